// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0
//! Local users, the users authenticated with the password history.
use chrono::Utc;
use sea_orm::ConnectionTrait;
use sea_orm::entity::*;
use sea_orm::query::*;

use crate::config::Config;
use crate::db::entity::{
    local_user as db_local_user, password as db_password,
    prelude::{LocalUser as DbLocalUser, Password as DbPassword},
};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;

pub async fn get_by_user_id<C: ConnectionTrait, U: AsRef<str>>(
    db: &C,
    user_id: U,
) -> Result<Option<db_local_user::Model>, IdentityProviderError> {
    Ok(DbLocalUser::find()
        .filter(db_local_user::Column::UserId.eq(user_id.as_ref()))
        .one(db)
        .await
        .context("fetching local user")?)
}

pub async fn get_by_name<C: ConnectionTrait, N: AsRef<str>, D: AsRef<str>>(
    db: &C,
    name: N,
    domain_id: D,
) -> Result<Option<db_local_user::Model>, IdentityProviderError> {
    Ok(DbLocalUser::find()
        .filter(db_local_user::Column::Name.eq(name.as_ref()))
        .filter(db_local_user::Column::DomainId.eq(domain_id.as_ref()))
        .one(db)
        .await
        .context("fetching local user by name")?)
}

/// Password history of the local user, newest first.
pub async fn load_passwords<C: ConnectionTrait>(
    db: &C,
    local_user: &db_local_user::Model,
) -> Result<Vec<db_password::Model>, IdentityProviderError> {
    Ok(DbPassword::find()
        .filter(db_password::Column::LocalUserId.eq(local_user.id))
        .order_by_desc(db_password::Column::CreatedAt)
        .order_by_desc(db_password::Column::Id)
        .all(db)
        .await
        .context("fetching password history")?)
}

pub async fn create<C: ConnectionTrait>(
    db: &C,
    user_id: &str,
    domain_id: &str,
    name: &str,
) -> Result<db_local_user::Model, IdentityProviderError> {
    Ok(db_local_user::ActiveModel {
        id: NotSet,
        user_id: Set(user_id.to_string()),
        domain_id: Set(domain_id.to_string()),
        name: Set(name.to_string()),
        failed_auth_count: Set(Some(0)),
        failed_auth_at: Set(None),
    }
    .insert(db)
    .await
    .context("inserting local user")?)
}

pub async fn rename<C: ConnectionTrait>(
    db: &C,
    local_user: &db_local_user::Model,
    name: &str,
) -> Result<(), IdentityProviderError> {
    let mut entry = local_user.clone().into_active_model();
    entry.name = Set(name.to_string());
    entry.update(db).await.context("renaming local user")?;
    Ok(())
}

/// Count the failed authentication attempt.
///
/// Returns `true` when the attempt exceeded the lockout threshold.
pub async fn record_failed_auth<C: ConnectionTrait>(
    conf: &Config,
    db: &C,
    local_user: &db_local_user::Model,
) -> Result<bool, IdentityProviderError> {
    let count = local_user.failed_auth_count.unwrap_or(0) + 1;
    let mut entry = local_user.clone().into_active_model();
    entry.failed_auth_count = Set(Some(count));
    entry.failed_auth_at = Set(Some(Utc::now().naive_utc()));
    entry.update(db).await.context("counting failed authentication")?;
    Ok(conf
        .security_compliance
        .lockout_failure_attempts
        .is_some_and(|threshold| i64::from(count) > i64::from(threshold)))
}

/// Clear the failed authentication counter.
pub async fn reset_failed_auth<C: ConnectionTrait>(
    db: &C,
    local_user: &db_local_user::Model,
) -> Result<(), IdentityProviderError> {
    if local_user.failed_auth_count.unwrap_or(0) == 0 && local_user.failed_auth_at.is_none() {
        return Ok(());
    }
    let mut entry = local_user.clone().into_active_model();
    entry.failed_auth_count = Set(Some(0));
    entry.failed_auth_at = Set(None);
    entry.update(db).await.context("resetting failed authentication")?;
    Ok(())
}
