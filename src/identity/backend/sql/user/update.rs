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

use sea_orm::entity::*;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::config::Config;
use crate::db::entity::prelude::User as DbUser;
use crate::error::DbContextExt;
use crate::identity::backend::sql::{local_user, password};
use crate::identity::error::IdentityProviderError;
use crate::identity::types::{UserResponse, UserUpdate};

/// Update the set attributes of the user.
///
/// A new password is appended to the password history, turning a non-local
/// user into a local one when necessary.
pub async fn update<U: AsRef<str>>(
    conf: &Config,
    db: &DatabaseConnection,
    user_id: U,
    update: UserUpdate,
) -> Result<UserResponse, IdentityProviderError> {
    let txn = db.begin().await.context("starting transaction")?;
    let current = DbUser::find_by_id(user_id.as_ref())
        .one(&txn)
        .await
        .context("fetching user for update")?
        .ok_or_else(|| IdentityProviderError::UserNotFound(user_id.as_ref().to_string()))?;
    let is_system_account = current.is_system_account;
    let mut entry = current.clone().into_active_model();
    if let Some(val) = update.name {
        entry.name = Set(val);
    }
    if let Some(val) = update.enabled {
        entry.enabled = Set(val);
    }
    if let Some(val) = update.displayname {
        entry.displayname = Set(Some(val));
    }
    if let Some(val) = update.email {
        entry.email = Set(Some(val));
    }
    if let Some(val) = update.mobile {
        entry.mobile = Set(Some(val));
    }
    if let Some(val) = update.default_project_id {
        entry.default_project_id = Set(Some(val));
    }
    let updated = if entry.is_changed() {
        entry.update(&txn).await.context("updating user")?
    } else {
        current
    };

    let local = local_user::get_by_user_id(&txn, &updated.id).await?;
    if let Some(local) = &local
        && local.name != updated.name
    {
        local_user::rename(&txn, local, &updated.name).await?;
    }
    if let Some(pass) = update.password {
        let local = match local {
            Some(local) => local,
            None => {
                local_user::create(&txn, &updated.id, &updated.domain_id, &updated.name).await?
            }
        };
        password::create(conf, &txn, local.id, pass, is_system_account).await?;
    }
    txn.commit().await.context("committing user update")?;
    Ok(updated.into())
}
