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

use chrono::Utc;
use sea_orm::entity::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::config::Config;
use crate::db::entity::user as db_user;
use crate::error::DbContextExt;
use crate::identity::backend::sql::{local_user, password};
use crate::identity::error::IdentityProviderError;
use crate::identity::types::{UserCreate, UserResponse};

/// Create the user.
///
/// A user with the password additionally gets the local user record with the
/// first entry of the password history.
pub async fn create(
    conf: &Config,
    db: &DatabaseConnection,
    user: UserCreate,
) -> Result<UserResponse, IdentityProviderError> {
    let txn = db.begin().await.context("starting transaction")?;
    let entry = db_user::ActiveModel {
        id: Set(user
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())),
        name: Set(user.name.clone()),
        domain_id: Set(user.domain_id.clone()),
        displayname: Set(user.displayname),
        email: Set(user.email),
        mobile: Set(user.mobile),
        enabled: Set(user.enabled),
        default_project_id: Set(user.default_project_id),
        is_system_account: Set(user.is_system_account),
        last_active_at: Set(None),
        last_login_ip: Set(None),
        last_login_source: Set(None),
        created_at: Set(Some(Utc::now().naive_utc())),
    }
    .insert(&txn)
    .await
    .context("inserting user")?;

    if let Some(pass) = user.password {
        let local = local_user::create(&txn, &entry.id, &entry.domain_id, &entry.name).await?;
        password::create(conf, &txn, local.id, pass, entry.is_system_account).await?;
    }
    txn.commit().await.context("committing user creation")?;
    Ok(entry.into())
}
