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

use chrono::{NaiveDateTime, TimeDelta, Utc};
use sea_orm::ConnectionTrait;
use sea_orm::entity::*;

use crate::config::Config;
use crate::db::entity::password as db_password;
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::password_hashing;

/// Append the password to the password history of the local user.
pub async fn create<C: ConnectionTrait, P: AsRef<[u8]>>(
    conf: &Config,
    db: &C,
    local_user_id: i32,
    password: P,
    is_system_account: bool,
) -> Result<db_password::Model, IdentityProviderError> {
    let now = Utc::now().naive_utc();
    let expires_at = match conf.identity.password_expires_days {
        Some(days) if !is_system_account => now.checked_add_signed(TimeDelta::days(days)),
        _ => None,
    };
    let hash = password_hashing::hash_password(conf, password).await?;
    Ok(db_password::ActiveModel {
        id: NotSet,
        local_user_id: Set(local_user_id),
        password_hash: Set(Some(hash)),
        created_at: Set(now),
        expires_at: Set(expires_at),
    }
    .insert(db)
    .await
    .context("inserting password")?)
}

pub fn is_expired(password: &db_password::Model, now: NaiveDateTime) -> bool {
    password.expires_at.is_some_and(|expires| expires <= now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        let now = Utc::now().naive_utc();
        let mut pass = db_password::Model::default();
        assert!(!is_expired(&pass, now));
        pass.expires_at = Some(now - TimeDelta::seconds(1));
        assert!(is_expired(&pass, now));
        pass.expires_at = Some(now + TimeDelta::days(1));
        assert!(!is_expired(&pass, now));
    }
}
