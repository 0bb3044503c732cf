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
//! Authentication implementation.
use chrono::Utc;
use sea_orm::DatabaseConnection;
use sea_orm::entity::*;
use tracing::info;

use super::{local_user, password};
use crate::config::Config;
use crate::db::entity::prelude::User as DbUser;
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::password_hashing;
use crate::identity::types::*;

/// Authenticate a user by a password.
///
/// - Reads the local user record either by the user ID or by the name in the
///   domain.
/// - Rejects disabled users (this includes the locked ones).
/// - Verifies the password against the password history, newest first. A
///   match against an expired password fails unless the user is a system
///   account.
/// - A failed attempt is counted and disables the user once the lockout
///   threshold is reached. A successful one clears the counter.
pub async fn authenticate_by_password(
    config: &Config,
    db: &DatabaseConnection,
    auth: &UserPasswordAuthRequest,
) -> Result<UserResponse, IdentityProviderError> {
    let local = match (&auth.id, &auth.name, &auth.domain_id) {
        (Some(id), _, _) => local_user::get_by_user_id(db, id).await?,
        (None, Some(name), Some(domain_id)) => {
            local_user::get_by_name(db, name, domain_id).await?
        }
        _ => return Err(IdentityProviderError::UserIdOrNameWithDomain),
    };
    let local = local.ok_or_else(|| {
        IdentityProviderError::UserNotFound(
            auth.id
                .clone()
                .or_else(|| auth.name.clone())
                .unwrap_or_default(),
        )
    })?;
    let user = DbUser::find_by_id(&local.user_id)
        .one(db)
        .await
        .context("fetching user of the local user")?
        .ok_or_else(|| IdentityProviderError::UserNotFound(local.user_id.clone()))?;
    if !user.enabled {
        return Err(IdentityProviderError::UserDisabled(user.id));
    }

    let now = Utc::now().naive_utc();
    let mut matched_expired = false;
    for candidate in local_user::load_passwords(db, &local).await? {
        let Some(hash) = &candidate.password_hash else {
            continue;
        };
        if password_hashing::verify_password(config, &auth.password, hash).await? {
            if !user.is_system_account && password::is_expired(&candidate, now) {
                matched_expired = true;
                break;
            }
            local_user::reset_failed_auth(db, &local).await?;
            return Ok(user.into());
        }
    }

    if local_user::record_failed_auth(config, db, &local).await? {
        info!("Locking out user {} after too many failed attempts", user.id);
        let mut entry = user.clone().into_active_model();
        entry.enabled = Set(false);
        entry.update(db).await.context("locking out the user")?;
    }
    if matched_expired {
        return Err(IdentityProviderError::PasswordExpired(user.id));
    }
    Err(IdentityProviderError::InvalidPassword)
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use tracing_test::traced_test;

    use super::*;
    use crate::config::PasswordHashingAlgo;
    use crate::db::entity::{local_user as db_local_user, password as db_password, user as db_user};

    fn plain_config(lockout: Option<u32>) -> Config {
        let mut config = Config::default();
        config.identity.password_hashing_algorithm = PasswordHashingAlgo::None;
        config.security_compliance.lockout_failure_attempts = lockout;
        config
    }

    fn local_user_mock(failed: i32) -> db_local_user::Model {
        db_local_user::Model {
            id: 1,
            user_id: "u1".into(),
            domain_id: "default".into(),
            name: "alice".into(),
            failed_auth_count: Some(failed),
            failed_auth_at: None,
        }
    }

    fn user_mock(enabled: bool) -> db_user::Model {
        db_user::Model {
            id: "u1".into(),
            name: "alice".into(),
            domain_id: "default".into(),
            enabled,
            ..Default::default()
        }
    }

    fn password_mock(id: i32, hash: &str, expired: bool) -> db_password::Model {
        let now = Utc::now().naive_utc();
        db_password::Model {
            id,
            local_user_id: 1,
            password_hash: Some(hash.into()),
            created_at: now,
            expires_at: expired.then(|| now - TimeDelta::days(1)),
        }
    }

    fn auth(password: &str) -> UserPasswordAuthRequest {
        UserPasswordAuthRequestBuilder::default()
            .name("alice")
            .domain_id("default")
            .password(password)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![local_user_mock(0)]])
            .append_query_results([vec![user_mock(true)]])
            .append_query_results([vec![password_mock(2, "p@ss", false)]])
            .into_connection();
        let user = authenticate_by_password(&plain_config(None), &db, &auth("p@ss"))
            .await
            .unwrap();
        assert_eq!("u1", user.id);
    }

    #[tokio::test]
    async fn test_authenticate_older_password() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![local_user_mock(0)]])
            .append_query_results([vec![user_mock(true)]])
            .append_query_results([vec![
                password_mock(3, "new", false),
                password_mock(2, "old", false),
            ]])
            .into_connection();
        assert!(
            authenticate_by_password(&plain_config(None), &db, &auth("old"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_authenticate_unknown_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<db_local_user::Model>::new()])
            .into_connection();
        match authenticate_by_password(&plain_config(None), &db, &auth("p@ss")).await {
            Err(IdentityProviderError::UserNotFound(name)) => assert_eq!("alice", name),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_authenticate_disabled() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![local_user_mock(3)]])
            .append_query_results([vec![user_mock(false)]])
            .into_connection();
        assert!(matches!(
            authenticate_by_password(&plain_config(Some(3)), &db, &auth("p@ss")).await,
            Err(IdentityProviderError::UserDisabled(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_expired() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![local_user_mock(0)]])
            .append_query_results([vec![user_mock(true)]])
            .append_query_results([vec![password_mock(2, "p@ss", true)]])
            .append_query_results([vec![local_user_mock(1)]])
            .into_connection();
        assert!(matches!(
            authenticate_by_password(&plain_config(None), &db, &auth("p@ss")).await,
            Err(IdentityProviderError::PasswordExpired(_))
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_authenticate_lockout() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![local_user_mock(3)]])
            .append_query_results([vec![user_mock(true)]])
            .append_query_results([vec![password_mock(2, "p@ss", false)]])
            // failed auth counter update
            .append_query_results([vec![local_user_mock(4)]])
            // user disabled
            .append_query_results([vec![user_mock(false)]])
            .into_connection();
        assert!(matches!(
            authenticate_by_password(&plain_config(Some(3)), &db, &auth("wrong")).await,
            Err(IdentityProviderError::InvalidPassword)
        ));
        assert!(logs_contain("Locking out user u1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_authenticate_at_lockout_threshold() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![local_user_mock(2)]])
            .append_query_results([vec![user_mock(true)]])
            .append_query_results([vec![password_mock(2, "p@ss", false)]])
            // failed auth counter update, the user stays enabled
            .append_query_results([vec![local_user_mock(3)]])
            .into_connection();
        assert!(matches!(
            authenticate_by_password(&plain_config(Some(3)), &db, &auth("wrong")).await,
            Err(IdentityProviderError::InvalidPassword)
        ));
        assert!(!logs_contain("Locking out user"));
    }
}
