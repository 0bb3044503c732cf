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

use sea_orm::DatabaseConnection;
use sea_orm::entity::*;
use sea_orm::query::*;

use crate::db::entity::{identity_provider as db_idp, prelude::IdentityProvider as DbIdp};
use crate::error::DbContextExt;
use crate::idp::IdpProviderError;
use crate::idp::types::IdentityProvider;

pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
) -> Result<Option<IdentityProvider>, IdpProviderError> {
    DbIdp::find_by_id(id.as_ref())
        .one(db)
        .await
        .context("fetching identity provider by id")?
        .map(TryInto::try_into)
        .transpose()
}

/// Identity provider whose users land in the domain.
pub async fn find_by_target_domain<D: AsRef<str>>(
    db: &DatabaseConnection,
    domain_id: D,
) -> Result<Option<IdentityProvider>, IdpProviderError> {
    DbIdp::find()
        .filter(db_idp::Column::TargetDomainId.eq(domain_id.as_ref()))
        .order_by_asc(db_idp::Column::Id)
        .one(db)
        .await
        .context("searching identity provider by the target domain")?
        .map(TryInto::try_into)
        .transpose()
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    use super::super::tests::get_idp_mock;
    use super::*;
    use crate::idp::types::SyncStatus;

    #[tokio::test]
    async fn test_get() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![get_idp_mock("idp", "ldap")]])
            .into_connection();
        let idp = get(&db, "idp").await.unwrap().expect("idp not found");
        assert_eq!(SyncStatus::Idle, idp.sync_status);

        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "identity_provider"."id", "identity_provider"."name", "identity_provider"."driver", "identity_provider"."template", "identity_provider"."target_domain_id", "identity_provider"."auto_create_project", "identity_provider"."auto_create_user", "identity_provider"."enabled", "identity_provider"."is_sso", "identity_provider"."is_default", "identity_provider"."sync_status", "identity_provider"."sync_status_at", "identity_provider"."status", "identity_provider"."error_count", "identity_provider"."sync_interval_seconds", "identity_provider"."last_sync", "identity_provider"."last_sync_end_at", "identity_provider"."description" FROM "identity_provider" WHERE "identity_provider"."id" = $1 LIMIT $2"#,
                ["idp".into(), 1u64.into()]
            ),]
        );
    }

    #[tokio::test]
    async fn test_unknown_status() {
        let mut model = get_idp_mock("idp", "ldap");
        model.sync_status = "running".into();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model]])
            .into_connection();
        assert!(matches!(
            get(&db, "idp").await,
            Err(IdpProviderError::Status(_))
        ));
    }
}
