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

use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::db::entity::{prelude::Service as DbService, service as db_service};
use crate::error::DbContextExt;

impl From<db_service::Model> for Service {
    fn from(value: db_service::Model) -> Self {
        Self {
            id: value.id,
            r#type: value.r#type,
            name: value.name,
            enabled: value.enabled,
        }
    }
}

pub async fn create(
    db: &DatabaseConnection,
    service: Service,
) -> Result<Service, CatalogProviderError> {
    Ok(db_service::ActiveModel {
        id: Set(service.id),
        r#type: Set(service.r#type),
        name: Set(service.name),
        enabled: Set(service.enabled),
    }
    .insert(db)
    .await
    .context("inserting service")?
    .into())
}

pub async fn get_by_type<T: AsRef<str>>(
    db: &DatabaseConnection,
    r#type: T,
) -> Result<Option<Service>, CatalogProviderError> {
    Ok(DbService::find()
        .filter(db_service::Column::Type.eq(r#type.as_ref()))
        .one(db)
        .await
        .context("fetching service by type")?
        .map(Into::into))
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    use super::*;

    #[tokio::test]
    async fn test_get_by_type() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![db_service::Model {
                id: "s1".into(),
                r#type: "identity".into(),
                name: "keystone".into(),
                enabled: true,
            }]])
            .into_connection();
        assert_eq!(
            "s1",
            get_by_type(&db, "identity").await.unwrap().unwrap().id
        );
        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "service"."id", "service"."type", "service"."name", "service"."enabled" FROM "service" WHERE "service"."type" = $1 LIMIT $2"#,
                ["identity".into(), 1u64.into()]
            ),]
        );
    }
}
