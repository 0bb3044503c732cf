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

use crate::assignment::error::AssignmentProviderError;
use crate::assignment::types::{ROLE_NULL_DOMAIN_ID, Role};
use crate::db::entity::{prelude::Role as DbRole, role as db_role};
use crate::error::DbContextExt;

pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
) -> Result<Option<Role>, AssignmentProviderError> {
    Ok(DbRole::find_by_id(id.as_ref())
        .one(db)
        .await
        .context("fetching role by id")?
        .map(Into::into))
}

pub async fn get_by_name<N: AsRef<str>>(
    db: &DatabaseConnection,
    name: N,
    domain_id: Option<&str>,
) -> Result<Option<Role>, AssignmentProviderError> {
    Ok(DbRole::find()
        .filter(db_role::Column::Name.eq(name.as_ref()))
        .filter(db_role::Column::DomainId.eq(domain_id.unwrap_or(ROLE_NULL_DOMAIN_ID)))
        .one(db)
        .await
        .context("fetching role by name")?
        .map(Into::into))
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, Transaction};

    use super::super::tests::get_role_mock;
    use super::*;

    #[tokio::test]
    async fn test_get_by_name() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![get_role_mock("1", "member")]])
            .into_connection();
        assert_eq!(
            "1",
            get_by_name(&db, "member", None).await.unwrap().unwrap().id
        );
        assert_eq!(
            db.into_transaction_log(),
            [Transaction::from_sql_and_values(
                DatabaseBackend::Postgres,
                r#"SELECT "role"."id", "role"."name", "role"."domain_id", "role"."description" FROM "role" WHERE "role"."name" = $1 AND "role"."domain_id" = $2 LIMIT $3"#,
                ["member".into(), "<<null>>".into(), 1u64.into()]
            ),]
        );
    }
}
