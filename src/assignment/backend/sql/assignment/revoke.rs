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
use sea_orm::sea_query::Expr;

use crate::assignment::error::AssignmentProviderError;
use crate::assignment::types::*;
use crate::db::entity::{
    assignment as db_assignment, prelude::Assignment as DbAssignment,
    sea_orm_active_enums::Type as DbAssignmentType,
};
use crate::error::DbContextExt;

/// Mark the grant revoked. The row stays for the audit trail.
pub async fn revoke(
    db: &DatabaseConnection,
    grant: Assignment,
) -> Result<(), AssignmentProviderError> {
    let res = DbAssignment::update_many()
        .col_expr(db_assignment::Column::Deleted, Expr::value(true))
        .filter(db_assignment::Column::Type.eq(DbAssignmentType::from(grant.r#type)))
        .filter(db_assignment::Column::ActorId.eq(&grant.actor_id))
        .filter(db_assignment::Column::TargetId.eq(&grant.target_id))
        .filter(db_assignment::Column::RoleId.eq(&grant.role_id))
        .filter(db_assignment::Column::Inherited.eq(grant.inherited))
        .filter(db_assignment::Column::Deleted.eq(false))
        .exec(db)
        .await
        .context("revoking role assignment")?;
    if res.rows_affected == 0 {
        return Err(AssignmentProviderError::GrantNotFound);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    fn grant() -> Assignment {
        AssignmentBuilder::default()
            .role_id("r")
            .actor_id("u")
            .target_id("p")
            .r#type(AssignmentType::UserProject)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_revoke() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                rows_affected: 1,
                ..Default::default()
            }])
            .into_connection();
        revoke(&db, grant()).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_missing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                rows_affected: 0,
                ..Default::default()
            }])
            .into_connection();
        assert!(matches!(
            revoke(&db, grant()).await,
            Err(AssignmentProviderError::GrantNotFound)
        ));
    }
}
