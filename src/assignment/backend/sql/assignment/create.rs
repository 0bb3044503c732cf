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
use sea_orm::sea_query::OnConflict;

use crate::assignment::error::AssignmentProviderError;
use crate::assignment::types::*;
use crate::db::entity::{
    assignment as db_assignment, prelude::Assignment as DbAssignment,
    sea_orm_active_enums::Type as DbAssignmentType,
};
use crate::error::DbContextExt;

/// Insert the grant. A previously revoked grant is reactivated.
pub async fn create(
    db: &DatabaseConnection,
    grant: Assignment,
) -> Result<Assignment, AssignmentProviderError> {
    let entry = db_assignment::ActiveModel {
        r#type: Set(DbAssignmentType::from(grant.r#type)),
        actor_id: Set(grant.actor_id.clone()),
        target_id: Set(grant.target_id.clone()),
        role_id: Set(grant.role_id.clone()),
        inherited: Set(grant.inherited),
        deleted: Set(false),
    };
    DbAssignment::insert(entry)
        .on_conflict(
            OnConflict::columns([
                db_assignment::Column::Type,
                db_assignment::Column::ActorId,
                db_assignment::Column::TargetId,
                db_assignment::Column::RoleId,
                db_assignment::Column::Inherited,
            ])
            .update_column(db_assignment::Column::Deleted)
            .to_owned(),
        )
        .exec_without_returning(db)
        .await
        .context("persisting role assignment")?;
    Ok(grant)
}
