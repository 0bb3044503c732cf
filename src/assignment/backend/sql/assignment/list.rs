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
use crate::assignment::types::*;
use crate::db::entity::{
    assignment as db_assignment,
    prelude::{Assignment as DbAssignment, Role as DbRole},
    role as db_role,
    sea_orm_active_enums::Type as DbAssignmentType,
};
use crate::error::DbContextExt;

/// Get the active role assignments of the list of actors on the list of
/// targets.
pub async fn list(
    db: &DatabaseConnection,
    params: &RoleAssignmentListForMultipleActorTargetParameters,
) -> Result<Vec<Assignment>, AssignmentProviderError> {
    let mut select = DbAssignment::find().filter(db_assignment::Column::Deleted.eq(false));

    if !params.actors.is_empty() {
        select = select.filter(db_assignment::Column::ActorId.is_in(params.actors.clone()));
    }
    if !params.targets.is_empty() {
        select = select.filter(db_assignment::Column::TargetId.is_in(params.targets.clone()));
    }
    if !params.types.is_empty() {
        select = select.filter(
            db_assignment::Column::Type.is_in(
                params
                    .types
                    .iter()
                    .map(|t| DbAssignmentType::from(*t))
                    .collect::<Vec<_>>(),
            ),
        );
    }
    if let Some(rid) = &params.role_id {
        select = select.filter(db_assignment::Column::RoleId.eq(rid));
    }
    if params.exclude_inherited {
        select = select.filter(db_assignment::Column::Inherited.eq(false));
    }

    if params.include_names {
        let db_assignments: Vec<(db_assignment::Model, Option<db_role::Model>)> = select
            .find_also_related(DbRole)
            .all(db)
            .await
            .context("fetching role assignments with roles")?;
        Ok(db_assignments.into_iter().map(Into::into).collect())
    } else {
        Ok(select
            .all(db)
            .await
            .context("fetching role assignments")?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
