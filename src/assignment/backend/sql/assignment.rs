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
//! Role assignment database backend.
use crate::assignment::types::*;
use crate::db::entity::{
    assignment as db_assignment, role as db_role, sea_orm_active_enums::Type as DbAssignmentType,
};

mod create;
mod list;
mod revoke;

pub use create::create;
pub use list::list;
pub use revoke::revoke;

impl From<db_assignment::Model> for Assignment {
    fn from(value: db_assignment::Model) -> Self {
        Self {
            role_id: value.role_id,
            role_name: None,
            actor_id: value.actor_id,
            target_id: value.target_id,
            inherited: value.inherited,
            r#type: value.r#type.into(),
        }
    }
}

impl From<(db_assignment::Model, Option<db_role::Model>)> for Assignment {
    fn from(value: (db_assignment::Model, Option<db_role::Model>)) -> Self {
        let mut assignment = Assignment::from(value.0);
        if let Some(val) = value.1 {
            assignment.role_name = Some(val.name);
        }
        assignment
    }
}

impl From<DbAssignmentType> for AssignmentType {
    fn from(value: DbAssignmentType) -> Self {
        match value {
            DbAssignmentType::GroupDomain => Self::GroupDomain,
            DbAssignmentType::GroupProject => Self::GroupProject,
            DbAssignmentType::UserDomain => Self::UserDomain,
            DbAssignmentType::UserProject => Self::UserProject,
        }
    }
}

impl From<AssignmentType> for DbAssignmentType {
    fn from(value: AssignmentType) -> Self {
        match value {
            AssignmentType::GroupDomain => Self::GroupDomain,
            AssignmentType::GroupProject => Self::GroupProject,
            AssignmentType::UserDomain => Self::UserDomain,
            AssignmentType::UserProject => Self::UserProject,
        }
    }
}
