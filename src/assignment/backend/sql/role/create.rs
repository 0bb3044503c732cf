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
use uuid::Uuid;

use crate::assignment::error::AssignmentProviderError;
use crate::assignment::types::{ROLE_NULL_DOMAIN_ID, Role, RoleCreate};
use crate::db::entity::role as db_role;
use crate::error::DbContextExt;

pub async fn create(
    db: &DatabaseConnection,
    role: RoleCreate,
) -> Result<Role, AssignmentProviderError> {
    Ok(db_role::ActiveModel {
        id: Set(role
            .id
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string())),
        name: Set(role.name),
        domain_id: Set(role
            .domain_id
            .unwrap_or_else(|| ROLE_NULL_DOMAIN_ID.to_string())),
        description: Set(role.description),
    }
    .insert(db)
    .await
    .context("inserting role")?
    .into())
}
