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
use crate::assignment::types::{ROLE_NULL_DOMAIN_ID, Role, RoleListParameters};
use crate::db::entity::{prelude::Role as DbRole, role as db_role};
use crate::error::DbContextExt;

pub async fn list(
    db: &DatabaseConnection,
    params: &RoleListParameters,
) -> Result<Vec<Role>, AssignmentProviderError> {
    let mut select = DbRole::find().filter(
        db_role::Column::DomainId.eq(params.domain_id.as_deref().unwrap_or(ROLE_NULL_DOMAIN_ID)),
    );
    if let Some(name) = &params.name {
        select = select.filter(db_role::Column::Name.eq(name));
    }
    Ok(select
        .order_by_asc(db_role::Column::Name)
        .all(db)
        .await
        .context("listing roles")?
        .into_iter()
        .map(Into::into)
        .collect())
}
