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

use crate::db::entity::{group as db_group, prelude::Group as DbGroup};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::{Group, GroupListParameters};

/// List groups.
pub async fn list(
    db: &DatabaseConnection,
    params: &GroupListParameters,
) -> Result<Vec<Group>, IdentityProviderError> {
    let mut select = DbGroup::find();
    if let Some(domain_id) = &params.domain_id {
        select = select.filter(db_group::Column::DomainId.eq(domain_id));
    }
    if let Some(name) = &params.name {
        select = select.filter(db_group::Column::Name.eq(name));
    }
    Ok(select
        .order_by_asc(db_group::Column::Name)
        .all(db)
        .await
        .context("listing groups")?
        .into_iter()
        .map(Into::into)
        .collect())
}
