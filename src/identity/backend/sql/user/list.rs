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

use crate::db::entity::{prelude::User as DbUser, user as db_user};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::{UserListParameters, UserResponse};

/// List users.
pub async fn list(
    db: &DatabaseConnection,
    params: &UserListParameters,
) -> Result<Vec<UserResponse>, IdentityProviderError> {
    let mut select = DbUser::find();
    if let Some(domain_id) = &params.domain_id {
        select = select.filter(db_user::Column::DomainId.eq(domain_id));
    }
    if let Some(name) = &params.name {
        select = select.filter(db_user::Column::Name.eq(name));
    }
    Ok(select
        .order_by_asc(db_user::Column::Name)
        .all(db)
        .await
        .context("listing users")?
        .into_iter()
        .map(Into::into)
        .collect())
}
