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

use crate::db::entity::{
    local_user as db_local_user,
    prelude::{LocalUser as DbLocalUser, User as DbUser},
    user as db_user,
};
use crate::error::DbContextExt;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::UserResponse;

pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    user_id: I,
) -> Result<Option<UserResponse>, IdentityProviderError> {
    Ok(DbUser::find_by_id(user_id.as_ref())
        .one(db)
        .await
        .context("fetching user by id")?
        .map(Into::into))
}

/// Find the user by the name in the domain.
///
/// A local and a non-local user may share the name. The local one is
/// preferred then.
pub async fn find_by_name<N: AsRef<str>, D: AsRef<str>>(
    db: &DatabaseConnection,
    name: N,
    domain_id: D,
) -> Result<Option<UserResponse>, IdentityProviderError> {
    let mut users = DbUser::find()
        .filter(db_user::Column::Name.eq(name.as_ref()))
        .filter(db_user::Column::DomainId.eq(domain_id.as_ref()))
        .all(db)
        .await
        .context("fetching user by name")?;
    if users.len() > 1 {
        let local = DbLocalUser::find()
            .filter(db_local_user::Column::UserId.is_in(users.iter().map(|x| x.id.clone())))
            .one(db)
            .await
            .context("fetching local user of the same name")?;
        if let Some(local) = local
            && let Some(pos) = users.iter().position(|x| x.id == local.user_id)
        {
            return Ok(Some(users.swap_remove(pos).into()));
        }
    }
    Ok(users.into_iter().next().map(Into::into))
}
