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
use crate::identity::types::Group;

pub async fn get<I: AsRef<str>>(
    db: &DatabaseConnection,
    group_id: I,
) -> Result<Option<Group>, IdentityProviderError> {
    Ok(DbGroup::find_by_id(group_id.as_ref())
        .one(db)
        .await
        .context("fetching group by id")?
        .map(Into::into))
}

pub async fn find_by_name<N: AsRef<str>, D: AsRef<str>>(
    db: &DatabaseConnection,
    name: N,
    domain_id: D,
) -> Result<Option<Group>, IdentityProviderError> {
    Ok(DbGroup::find()
        .filter(db_group::Column::Name.eq(name.as_ref()))
        .filter(db_group::Column::DomainId.eq(domain_id.as_ref()))
        .one(db)
        .await
        .context("fetching group by name")?
        .map(Into::into))
}
