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

use crate::db::entity::{prelude::Project as DbProject, project as db_project};
use crate::error::DbContextExt;
use crate::resource::ResourceProviderError;
use crate::resource::types::{Domain, ROOT_DOMAIN_ID};

pub async fn get_domain_by_id<I: AsRef<str>>(
    db: &DatabaseConnection,
    domain_id: I,
) -> Result<Option<Domain>, ResourceProviderError> {
    Ok(DbProject::find_by_id(domain_id.as_ref())
        .filter(db_project::Column::IsDomain.eq(true))
        .one(db)
        .await
        .context("fetching domain by id")?
        .map(Into::into))
}

pub async fn get_domain_by_name<N: AsRef<str>>(
    db: &DatabaseConnection,
    domain_name: N,
) -> Result<Option<Domain>, ResourceProviderError> {
    Ok(DbProject::find()
        .filter(db_project::Column::IsDomain.eq(true))
        .filter(db_project::Column::Id.ne(ROOT_DOMAIN_ID))
        .filter(db_project::Column::Name.eq(domain_name.as_ref()))
        .one(db)
        .await
        .context("fetching domain by name")?
        .map(Into::into))
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<Domain>, ResourceProviderError> {
    Ok(DbProject::find()
        .filter(db_project::Column::IsDomain.eq(true))
        .filter(db_project::Column::Id.ne(ROOT_DOMAIN_ID))
        .order_by_asc(db_project::Column::Name)
        .all(db)
        .await
        .context("listing domains")?
        .into_iter()
        .map(Into::into)
        .collect())
}
