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
use crate::resource::types::Project;

pub async fn get_project<I: AsRef<str>>(
    db: &DatabaseConnection,
    id: I,
) -> Result<Option<Project>, ResourceProviderError> {
    Ok(DbProject::find_by_id(id.as_ref())
        .filter(db_project::Column::IsDomain.eq(false))
        .one(db)
        .await
        .context("fetching project by id")?
        .map(Into::into))
}

pub async fn get_project_by_name<N: AsRef<str>, D: AsRef<str>>(
    db: &DatabaseConnection,
    name: N,
    domain_id: D,
) -> Result<Option<Project>, ResourceProviderError> {
    Ok(DbProject::find()
        .filter(db_project::Column::Name.eq(name.as_ref()))
        .filter(db_project::Column::DomainId.eq(domain_id.as_ref()))
        .filter(db_project::Column::IsDomain.eq(false))
        .one(db)
        .await
        .context("fetching project by name and domain")?
        .map(Into::into))
}
