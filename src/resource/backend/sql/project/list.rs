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
use crate::resource::types::{Project, ProjectListParameters};

pub async fn list(
    db: &DatabaseConnection,
    params: &ProjectListParameters,
) -> Result<Vec<Project>, ResourceProviderError> {
    let mut select = DbProject::find().filter(db_project::Column::IsDomain.eq(false));
    if let Some(val) = &params.domain_id {
        select = select.filter(db_project::Column::DomainId.eq(val));
    }
    if let Some(val) = &params.name {
        select = select.filter(db_project::Column::Name.eq(val));
    }
    if let Some(val) = &params.parent_id {
        select = select.filter(db_project::Column::ParentId.eq(val));
    }
    Ok(select
        .order_by_asc(db_project::Column::Name)
        .all(db)
        .await
        .context("listing projects")?
        .into_iter()
        .map(Into::into)
        .collect())
}
