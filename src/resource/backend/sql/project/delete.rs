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

pub async fn delete<S: AsRef<str>>(
    db: &DatabaseConnection,
    project_id: S,
) -> Result<(), ResourceProviderError> {
    let res = DbProject::delete_many()
        .filter(db_project::Column::Id.eq(project_id.as_ref()))
        .filter(db_project::Column::IsDomain.eq(false))
        .exec(db)
        .await
        .context("deleting project")?;
    if res.rows_affected == 0 {
        return Err(ResourceProviderError::ProjectNotFound(
            project_id.as_ref().to_string(),
        ));
    }
    Ok(())
}
