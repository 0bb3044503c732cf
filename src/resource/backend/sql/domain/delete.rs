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

use sea_orm::entity::*;
use sea_orm::query::*;
use sea_orm::{DatabaseConnection, TransactionTrait};

use crate::db::entity::{prelude::Project as DbProject, project as db_project};
use crate::error::DbContextExt;
use crate::resource::ResourceProviderError;
use crate::resource::types::ROOT_DOMAIN_ID;

/// Delete the domain together with its projects.
pub async fn delete<S: AsRef<str>>(
    db: &DatabaseConnection,
    domain_id: S,
) -> Result<(), ResourceProviderError> {
    if domain_id.as_ref() == ROOT_DOMAIN_ID {
        return Err(ResourceProviderError::RootDomainImmutable);
    }
    let txn = db.begin().await.context("starting transaction")?;
    DbProject::delete_many()
        .filter(db_project::Column::DomainId.eq(domain_id.as_ref()))
        .filter(db_project::Column::IsDomain.eq(false))
        .exec(&txn)
        .await
        .context("deleting domain projects")?;
    let res = DbProject::delete_by_id(domain_id.as_ref())
        .exec(&txn)
        .await
        .context("deleting domain")?;
    if res.rows_affected == 0 {
        return Err(ResourceProviderError::DomainNotFound(
            domain_id.as_ref().to_string(),
        ));
    }
    txn.commit().await.context("committing domain removal")?;
    Ok(())
}
