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

use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::db::entity::region as db_region;
use crate::error::DbContextExt;

impl From<db_region::Model> for Region {
    fn from(value: db_region::Model) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            parent_region_id: value.parent_region_id,
        }
    }
}

pub async fn create(db: &DatabaseConnection, region: Region) -> Result<Region, CatalogProviderError> {
    Ok(db_region::ActiveModel {
        id: Set(region.id),
        name: Set(region.name),
        description: Set(region.description),
        parent_region_id: Set(region.parent_region_id),
    }
    .insert(db)
    .await
    .context("inserting region")?
    .into())
}
