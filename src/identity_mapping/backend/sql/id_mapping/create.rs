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

use crate::db::entity::id_mapping as db_id_mapping;
use crate::error::DbContextExt;
use crate::identity_mapping::IdentityMappingProviderError;
use crate::identity_mapping::types::IdMapping;

pub async fn create(
    db: &DatabaseConnection,
    mapping: IdMapping,
) -> Result<IdMapping, IdentityMappingProviderError> {
    db_id_mapping::ActiveModel {
        public_id: Set(mapping.public_id),
        domain_id: Set(mapping.idp_id),
        local_id: Set(mapping.local_id),
        entity_type: Set(mapping.entity_type.to_string()),
    }
    .insert(db)
    .await
    .context("inserting id mapping")?
    .try_into()
}
