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

use crate::db::entity::{id_mapping, prelude::IdMapping as DbIdMapping};
use crate::error::DbContextExt;
use crate::identity_mapping::IdentityMappingProviderError;
use crate::identity_mapping::types::IdMappingEntityType;

pub async fn delete_by_public_id<P: AsRef<str>>(
    db: &DatabaseConnection,
    public_id: P,
    entity_type: IdMappingEntityType,
) -> Result<(), IdentityMappingProviderError> {
    DbIdMapping::delete_many()
        .filter(id_mapping::Column::PublicId.eq(public_id.as_ref()))
        .filter(id_mapping::Column::EntityType.eq(entity_type.as_str()))
        .exec(db)
        .await
        .context("deleting id mapping")?;
    Ok(())
}

pub async fn delete_by_idp<I: AsRef<str>>(
    db: &DatabaseConnection,
    idp_id: I,
) -> Result<u64, IdentityMappingProviderError> {
    Ok(DbIdMapping::delete_many()
        .filter(id_mapping::Column::DomainId.eq(idp_id.as_ref()))
        .exec(db)
        .await
        .context("deleting id mappings of the identity provider")?
        .rows_affected)
}
