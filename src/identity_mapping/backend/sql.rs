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

use async_trait::async_trait;

use super::IdentityMappingBackend;
use crate::identity_mapping::IdentityMappingProviderError;
use crate::identity_mapping::types::*;
use crate::keystone::ServiceState;

mod id_mapping;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl IdentityMappingBackend for SqlBackend {
    async fn get_by_local_id<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        local_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<Option<IdMapping>, IdentityMappingProviderError> {
        id_mapping::get_by_local_id(&state.db, idp_id, local_id, entity_type).await
    }

    async fn get_by_public_id<'a>(
        &self,
        state: &ServiceState,
        public_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<Option<IdMapping>, IdentityMappingProviderError> {
        id_mapping::get_by_public_id(&state.db, public_id, entity_type).await
    }

    async fn create(
        &self,
        state: &ServiceState,
        mapping: IdMapping,
    ) -> Result<IdMapping, IdentityMappingProviderError> {
        id_mapping::create(&state.db, mapping).await
    }

    async fn list_by_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        entity_type: Option<IdMappingEntityType>,
    ) -> Result<Vec<IdMapping>, IdentityMappingProviderError> {
        id_mapping::list_by_idp(&state.db, idp_id, entity_type).await
    }

    async fn delete_by_public_id<'a>(
        &self,
        state: &ServiceState,
        public_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<(), IdentityMappingProviderError> {
        id_mapping::delete_by_public_id(&state.db, public_id, entity_type).await
    }

    async fn delete_by_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<u64, IdentityMappingProviderError> {
        id_mapping::delete_by_idp(&state.db, idp_id).await
    }
}
