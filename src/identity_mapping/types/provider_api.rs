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

use crate::identity_mapping::IdentityMappingProviderError;
use crate::identity_mapping::types::id_mapping::*;
use crate::keystone::ServiceState;

/// IdMapping provider API.
#[async_trait]
pub trait IdentityMappingApi: Send + Sync + Clone {
    /// Get the `IdMapping` by the identity provider data.
    async fn get_by_local_id<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        local_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<Option<IdMapping>, IdentityMappingProviderError>;

    /// Get the IdMapping by the public_id.
    async fn get_by_public_id<'a>(
        &self,
        state: &ServiceState,
        public_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<Option<IdMapping>, IdentityMappingProviderError>;

    /// Get the public ID of the entity, minting it on the first call.
    ///
    /// Concurrent callers always observe the same public ID.
    async fn get_or_create_public_id<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        local_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<String, IdentityMappingProviderError>;

    /// List the mappings of the identity provider.
    async fn list_by_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        entity_type: Option<IdMappingEntityType>,
    ) -> Result<Vec<IdMapping>, IdentityMappingProviderError>;

    /// Remove the mapping of the public ID.
    async fn delete_by_public_id<'a>(
        &self,
        state: &ServiceState,
        public_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<(), IdentityMappingProviderError>;

    /// Remove all mappings of the identity provider.
    async fn delete_by_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<u64, IdentityMappingProviderError>;
}
