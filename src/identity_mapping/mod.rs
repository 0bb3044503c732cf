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
//! # Identity mapping provider
//!
//! Entities synchronized from an identity provider keep their external
//! identifier in the mapping and get a stable public ID assigned locally. The
//! public ID is minted exactly once per (identity provider, external ID,
//! entity type).
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::identity_mapping::backend::{IdentityMappingBackend, sql::SqlBackend};
use crate::identity_mapping::types::*;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

pub use error::IdentityMappingProviderError;
#[cfg(test)]
pub use mock::MockIdentityMappingProvider;
pub use types::IdentityMappingApi;

/// Identity mapping provider.
#[derive(Clone)]
pub struct IdentityMappingProvider {
    backend_driver: Arc<dyn IdentityMappingBackend>,
}

impl IdentityMappingProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, IdentityMappingProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_identity_mapping_backend(config.identity_mapping.driver.clone())
        {
            driver.clone()
        } else {
            match config.identity_mapping.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                _ => {
                    return Err(IdentityMappingProviderError::UnsupportedDriver(
                        config.identity_mapping.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl IdentityMappingApi for IdentityMappingProvider {
    /// Get the `IdMapping` by the local data.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_by_local_id<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        local_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<Option<IdMapping>, IdentityMappingProviderError> {
        self.backend_driver
            .get_by_local_id(state, idp_id, local_id, entity_type)
            .await
    }

    /// Get the `IdMapping` by the public_id.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_by_public_id<'a>(
        &self,
        state: &ServiceState,
        public_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<Option<IdMapping>, IdentityMappingProviderError> {
        self.backend_driver
            .get_by_public_id(state, public_id, entity_type)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_or_create_public_id<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        local_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<String, IdentityMappingProviderError> {
        if let Some(existing) = self
            .backend_driver
            .get_by_local_id(state, idp_id, local_id, entity_type)
            .await?
        {
            return Ok(existing.public_id);
        }
        let mapping = IdMappingBuilder::default()
            .idp_id(idp_id)
            .local_id(local_id)
            .entity_type(entity_type)
            .public_id(Uuid::new_v4().simple().to_string())
            .build()?;
        mapping.validate()?;
        match self.backend_driver.create(state, mapping).await {
            Ok(created) => Ok(created.public_id),
            // Lost the race against a concurrent writer: use its ID.
            Err(IdentityMappingProviderError::Conflict(msg)) => self
                .backend_driver
                .get_by_local_id(state, idp_id, local_id, entity_type)
                .await?
                .map(|x| x.public_id)
                .ok_or(IdentityMappingProviderError::Conflict(msg)),
            Err(other) => Err(other),
        }
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_by_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        entity_type: Option<IdMappingEntityType>,
    ) -> Result<Vec<IdMapping>, IdentityMappingProviderError> {
        self.backend_driver
            .list_by_idp(state, idp_id, entity_type)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_by_public_id<'a>(
        &self,
        state: &ServiceState,
        public_id: &'a str,
        entity_type: IdMappingEntityType,
    ) -> Result<(), IdentityMappingProviderError> {
        self.backend_driver
            .delete_by_public_id(state, public_id, entity_type)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_by_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<u64, IdentityMappingProviderError> {
        self.backend_driver.delete_by_idp(state, idp_id).await
    }
}
