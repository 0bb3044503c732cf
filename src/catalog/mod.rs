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
//! # Catalog provider
//!
//! Services, their endpoints and the regions the endpoints live in. The
//! catalog document is rebuilt from the tables on every request.
use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::catalog::backend::{CatalogBackend, sql::SqlBackend};
use crate::catalog::types::*;
use crate::config::Config;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

pub use error::CatalogProviderError;
#[cfg(test)]
pub use mock::MockCatalogProvider;
pub use types::CatalogApi;

#[derive(Clone)]
pub struct CatalogProvider {
    backend_driver: Arc<dyn CatalogBackend>,
}

impl CatalogProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, CatalogProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_catalog_backend(config.catalog.driver.clone())
        {
            driver.clone()
        } else {
            match config.catalog.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                _ => {
                    return Err(CatalogProviderError::UnsupportedDriver(
                        config.catalog.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl CatalogApi for CatalogProvider {
    /// Get catalog
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_catalog(&self, state: &ServiceState) -> Result<Catalog, CatalogProviderError> {
        Ok(Catalog::new(
            self.backend_driver.list_catalog_entries(state).await?,
        ))
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_region(
        &self,
        state: &ServiceState,
        region: Region,
    ) -> Result<Region, CatalogProviderError> {
        self.backend_driver.create_region(state, region).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_service(
        &self,
        state: &ServiceState,
        service: Service,
    ) -> Result<Service, CatalogProviderError> {
        service.validate()?;
        self.backend_driver.create_service(state, service).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_endpoint(
        &self,
        state: &ServiceState,
        endpoint: Endpoint,
    ) -> Result<Endpoint, CatalogProviderError> {
        endpoint.validate()?;
        self.backend_driver.create_endpoint(state, endpoint).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_service_by_type<'a>(
        &self,
        state: &ServiceState,
        r#type: &'a str,
    ) -> Result<Option<Service>, CatalogProviderError> {
        self.backend_driver.get_service_by_type(state, r#type).await
    }
}
