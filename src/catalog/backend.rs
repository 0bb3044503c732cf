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
//! Catalog backend drivers.
use async_trait::async_trait;

use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::keystone::ServiceState;

pub mod sql;

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Enabled endpoints of the enabled services joined with the regions.
    async fn list_catalog_entries(
        &self,
        state: &ServiceState,
    ) -> Result<Vec<CatalogEntry>, CatalogProviderError>;

    async fn create_region(
        &self,
        state: &ServiceState,
        region: Region,
    ) -> Result<Region, CatalogProviderError>;

    async fn create_service(
        &self,
        state: &ServiceState,
        service: Service,
    ) -> Result<Service, CatalogProviderError>;

    async fn create_endpoint(
        &self,
        state: &ServiceState,
        endpoint: Endpoint,
    ) -> Result<Endpoint, CatalogProviderError>;

    async fn get_service_by_type<'a>(
        &self,
        state: &ServiceState,
        r#type: &'a str,
    ) -> Result<Option<Service>, CatalogProviderError>;
}
