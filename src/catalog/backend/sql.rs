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

use super::CatalogBackend;
use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::keystone::ServiceState;

mod catalog;
mod endpoint;
mod region;
mod service;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl CatalogBackend for SqlBackend {
    async fn list_catalog_entries(
        &self,
        state: &ServiceState,
    ) -> Result<Vec<CatalogEntry>, CatalogProviderError> {
        catalog::list(&state.db).await
    }

    async fn create_region(
        &self,
        state: &ServiceState,
        region: Region,
    ) -> Result<Region, CatalogProviderError> {
        region::create(&state.db, region).await
    }

    async fn create_service(
        &self,
        state: &ServiceState,
        service: Service,
    ) -> Result<Service, CatalogProviderError> {
        service::create(&state.db, service).await
    }

    async fn create_endpoint(
        &self,
        state: &ServiceState,
        endpoint: Endpoint,
    ) -> Result<Endpoint, CatalogProviderError> {
        endpoint::create(&state.db, endpoint).await
    }

    async fn get_service_by_type<'a>(
        &self,
        state: &ServiceState,
        r#type: &'a str,
    ) -> Result<Option<Service>, CatalogProviderError> {
        service::get_by_type(&state.db, r#type).await
    }
}
