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
use mockall::mock;

use crate::catalog::CatalogProviderError;
use crate::catalog::types::*;
use crate::config::Config;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

mock! {
    pub CatalogProvider {
        pub fn new(cfg: &Config, plugin_manager: &PluginManager) -> Result<Self, CatalogProviderError>;
    }

    #[async_trait]
    impl CatalogApi for CatalogProvider {
        async fn get_catalog(&self, state: &ServiceState) -> Result<Catalog, CatalogProviderError>;

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

        async fn find_service_by_type<'a>(
            &self,
            state: &ServiceState,
            r#type: &'a str,
        ) -> Result<Option<Service>, CatalogProviderError>;
    }

    impl Clone for CatalogProvider {
        fn clone(&self) -> Self;
    }
}
