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
use std::sync::Arc;

use crate::config::Config;
use crate::idp::IdpProviderError;
use crate::idp::driver::IdentityDriver;
use crate::idp::types::*;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

mock! {
    pub IdpProvider {
        pub fn new(cfg: &Config, plugin_manager: &PluginManager) -> Result<Self, IdpProviderError>;
    }

    #[async_trait]
    impl IdpApi for IdpProvider {
        async fn get_idp<'a>(
            &self,
            state: &ServiceState,
            idp_id: &'a str,
        ) -> Result<Option<IdentityProvider>, IdpProviderError>;

        async fn list_idps(
            &self,
            state: &ServiceState,
        ) -> Result<Vec<IdentityProvider>, IdpProviderError>;

        async fn create_idp(
            &self,
            state: &ServiceState,
            idp: IdentityProviderCreate,
        ) -> Result<IdentityProvider, IdpProviderError>;

        async fn delete_idp<'a>(
            &self,
            state: &ServiceState,
            idp_id: &'a str,
        ) -> Result<(), IdpProviderError>;

        async fn find_idp_for_domain<'a>(
            &self,
            state: &ServiceState,
            domain_id: &'a str,
        ) -> Result<Option<IdentityProvider>, IdpProviderError>;

        async fn get_idp_config<'a>(
            &self,
            state: &ServiceState,
            idp_id: &'a str,
        ) -> Result<IdpConfig, IdpProviderError>;

        async fn set_idp_config<'a>(
            &self,
            state: &ServiceState,
            idp_id: &'a str,
            config: &IdpConfig,
        ) -> Result<(), IdpProviderError>;

        async fn transition_sync_status<'a>(
            &self,
            state: &ServiceState,
            idp_id: &'a str,
            from: SyncStatus,
            to: SyncStatus,
        ) -> Result<bool, IdpProviderError>;

        async fn set_health<'a>(
            &self,
            state: &ServiceState,
            idp_id: &'a str,
            health: IdpHealth,
        ) -> Result<(), IdpProviderError>;

        async fn get_driver(
            &self,
            state: &ServiceState,
            idp: &IdentityProvider,
        ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError>;
    }

    impl Clone for IdpProvider {
        fn clone(&self) -> Self;
    }
}
