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
use std::sync::Arc;

use crate::idp::IdpProviderError;
use crate::idp::driver::IdentityDriver;
use crate::idp::types::*;
use crate::keystone::ServiceState;

#[async_trait]
pub trait IdpApi: Send + Sync + Clone {
    async fn get_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError>;

    async fn list_idps(
        &self,
        state: &ServiceState,
    ) -> Result<Vec<IdentityProvider>, IdpProviderError>;

    /// Register the identity provider.
    async fn create_idp(
        &self,
        state: &ServiceState,
        idp: IdentityProviderCreate,
    ) -> Result<IdentityProvider, IdpProviderError>;

    /// Remove the identity provider together with its options and id
    /// mappings.
    async fn delete_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<(), IdpProviderError>;

    /// Identity provider owning the domain, if any.
    async fn find_idp_for_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError>;

    /// Merged and decrypted options of the identity provider.
    async fn get_idp_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<IdpConfig, IdpProviderError>;

    /// Replace the options of the identity provider. Sensitive options are
    /// stored encrypted.
    async fn set_idp_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        config: &IdpConfig,
    ) -> Result<(), IdpProviderError>;

    /// Move the sync status `from` → `to`. Returns `false` when the
    /// identity provider is not in the expected state.
    async fn transition_sync_status<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        from: SyncStatus,
        to: SyncStatus,
    ) -> Result<bool, IdpProviderError>;

    /// Record the reachability of the identity provider.
    async fn set_health<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        health: IdpHealth,
    ) -> Result<(), IdpProviderError>;

    /// Driver instance serving the identity provider, built from its merged
    /// options.
    async fn get_driver(
        &self,
        state: &ServiceState,
        idp: &IdentityProvider,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError>;
}
