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
//! Identity provider backend drivers.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::idp::IdpProviderError;
use crate::idp::types::*;
use crate::keystone::ServiceState;

pub mod sql;

/// Identity provider storage interface.
#[async_trait]
pub trait IdpBackend: Send + Sync {
    async fn get<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError>;

    async fn list(&self, state: &ServiceState) -> Result<Vec<IdentityProvider>, IdpProviderError>;

    async fn create(
        &self,
        state: &ServiceState,
        idp: IdentityProvider,
    ) -> Result<IdentityProvider, IdpProviderError>;

    /// Delete the identity provider and its options.
    async fn delete<'a>(&self, state: &ServiceState, idp_id: &'a str)
    -> Result<(), IdpProviderError>;

    async fn find_by_target_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError>;

    /// Conditionally update the sync status. With `stuck_before` set a row
    /// whose status did not change since that moment matches as well.
    async fn transition_sync_status<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        from: SyncStatus,
        to: SyncStatus,
        stuck_before: Option<DateTime<Utc>>,
    ) -> Result<bool, IdpProviderError>;

    async fn set_health<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        health: IdpHealth,
    ) -> Result<(), IdpProviderError>;

    /// Whitelisted options and the sensitive options in their encrypted form.
    async fn get_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<(IdpConfig, IdpConfig), IdpProviderError>;

    /// Replace all options of the identity provider.
    async fn set_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        whitelisted: &IdpConfig,
        sensitive: &IdpConfig,
    ) -> Result<(), IdpProviderError>;
}
