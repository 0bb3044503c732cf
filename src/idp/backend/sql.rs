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
use chrono::{DateTime, Utc};

use super::IdpBackend;
use crate::idp::IdpProviderError;
use crate::idp::types::*;
use crate::keystone::ServiceState;

mod config;
mod identity_provider;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl IdpBackend for SqlBackend {
    async fn get<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError> {
        identity_provider::get(&state.db, idp_id).await
    }

    async fn list(&self, state: &ServiceState) -> Result<Vec<IdentityProvider>, IdpProviderError> {
        identity_provider::list(&state.db).await
    }

    async fn create(
        &self,
        state: &ServiceState,
        idp: IdentityProvider,
    ) -> Result<IdentityProvider, IdpProviderError> {
        identity_provider::create(&state.db, idp).await
    }

    async fn delete<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<(), IdpProviderError> {
        config::delete(&state.db, idp_id).await?;
        identity_provider::delete(&state.db, idp_id).await
    }

    async fn find_by_target_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError> {
        identity_provider::find_by_target_domain(&state.db, domain_id).await
    }

    async fn transition_sync_status<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        from: SyncStatus,
        to: SyncStatus,
        stuck_before: Option<DateTime<Utc>>,
    ) -> Result<bool, IdpProviderError> {
        identity_provider::transition_sync_status(&state.db, idp_id, from, to, stuck_before).await
    }

    async fn set_health<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        health: IdpHealth,
    ) -> Result<(), IdpProviderError> {
        identity_provider::set_health(&state.db, idp_id, health).await
    }

    async fn get_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<(IdpConfig, IdpConfig), IdpProviderError> {
        config::get(&state.db, idp_id).await
    }

    async fn set_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        whitelisted: &IdpConfig,
        sensitive: &IdpConfig,
    ) -> Result<(), IdpProviderError> {
        config::set(&state.db, idp_id, whitelisted, sensitive).await
    }
}
