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
//! # Policy provider
//!
//! Policies are rule documents bound to roles through role policy bindings.
//! The bindings matching the roles, the project and the source address of an
//! authenticated request select the policies, which are then grouped by the
//! scope they apply at.
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

pub mod backend;
pub mod engine;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;
use crate::policy::backend::{PolicyBackend, sql::SqlBackend};
use crate::policy::types::*;

pub use error::PolicyProviderError;
#[cfg(test)]
pub use mock::MockPolicyProvider;
pub use types::PolicyApi;

#[derive(Clone)]
pub struct PolicyProvider {
    backend_driver: Arc<dyn PolicyBackend>,
}

impl PolicyProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, PolicyProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_policy_backend(config.policy.driver.clone())
        {
            driver.clone()
        } else {
            match config.policy.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                _ => {
                    return Err(PolicyProviderError::UnsupportedDriver(
                        config.policy.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl PolicyApi for PolicyProvider {
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_policy_group(
        &self,
        state: &ServiceState,
        request: &PolicyRequest,
    ) -> Result<PolicyGroup, PolicyProviderError> {
        let bindings = self
            .backend_driver
            .list_role_policies(state, request)
            .await?;
        let policy_ids = engine::match_bindings(&bindings, request, &Utc::now());
        Ok(engine::group_policies(
            self.backend_driver
                .list_policies_by_ids(state, &policy_ids)
                .await?,
        ))
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_policy(
        &self,
        state: &ServiceState,
        policy: Policy,
    ) -> Result<Policy, PolicyProviderError> {
        policy.validate()?;
        self.backend_driver.create_policy(state, policy).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_policy_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
    ) -> Result<Option<Policy>, PolicyProviderError> {
        self.backend_driver.get_policy_by_name(state, name).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn set_role_policy(
        &self,
        state: &ServiceState,
        binding: RolePolicy,
    ) -> Result<RolePolicy, PolicyProviderError> {
        if self
            .backend_driver
            .get_policy(state, &binding.policy_id)
            .await?
            .is_none()
        {
            return Err(PolicyProviderError::PolicyNotFound(binding.policy_id));
        }
        self.backend_driver.upsert_role_policy(state, binding).await
    }
}
