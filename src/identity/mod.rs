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
//! # Identity provider
//!
//! Following identity concepts are covered by the identity provider:
//!
//! ## Group
//!
//! Groups are a collection of users owned by a domain. A group role, granted
//! to a domain or project, applies to all users in the group.
//!
//! ## User
//!
//! A digital representation of a person, system, or service. A user is either
//! local, with a password history verified by this service, or non-local and
//! linked to an external identity provider through the identity mapping.
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use validator::Validate;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod password_hashing;
pub mod types;

use crate::config::Config;
use crate::identity::backend::{IdentityBackend, sql::SqlBackend};
use crate::identity::types::*;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

#[cfg(test)]
pub use mock::MockIdentityProvider;
pub use error::IdentityProviderError;
pub use types::IdentityApi;

#[derive(Clone)]
pub struct IdentityProvider {
    backend_driver: Arc<dyn IdentityBackend>,
}

impl IdentityProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, IdentityProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_identity_backend(config.identity.driver.clone())
        {
            driver.clone()
        } else {
            match config.identity.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                _ => {
                    return Err(IdentityProviderError::UnsupportedDriver(
                        config.identity.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

#[async_trait]
impl IdentityApi for IdentityProvider {
    /// Authenticate user with the password auth method
    #[tracing::instrument(level = "info", skip(self, state, auth))]
    async fn authenticate_by_password(
        &self,
        state: &ServiceState,
        auth: &UserPasswordAuthRequest,
    ) -> Result<UserResponse, IdentityProviderError> {
        if auth.id.is_none() && (auth.name.is_none() || auth.domain_id.is_none()) {
            return Err(IdentityProviderError::UserIdOrNameWithDomain);
        }
        self.backend_driver
            .authenticate_by_password(state, auth)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn record_login<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        context: &LoginContext,
    ) -> Result<(), IdentityProviderError> {
        self.backend_driver
            .record_login(state, user_id, context)
            .await
    }

    /// Get single user
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<Option<UserResponse>, IdentityProviderError> {
        self.backend_driver.get_user(state, user_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_user_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<UserResponse>, IdentityProviderError> {
        self.backend_driver
            .find_user_by_name(state, name, domain_id)
            .await
    }

    /// List users
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_users(
        &self,
        state: &ServiceState,
        params: &UserListParameters,
    ) -> Result<Vec<UserResponse>, IdentityProviderError> {
        self.backend_driver.list_users(state, params).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn is_local_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<bool, IdentityProviderError> {
        self.backend_driver.is_local_user(state, user_id).await
    }

    /// Create user
    #[tracing::instrument(level = "info", skip(self, state, user))]
    async fn create_user(
        &self,
        state: &ServiceState,
        user: UserCreate,
    ) -> Result<UserResponse, IdentityProviderError> {
        user.validate()?;
        self.backend_driver.create_user(state, user).await
    }

    #[tracing::instrument(level = "info", skip(self, state, user))]
    async fn update_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        user: UserUpdate,
    ) -> Result<UserResponse, IdentityProviderError> {
        user.validate()?;
        self.backend_driver.update_user(state, user_id, user).await
    }

    /// Delete user
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<(), IdentityProviderError> {
        self.backend_driver.delete_user(state, user_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_group<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<Option<Group>, IdentityProviderError> {
        self.backend_driver.get_group(state, group_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_group_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<Group>, IdentityProviderError> {
        self.backend_driver
            .find_group_by_name(state, name, domain_id)
            .await
    }

    /// List groups
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_groups(
        &self,
        state: &ServiceState,
        params: &GroupListParameters,
    ) -> Result<Vec<Group>, IdentityProviderError> {
        self.backend_driver.list_groups(state, params).await
    }

    /// Create group
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_group(
        &self,
        state: &ServiceState,
        group: GroupCreate,
    ) -> Result<Group, IdentityProviderError> {
        self.backend_driver.create_group(state, group).await
    }

    /// Delete group
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_group<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<(), IdentityProviderError> {
        self.backend_driver.delete_group(state, group_id).await
    }

    /// List groups a user is member of
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_groups_of_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<Vec<Group>, IdentityProviderError> {
        self.backend_driver.list_groups_of_user(state, user_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_group_members<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<Vec<String>, IdentityProviderError> {
        self.backend_driver.list_group_members(state, group_id).await
    }

    /// Add the user to the single group
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn add_user_to_group<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        group_id: &'a str,
    ) -> Result<(), IdentityProviderError> {
        self.backend_driver
            .add_user_to_group(state, user_id, group_id)
            .await
    }

    /// Set group members
    #[tracing::instrument(level = "info", skip(self, state, user_ids))]
    async fn set_group_members<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
        user_ids: &'a HashSet<String>,
    ) -> Result<(), IdentityProviderError> {
        self.backend_driver
            .set_group_members(state, group_id, user_ids)
            .await
    }
}
