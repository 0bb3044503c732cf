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
//! Identity sql backend.
use async_trait::async_trait;
use std::collections::HashSet;

use crate::identity::backend::IdentityBackend;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::*;
use crate::keystone::ServiceState;

mod authenticate;
mod group;
mod local_user;
mod password;
mod user;
mod user_group;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl IdentityBackend for SqlBackend {
    /// Authenticate a user by a password
    #[tracing::instrument(level = "info", skip(self, state, auth))]
    async fn authenticate_by_password(
        &self,
        state: &ServiceState,
        auth: &UserPasswordAuthRequest,
    ) -> Result<UserResponse, IdentityProviderError> {
        authenticate::authenticate_by_password(&state.config, &state.db, auth).await
    }

    async fn record_login<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        context: &LoginContext,
    ) -> Result<(), IdentityProviderError> {
        user::record_login(&state.db, user_id, context).await
    }

    /// Get single user by ID
    async fn get_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<Option<UserResponse>, IdentityProviderError> {
        user::get(&state.db, user_id).await
    }

    async fn find_user_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<UserResponse>, IdentityProviderError> {
        user::find_by_name(&state.db, name, domain_id).await
    }

    /// Fetch users from the database
    async fn list_users(
        &self,
        state: &ServiceState,
        params: &UserListParameters,
    ) -> Result<Vec<UserResponse>, IdentityProviderError> {
        user::list(&state.db, params).await
    }

    async fn is_local_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<bool, IdentityProviderError> {
        Ok(local_user::get_by_user_id(&state.db, user_id)
            .await?
            .is_some())
    }

    /// Create user
    async fn create_user(
        &self,
        state: &ServiceState,
        user: UserCreate,
    ) -> Result<UserResponse, IdentityProviderError> {
        user::create(&state.config, &state.db, user).await
    }

    async fn update_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        user: UserUpdate,
    ) -> Result<UserResponse, IdentityProviderError> {
        user::update(&state.config, &state.db, user_id, user).await
    }

    /// Delete user
    async fn delete_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<(), IdentityProviderError> {
        user::delete(&state.db, user_id).await
    }

    async fn get_group<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<Option<Group>, IdentityProviderError> {
        group::get(&state.db, group_id).await
    }

    async fn find_group_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<Group>, IdentityProviderError> {
        group::find_by_name(&state.db, name, domain_id).await
    }

    async fn list_groups(
        &self,
        state: &ServiceState,
        params: &GroupListParameters,
    ) -> Result<Vec<Group>, IdentityProviderError> {
        group::list(&state.db, params).await
    }

    async fn create_group(
        &self,
        state: &ServiceState,
        group: GroupCreate,
    ) -> Result<Group, IdentityProviderError> {
        group::create(&state.db, group).await
    }

    async fn delete_group<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<(), IdentityProviderError> {
        group::delete(&state.db, group_id).await
    }

    async fn list_groups_of_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<Vec<Group>, IdentityProviderError> {
        user_group::list_user_groups(&state.db, user_id).await
    }

    async fn list_group_members<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<Vec<String>, IdentityProviderError> {
        user_group::list_group_members(&state.db, group_id).await
    }

    async fn add_user_to_group<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        group_id: &'a str,
    ) -> Result<(), IdentityProviderError> {
        user_group::add(&state.db, user_id, group_id).await
    }

    async fn set_group_members<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
        user_ids: &'a HashSet<String>,
    ) -> Result<(), IdentityProviderError> {
        user_group::set_group_members(&state.db, group_id, user_ids).await
    }
}
