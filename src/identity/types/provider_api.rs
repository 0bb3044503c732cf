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
use std::collections::HashSet;

use crate::identity::error::IdentityProviderError;
use crate::identity::types::*;
use crate::keystone::ServiceState;

#[async_trait]
pub trait IdentityApi: Send + Sync + Clone {
    /// Authenticate the local user with the password.
    ///
    /// A failed attempt is counted against the lockout threshold.
    async fn authenticate_by_password(
        &self,
        state: &ServiceState,
        auth: &UserPasswordAuthRequest,
    ) -> Result<UserResponse, IdentityProviderError>;

    /// Record the successful login of the user.
    async fn record_login<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        context: &LoginContext,
    ) -> Result<(), IdentityProviderError>;

    /// Get single user.
    async fn get_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<Option<UserResponse>, IdentityProviderError>;

    /// Find users with the name in the domain.
    async fn find_user_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<UserResponse>, IdentityProviderError>;

    /// List users.
    async fn list_users(
        &self,
        state: &ServiceState,
        params: &UserListParameters,
    ) -> Result<Vec<UserResponse>, IdentityProviderError>;

    /// Whether the user has a local password record.
    async fn is_local_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<bool, IdentityProviderError>;

    /// Create user.
    async fn create_user(
        &self,
        state: &ServiceState,
        user: UserCreate,
    ) -> Result<UserResponse, IdentityProviderError>;

    /// Update user.
    async fn update_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        user: UserUpdate,
    ) -> Result<UserResponse, IdentityProviderError>;

    /// Delete user.
    async fn delete_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<(), IdentityProviderError>;

    /// Get single group.
    async fn get_group<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<Option<Group>, IdentityProviderError>;

    /// Find the group by the name in the domain.
    async fn find_group_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: &'a str,
    ) -> Result<Option<Group>, IdentityProviderError>;

    /// List groups.
    async fn list_groups(
        &self,
        state: &ServiceState,
        params: &GroupListParameters,
    ) -> Result<Vec<Group>, IdentityProviderError>;

    /// Create group.
    async fn create_group(
        &self,
        state: &ServiceState,
        group: GroupCreate,
    ) -> Result<Group, IdentityProviderError>;

    /// Delete group.
    async fn delete_group<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<(), IdentityProviderError>;

    /// List groups the user is member of.
    async fn list_groups_of_user<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
    ) -> Result<Vec<Group>, IdentityProviderError>;

    /// List IDs of the group members.
    async fn list_group_members<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
    ) -> Result<Vec<String>, IdentityProviderError>;

    /// Add the user to the group.
    async fn add_user_to_group<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        group_id: &'a str,
    ) -> Result<(), IdentityProviderError>;

    /// Replace the group members.
    async fn set_group_members<'a>(
        &self,
        state: &ServiceState,
        group_id: &'a str,
        user_ids: &'a HashSet<String>,
    ) -> Result<(), IdentityProviderError>;
}
