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
//! Assignment backend drivers.
use async_trait::async_trait;

use crate::assignment::error::AssignmentProviderError;
use crate::assignment::types::*;
use crate::keystone::ServiceState;

pub mod sql;

#[async_trait]
pub trait AssignmentBackend: Send + Sync {
    /// Get single role by ID.
    async fn get_role<'a>(
        &self,
        state: &ServiceState,
        role_id: &'a str,
    ) -> Result<Option<Role>, AssignmentProviderError>;

    /// Get single role by the name in the domain.
    async fn get_role_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: Option<&'a str>,
    ) -> Result<Option<Role>, AssignmentProviderError>;

    /// List roles.
    async fn list_roles(
        &self,
        state: &ServiceState,
        params: &RoleListParameters,
    ) -> Result<Vec<Role>, AssignmentProviderError>;

    /// Create role.
    async fn create_role(
        &self,
        state: &ServiceState,
        role: RoleCreate,
    ) -> Result<Role, AssignmentProviderError>;

    /// List the not revoked assignments.
    async fn list_assignments(
        &self,
        state: &ServiceState,
        params: &RoleAssignmentListForMultipleActorTargetParameters,
    ) -> Result<Vec<Assignment>, AssignmentProviderError>;

    /// Insert or reactivate the grant.
    async fn create_grant(
        &self,
        state: &ServiceState,
        grant: Assignment,
    ) -> Result<Assignment, AssignmentProviderError>;

    /// Mark the grant revoked.
    async fn revoke_grant(
        &self,
        state: &ServiceState,
        grant: Assignment,
    ) -> Result<(), AssignmentProviderError>;
}
