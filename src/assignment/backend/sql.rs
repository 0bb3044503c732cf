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

use super::AssignmentBackend;
use crate::assignment::error::AssignmentProviderError;
use crate::assignment::types::*;
use crate::keystone::ServiceState;

mod assignment;
mod role;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl AssignmentBackend for SqlBackend {
    /// Get single role by ID
    async fn get_role<'a>(
        &self,
        state: &ServiceState,
        role_id: &'a str,
    ) -> Result<Option<Role>, AssignmentProviderError> {
        role::get(&state.db, role_id).await
    }

    async fn get_role_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
        domain_id: Option<&'a str>,
    ) -> Result<Option<Role>, AssignmentProviderError> {
        role::get_by_name(&state.db, name, domain_id).await
    }

    /// Fetch roles from the database
    async fn list_roles(
        &self,
        state: &ServiceState,
        params: &RoleListParameters,
    ) -> Result<Vec<Role>, AssignmentProviderError> {
        role::list(&state.db, params).await
    }

    async fn create_role(
        &self,
        state: &ServiceState,
        role: RoleCreate,
    ) -> Result<Role, AssignmentProviderError> {
        role::create(&state.db, role).await
    }

    /// Fetch role assignments from the database
    async fn list_assignments(
        &self,
        state: &ServiceState,
        params: &RoleAssignmentListForMultipleActorTargetParameters,
    ) -> Result<Vec<Assignment>, AssignmentProviderError> {
        assignment::list(&state.db, params).await
    }

    async fn create_grant(
        &self,
        state: &ServiceState,
        grant: Assignment,
    ) -> Result<Assignment, AssignmentProviderError> {
        assignment::create(&state.db, grant).await
    }

    async fn revoke_grant(
        &self,
        state: &ServiceState,
        grant: Assignment,
    ) -> Result<(), AssignmentProviderError> {
        assignment::revoke(&state.db, grant).await
    }
}
