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

use crate::keystone::ServiceState;
use crate::policy::PolicyProviderError;
use crate::policy::types::*;

#[async_trait]
pub trait PolicyApi: Send + Sync + Clone {
    /// Policies applying to the request grouped by their scope.
    async fn get_policy_group(
        &self,
        state: &ServiceState,
        request: &PolicyRequest,
    ) -> Result<PolicyGroup, PolicyProviderError>;

    async fn create_policy(
        &self,
        state: &ServiceState,
        policy: Policy,
    ) -> Result<Policy, PolicyProviderError>;

    async fn find_policy_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
    ) -> Result<Option<Policy>, PolicyProviderError>;

    /// Create or replace the binding identified by the role, the project and
    /// the policy.
    async fn set_role_policy(
        &self,
        state: &ServiceState,
        binding: RolePolicy,
    ) -> Result<RolePolicy, PolicyProviderError>;
}
