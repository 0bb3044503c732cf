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

use super::PolicyBackend;
use crate::keystone::ServiceState;
use crate::policy::PolicyProviderError;
use crate::policy::types::*;

mod policy;
mod role_policy;

#[derive(Clone, Debug, Default)]
pub struct SqlBackend {}

#[async_trait]
impl PolicyBackend for SqlBackend {
    async fn list_role_policies(
        &self,
        state: &ServiceState,
        request: &PolicyRequest,
    ) -> Result<Vec<RolePolicy>, PolicyProviderError> {
        role_policy::list(&state.db, request).await
    }

    async fn list_policies_by_ids(
        &self,
        state: &ServiceState,
        ids: &[String],
    ) -> Result<Vec<Policy>, PolicyProviderError> {
        policy::list_by_ids(&state.db, ids).await
    }

    async fn get_policy_by_name<'a>(
        &self,
        state: &ServiceState,
        name: &'a str,
    ) -> Result<Option<Policy>, PolicyProviderError> {
        policy::get_by_name(&state.db, name).await
    }

    async fn get_policy<'a>(
        &self,
        state: &ServiceState,
        id: &'a str,
    ) -> Result<Option<Policy>, PolicyProviderError> {
        policy::get(&state.db, id).await
    }

    async fn create_policy(
        &self,
        state: &ServiceState,
        policy: Policy,
    ) -> Result<Policy, PolicyProviderError> {
        policy::create(&state.db, policy).await
    }

    async fn upsert_role_policy(
        &self,
        state: &ServiceState,
        binding: RolePolicy,
    ) -> Result<RolePolicy, PolicyProviderError> {
        role_policy::upsert(&state.db, binding).await
    }
}
