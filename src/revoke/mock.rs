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
use mockall::mock;

use crate::config::Config;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;
use crate::revoke::RevokeProviderError;
use crate::revoke::types::*;

mock! {
    pub RevokeProvider {
        pub fn new(cfg: &Config, plugin_manager: &PluginManager) -> Result<Self, RevokeProviderError>;
    }

    #[async_trait]
    impl RevokeApi for RevokeProvider {
        async fn record_token(
            &self,
            state: &ServiceState,
            record: &TokenRecord,
        ) -> Result<(), RevokeProviderError>;

        async fn revoke_token(
            &self,
            state: &ServiceState,
            record: &TokenRecord,
        ) -> Result<Vec<String>, RevokeProviderError>;

        async fn is_token_revoked<'a>(
            &self,
            state: &ServiceState,
            token: &'a str,
        ) -> Result<bool, RevokeProviderError>;

        async fn cleanup(&self, state: &ServiceState) -> Result<u64, RevokeProviderError>;
    }

    impl Clone for RevokeProvider {
        fn clone(&self) -> Self;
    }
}
