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
//! Internal mock structures for the [TokenProvider].

use async_trait::async_trait;
use mockall::mock;

use super::error::TokenProviderError;
use crate::auth::{AuthenticatedInfo, AuthzInfo};
use crate::config::Config;
use crate::keystone::ServiceState;
use crate::policy::types::PolicyGroup;

use super::{IssuedToken, Token, TokenApi};

mock! {
    pub TokenProvider {
        pub fn new(cfg: &Config) -> Result<Self, TokenProviderError>;
    }

    #[async_trait]
    impl TokenApi for TokenProvider {
        async fn issue_token(
            &self,
            state: &ServiceState,
            authentication_info: AuthenticatedInfo,
            authz_info: AuthzInfo,
        ) -> Result<IssuedToken, TokenProviderError>;

        async fn validate_token<'a>(
            &self,
            state: &ServiceState,
            credential: &'a str,
        ) -> Result<Token, TokenProviderError>;

        fn encode_token(&self, state: &ServiceState, token: &Token) -> Result<String, TokenProviderError>;

        async fn expand_token_information(
            &self,
            state: &ServiceState,
            token: &Token,
        ) -> Result<Token, TokenProviderError>;

        async fn get_token_policies(
            &self,
            state: &ServiceState,
            token: &Token,
        ) -> Result<PolicyGroup, TokenProviderError>;

        async fn revoke_token<'a>(
            &self,
            state: &ServiceState,
            credential: &'a str,
            token: &Token,
        ) -> Result<Vec<String>, TokenProviderError>;
    }

    impl Clone for TokenProvider {
        fn clone(&self) -> Self;
    }
}
