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
//! Token provider types.

use async_trait::async_trait;

use crate::auth::{AuthenticatedInfo, AuthzInfo};
use crate::keystone::ServiceState;
use crate::policy::types::PolicyGroup;
use crate::token::TokenProviderError;

use super::*;

/// Token Provider interface.
#[async_trait]
pub trait TokenApi: Send + Sync + Clone {
    /// Issue a token for given parameters.
    ///
    /// The scoped tokens get the effective roles of the user resolved. The
    /// issued token is recorded in the token cache so that revoking its
    /// parent cascades to it.
    async fn issue_token(
        &self,
        state: &ServiceState,
        authentication_info: AuthenticatedInfo,
        authz_info: AuthzInfo,
    ) -> Result<IssuedToken, TokenProviderError>;

    /// Validate the token.
    ///
    /// Decode the token, reject revoked ones and populate the current user,
    /// scope and roles information. Successful results are cached in memory.
    async fn validate_token<'a>(
        &self,
        state: &ServiceState,
        credential: &'a str,
    ) -> Result<Token, TokenProviderError>;

    /// Encode the token into the X-Subject-Token String
    fn encode_token(&self, state: &ServiceState, token: &Token) -> Result<String, TokenProviderError>;

    /// Populate additional information (user, project, domain, roles) in the
    /// token.
    async fn expand_token_information(
        &self,
        state: &ServiceState,
        token: &Token,
    ) -> Result<Token, TokenProviderError>;

    /// Policies activated by the roles, project and source address of the
    /// token.
    async fn get_token_policies(
        &self,
        state: &ServiceState,
        token: &Token,
    ) -> Result<PolicyGroup, TokenProviderError>;

    /// Revoke the token and every token minted from it.
    async fn revoke_token<'a>(
        &self,
        state: &ServiceState,
        credential: &'a str,
        token: &Token,
    ) -> Result<Vec<String>, TokenProviderError>;
}
