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
use crate::api::KeystoneApiError;
use crate::api::types::{CatalogServiceV2, Policies};
use crate::api::v2::token::types::{Access, Metadata, Role, Tenant, Token, User};
use crate::catalog::CatalogApi;
use crate::keystone::ServiceState;
use crate::token::{Token as ProviderToken, TokenApi};

impl Access {
    /// Render the expanded provider token in the v2.0 form.
    pub(crate) async fn from_provider_token(
        state: &ServiceState,
        token: &ProviderToken,
        credential: &str,
    ) -> Result<Self, KeystoneApiError> {
        let user = token.user().as_ref().ok_or_else(|| {
            KeystoneApiError::InternalError(format!(
                "token of the user {} is not expanded",
                token.user_id()
            ))
        })?;
        let roles = token.roles().cloned().unwrap_or_default();

        let service_catalog = if token.is_scoped() {
            state
                .provider
                .get_catalog_provider()
                .get_catalog(state)
                .await?
                .v2()
                .into_iter()
                .map(CatalogServiceV2::from)
                .collect()
        } else {
            Vec::new()
        };
        let policies = state
            .provider
            .get_token_provider()
            .get_token_policies(state, token)
            .await?;

        Ok(Self {
            token: Token {
                id: credential.to_string(),
                issued_at: *token.issued_at(),
                expires: *token.expires_at(),
                audit_ids: token.audit_ids().clone(),
                tenant: token.project().map(Tenant::from),
            },
            service_catalog,
            user: User {
                id: user.id.clone(),
                name: user.name.clone(),
                username: user.name.clone(),
                roles: roles
                    .iter()
                    .map(|role| Role {
                        name: role.name.clone(),
                    })
                    .collect(),
                roles_links: Vec::new(),
            },
            metadata: Metadata {
                is_admin: 0,
                roles: roles.into_iter().map(|role| role.id).collect(),
            },
            policies: Policies::from(&policies),
        })
    }
}
