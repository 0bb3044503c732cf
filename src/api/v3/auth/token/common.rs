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
//! Common functionality of the v3 token handlers.
use crate::api::authenticate::{
    AccessKeyRequest, PasswordCredentials, authenticate_aksk, authenticate_password,
    authenticate_sso, authenticate_token,
};
use crate::api::types::{Catalog, Domain, Policies, Project, Scope, ScopeProject};
use crate::api::v3::auth::token::types::{AuthRequest, Role, Token, TokenBuilder, User};
use crate::api::KeystoneApiError;
use crate::auth::{AuthenticatedInfo, AuthenticationError};
use crate::catalog::CatalogApi;
use crate::idp::driver::AuthIdentity;
use crate::keystone::ServiceState;
use crate::resource::ResourceApi;
use crate::token::{AuthMethod, Token as ProviderToken, TokenApi, TokenContext};

/// Domain of the id as the API object.
async fn api_domain(state: &ServiceState, domain_id: &str) -> Result<Domain, KeystoneApiError> {
    Ok(state
        .provider
        .get_resource_provider()
        .get_domain(state, domain_id)
        .await?
        .map(Domain::from)
        .unwrap_or_else(|| Domain {
            id: Some(domain_id.to_string()),
            name: None,
        }))
}

impl Token {
    /// Render the expanded provider token.
    ///
    /// The catalog is only attached to scoped tokens.
    pub(crate) async fn from_provider_token(
        state: &ServiceState,
        token: &ProviderToken,
        with_catalog: bool,
    ) -> Result<Self, KeystoneApiError> {
        let mut res = TokenBuilder::default();
        res.methods(vec![token.method().to_string()]);
        res.audit_ids(token.audit_ids().clone());
        res.expires_at(*token.expires_at());
        res.issued_at(*token.issued_at());

        let user = token.user().as_ref().ok_or_else(|| {
            KeystoneApiError::InternalError(format!(
                "token of the user {} is not expanded",
                token.user_id()
            ))
        })?;
        res.user(User {
            id: user.id.clone(),
            name: Some(user.name.clone()),
            domain: api_domain(state, &user.domain_id).await?,
        });

        if let Some(project) = token.project() {
            res.project(Project {
                id: project.id.clone(),
                name: project.name.clone(),
                domain: api_domain(state, &project.domain_id).await?,
            });
        }
        if let Some(domain) = token.domain() {
            res.domain(Domain::from(domain));
        }
        if let Some(roles) = token.roles() {
            res.roles(roles.iter().map(Role::from).collect::<Vec<_>>());
        }
        if with_catalog && token.is_scoped() {
            let catalog = state
                .provider
                .get_catalog_provider()
                .get_catalog(state)
                .await?;
            res.catalog(Catalog::from(catalog.v3()));
        }
        let policies = state
            .provider
            .get_token_provider()
            .get_token_policies(state, token)
            .await?;
        res.policies(Policies::from(&policies));
        res.build()
            .map_err(|err| KeystoneApiError::InternalError(err.to_string()))
    }
}

/// Authenticate the identity of the v3 request.
///
/// Returns the scope the token is requested for as well. The access key
/// method replaces the requested scope with the project of the key.
pub(crate) async fn authenticate_request(
    state: &ServiceState,
    req: &AuthRequest,
    context: TokenContext,
) -> Result<(AuthenticatedInfo, Option<Scope>), KeystoneApiError> {
    let identity = &req.auth.identity;
    let [method] = identity.methods.as_slice() else {
        return Err(AuthenticationError::InvalidAuthMethod(identity.methods.join(",")).into());
    };
    let method = AuthMethod::try_from(method.as_str())
        .map_err(AuthenticationError::InvalidAuthMethod)?;
    let missing = || AuthenticationError::InvalidAuthMethod(format!("{method} data missing"));
    let authn = match method {
        AuthMethod::Password => {
            let password = identity.password.clone().ok_or_else(missing)?;
            authenticate_password(state, &PasswordCredentials::from(password.user), context).await
        }
        AuthMethod::Token => {
            let token = identity.token.as_ref().ok_or_else(missing)?;
            authenticate_token(state, &token.id, context).await
        }
        AuthMethod::Saml => {
            let saml = identity.saml.as_ref().ok_or_else(missing)?;
            let sso = AuthIdentity::Saml {
                response: saml.response.clone(),
            };
            authenticate_sso(state, method, Some(&saml.id), &sso, context).await
        }
        AuthMethod::Oidc | AuthMethod::Oauth2 => {
            let auth = if method == AuthMethod::Oidc {
                identity.oidc.as_ref()
            } else {
                identity.oauth2.as_ref()
            }
            .ok_or_else(missing)?;
            let sso = if method == AuthMethod::Oidc {
                AuthIdentity::Oidc {
                    code: auth.code.clone(),
                    redirect_uri: auth.redirect_uri.clone(),
                }
            } else {
                AuthIdentity::OAuth2 {
                    code: auth.code.clone(),
                    redirect_uri: auth.redirect_uri.clone(),
                }
            };
            authenticate_sso(state, method, Some(&auth.id), &sso, context).await
        }
        AuthMethod::Cas => {
            let cas = identity.cas.as_ref().ok_or_else(missing)?;
            let sso = AuthIdentity::Cas {
                ticket: cas.ticket.clone(),
                service: cas.service.clone(),
            };
            authenticate_sso(state, method, cas.id.as_deref(), &sso, context).await
        }
        AuthMethod::Aksk => {
            let aksk = identity.aksk.as_ref().ok_or_else(missing)?;
            let (authn, project_id) =
                authenticate_aksk(state, &AccessKeyRequest::from(aksk), context).await?;
            if let Some(id) = project_id {
                let scope = Scope::Project(ScopeProject {
                    id: Some(id),
                    ..Default::default()
                });
                return Ok((authn, Some(scope)));
            }
            Ok(authn)
        }
    }?;
    Ok((authn, req.auth.scope.clone()))
}
