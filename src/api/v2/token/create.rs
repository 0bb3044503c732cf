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
//! Create token (v2.0 authenticate).
//!
//! The token credentials win over the password credentials when both are
//! present. The tenant is resolved in the default domain.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use validator::Validate;

use crate::api::KeystoneApiError;
use crate::api::authenticate::{
    PasswordCredentials, authenticate_password, authenticate_token, resolve_scope,
};
use crate::api::common::request_context;
use crate::api::types::{Domain, Scope, ScopeProject};
use crate::api::v2::token::types::{Access, AccessResponse, AuthRequest};
use crate::auth::AuthenticationError;
use crate::keystone::ServiceState;
use crate::resource::types::DEFAULT_DOMAIN_ID;
use crate::token::TokenApi;

/// Authenticate user issuing a new token.
#[utoipa::path(
    post,
    path = "/",
    description = "Issue token",
    request_body = AuthRequest,
    responses(
        (status = OK, description = "Access object", body = AccessResponse),
        (status = UNAUTHORIZED, description = "Authentication failed"),
    ),
    tag="v2"
)]
#[tracing::instrument(name = "api::v2::token::post", level = "debug", skip(state, headers, req))]
pub(super) async fn create(
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(req): Json<AuthRequest>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    req.validate()?;
    let auth = req.auth;
    let context = request_context(&headers, auth.context.clone());

    let authed_info = if let Some(token) = auth.token.as_ref().filter(|x| !x.id.is_empty()) {
        authenticate_token(&state, &token.id, context).await?
    } else if let Some(creds) = auth.password_credentials.clone() {
        authenticate_password(&state, &PasswordCredentials::from(creds), context).await?
    } else {
        return Err(AuthenticationError::EmptyAuth.into());
    };

    let scope = auth.has_tenant().then(|| {
        Scope::Project(ScopeProject {
            id: auth.tenant_id.clone().filter(|x| !x.is_empty()),
            name: auth.tenant_name.clone(),
            domain: Some(Domain {
                id: Some(DEFAULT_DOMAIN_ID.into()),
                name: None,
            }),
        })
    });
    let authz_info = resolve_scope(&state, scope.as_ref()).await?;

    let issued = state
        .provider
        .get_token_provider()
        .issue_token(&state, authed_info, authz_info)
        .await?;

    Ok(AccessResponse {
        access: Access::from_provider_token(&state, &issued.token, &issued.credential).await?,
    })
}
