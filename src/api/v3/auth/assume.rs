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
//! Assume the identity of another user.
//!
//! The operator gets a token of the user without knowing the password. The
//! operator token must be allowed `identity:tokens:perform:assume` at a scope
//! covering the target user and the requested scope. The user id of the
//! operator is appended to the audit ids of the minted token.
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::authenticate::resolve_scope;
use crate::api::common::{
    SUBJECT_TOKEN_HEADER, enforce, get_domain, request_context, token_domain,
};
use crate::api::types::{Domain, Scope};
use crate::api::v3::auth::token::types::{
    CreateTokenParameters, Token as ApiResponseToken, TokenResponse,
};
use crate::api::{KeystoneApiError, auth::Auth};
use crate::auth::{AuthenticatedInfo, AuthenticationError, AuthzInfo};
use crate::identity::{IdentityApi, types::UserResponse};
use crate::keystone::ServiceState;
use crate::policy::types::PolicyScope;
use crate::resource::ResourceApi;
use crate::token::{AuthMethod, Token, TokenApi};

/// Assume request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AssumeRequest {
    #[validate(nested)]
    pub assume: Assume,
}

/// The user to act as and the scope of the minted token.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Assume {
    #[validate(nested)]
    pub user: AssumeUser,
    #[validate(nested)]
    pub scope: Option<Scope>,
}

/// The user identified by the id or by the name within the domain.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AssumeUser {
    #[validate(length(max = 64))]
    pub id: Option<String>,
    #[validate(length(max = 255))]
    pub name: Option<String>,
    #[validate(nested)]
    pub domain: Option<Domain>,
}

async fn find_user(
    state: &ServiceState,
    target: &AssumeUser,
) -> Result<UserResponse, KeystoneApiError> {
    let identity = state.provider.get_identity_provider();
    let not_found = |identifier: &str| KeystoneApiError::NotFound {
        resource: "user".into(),
        identifier: identifier.to_string(),
    };
    if let Some(id) = target.id.as_deref().filter(|x| !x.is_empty()) {
        identity
            .get_user(state, id)
            .await?
            .ok_or_else(|| not_found(id))
    } else if let (Some(name), Some(domain)) = (target.name.as_deref(), target.domain.as_ref()) {
        let domain = get_domain(state, domain.id.as_ref(), domain.name.as_ref()).await?;
        identity
            .find_user_by_name(state, name, &domain.id)
            .await?
            .ok_or_else(|| not_found(name))
    } else {
        Err(KeystoneApiError::BadRequest(
            "user id or name with the domain must be present".into(),
        ))
    }
}

/// Whether the scope the operation was granted at covers the target.
fn covers(granted: PolicyScope, operator: &Token, user: &UserResponse, authz: &AuthzInfo) -> bool {
    match granted {
        PolicyScope::System => true,
        PolicyScope::Domain => token_domain(operator)
            .filter(|_| operator.is_scoped())
            .is_some_and(|domain_id| {
                user.domain_id == domain_id
                    && match authz {
                        AuthzInfo::Project(project) => project.domain_id == domain_id,
                        AuthzInfo::Domain(domain) => domain.id == domain_id,
                        AuthzInfo::Unscoped => true,
                    }
            }),
        PolicyScope::Project => operator.project_id().is_some_and(|project_id| {
            matches!(authz, AuthzInfo::Project(project) if project.id == *project_id)
        }),
    }
}

/// Assume the identity of the user.
#[utoipa::path(
    post,
    path = "/assume",
    description = "Issue token of another user",
    params(CreateTokenParameters),
    request_body = AssumeRequest,
    responses(
        (status = CREATED, description = "Token object", body = TokenResponse),
        (status = FORBIDDEN, description = "The operator may not act as the user"),
    ),
    security(("x-auth" = [])),
    tag="auth"
)]
#[tracing::instrument(name = "api::v3::assume", level = "debug", skip(state, operator, headers))]
pub(super) async fn assume(
    Auth(operator): Auth,
    Query(query): Query<CreateTokenParameters>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(req): Json<AssumeRequest>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    req.validate()?;
    let granted = enforce(&state, &operator, "identity:tokens:perform:assume").await?;

    let user = find_user(&state, &req.assume.user).await?;
    let authz_info = resolve_scope(&state, req.assume.scope.as_ref()).await?;
    if !covers(granted, &operator, &user, &authz_info) {
        info!(
            "{} may not act as {} at the requested scope",
            operator.user_id(),
            user.id
        );
        return Err(KeystoneApiError::Forbidden);
    }

    let user_domain = state
        .provider
        .get_resource_provider()
        .get_domain(&state, &user.domain_id)
        .await?
        .ok_or_else(|| AuthenticationError::DomainDisabled(user.domain_id.clone()))?;
    let authed_info = AuthenticatedInfo::builder()
        .user_id(user.id.clone())
        .user(user)
        .user_domain(user_domain)
        .method(AuthMethod::Token)
        .audit_ids(vec![operator.user_id().clone()])
        .context(request_context(&headers, None))
        .build()
        .map_err(AuthenticationError::from)?;
    authed_info.validate()?;

    let issued = state
        .provider
        .get_token_provider()
        .issue_token(&state, authed_info, authz_info)
        .await?;
    info!(
        "{} assumed the identity of {}",
        operator.user_id(),
        issued.token.user_id()
    );

    let api_token = TokenResponse {
        token: ApiResponseToken::from_provider_token(
            &state,
            &issued.token,
            !query.nocatalog.is_some_and(|x| x),
        )
        .await?,
    };
    Ok((
        StatusCode::CREATED,
        [(SUBJECT_TOKEN_HEADER, issued.credential)],
        Json(api_token),
    )
        .into_response())
}
