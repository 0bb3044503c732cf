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
//! Validate token.
//!
//! Check the token whether it can be accepted as a valid. The current user,
//! scope, roles and catalog are loaded again since they may have changed
//! after the token was issued.
//!
//! Token validations:
//!
//!  - expiration
//!  - revocation

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::IntoResponse,
};
use tracing::info;

use crate::api::common::{enforce, ensure_token_within, subject_token};
use crate::api::v3::auth::token::types::{
    Token as ApiResponseToken, TokenResponse, ValidateTokenParameters,
};
use crate::api::{KeystoneApiError, auth::Auth};
use crate::keystone::ServiceState;
use crate::token::TokenApi;

/// Validate and show information for token.
///
/// Pass your own token in the X-Auth-Token request header.
///
/// Pass the token that you want to validate in the X-Subject-Token request
/// header. Validating the token of another user requires the
/// `identity:tokens:validate` permission.
#[utoipa::path(
    get,
    path = "/",
    params(ValidateTokenParameters),
    responses(
        (status = OK, description = "Token object", body = TokenResponse),
        (status = NOT_FOUND, description = "Subject token is not valid"),
    ),
    security(("x-auth" = [])),
    tag="auth"
)]
#[tracing::instrument(
    name = "api::v3::token::get",
    level = "debug",
    skip(state, headers, user_auth)
)]
pub(super) async fn show(
    Auth(user_auth): Auth,
    Query(query): Query<ValidateTokenParameters>,
    headers: HeaderMap,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    let subject = subject_token(&headers)?;

    let token = state
        .provider
        .get_token_provider()
        .validate_token(&state, &subject)
        .await
        .map_err(|err| {
            info!("subject token rejected: {err}");
            KeystoneApiError::NotFound {
                resource: "token".into(),
                identifier: String::new(),
            }
        })?;

    if token.user_id() != user_auth.user_id() {
        let granted = enforce(&state, &user_auth, "identity:tokens:validate").await?;
        ensure_token_within(granted, &user_auth, &token)?;
    }

    Ok(TokenResponse {
        token: ApiResponseToken::from_provider_token(
            &state,
            &token,
            !query.nocatalog.is_some_and(|x| x),
        )
        .await?,
    })
}
