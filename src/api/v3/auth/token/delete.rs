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
//! Revoke token.
//!
//! Revoking the token revokes every token minted from it.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use tracing::{debug, info};

use crate::api::common::{enforce, ensure_token_within, subject_token};
use crate::api::{KeystoneApiError, auth::Auth};
use crate::keystone::ServiceState;
use crate::token::TokenApi;

/// Revoke token.
///
/// Pass the token that you want to revoke in the X-Subject-Token request
/// header. Revoking the token of another user requires the
/// `identity:tokens:revoke` permission.
#[utoipa::path(
    delete,
    path = "/",
    responses(
        (status = NO_CONTENT, description = "Token revoked"),
        (status = NOT_FOUND, description = "Subject token is not valid"),
    ),
    security(("x-auth" = [])),
    tag="auth"
)]
#[tracing::instrument(
    name = "api::v3::token::delete",
    level = "debug",
    skip(state, headers, user_auth)
)]
pub(super) async fn delete(
    Auth(user_auth): Auth,
    headers: HeaderMap,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    let subject = subject_token(&headers)?;
    let provider = state.provider.get_token_provider();

    let token = provider
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
        let granted = enforce(&state, &user_auth, "identity:tokens:revoke").await?;
        ensure_token_within(granted, &user_auth, &token)?;
    }

    let revoked = provider.revoke_token(&state, &subject, &token).await?;
    debug!("revoked {} token(s) of the user {}", revoked.len(), token.user_id());
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`

    use crate::policy::types::{PolicyGroup, PolicyScope};
    use crate::provider::Provider;
    use crate::tests::{allow_all, get_state, project_token, unscoped_token};
    use crate::token::{MockTokenProvider, Token};

    use super::super::openapi_router;

    #[tokio::test]
    async fn test_delete_own() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .returning(|_, _| Ok(unscoped_token("alice")));
        token_mock
            .expect_revoke_token()
            .withf(|_, credential: &'_ str, token: &Token| {
                credential == "subject" && token.user_id() == "alice"
            })
            .times(1)
            .returning(|_, _, _| Ok(vec!["subject".into(), "child".into()]));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/")
                    .header("x-auth-token", "own")
                    .header("x-subject-token", "subject")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_delete_foreign_forbidden() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "own")
            .returning(|_, _| Ok(unscoped_token("alice")));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(unscoped_token("bob")));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(PolicyGroup::default()));
        token_mock.expect_revoke_token().never();
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/")
                    .header("x-auth-token", "own")
                    .header("x-subject-token", "subject")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_outside_project_grant() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "manager")
            .returning(|_, _| Ok(project_token("manager", "p1", &["project_admin"])));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(project_token("eve", "p2", &["member"])));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(allow_all(PolicyScope::Project)));
        token_mock.expect_revoke_token().never();
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/")
                    .header("x-auth-token", "manager")
                    .header("x-subject-token", "subject")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_delete_within_project_grant() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "manager")
            .returning(|_, _| Ok(project_token("manager", "p1", &["project_admin"])));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(project_token("bob", "p1", &["member"])));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(allow_all(PolicyScope::Project)));
        token_mock
            .expect_revoke_token()
            .withf(|_, credential: &'_ str, token: &Token| {
                credential == "subject" && token.user_id() == "bob"
            })
            .times(1)
            .returning(|_, _, _| Ok(vec!["subject".into()]));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/")
                    .header("x-auth-token", "manager")
                    .header("x-subject-token", "subject")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_delete_missing_subject() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .returning(|_, _| Ok(unscoped_token("alice")));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/")
                    .header("x-auth-token", "own")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
