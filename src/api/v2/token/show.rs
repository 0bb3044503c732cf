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
//! Validate token (v2.0).
use axum::{
    extract::{Path, State},
    response::IntoResponse,
};
use tracing::info;

use crate::api::common::{enforce, ensure_token_within};
use crate::api::v2::token::types::{Access, AccessResponse};
use crate::api::{KeystoneApiError, auth::Auth};
use crate::keystone::ServiceState;
use crate::token::TokenApi;

/// Validate the token passed in the path.
///
/// Validating the token of another user requires the
/// `identity:tokens:validate` permission.
#[utoipa::path(
    get,
    path = "/{token}",
    params(
        ("token" = String, Path, description = "The token to validate"),
    ),
    responses(
        (status = OK, description = "Access object", body = AccessResponse),
        (status = NOT_FOUND, description = "Token is not valid"),
    ),
    security(("x-auth" = [])),
    tag="v2"
)]
#[tracing::instrument(
    name = "api::v2::token::get",
    level = "debug",
    skip(state, user_auth, subject)
)]
pub(super) async fn show(
    Auth(user_auth): Auth,
    Path(subject): Path<String>,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
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

    Ok(AccessResponse {
        access: Access::from_provider_token(&state, &token, &subject).await?,
    })
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt; // for `collect`
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`

    use crate::api::v2::token::types::*;
    use crate::catalog::{MockCatalogProvider, types::Catalog};
    use crate::policy::types::{PolicyGroup, PolicyScope};
    use crate::provider::Provider;
    use crate::tests::{allow_all, get_state, project_token, unscoped_token};
    use crate::token::{MockTokenProvider, TokenProviderError};

    use super::super::openapi_router;

    #[tokio::test]
    async fn test_get_own() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "caller")
            .returning(|_, _| Ok(unscoped_token("alice")));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(project_token("alice", "p1", &["member"])));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(PolicyGroup::default()));
        let mut catalog_mock = MockCatalogProvider::default();
        catalog_mock
            .expect_get_catalog()
            .returning(|_| Ok(Catalog::default()));
        let state = get_state(
            Provider::mocked_builder()
                .catalog(catalog_mock)
                .token(token_mock)
                .build()
                .unwrap(),
        );

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/subject")
                    .header("x-auth-token", "caller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let res: AccessResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!("subject", res.access.token.id);
        assert_eq!("p1-name", res.access.token.tenant.unwrap().name);
        assert_eq!("alice", res.access.user.id);
    }

    #[tokio::test]
    async fn test_get_foreign_forbidden() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "caller")
            .returning(|_, _| Ok(unscoped_token("alice")));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(unscoped_token("bob")));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(PolicyGroup::default()));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/subject")
                    .header("x-auth-token", "caller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_foreign_admin() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "caller")
            .returning(|_, _| Ok(project_token("admin", "p1", &["admin"])));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(unscoped_token("bob")));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(allow_all(PolicyScope::System)));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/subject")
                    .header("x-auth-token", "caller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let res: AccessResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!("bob", res.access.user.id);
        assert!(res.access.service_catalog.is_empty());
    }

    #[tokio::test]
    async fn test_get_foreign_outside_project_grant() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "caller")
            .returning(|_, _| Ok(project_token("manager", "p1", &["project_admin"])));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Ok(unscoped_token("bob")));
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(allow_all(PolicyScope::Project)));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/subject")
                    .header("x-auth-token", "caller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_get_invalid() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "caller")
            .returning(|_, _| Ok(unscoped_token("alice")));
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &'_ str| credential == "subject")
            .returning(|_, _| Err(TokenProviderError::Expired));
        let state = get_state(Provider::mocked_builder().token(token_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/subject")
                    .header("x-auth-token", "caller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
