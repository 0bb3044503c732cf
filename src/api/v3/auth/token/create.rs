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
//! Create token (authenticate).

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use validator::Validate;

use crate::api::KeystoneApiError;
use crate::api::authenticate::resolve_scope;
use crate::api::common::{SUBJECT_TOKEN_HEADER, request_context};
use crate::api::v3::auth::token::common::authenticate_request;
use crate::api::v3::auth::token::types::{
    AuthRequest, CreateTokenParameters, Token as ApiResponseToken, TokenResponse,
};
use crate::keystone::ServiceState;
use crate::token::TokenApi;

/// Authenticate user issuing a new token.
///
/// The token is returned in the `X-Subject-Token` response header.
#[utoipa::path(
    post,
    path = "/",
    description = "Issue token",
    params(CreateTokenParameters),
    request_body = AuthRequest,
    responses(
        (status = CREATED, description = "Token object", body = TokenResponse),
        (status = UNAUTHORIZED, description = "Authentication failed"),
    ),
    tag="auth"
)]
#[tracing::instrument(name = "api::v3::token::post", level = "debug", skip(state, headers, req))]
pub(super) async fn create(
    Query(query): Query<CreateTokenParameters>,
    State(state): State<ServiceState>,
    headers: HeaderMap,
    Json(req): Json<AuthRequest>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    req.validate()?;
    let context = request_context(&headers, req.auth.context.clone());
    let (authed_info, scope) = authenticate_request(&state, &req, context).await?;
    let authz_info = resolve_scope(&state, scope.as_ref()).await?;

    let issued = state
        .provider
        .get_token_provider()
        .issue_token(&state, authed_info, authz_info)
        .await?;

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

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use hmac::{Hmac, Mac};
    use http_body_util::BodyExt; // for `collect`
    use serde_json::json;
    use sha2::Sha256;
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`
    use tower_http::trace::TraceLayer;
    use tracing_test::traced_test;

    use crate::api::v3::auth::token::types::*;
    use crate::auth::{AuthenticatedInfo, AuthzInfo};
    use crate::catalog::{
        MockCatalogProvider,
        types::{Catalog, CatalogEntry, Interface},
    };
    use crate::credential::{
        MockCredentialProvider,
        types::{CredentialBuilder, CredentialType},
    };
    use crate::identity::{
        MockIdentityProvider,
        types::{LoginContext, UserPasswordAuthRequest},
    };
    use crate::identity_mapping::MockIdentityMappingProvider;
    use crate::policy::types::PolicyScope;
    use crate::provider::Provider;
    use crate::resource::MockResourceProvider;
    use crate::tests::{allow_all, default_domain, get_state, project, project_token, user};
    use crate::token::{IssuedToken, MockTokenProvider};

    use super::super::openapi_router;

    fn resource_mock() -> MockResourceProvider {
        let mut resource_mock = MockResourceProvider::default();
        resource_mock
            .expect_get_domain()
            .withf(|_, id: &'_ str| id == "default")
            .returning(|_, _| Ok(Some(default_domain())));
        resource_mock
            .expect_find_domain_by_name()
            .withf(|_, name: &'_ str| name == "Default")
            .returning(|_, _| Ok(Some(default_domain())));
        resource_mock
            .expect_get_project()
            .withf(|_, id: &'_ str| id == "p1")
            .returning(|_, _| Ok(Some(project("p1"))));
        resource_mock
    }

    fn identity_mock() -> MockIdentityProvider {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_find_user_by_name()
            .withf(|_, name: &'_ str, domain_id: &'_ str| name == "alice" && domain_id == "default")
            .returning(|_, _, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_authenticate_by_password()
            .withf(|_, req: &UserPasswordAuthRequest| {
                req.id == Some("alice".to_string()) && req.password == "pass"
            })
            .returning(|_, _| Ok(user("alice")));
        identity_mock
            .expect_record_login()
            .withf(|_, id: &'_ str, ctx: &LoginContext| {
                id == "alice" && ctx.ip == Some("192.0.2.10".into())
            })
            .returning(|_, _, _| Ok(()));
        identity_mock
    }

    fn mapping_mock() -> MockIdentityMappingProvider {
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock
            .expect_get_by_public_id()
            .returning(|_, _, _| Ok(None));
        mapping_mock
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_project_scope() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_issue_token()
            .withf(|_, authn: &AuthenticatedInfo, authz: &AuthzInfo| {
                authn.user_id == "alice"
                    && authn.context.as_ref().map(|x| x.source.as_str()) == Some("api")
                    && matches!(authz, AuthzInfo::Project(p) if p.id == "p1")
            })
            .returning(|_, _, _| {
                Ok(IssuedToken {
                    credential: "gAAAA-token".into(),
                    token: project_token("alice", "p1", &["member"]),
                })
            });
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(allow_all(PolicyScope::Project)));
        let mut catalog_mock = MockCatalogProvider::default();
        catalog_mock.expect_get_catalog().returning(|_| {
            Ok(Catalog::new(vec![CatalogEntry {
                id: "e1".into(),
                interface: Interface::Public,
                url: "http://keystone:5000/v3".into(),
                service_id: "s1".into(),
                service_type: "identity".into(),
                service_name: "keystone".into(),
                ..Default::default()
            }]))
        });

        let state = get_state(
            Provider::mocked_builder()
                .catalog(catalog_mock)
                .identity(identity_mock())
                .identity_mapping(mapping_mock())
                .resource(resource_mock())
                .token(token_mock)
                .build()
                .unwrap(),
        );

        let mut api = openapi_router()
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header("X-Forwarded-For", "192.0.2.10, 10.0.0.1")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "auth": {
                                "identity": {
                                    "methods": ["password"],
                                    "password": {
                                        "user": {
                                            "name": "alice",
                                            "domain": {"name": "Default"},
                                            "password": "pass"
                                        }
                                    }
                                },
                                "scope": {"project": {"id": "p1"}}
                            }
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            "gAAAA-token",
            response.headers().get("X-Subject-Token").unwrap()
        );
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let res: TokenResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(vec!["password".to_string()], res.token.methods);
        assert_eq!("alice", res.token.user.id);
        assert_eq!(Some("Default".to_string()), res.token.user.domain.name);
        assert_eq!("p1", res.token.project.unwrap().id);
        assert_eq!(1, res.token.catalog.unwrap().0.len());
        assert_eq!(
            Some(&vec!["allow-all".to_string()]),
            res.token.policies.0.get("project")
        );
    }

    #[tokio::test]
    async fn test_post_wrong_password() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .returning(|_, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_authenticate_by_password()
            .returning(|_, _| Err(crate::identity::error::IdentityProviderError::InvalidPassword));
        let mut token_mock = MockTokenProvider::default();
        token_mock.expect_issue_token().never();
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock())
                .token(token_mock)
                .build()
                .unwrap(),
        );

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "auth": {
                                "identity": {
                                    "methods": ["password"],
                                    "password": {"user": {"id": "alice", "password": "bad"}}
                                }
                            }
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            "The request you have made requires authentication.",
            body["error"]["message"]
        );
    }

    #[tokio::test]
    async fn test_post_unknown_method() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "auth": {"identity": {"methods": ["totp"]}}
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_post_aksk_scoped_to_key_project() {
        let mut credential_mock = MockCredentialProvider::default();
        credential_mock
            .expect_get_credential()
            .withf(|_, id: &'_ str| id == "ak1")
            .returning(|_, _| {
                Ok(Some(
                    CredentialBuilder::default()
                        .id("ak1")
                        .user_id("alice")
                        .project_id("p1")
                        .r#type(CredentialType::Aksk)
                        .blob(json!({"secret": "s3cr3t"}).to_string())
                        .key_hash("k0")
                        .build()
                        .unwrap(),
                ))
            });
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .returning(|_, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_record_login()
            .returning(|_, _, _| Ok(()));
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_issue_token()
            .withf(|_, authn: &AuthenticatedInfo, authz: &AuthzInfo| {
                authn.method == crate::token::AuthMethod::Aksk
                    && matches!(authz, AuthzInfo::Project(p) if p.id == "p1")
            })
            .returning(|_, _, _| {
                Ok(IssuedToken {
                    credential: "gAAAA-token".into(),
                    token: project_token("alice", "p1", &["member"]),
                })
            });
        token_mock
            .expect_get_token_policies()
            .returning(|_, _| Ok(allow_all(PolicyScope::Project)));
        let state = get_state(
            Provider::mocked_builder()
                .credential(credential_mock)
                .identity(identity_mock)
                .resource(resource_mock())
                .token(token_mock)
                .build()
                .unwrap(),
        );

        let text = "POST\n/v3/auth/tokens\n20261016T000000Z";
        let mut mac = Hmac::<Sha256>::new_from_slice(b"s3cr3t").unwrap();
        mac.update(text.as_bytes());
        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/?nocatalog=true")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "auth": {
                                "identity": {
                                    "methods": ["aksk"],
                                    "aksk": {
                                        "access": "ak1",
                                        "string_to_sign": text,
                                        "signature": STANDARD.encode(mac.finalize().into_bytes())
                                    }
                                },
                                "scope": {"project": {"id": "elsewhere"}}
                            }
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_post_aksk_missing_signature() {
        let mut credential_mock = MockCredentialProvider::default();
        credential_mock.expect_get_credential().never();
        let state = get_state(
            Provider::mocked_builder()
                .credential(credential_mock)
                .build()
                .unwrap(),
        );
        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::to_vec(&json!({
                            "auth": {"identity": {"methods": ["aksk"]}}
                        }))
                        .unwrap(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
