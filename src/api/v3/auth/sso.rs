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
//! Single sign-on redirect.
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect},
};
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

use crate::api::KeystoneApiError;
use crate::idp::IdpApi;
use crate::keystone::ServiceState;

#[derive(Clone, Debug, Default, Deserialize, Serialize, IntoParams, Validate)]
pub struct SsoRedirectParameters {
    /// Where the identity provider sends the browser back to.
    #[validate(url)]
    pub callback: String,
    /// Opaque value echoed back by the identity provider.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub state: String,
}

/// Redirect the browser to the identity provider login page.
#[utoipa::path(
    get,
    path = "/sso/redirect/{idp_id}",
    params(
        ("idp_id" = String, Path, description = "Identity provider ID"),
        SsoRedirectParameters
    ),
    responses(
        (status = TEMPORARY_REDIRECT, description = "Login page of the identity provider"),
        (status = NOT_FOUND, description = "Identity provider not found"),
    ),
    tag="auth"
)]
#[tracing::instrument(name = "api::v3::sso_redirect", level = "debug", skip(state))]
pub(super) async fn redirect(
    Path(idp_id): Path<String>,
    Query(query): Query<SsoRedirectParameters>,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    query.validate()?;
    let provider = state.provider.get_idp_provider();
    let idp = provider
        .get_idp(&state, &idp_id)
        .await?
        .filter(|idp| idp.enabled && idp.is_sso)
        .ok_or_else(|| KeystoneApiError::NotFound {
            resource: "identity provider".into(),
            identifier: idp_id.clone(),
        })?;
    let uri = provider
        .get_driver(&state, &idp)
        .await?
        .get_sso_redirect_uri(&query.callback, &query.state)
        .await?;
    Ok(Redirect::temporary(&uri))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use std::sync::Arc;
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`

    use crate::api::v3::auth::openapi_router;
    use crate::identity::types::UserResponse;
    use crate::idp::driver::{AuthIdentity, CAS_CLASS, DriverClass, IdentityDriver};
    use crate::idp::{IdpProviderError, MockIdpProvider, types::IdentityProvider};
    use crate::keystone::ServiceState;
    use crate::provider::Provider;
    use crate::tests::get_state;

    struct FakeCas;

    #[async_trait]
    impl IdentityDriver for FakeCas {
        fn class(&self) -> &'static DriverClass {
            &CAS_CLASS
        }

        async fn probe(&self) -> Result<(), IdpProviderError> {
            Ok(())
        }

        async fn authenticate(
            &self,
            _state: &ServiceState,
            _identity: &AuthIdentity,
        ) -> Result<UserResponse, IdpProviderError> {
            Err(IdpProviderError::Unauthenticated)
        }

        async fn get_sso_redirect_uri(
            &self,
            callback: &str,
            _state: &str,
        ) -> Result<String, IdpProviderError> {
            Ok(format!("https://cas.example/login?service={callback}"))
        }
    }

    #[tokio::test]
    async fn test_redirect() {
        let mut idp_mock = MockIdpProvider::default();
        idp_mock
            .expect_get_idp()
            .withf(|_, id: &'_ str| id == "cas")
            .returning(|_, _| {
                Ok(Some(IdentityProvider {
                    id: "cas".into(),
                    driver: "cas".into(),
                    enabled: true,
                    is_sso: true,
                    ..Default::default()
                }))
            });
        idp_mock
            .expect_get_driver()
            .returning(|_, _| Ok(Arc::new(FakeCas)));
        let state = get_state(Provider::mocked_builder().idp(idp_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/sso/redirect/cas?callback=https://keystone.example/cb&state=xyz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            "https://cas.example/login?service=https://keystone.example/cb",
            response.headers().get(header::LOCATION).unwrap()
        );
    }

    #[tokio::test]
    async fn test_redirect_not_sso() {
        let mut idp_mock = MockIdpProvider::default();
        idp_mock.expect_get_idp().returning(|_, _| {
            Ok(Some(IdentityProvider {
                id: "ldap".into(),
                driver: "ldap".into(),
                enabled: true,
                ..Default::default()
            }))
        });
        idp_mock.expect_get_driver().never();
        let state = get_state(Provider::mocked_builder().idp(idp_mock).build().unwrap());

        let mut api = openapi_router().with_state(state);
        let response = api
            .as_service()
            .oneshot(
                Request::builder()
                    .uri("/sso/redirect/ldap?callback=https://keystone.example/cb")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
