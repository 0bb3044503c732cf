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
//! Trigger the identity provider sync.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::api::common::enforce;
use crate::api::{KeystoneApiError, auth::Auth};
use crate::idp::{IdpApi, IdpProviderError, sync::trigger_sync};
use crate::keystone::ServiceState;

/// Queue the sync of the identity provider.
///
/// Only an idle identity provider can be queued.
#[utoipa::path(
    post,
    path = "/{idp_id}/sync",
    params(("idp_id" = String, Path, description = "Identity provider ID")),
    responses(
        (status = ACCEPTED, description = "Sync queued"),
        (status = NOT_FOUND, description = "Identity provider not found"),
        (status = CONFLICT, description = "Sync already queued or running"),
    ),
    security(("x-auth" = [])),
    tag="identity_providers"
)]
#[tracing::instrument(name = "api::idp_sync", level = "debug", skip(state, user_auth))]
pub(super) async fn sync(
    Auth(user_auth): Auth,
    Path(idp_id): Path<String>,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    enforce(&state, &user_auth, "identity:identity_providers:perform:sync").await?;
    state
        .provider
        .get_idp_provider()
        .get_idp(&state, &idp_id)
        .await?
        .ok_or_else(|| IdpProviderError::NotFound(idp_id.clone()))?;
    if trigger_sync(&state, &idp_id).await? {
        Ok(StatusCode::ACCEPTED)
    } else {
        Err(IdpProviderError::NotIdle(idp_id).into())
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt; // for `call`, `oneshot`, and `ready`

    use crate::api::v3::identity_provider::openapi_router;
    use crate::idp::{
        MockIdpProvider,
        types::{IdentityProvider, SyncStatus},
    };
    use crate::policy::types::{PolicyGroup, PolicyScope};
    use crate::provider::Provider;
    use crate::tests::{allow_all, get_state, unscoped_token};
    use crate::token::MockTokenProvider;

    fn token_mock(policies: PolicyGroup) -> MockTokenProvider {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .returning(|_, _| Ok(unscoped_token("admin")));
        token_mock
            .expect_get_token_policies()
            .returning(move |_, _| Ok(policies.clone()));
        token_mock
    }

    fn idp_mock(idle: bool) -> MockIdpProvider {
        let mut idp_mock = MockIdpProvider::default();
        idp_mock.expect_get_idp().returning(|_, id| {
            Ok(Some(IdentityProvider {
                id: id.into(),
                driver: "ldap".into(),
                enabled: true,
                ..Default::default()
            }))
        });
        idp_mock
            .expect_transition_sync_status()
            .withf(|_, id: &'_ str, from: &SyncStatus, to: &SyncStatus| {
                id == "ldap" && *from == SyncStatus::Idle && *to == SyncStatus::Queued
            })
            .returning(move |_, _, _, _| Ok(idle));
        idp_mock
    }

    async fn post(idp_mock: MockIdpProvider, policies: PolicyGroup) -> StatusCode {
        let state = get_state(
            Provider::mocked_builder()
                .idp(idp_mock)
                .token(token_mock(policies))
                .build()
                .unwrap(),
        );
        let mut api = openapi_router().with_state(state);
        api.as_service()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ldap/sync")
                    .header("x-auth-token", "admin")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_sync_queued() {
        assert_eq!(
            StatusCode::ACCEPTED,
            post(idp_mock(true), allow_all(PolicyScope::System)).await
        );
    }

    #[tokio::test]
    async fn test_sync_not_idle() {
        assert_eq!(
            StatusCode::CONFLICT,
            post(idp_mock(false), allow_all(PolicyScope::System)).await
        );
    }

    #[tokio::test]
    async fn test_sync_forbidden() {
        let mut idp_mock = MockIdpProvider::default();
        idp_mock.expect_transition_sync_status().never();
        assert_eq!(
            StatusCode::FORBIDDEN,
            post(idp_mock, PolicyGroup::default()).await
        );
    }
}
