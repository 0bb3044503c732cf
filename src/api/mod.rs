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
//! Keystone API
use axum::{
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::keystone::ServiceState;

pub mod auth;
pub mod authenticate;
pub(crate) mod common;
pub mod error;
pub mod types;
pub mod v2;
pub mod v3;

pub use error::KeystoneApiError;

use crate::api::types::*;

#[derive(OpenApi)]
#[openapi(
    info(version = "3.14.0"),
    modifiers(&SecurityAddon),
    tags(
        (name="auth", description=v3::auth::DESCRIPTION),
        (name="identity_providers", description=v3::identity_provider::DESCRIPTION),
        (name="role_assignments", description=v3::role_assignment::DESCRIPTION),
        (name="v2", description=v2::DESCRIPTION),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "x-auth",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("x-auth-token"))),
            );
        }
    }
}

pub fn openapi_router() -> OpenApiRouter<ServiceState> {
    OpenApiRouter::new()
        .nest("/v3", v3::openapi_router())
        .nest("/v2.0", v2::openapi_router())
        .routes(routes!(version))
}

/// Base URL the service is reachable at.
///
/// The configured public endpoint wins over the `Host` header of the request.
pub(crate) fn public_url(state: &ServiceState, headers: &HeaderMap) -> String {
    state
        .config
        .default
        .public_endpoint
        .clone()
        .map(|x| x.trim_end_matches('/').to_string())
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|header| header.to_str().map(|val| format!("http://{val}")).ok())
        })
        .unwrap_or_else(|| "http://localhost".to_string())
}

/// Versions
#[utoipa::path(
    get,
    path = "/",
    description = "Version discovery",
    responses(
        (status = MULTIPLE_CHOICES, description = "Versions", body = Versions),
    ),
    tag = "version"
)]
async fn version(
    headers: HeaderMap,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    let host = public_url(&state, &headers);

    let res = Versions {
        versions: Values {
            values: vec![
                Version {
                    id: "v3.14".into(),
                    status: VersionStatus::Stable,
                    links: Some(vec![Link::new(format!("{host}/v3/"))]),
                    media_types: Some(vec![MediaType::default()]),
                    ..Default::default()
                },
                Version {
                    id: "v2.0".into(),
                    status: VersionStatus::Deprecated,
                    links: Some(vec![Link::new(format!("{host}/v2.0/"))]),
                    media_types: Some(vec![MediaType::v2()]),
                    ..Default::default()
                },
            ],
        },
    };
    Ok(res)
}
