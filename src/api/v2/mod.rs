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
//! Legacy v2.0 API.
//!
//! Only the token operations are kept for the old clients. Everything is
//! served from the default domain.

use axum::{
    extract::{OriginalUri, State},
    http::HeaderMap,
    response::IntoResponse,
};
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::api::error::KeystoneApiError;
use crate::api::public_url;
use crate::api::types::*;
use crate::keystone::ServiceState;

pub mod token;

pub(crate) const DESCRIPTION: &str = r#"Legacy v2.0 token API.

Tokens are issued with `POST /v2.0/tokens` and verified with
`GET /v2.0/tokens/{token}`. Tenants and users are looked up in the default
domain only.
"#;

pub(super) fn openapi_router() -> OpenApiRouter<ServiceState> {
    OpenApiRouter::new()
        .nest("/tokens", token::openapi_router())
        .routes(routes!(version))
}

/// Version discovery endpoint
#[utoipa::path(
    get,
    path = "/",
    description = "Version discovery",
    responses(
        (status = OK, description = "Versions", body = SingleVersion),
    ),
    tag = "version"
)]
async fn version(
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    State(state): State<ServiceState>,
) -> Result<impl IntoResponse, KeystoneApiError> {
    let host = public_url(&state, &headers);
    let version = Version {
        id: "v2.0".into(),
        status: VersionStatus::Deprecated,
        links: Some(vec![Link::new(format!("{}{}", host, uri.path()))]),
        media_types: Some(vec![MediaType::v2()]),
        ..Default::default()
    };
    Ok(SingleVersion { version })
}
