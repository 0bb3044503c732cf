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
//! Authentication API.
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::keystone::ServiceState;

mod assume;
mod sso;
pub mod token;

pub(crate) const DESCRIPTION: &str = r#"Authentication and token management.

Tokens are issued for the password, token, saml, oidc, oauth2 and cas
authentication methods and can be validated and revoked by the owner or by an
operator allowed to do so.
"#;

pub(crate) fn openapi_router() -> OpenApiRouter<ServiceState> {
    OpenApiRouter::new()
        .nest("/tokens", token::openapi_router())
        .routes(routes!(assume::assume))
        .routes(routes!(sso::redirect))
}
