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
//! v2.0 token API types.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::api::authenticate::PasswordCredentials;
use crate::api::types::{CatalogServiceV2, Domain, Policies, RequestContext};
use crate::resource::types::{DEFAULT_DOMAIN_ID, Project};

/// Authentication request.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AuthRequest {
    #[validate(nested)]
    pub auth: AuthRequestInner,
}

/// Credentials and the optional tenant of the v2.0 request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AuthRequestInner {
    /// Project (tenant) ID to scope the token to.
    #[serde(rename = "tenantId", default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub tenant_id: Option<String>,

    /// Project (tenant) name in the default domain.
    #[serde(rename = "tenantName", default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 64))]
    pub tenant_name: Option<String>,

    #[serde(
        rename = "passwordCredentials",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    #[validate(nested)]
    pub password_credentials: Option<PasswordCredentialsV2>,

    /// Existing token to exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub token: Option<TokenAuth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub context: Option<RequestContext>,
}

impl AuthRequestInner {
    /// Whether the request names a tenant.
    pub fn has_tenant(&self) -> bool {
        self.tenant_id.as_ref().is_some_and(|x| !x.is_empty())
            || self.tenant_name.as_ref().is_some_and(|x| !x.is_empty())
    }
}

#[derive(Clone, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct PasswordCredentialsV2 {
    /// User name in the default domain.
    #[validate(length(max = 255))]
    pub username: String,
    #[validate(length(max = 4096))]
    pub password: String,
}

impl std::fmt::Debug for PasswordCredentialsV2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentialsV2")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl From<PasswordCredentialsV2> for PasswordCredentials {
    fn from(value: PasswordCredentialsV2) -> Self {
        Self {
            user_id: None,
            user_name: Some(value.username),
            domain: Some(Domain {
                id: Some(DEFAULT_DOMAIN_ID.into()),
                name: None,
            }),
            password: value.password,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct TokenAuth {
    #[validate(length(max = 1024))]
    pub id: String,
}

/// Token verification response.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct AccessResponse {
    pub access: Access,
}

impl IntoResponse for AccessResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Token together with the catalog and the user information.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Access {
    pub token: Token,
    /// v2.0 catalog, empty for the tokens without a tenant.
    #[serde(rename = "serviceCatalog")]
    pub service_catalog: Vec<CatalogServiceV2>,
    pub user: User,
    pub metadata: Metadata,
    /// Names of the policies activated for the token per scope.
    pub policies: Policies,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Token {
    /// The token itself.
    pub id: String,
    pub issued_at: DateTime<Utc>,
    pub expires: DateTime<Utc>,
    pub audit_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
}

/// Project the token is scoped to.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Project> for Tenant {
    fn from(value: &Project) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
            enabled: value.enabled,
            description: value.description.clone(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    /// Roles of the user in the tenant.
    pub roles: Vec<Role>,
    pub roles_links: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Role {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Metadata {
    pub is_admin: u8,
    /// Role IDs.
    pub roles: Vec<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_auth_request() {
        let req: AuthRequest = serde_json::from_value(json!({
            "auth": {
                "tenantName": "admin",
                "passwordCredentials": {"username": "alice", "password": "secret"}
            }
        }))
        .unwrap();
        assert!(req.auth.has_tenant());
        assert!(req.auth.token.is_none());
        let creds = req.auth.password_credentials.unwrap();
        assert!(!format!("{creds:?}").contains("secret"));

        let creds = PasswordCredentials::from(creds);
        assert_eq!(Some("alice".to_string()), creds.user_name);
        assert_eq!(
            Some("default".to_string()),
            creds.domain.and_then(|x| x.id)
        );
    }

    #[test]
    fn test_auth_request_token() {
        let req: AuthRequest = serde_json::from_value(json!({
            "auth": {"token": {"id": "gAAAA"}, "tenantId": ""}
        }))
        .unwrap();
        assert!(!req.auth.has_tenant());
        assert_eq!("gAAAA", req.auth.token.unwrap().id);
    }
}
