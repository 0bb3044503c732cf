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
//! v3 token API types.
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::authenticate::{AccessKeyRequest, PasswordCredentials};
use crate::api::types::*;
use crate::assignment::types::Role as ProviderRole;

/// Authorization token
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
#[builder(setter(strip_option, into))]
pub struct Token {
    /// A list of one or two audit IDs. The first audit ID is the current
    /// audit ID for the token. The second audit ID is the audit ID of the
    /// token the current one was minted from.
    pub audit_ids: Vec<String>,

    /// The authentication methods used to obtain the token.
    pub methods: Vec<String>,

    /// The date and time when the token expires.
    pub expires_at: DateTime<Utc>,

    /// The date and time when the token was issued.
    pub issued_at: DateTime<Utc>,

    /// A user object.
    pub user: User,

    /// A project object including the id, name and domain object representing
    /// the project the token is scoped to. This is only included in tokens
    /// that are scoped to a project.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub project: Option<Project>,

    /// A domain object including the id and name representing the domain the
    /// token is scoped to. This is only included in tokens that are scoped
    /// to a domain.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub domain: Option<Domain>,

    /// A list of role objects
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub roles: Option<Vec<Role>>,

    /// A catalog object.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[builder(default)]
    pub catalog: Option<Catalog>,

    /// Policies granted to the token per scope.
    #[builder(default)]
    pub policies: Policies,
}

/// User information
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
#[builder(setter(into))]
pub struct User {
    /// User ID
    pub id: String,
    /// User Name
    #[builder(default)]
    pub name: Option<String>,
    /// User domain
    pub domain: Domain,
}

/// Role granted on the token scope.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
pub struct Role {
    pub id: String,
    pub name: String,
}

impl From<&ProviderRole> for Role {
    fn from(value: &ProviderRole) -> Self {
        Self {
            id: value.id.clone(),
            name: value.name.clone(),
        }
    }
}

#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema)]
#[builder(setter(strip_option, into))]
pub struct TokenResponse {
    /// Token
    pub token: Token,
}

impl IntoResponse for TokenResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// An authentication request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AuthRequest {
    /// An identity object.
    #[validate(nested)]
    pub auth: AuthRequestInner,
}

/// An authentication request.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AuthRequestInner {
    /// An identity object.
    #[validate(nested)]
    pub identity: Identity,

    /// The authorization scope, a project or a domain.
    #[validate(nested)]
    pub scope: Option<Scope>,

    /// Origin of the request.
    #[serde(default)]
    #[validate(nested)]
    pub context: Option<RequestContext>,
}

/// An identity object.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct Identity {
    /// The authentication method. Exactly one method is accepted.
    #[validate(length(min = 1, max = 1))]
    pub methods: Vec<String>,

    /// The password object, contains the authentication information.
    #[validate(nested)]
    pub password: Option<PasswordAuth>,

    /// The token object, contains the authentication information.
    #[validate(nested)]
    pub token: Option<TokenAuth>,

    /// SAML response posted back by the identity provider.
    #[validate(nested)]
    pub saml: Option<SamlAuth>,

    /// Authorization code of the OpenID Connect identity provider.
    #[validate(nested)]
    pub oidc: Option<CodeAuth>,

    /// Authorization code of the OAuth2 identity provider.
    #[validate(nested)]
    pub oauth2: Option<CodeAuth>,

    /// CAS service ticket.
    #[validate(nested)]
    pub cas: Option<CasAuth>,

    /// Request signed with the access key secret.
    #[validate(nested)]
    pub aksk: Option<AkskAuth>,
}

/// The password object, contains the authentication information.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
#[builder(setter(strip_option, into))]
pub struct PasswordAuth {
    /// A user object.
    #[builder(default)]
    #[validate(nested)]
    pub user: UserPassword,
}

/// User password information
#[derive(Clone, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct UserPassword {
    /// User ID
    #[validate(length(max = 64))]
    pub id: Option<String>,
    /// User Name
    #[validate(length(max = 255))]
    pub name: Option<String>,
    /// User domain
    #[validate(nested)]
    pub domain: Option<Domain>,
    /// User password
    #[validate(length(max = 1024))]
    pub password: String,
}

impl std::fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPassword")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl From<UserPassword> for PasswordCredentials {
    fn from(value: UserPassword) -> Self {
        Self {
            user_id: value.id,
            user_name: value.name,
            domain: value.domain,
            password: value.password,
        }
    }
}

/// The token object, contains the authentication information.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
#[builder(setter(strip_option, into))]
pub struct TokenAuth {
    /// An authentication token.
    #[validate(length(min = 1, max = 1024))]
    pub id: String,
}

/// SAML assertion.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct SamlAuth {
    /// Identity provider ID.
    #[validate(length(max = 64))]
    pub id: String,
    /// Base64 encoded `SAMLResponse`.
    #[validate(length(min = 1))]
    pub response: String,
}

/// Authorization code of the OpenID Connect or OAuth2 flow.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct CodeAuth {
    /// Identity provider ID.
    #[validate(length(max = 64))]
    pub id: String,
    /// Authorization code.
    #[validate(length(min = 1, max = 2048))]
    pub code: String,
    /// Redirect URI the code was issued for.
    #[validate(url)]
    pub redirect_uri: String,
}

/// CAS ticket.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct CasAuth {
    /// Identity provider ID. May be omitted with a single CAS provider.
    #[validate(length(max = 64))]
    pub id: Option<String>,
    /// Service ticket.
    #[validate(length(min = 1, max = 256))]
    pub ticket: String,
    /// Service the ticket was issued for.
    #[validate(url)]
    pub service: String,
}

/// Access key signature.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize, ToSchema, Validate)]
pub struct AkskAuth {
    /// Access key.
    #[validate(length(min = 1, max = 64))]
    pub access: String,
    /// Signed text.
    #[validate(length(max = 8192))]
    pub string_to_sign: String,
    /// Base64 encoded HMAC-SHA256 of the signed text.
    #[validate(length(min = 1, max = 256))]
    pub signature: String,
}

impl From<&AkskAuth> for AccessKeyRequest {
    fn from(value: &AkskAuth) -> Self {
        Self {
            access_key: value.access.clone(),
            string_to_sign: value.string_to_sign.clone(),
            signature: value.signature.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct CreateTokenParameters {
    /// The authentication response excludes the service catalog. By default,
    /// the response includes the service catalog.
    pub nocatalog: Option<bool>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, IntoParams)]
pub struct ValidateTokenParameters {
    /// The authentication response excludes the service catalog. By default,
    /// the response includes the service catalog.
    pub nocatalog: Option<bool>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_auth_request_password() {
        let req: AuthRequest = serde_json::from_value(json!({
            "auth": {
                "identity": {
                    "methods": ["password"],
                    "password": {
                        "user": {
                            "name": "admin",
                            "domain": {"name": "Default"},
                            "password": "secret"
                        }
                    }
                },
                "scope": {"project": {"id": "p1"}}
            }
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let user = req.auth.identity.password.unwrap().user;
        assert_eq!(Some("admin".to_string()), user.name);
        assert!(!format!("{user:?}").contains("secret"));
    }

    #[test]
    fn test_auth_request_methods() {
        let req: AuthRequest = serde_json::from_value(json!({
            "auth": {"identity": {"methods": ["password", "token"]}}
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_token_serialize() {
        let token = Token {
            methods: vec!["password".into()],
            user: User {
                id: "u".into(),
                name: Some("alice".into()),
                domain: Domain {
                    id: Some("default".into()),
                    name: Some("Default".into()),
                },
            },
            ..Default::default()
        };
        let val = serde_json::to_value(&token).unwrap();
        assert!(val.get("project").is_none());
        assert!(val.get("catalog").is_none());
        assert_eq!(json!({}), val["policies"]);
        assert_eq!("Default", val["user"]["domain"]["name"]);
    }
}
