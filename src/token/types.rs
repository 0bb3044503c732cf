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
//! Token provider types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::assignment::types::Role;
use crate::identity::types::{LoginContext, UserResponse};
use crate::resource::types::{Domain, Project};

pub mod domain_scoped;
pub mod project_scoped;
pub mod provider_api;
pub mod unscoped;
pub mod validators;

pub use domain_scoped::{DomainScopePayload, DomainScopePayloadBuilder};
pub use project_scoped::{ProjectScopePayload, ProjectScopePayloadBuilder};
pub use provider_api::TokenApi;
pub use unscoped::{UnscopedPayload, UnscopedPayloadBuilder};

/// Authentication method of the token.
///
/// The position in [`AUTH_METHODS`] is the wire representation, new methods
/// are only ever appended.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    #[default]
    Password,
    Token,
    Saml,
    Oidc,
    Oauth2,
    Cas,
    Aksk,
}

/// Authentication methods in their wire order.
pub const AUTH_METHODS: [AuthMethod; 7] = [
    AuthMethod::Password,
    AuthMethod::Token,
    AuthMethod::Saml,
    AuthMethod::Oidc,
    AuthMethod::Oauth2,
    AuthMethod::Cas,
    AuthMethod::Aksk,
];

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Token => "token",
            Self::Saml => "saml",
            Self::Oidc => "oidc",
            Self::Oauth2 => "oauth2",
            Self::Cas => "cas",
            Self::Aksk => "aksk",
        }
    }

    /// Index of the method on the wire.
    pub fn index(&self) -> u8 {
        AUTH_METHODS
            .iter()
            .position(|x| x == self)
            .map(|x| x as u8)
            .unwrap_or_default()
    }

    pub fn from_index(idx: u8) -> Option<Self> {
        AUTH_METHODS.get(usize::from(idx)).copied()
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AuthMethod {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        AUTH_METHODS
            .iter()
            .find(|x| x.as_str() == value)
            .copied()
            .ok_or_else(|| format!("unsupported authentication method {value}"))
    }
}

/// Origin of the authentication request carried by the v3-v5 payloads.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TokenContext {
    pub source: String,
    pub ip: String,
}

impl From<&TokenContext> for LoginContext {
    fn from(value: &TokenContext) -> Self {
        Self {
            source: Some(value.source.clone()).filter(|x| !x.is_empty()),
            ip: Some(value.ip.clone()).filter(|x| !x.is_empty()),
        }
    }
}

/// Fernet token.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Token {
    /// Unscoped.
    Unscoped(UnscopedPayload),
    /// Domain scoped.
    DomainScope(DomainScopePayload),
    /// Project scoped.
    ProjectScope(ProjectScopePayload),
}

impl Token {
    /// Payload version.
    ///
    /// The versions 3 to 5 repeat 0 to 2 and carry the request context.
    pub fn version(&self) -> u8 {
        let (base, context) = match self {
            Self::Unscoped(x) => (0, x.context.is_some()),
            Self::DomainScope(x) => (1, x.context.is_some()),
            Self::ProjectScope(x) => (2, x.context.is_some()),
        };
        if context { base + 3 } else { base }
    }

    pub const fn user_id(&self) -> &String {
        match self {
            Self::Unscoped(x) => &x.user_id,
            Self::DomainScope(x) => &x.user_id,
            Self::ProjectScope(x) => &x.user_id,
        }
    }

    pub const fn user(&self) -> &Option<UserResponse> {
        match self {
            Self::Unscoped(x) => &x.user,
            Self::DomainScope(x) => &x.user,
            Self::ProjectScope(x) => &x.user,
        }
    }

    pub(crate) fn set_user(&mut self, user: Option<UserResponse>) -> &mut Self {
        match self {
            Self::Unscoped(x) => x.user = user,
            Self::DomainScope(x) => x.user = user,
            Self::ProjectScope(x) => x.user = user,
        }
        self
    }

    pub const fn method(&self) -> AuthMethod {
        match self {
            Self::Unscoped(x) => x.method,
            Self::DomainScope(x) => x.method,
            Self::ProjectScope(x) => x.method,
        }
    }

    /// Set the `issued_at` property of the token.
    ///
    /// The value comes from the Fernet envelope and not from the payload.
    pub(super) fn set_issued_at(&mut self, issued_at: DateTime<Utc>) -> &mut Self {
        match self {
            Self::Unscoped(x) => x.issued_at = issued_at,
            Self::DomainScope(x) => x.issued_at = issued_at,
            Self::ProjectScope(x) => x.issued_at = issued_at,
        }
        self
    }

    pub const fn issued_at(&self) -> &DateTime<Utc> {
        match self {
            Self::Unscoped(x) => &x.issued_at,
            Self::DomainScope(x) => &x.issued_at,
            Self::ProjectScope(x) => &x.issued_at,
        }
    }

    pub const fn expires_at(&self) -> &DateTime<Utc> {
        match self {
            Self::Unscoped(x) => &x.expires_at,
            Self::DomainScope(x) => &x.expires_at,
            Self::ProjectScope(x) => &x.expires_at,
        }
    }

    pub const fn audit_ids(&self) -> &Vec<String> {
        match self {
            Self::Unscoped(x) => &x.audit_ids,
            Self::DomainScope(x) => &x.audit_ids,
            Self::ProjectScope(x) => &x.audit_ids,
        }
    }

    pub const fn context(&self) -> Option<&TokenContext> {
        match self {
            Self::Unscoped(x) => x.context.as_ref(),
            Self::DomainScope(x) => x.context.as_ref(),
            Self::ProjectScope(x) => x.context.as_ref(),
        }
    }

    pub const fn project_id(&self) -> Option<&String> {
        match self {
            Self::ProjectScope(x) => Some(&x.project_id),
            _ => None,
        }
    }

    pub const fn project(&self) -> Option<&Project> {
        match self {
            Self::ProjectScope(x) => x.project.as_ref(),
            _ => None,
        }
    }

    pub const fn domain_id(&self) -> Option<&String> {
        match self {
            Self::DomainScope(x) => Some(&x.domain_id),
            _ => None,
        }
    }

    pub const fn domain(&self) -> Option<&Domain> {
        match self {
            Self::DomainScope(x) => x.domain.as_ref(),
            _ => None,
        }
    }

    pub const fn roles(&self) -> Option<&Vec<Role>> {
        match self {
            Self::DomainScope(x) => x.roles.as_ref(),
            Self::ProjectScope(x) => x.roles.as_ref(),
            Self::Unscoped(_) => None,
        }
    }

    /// Whether the token is bound to a project or a domain.
    pub fn is_scoped(&self) -> bool {
        !matches!(self, Self::Unscoped(_))
    }
}

/// Freshly minted token together with its string form.
#[derive(Clone, Debug, PartialEq)]
pub struct IssuedToken {
    /// Value of the `X-Subject-Token` header.
    pub credential: String,
    pub token: Token,
}
