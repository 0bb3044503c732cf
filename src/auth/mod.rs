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
//! # Authentication and authorization information
//!
//! Result of a successful authentication ([`AuthenticatedInfo`]) and the
//! resolved scope the token is requested for ([`AuthzInfo`]), together with
//! the closed set of authentication failures.

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::identity::types::{Group, UserResponse};
use crate::resource::types::{Domain, Project};
use crate::token::types::{AuthMethod, TokenContext};

/// Authentication failures.
///
/// Every variant is reported to the client as `401 Unauthorized` with a
/// generic message.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    /// Access key is disabled.
    #[error("access key {0} is disabled")]
    AccessKeyDisabled(String),

    /// Access key is past its expiration.
    #[error("access key {0} expired")]
    AccessKeyExpired(String),

    /// Builder error
    #[error("building authentication information: {source}")]
    AuthenticatedInfoBuilder {
        #[from]
        source: AuthenticatedInfoBuilderError,
    },

    /// The domain of the user or of the scope is disabled.
    #[error("domain {0} is disabled")]
    DomainDisabled(String),

    /// Name only login matched more than one user.
    #[error("more than one user named {0}")]
    DuplicateUser(String),

    /// The request carries no usable authentication data.
    #[error("no authentication data in the request")]
    EmptyAuth,

    /// Token expired.
    #[error("token expired")]
    ExpiredToken,

    /// Unknown access key or a credential that is not an access key.
    #[error("invalid access key {0}")]
    InvalidAccessKey(String),

    /// Unsupported authentication method.
    #[error("unsupported authentication method {0}")]
    InvalidAuthMethod(String),

    /// Wrong password or rejected identity provider response.
    #[error("invalid credential")]
    InvalidCredential,

    /// Token can not be decrypted.
    #[error("invalid fernet token")]
    InvalidFernetToken,

    /// Requested project is disabled.
    #[error("project {0} is disabled")]
    ProjectDisabled(String),

    /// Token has been revoked.
    #[error("token has been revoked")]
    TokenRevoked,

    /// Unauthorized
    #[error("The request you have made requires authentication.")]
    Unauthorized,

    /// User is disabled or locked.
    #[error("The account is disabled for user: {0}")]
    UserDisabled(String),

    /// User can not be found.
    #[error("user {0} not found")]
    UserNotFound(String),

    /// User has no roles on the requested scope.
    #[error("user has no roles on the requested scope")]
    UserNotInProject,

    /// Token payload version is not known.
    #[error("token payload version mismatch")]
    VerMismatch,
}

#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(setter(into, strip_option))]
pub struct AuthenticatedInfo {
    /// User id.
    pub user_id: String,

    /// Resolved user object.
    #[builder(default)]
    pub user: Option<UserResponse>,

    /// Resolved user domain information.
    #[builder(default)]
    pub user_domain: Option<Domain>,

    /// Groups of the user.
    #[builder(default)]
    pub user_groups: Vec<Group>,

    /// Authentication method.
    #[builder(default)]
    pub method: AuthMethod,

    /// Audit IDs inherited by the new token.
    #[builder(default)]
    pub audit_ids: Vec<String>,

    /// Token the new token is minted from.
    #[builder(default)]
    pub parent_token: Option<String>,

    /// Upper bound of the new token expiration.
    #[builder(default)]
    pub expires_at: Option<DateTime<Utc>>,

    /// Origin of the request.
    #[builder(default)]
    pub context: Option<TokenContext>,

    /// Identity provider that authenticated the user.
    #[builder(default)]
    pub idp_id: Option<String>,
}

impl AuthenticatedInfo {
    pub fn builder() -> AuthenticatedInfoBuilder {
        AuthenticatedInfoBuilder::default()
    }

    /// Validate the authentication information
    ///
    /// - User attribute must be set
    /// - User must be enabled
    /// - User object id must match user_id
    /// - User domain, when resolved, must be enabled
    pub fn validate(&self) -> Result<(), AuthenticationError> {
        if let Some(user) = &self.user {
            if user.id != self.user_id {
                warn!(
                    "User data does not match the user_id attribute: {} vs {}",
                    self.user_id, user.id
                );
                return Err(AuthenticationError::Unauthorized);
            }
            if !user.enabled {
                return Err(AuthenticationError::UserDisabled(self.user_id.clone()));
            }
        } else {
            warn!(
                "User data must be resolved in the AuthenticatedInfo before validating: {:?}",
                self
            );
            return Err(AuthenticationError::Unauthorized);
        }
        if let Some(domain) = &self.user_domain
            && !domain.enabled
        {
            return Err(AuthenticationError::DomainDisabled(domain.id.clone()));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum AuthzInfo {
    /// Unscoped
    Unscoped,
    /// Project scope
    Project(Project),
    /// Domain scope
    Domain(Domain),
}

impl AuthzInfo {
    /// Validate the authorization information
    ///
    /// - Unscoped: always valid
    /// - Project: check if the project is enabled
    /// - Domain: check if the domain is enabled
    pub fn validate(&self) -> Result<(), AuthenticationError> {
        match self {
            AuthzInfo::Unscoped => {}
            AuthzInfo::Project(project) => {
                if !project.enabled {
                    return Err(AuthenticationError::ProjectDisabled(project.id.clone()));
                }
            }
            AuthzInfo::Domain(domain) => {
                if !domain.enabled {
                    return Err(AuthenticationError::DomainDisabled(domain.id.clone()));
                }
            }
        }
        Ok(())
    }
}
