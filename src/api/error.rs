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
//! # Keystone API error.
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::assignment::error::AssignmentProviderError;
use crate::auth::AuthenticationError;
use crate::catalog::error::CatalogProviderError;
use crate::credential::CredentialProviderError;
use crate::error::BuilderError;
use crate::identity::error::IdentityProviderError;
use crate::identity_mapping::error::IdentityMappingProviderError;
use crate::idp::IdpProviderError;
use crate::policy::PolicyProviderError;
use crate::resource::error::ResourceProviderError;
use crate::revoke::error::RevokeProviderError;
use crate::token::error::TokenProviderError;

/// Keystone API operation errors
#[derive(Debug, Error)]
pub enum KeystoneApiError {
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("could not find {resource}: {identifier}")]
    NotFound {
        resource: String,
        identifier: String,
    },

    #[error("{0}.")]
    BadRequest(String),

    #[error("{}", .0.clone().unwrap_or("The request you have made requires authentication.".to_string()))]
    Unauthorized(Option<String>),

    #[error("You are not authorized to perform the requested action.")]
    Forbidden,

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("missing x-subject-token header")]
    SubjectTokenMissing,

    #[error("invalid header")]
    InvalidHeader,

    #[error("internal server error: {0}")]
    InternalError(String),

    #[error(transparent)]
    AssignmentError {
        #[from]
        source: AssignmentProviderError,
    },

    #[error(transparent)]
    CatalogError {
        #[from]
        source: CatalogProviderError,
    },

    #[error(transparent)]
    CredentialError {
        #[from]
        source: CredentialProviderError,
    },

    #[error(transparent)]
    IdentityError { source: IdentityProviderError },

    #[error(transparent)]
    IdentityMappingError {
        #[from]
        source: IdentityMappingProviderError,
    },

    #[error(transparent)]
    IdpError { source: IdpProviderError },

    #[error(transparent)]
    Policy {
        #[from]
        source: PolicyProviderError,
    },

    #[error(transparent)]
    ResourceError {
        #[from]
        source: ResourceProviderError,
    },

    /// Revoke provider error.
    #[error(transparent)]
    RevokeProvider {
        /// The source of the error.
        #[from]
        source: RevokeProviderError,
    },

    #[error(transparent)]
    TokenError { source: TokenProviderError },

    #[error(transparent)]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },

    #[error("domain id or name must be present")]
    DomainIdOrName,

    #[error("project id or name must be present")]
    ProjectIdOrName,

    #[error("project domain must be present")]
    ProjectDomain,

    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),

    /// Request validation error.
    #[error("request validation failed: {source}")]
    Validator {
        /// The source of the error.
        #[from]
        source: validator::ValidationErrors,
    },
}

impl IntoResponse for KeystoneApiError {
    fn into_response(self) -> Response {
        let status_code = match self {
            KeystoneApiError::Conflict(_) => StatusCode::CONFLICT,
            KeystoneApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            KeystoneApiError::Unauthorized(..) => StatusCode::UNAUTHORIZED,
            KeystoneApiError::Forbidden => StatusCode::FORBIDDEN,
            KeystoneApiError::ServiceUnavailable(..) => StatusCode::SERVICE_UNAVAILABLE,
            KeystoneApiError::InternalError(_)
            | KeystoneApiError::AssignmentError { .. }
            | KeystoneApiError::CatalogError { .. }
            | KeystoneApiError::CredentialError { .. }
            | KeystoneApiError::IdentityError { .. }
            | KeystoneApiError::IdentityMappingError { .. }
            | KeystoneApiError::IdpError { .. }
            | KeystoneApiError::Policy { .. }
            | KeystoneApiError::ResourceError { .. }
            | KeystoneApiError::TokenError { .. }
            | KeystoneApiError::RevokeProvider { .. }
            | KeystoneApiError::Serde { .. }
            | KeystoneApiError::UrlParse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            KeystoneApiError::BadRequest(..)
            | KeystoneApiError::SubjectTokenMissing
            | KeystoneApiError::InvalidHeader
            | KeystoneApiError::DomainIdOrName
            | KeystoneApiError::ProjectIdOrName
            | KeystoneApiError::ProjectDomain
            | KeystoneApiError::JsonExtractorRejection(..)
            | KeystoneApiError::Validator { .. } => StatusCode::BAD_REQUEST,
        };
        if status_code.is_server_error() {
            error!("Error happened during request processing: {:#?}", self);
        } else {
            info!("Request rejected: {}", self);
        }

        (
            status_code,
            Json(json!({"error": {"code": status_code.as_u16(), "message": self.to_string()}})),
        )
            .into_response()
    }
}

impl From<AuthenticationError> for KeystoneApiError {
    fn from(value: AuthenticationError) -> Self {
        match value {
            AuthenticationError::AuthenticatedInfoBuilder { source } => {
                KeystoneApiError::InternalError(source.to_string())
            }
            other => {
                // The client only learns that the authentication failed.
                info!("authentication failed: {other}");
                KeystoneApiError::Unauthorized(None)
            }
        }
    }
}

impl From<BuilderError> for KeystoneApiError {
    fn from(value: BuilderError) -> Self {
        Self::InternalError(value.to_string())
    }
}

impl From<IdentityProviderError> for KeystoneApiError {
    fn from(value: IdentityProviderError) -> Self {
        match value {
            IdentityProviderError::UserNotFound(x) => Self::NotFound {
                resource: "user".into(),
                identifier: x,
            },
            IdentityProviderError::GroupNotFound(x) => Self::NotFound {
                resource: "group".into(),
                identifier: x,
            },
            IdentityProviderError::InvalidPassword | IdentityProviderError::PasswordExpired(_) => {
                AuthenticationError::InvalidCredential.into()
            }
            IdentityProviderError::UserDisabled(x) => AuthenticationError::UserDisabled(x).into(),
            IdentityProviderError::UserIdOrNameWithDomain => {
                Self::BadRequest("user id or name with the domain must be present".into())
            }
            _ => Self::IdentityError { source: value },
        }
    }
}

impl From<IdpProviderError> for KeystoneApiError {
    fn from(value: IdpProviderError) -> Self {
        match value {
            IdpProviderError::NotFound(x) => Self::NotFound {
                resource: "identity provider".into(),
                identifier: x,
            },
            IdpProviderError::NotIdle(x) => {
                Self::Conflict(format!("identity provider {x} is not idle"))
            }
            IdpProviderError::QueueFull(x) => {
                Self::ServiceUnavailable(format!("identity provider {x} can not be queued"))
            }
            IdpProviderError::DriverUnsupportedOperation { driver, operation } => {
                Self::BadRequest(format!("driver {driver} does not support {operation}"))
            }
            IdpProviderError::IdentityProvider { source } => source.into(),
            IdpProviderError::Unauthenticated | IdpProviderError::Assertion(_) => {
                AuthenticationError::InvalidCredential.into()
            }
            IdpProviderError::Disabled(x) => {
                AuthenticationError::InvalidAuthMethod(format!("identity provider {x}")).into()
            }
            _ => Self::IdpError { source: value },
        }
    }
}

impl From<TokenProviderError> for KeystoneApiError {
    fn from(value: TokenProviderError) -> Self {
        match value {
            TokenProviderError::AuthenticationInfo(source) => source.into(),
            TokenProviderError::Expired => AuthenticationError::ExpiredToken.into(),
            TokenProviderError::InvalidToken
            | TokenProviderError::InvalidTokenUuidMarker(_)
            | TokenProviderError::RmpValueRead(_)
            | TokenProviderError::UnsupportedAuthMethod(_)
            | TokenProviderError::Uuid(_) => AuthenticationError::InvalidFernetToken.into(),
            TokenProviderError::VerMismatch => AuthenticationError::VerMismatch.into(),
            TokenProviderError::TokenRevoked => AuthenticationError::TokenRevoked.into(),
            TokenProviderError::ActorHasNoRolesOnTarget => {
                AuthenticationError::UserNotInProject.into()
            }
            TokenProviderError::UserDisabled(x) => AuthenticationError::UserDisabled(x).into(),
            TokenProviderError::UserNotFound(x) => AuthenticationError::UserNotFound(x).into(),
            TokenProviderError::DomainDisabled(x) | TokenProviderError::DomainNotFound(x) => {
                AuthenticationError::DomainDisabled(x).into()
            }
            TokenProviderError::ProjectDisabled(x) | TokenProviderError::ProjectNotFound(x) => {
                AuthenticationError::ProjectDisabled(x).into()
            }
            TokenProviderError::KeyRing { .. } => AuthenticationError::InvalidFernetToken.into(),
            _ => Self::TokenError { source: value },
        }
    }
}
