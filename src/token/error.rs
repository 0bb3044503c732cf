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
//! Token provider errors.

use thiserror::Error;

use crate::error::BuilderError;
use crate::key_ring::KeyRingError;

/// Token provider error.
#[derive(Error, Debug)]
pub enum TokenProviderError {
    /// The user has no roles on the scope of the token.
    #[error("user has no roles on the scope")]
    ActorHasNoRolesOnTarget,

    #[error(transparent)]
    AssignmentProvider {
        /// The source of the error.
        #[from]
        source: crate::assignment::error::AssignmentProviderError,
    },

    /// Authentication information is not valid.
    #[error(transparent)]
    AuthenticationInfo(#[from] crate::auth::AuthenticationError),

    /// Audit id can not be represented in the payload.
    #[error("audit id {0} can not be encoded")]
    AuditIdWrongFormat(String),

    #[error(transparent)]
    CatalogProvider {
        #[from]
        source: crate::catalog::error::CatalogProviderError,
    },

    /// The domain is disabled.
    #[error("domain {0} is disabled")]
    DomainDisabled(String),

    /// The domain of the token does not exist anymore.
    #[error("domain {0} not found")]
    DomainNotFound(String),

    /// Expired token
    #[error("token expired")]
    Expired,

    /// Expired token
    #[error("token expiry calculation failed")]
    ExpiryCalculation,

    #[error(transparent)]
    IdentityProvider {
        #[from]
        source: crate::identity::error::IdentityProviderError,
    },

    /// Fernet envelope can not be decrypted or is malformed.
    #[error("invalid fernet token")]
    InvalidToken,

    /// Unsupported token uuid coding
    #[error("token uuid coding {0:?} is not supported")]
    InvalidTokenUuidMarker(rmp::Marker),

    /// Key ring error.
    #[error(transparent)]
    KeyRing {
        #[from]
        source: KeyRingError,
    },

    #[error(transparent)]
    PolicyProvider {
        #[from]
        source: crate::policy::error::PolicyProviderError,
    },

    /// The project is disabled.
    #[error("project {0} is disabled")]
    ProjectDisabled(String),

    /// The project of the token does not exist anymore.
    #[error("project {0} not found")]
    ProjectNotFound(String),

    #[error(transparent)]
    ResourceProvider {
        #[from]
        source: crate::resource::error::ResourceProviderError,
    },

    /// Revoke Provider error.
    #[error(transparent)]
    RevokeProvider {
        #[from]
        source: crate::revoke::error::RevokeProviderError,
    },

    /// MSGPack decoding.
    #[error("rmp value error")]
    RmpValueRead(#[from] rmp::decode::ValueReadError),

    /// MSGPack encoding.
    #[error("rmp value encoding error")]
    RmpEncode(String),

    /// Structures builder error.
    #[error(transparent)]
    StructBuilder(#[from] BuilderError),

    /// Revoked token
    #[error("token has been revoked")]
    TokenRevoked,

    /// The user is disabled.
    #[error("user {0} is disabled")]
    UserDisabled(String),

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error("unsupported authentication method index {0}")]
    UnsupportedAuthMethod(u8),

    #[error("uuid decoding error")]
    Uuid(#[from] uuid::Error),

    #[error("token validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Payload version does not match the decoded shape.
    #[error("token payload version mismatch")]
    VerMismatch,
}

impl From<std::io::Error> for TokenProviderError {
    fn from(_: std::io::Error) -> Self {
        Self::InvalidToken
    }
}
