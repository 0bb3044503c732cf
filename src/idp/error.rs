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
//! Identity provider errors.
use thiserror::Error;

use crate::assignment::error::AssignmentProviderError;
use crate::error::{BuilderError, DatabaseError};
use crate::identity::error::IdentityProviderError;
use crate::identity_mapping::error::IdentityMappingProviderError;
use crate::key_ring::KeyRingError;
use crate::resource::error::ResourceProviderError;

#[derive(Error, Debug)]
pub enum IdpProviderError {
    /// Assignment provider error.
    #[error(transparent)]
    AssignmentProvider {
        #[from]
        source: AssignmentProviderError,
    },

    /// The sync was interrupted by the shutdown.
    #[error("sync of the identity provider {0} was cancelled")]
    Cancelled(String),

    /// Stored option value is not valid.
    #[error("invalid value of the option {group}.{option}")]
    ConfigValue { group: String, option: String },

    /// Conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error(transparent)]
    Database { source: DatabaseError },

    /// The driver allows a single identity provider only.
    #[error("only one identity provider with the driver {0} is allowed")]
    DriverSingleton(String),

    /// The driver does not implement the operation.
    #[error("driver {driver} does not support {operation}")]
    DriverUnsupportedOperation { driver: String, operation: String },

    /// The identity provider is disabled.
    #[error("identity provider {0} is disabled")]
    Disabled(String),

    /// HTTP client error.
    #[error(transparent)]
    Http {
        #[from]
        source: reqwest::Error,
    },

    /// Identity provider error.
    #[error(transparent)]
    IdentityProvider {
        #[from]
        source: IdentityProviderError,
    },

    /// Identity mapping provider error.
    #[error(transparent)]
    IdentityMappingProvider {
        #[from]
        source: IdentityMappingProviderError,
    },

    /// Json serialization error.
    #[error(transparent)]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Key ring error.
    #[error(transparent)]
    KeyRing {
        #[from]
        source: KeyRingError,
    },

    /// LDAP protocol error.
    #[error("ldap error: {0}")]
    Ldap(String),

    /// Option required by the driver is not set.
    #[error("option {group}.{option} is required")]
    MissingOption { group: String, option: String },

    /// Identity provider not found.
    #[error("identity provider {0} not found")]
    NotFound(String),

    /// Identity provider is not idle.
    #[error("identity provider {0} is busy")]
    NotIdle(String),

    /// The sync queue is full.
    #[error("sync queue is full, identity provider {0} is not queued")]
    QueueFull(String),

    /// OAuth2 or OpenID Connect exchange failed.
    #[error("oauth2 error: {0}")]
    OAuth2(String),

    /// Resource provider error.
    #[error(transparent)]
    ResourceProvider {
        #[from]
        source: ResourceProviderError,
    },

    /// SAML or CAS document is not acceptable.
    #[error("assertion error: {0}")]
    Assertion(String),

    /// Stored status is unknown.
    #[error("{0}")]
    Status(String),

    /// Structures builder error.
    #[error(transparent)]
    StructBuilder {
        #[from]
        source: BuilderError,
    },

    /// Identity provider did not confirm the identity.
    #[error("the identity was not confirmed by the identity provider")]
    Unauthenticated,

    /// Unsupported driver.
    #[error("unsupported driver {0}")]
    UnsupportedDriver(String),

    /// Url parsing error.
    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },

    /// Request validation error.
    #[error("request validation error: {}", source)]
    Validation {
        #[from]
        source: validator::ValidationErrors,
    },

    /// XML document error.
    #[error(transparent)]
    Xml {
        #[from]
        source: quick_xml::Error,
    },
}

impl From<DatabaseError> for IdpProviderError {
    fn from(source: DatabaseError) -> Self {
        match source {
            cfl @ DatabaseError::Conflict { .. } => Self::Conflict(cfl.to_string()),
            other => Self::Database { source: other },
        }
    }
}

impl From<ldap3::LdapError> for IdpProviderError {
    fn from(source: ldap3::LdapError) -> Self {
        Self::Ldap(source.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for IdpProviderError {
    fn from(source: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml {
            source: source.into(),
        }
    }
}

impl From<base64::DecodeError> for IdpProviderError {
    fn from(source: base64::DecodeError) -> Self {
        Self::Assertion(source.to_string())
    }
}
