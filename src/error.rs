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
//! # Error
//!
//! Errors that can occur during the Keystone processing (not the API).
use sea_orm::SqlErr;
use thiserror::Error;

use crate::assignment::error::AssignmentProviderError;
use crate::catalog::error::CatalogProviderError;
use crate::credential::error::CredentialProviderError;
use crate::identity::error::IdentityProviderError;
use crate::identity_mapping::error::IdentityMappingProviderError;
use crate::idp::error::IdpProviderError;
use crate::key_ring::KeyRingError;
use crate::policy::error::PolicyProviderError;
use crate::resource::error::ResourceProviderError;
use crate::revoke::error::RevokeProviderError;
use crate::token::TokenProviderError;

/// Keystone error.
#[derive(Debug, Error)]
pub enum KeystoneError {
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
    IdentityError {
        #[from]
        source: IdentityProviderError,
    },

    #[error(transparent)]
    IdentityMappingError {
        #[from]
        source: IdentityMappingProviderError,
    },

    #[error(transparent)]
    IdpError {
        #[from]
        source: IdpProviderError,
    },

    #[error(transparent)]
    IO {
        #[from]
        source: std::io::Error,
    },

    #[error(transparent)]
    KeyRing {
        #[from]
        source: KeyRingError,
    },

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
    TokenProvider {
        #[from]
        source: TokenProviderError,
    },

    /// Json serialization error.
    #[error("json serde error: {}", source)]
    JsonError {
        /// The source of the error.
        #[from]
        source: serde_json::Error,
    },

    /// Url parsing error
    #[error(transparent)]
    UrlParse {
        #[from]
        source: url::ParseError,
    },
}

/// Builder error.
///
/// Used by the `derive_builder` generated builders of the provider types.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BuilderError {
    /// Uninitialized field.
    #[error("{0}")]
    UninitializedField(String),
    /// Custom validation error.
    #[error("{0}")]
    Validation(String),
}

impl From<String> for BuilderError {
    fn from(s: String) -> Self {
        Self::Validation(s)
    }
}

impl From<derive_builder::UninitializedFieldError> for BuilderError {
    fn from(ufe: derive_builder::UninitializedFieldError) -> Self {
        Self::UninitializedField(ufe.to_string())
    }
}

/// Database error shared by the sql backends.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Unique or foreign key constraint violation.
    #[error("{message}")]
    Conflict { message: String, context: String },

    /// Other SQL error.
    #[error("{message}")]
    Sql { message: String, context: String },

    /// Database error
    #[error("Database error while {context}")]
    Database {
        source: sea_orm::DbErr,
        context: String,
    },
}

/// Convert the DB error into the [DatabaseError] with the context information.
pub fn db_err(e: sea_orm::DbErr, context: &str) -> DatabaseError {
    e.sql_err().map_or_else(
        || DatabaseError::Database {
            source: e,
            context: context.to_string(),
        },
        |err| match err {
            SqlErr::UniqueConstraintViolation(descr) => DatabaseError::Conflict {
                message: descr.to_string(),
                context: context.to_string(),
            },
            SqlErr::ForeignKeyConstraintViolation(descr) => DatabaseError::Conflict {
                message: descr.to_string(),
                context: context.to_string(),
            },
            other => DatabaseError::Sql {
                message: other.to_string(),
                context: context.to_string(),
            },
        },
    )
}

/// Attach the operation context to the database errors.
pub trait DbContextExt<T> {
    fn context(self, context: &str) -> Result<T, DatabaseError>;
}

impl<T> DbContextExt<T> for Result<T, sea_orm::DbErr> {
    fn context(self, context: &str) -> Result<T, DatabaseError> {
        self.map_err(|e| db_err(e, context))
    }
}
