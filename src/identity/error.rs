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

use thiserror::Error;

use crate::error::{BuilderError, DatabaseError};

#[derive(Error, Debug)]
pub enum IdentityProviderError {
    /// Conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error(transparent)]
    Database { source: DatabaseError },

    #[error("group {0} not found")]
    GroupNotFound(String),

    /// The password does not match any of the recorded hashes.
    #[error("wrong password")]
    InvalidPassword,

    #[error("password hashing error")]
    PasswordHash {
        #[from]
        source: IdentityProviderPasswordHashError,
    },

    /// The matching password has expired.
    #[error("password of the user {0} is expired")]
    PasswordExpired(String),

    /// Structures builder error.
    #[error(transparent)]
    StructBuilder {
        #[from]
        source: BuilderError,
    },

    /// Unsupported driver
    #[error("unsupported driver {0}")]
    UnsupportedDriver(String),

    #[error("user {0} is disabled")]
    UserDisabled(String),

    #[error("either user id or user name with user domain id must be given")]
    UserIdOrNameWithDomain,

    #[error("user {0} not found")]
    UserNotFound(String),

    #[error(transparent)]
    Validation {
        #[from]
        source: validator::ValidationErrors,
    },
}

impl From<DatabaseError> for IdentityProviderError {
    fn from(source: DatabaseError) -> Self {
        match source {
            cfl @ DatabaseError::Conflict { .. } => Self::Conflict(cfl.to_string()),
            other => Self::Database { source: other },
        }
    }
}

/// Password hashing related errors.
#[derive(Error, Debug)]
pub enum IdentityProviderPasswordHashError {
    /// Bcrypt error.
    #[error(transparent)]
    BCrypt {
        #[from]
        source: bcrypt::BcryptError,
    },

    /// Async task join error.
    #[error(transparent)]
    Join {
        #[from]
        source: tokio::task::JoinError,
    },
}
