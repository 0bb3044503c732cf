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
use crate::key_ring::KeyRingError;

#[derive(Error, Debug)]
pub enum CredentialProviderError {
    /// Conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error(transparent)]
    Database { source: DatabaseError },

    /// Decrypted blob is not a text.
    #[error("credential {0} blob is not valid utf-8")]
    BlobEncoding(String),

    /// Stored credential type is unknown.
    #[error("{0}")]
    CredentialType(String),

    /// Key ring error.
    #[error(transparent)]
    KeyRing {
        #[from]
        source: KeyRingError,
    },

    /// Structures builder error.
    #[error(transparent)]
    StructBuilder {
        #[from]
        source: BuilderError,
    },

    /// Unsupported driver.
    #[error("unsupported driver {0}")]
    UnsupportedDriver(String),

    /// Request validation error.
    #[error("request validation error: {}", source)]
    Validation {
        #[from]
        source: validator::ValidationErrors,
    },
}

impl From<DatabaseError> for CredentialProviderError {
    fn from(source: DatabaseError) -> Self {
        match source {
            cfl @ DatabaseError::Conflict { .. } => Self::Conflict(cfl.to_string()),
            other => Self::Database { source: other },
        }
    }
}
