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
//! Resource provider errors.
use thiserror::Error;

use crate::error::{BuilderError, DatabaseError};

#[derive(Error, Debug)]
pub enum ResourceProviderError {
    /// Assignment provider error.
    #[error(transparent)]
    AssignmentProvider {
        source: Box<crate::assignment::error::AssignmentProviderError>,
    },

    /// Conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error(transparent)]
    Database { source: DatabaseError },

    #[error("domain {0} not found")]
    DomainNotFound(String),

    /// Identity provider error.
    #[error(transparent)]
    IdentityProvider {
        source: Box<crate::identity::error::IdentityProviderError>,
    },

    /// IdP provider error.
    #[error(transparent)]
    IdpProvider {
        source: Box<crate::idp::error::IdpProviderError>,
    },

    #[error("project {0} not found")]
    ProjectNotFound(String),

    /// Project can not be deleted.
    #[error("project {0} can not be deleted: {1}")]
    ProjectNotDeletable(String, String),

    /// The root domain can not be modified.
    #[error("the root domain is immutable")]
    RootDomainImmutable,

    /// Structures builder error.
    #[error(transparent)]
    StructBuilder {
        #[from]
        source: BuilderError,
    },

    /// Unsupported driver.
    #[error("unsupported driver {0}")]
    UnsupportedDriver(String),
}

impl From<DatabaseError> for ResourceProviderError {
    fn from(source: DatabaseError) -> Self {
        match source {
            cfl @ DatabaseError::Conflict { .. } => Self::Conflict(cfl.to_string()),
            other => Self::Database { source: other },
        }
    }
}

impl From<crate::assignment::error::AssignmentProviderError> for ResourceProviderError {
    fn from(source: crate::assignment::error::AssignmentProviderError) -> Self {
        Self::AssignmentProvider {
            source: Box::new(source),
        }
    }
}

impl From<crate::identity::error::IdentityProviderError> for ResourceProviderError {
    fn from(source: crate::identity::error::IdentityProviderError) -> Self {
        Self::IdentityProvider {
            source: Box::new(source),
        }
    }
}

impl From<crate::idp::error::IdpProviderError> for ResourceProviderError {
    fn from(source: crate::idp::error::IdpProviderError) -> Self {
        Self::IdpProvider {
            source: Box::new(source),
        }
    }
}
