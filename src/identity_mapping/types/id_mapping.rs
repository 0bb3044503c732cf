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

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::BuilderError;

/// Id mapping entity.
///
/// Binds the stable identifier of an entity in the identity provider to the
/// public ID used locally.
#[derive(Builder, Clone, Debug, Deserialize, Eq, Hash, Serialize, PartialEq, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct IdMapping {
    /// The identity provider owning the entity.
    #[validate(length(min = 1, max = 64))]
    pub idp_id: String,
    /// The entity type.
    pub entity_type: IdMappingEntityType,
    /// The ID of the entity in the identity provider.
    #[validate(length(min = 1, max = 255))]
    pub local_id: String,
    /// The public ID of the entity.
    #[validate(length(min = 1, max = 64))]
    pub public_id: String,
}

/// ID mapping entity type.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum IdMappingEntityType {
    Domain,
    Group,
    User,
}

impl IdMappingEntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Group => "group",
            Self::User => "user",
        }
    }
}

impl fmt::Display for IdMappingEntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for IdMappingEntityType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "domain" => Ok(Self::Domain),
            "group" => Ok(Self::Group),
            "user" => Ok(Self::User),
            other => Err(format!("unknown id mapping entity type {other}")),
        }
    }
}
