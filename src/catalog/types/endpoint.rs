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

/// Endpoint interface.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Interface {
    /// Visible by end users on a publicly available network interface.
    #[default]
    Public,
    /// Visible by end users on an unmetered internal network interface.
    Internal,
    /// Visible by administrative users on a secure network interface.
    Admin,
}

impl Interface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Interface {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "public" => Ok(Self::Public),
            "internal" => Ok(Self::Internal),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unsupported endpoint interface {other}")),
        }
    }
}

#[derive(Builder, Clone, Debug, Deserialize, Serialize, PartialEq, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Endpoint {
    /// The ID of the endpoint.
    #[validate(length(max = 64))]
    pub id: String,
    #[builder(default)]
    pub name: Option<String>,
    pub interface: Interface,
    /// The ID of the region that contains the service endpoint.
    #[builder(default)]
    pub region_id: Option<String>,
    /// The ID of the service to which the endpoint belongs.
    pub service_id: String,
    #[validate(url)]
    pub url: String,
    #[builder(default = "true")]
    pub enabled: bool,
}

#[derive(Builder, Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Region {
    pub id: String,
    #[builder(default)]
    pub name: Option<String>,
    #[builder(default)]
    pub description: Option<String>,
    #[builder(default)]
    pub parent_region_id: Option<String>,
}
