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
use validator::Validate;

use crate::error::BuilderError;

/// Domain ID stored for the global roles.
pub const ROLE_NULL_DOMAIN_ID: &str = "<<null>>";

/// Role.
#[derive(Builder, Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Role {
    /// The role ID.
    #[validate(length(max = 64))]
    pub id: String,
    /// The role name.
    #[validate(length(max = 255))]
    pub name: String,
    /// The domain owning the role. Global roles have none.
    #[builder(default)]
    pub domain_id: Option<String>,
    #[builder(default)]
    pub description: Option<String>,
}

/// New role.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct RoleCreate {
    /// Role ID. A new one is generated when unset.
    #[builder(default)]
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[builder(default)]
    pub domain_id: Option<String>,
    #[builder(default)]
    pub description: Option<String>,
}

/// Role listing parameters.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct RoleListParameters {
    /// Filter roles by the domain. Global roles are listed when unset.
    #[builder(default)]
    pub domain_id: Option<String>,
    /// Filter roles by the name.
    #[builder(default)]
    pub name: Option<String>,
}
