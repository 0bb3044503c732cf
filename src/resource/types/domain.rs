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

use crate::error::BuilderError;

#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Domain {
    /// The domain ID.
    pub id: String,
    /// The domain name.
    pub name: String,
    pub enabled: bool,
    /// The resource description
    #[builder(default)]
    pub description: Option<String>,
    /// Driver of the identity provider owning the domain. `None` for the
    /// domains managed locally.
    #[builder(default)]
    pub driver: Option<String>,
    /// Domain content is mirrored from an identity provider and can not be
    /// changed locally.
    #[builder(default)]
    pub readonly: bool,
}

/// New domain.
#[derive(Builder, Clone, Debug, Default, PartialEq)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct DomainCreate {
    /// Domain ID. A new one is generated when unset.
    #[builder(default)]
    pub id: Option<String>,
    pub name: String,
    #[builder(default = "true")]
    pub enabled: bool,
    #[builder(default)]
    pub description: Option<String>,
}
