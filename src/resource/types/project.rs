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
pub struct Project {
    /// The project ID.
    pub id: String,
    /// The project name.
    pub name: String,
    /// The ID of the domain owning the project.
    pub domain_id: String,
    pub enabled: bool,
    /// The parent project. Top level projects have the domain as the parent.
    #[builder(default)]
    pub parent_id: Option<String>,
    /// The project description.
    #[builder(default)]
    pub description: Option<String>,
}

/// New project.
#[derive(Builder, Clone, Debug, Default, PartialEq)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct ProjectCreate {
    /// Project ID. A new one is generated when unset.
    #[builder(default)]
    pub id: Option<String>,
    pub name: String,
    pub domain_id: String,
    #[builder(default)]
    pub parent_id: Option<String>,
    #[builder(default = "true")]
    pub enabled: bool,
    #[builder(default)]
    pub description: Option<String>,
}

/// Project listing parameters.
#[derive(Builder, Clone, Debug, Default, PartialEq)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct ProjectListParameters {
    /// Filter by the domain.
    #[builder(default)]
    pub domain_id: Option<String>,
    /// Filter by the name.
    #[builder(default)]
    pub name: Option<String>,
    /// Filter by the parent project.
    #[builder(default)]
    pub parent_id: Option<String>,
}
