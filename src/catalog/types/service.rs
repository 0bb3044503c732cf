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

#[derive(Builder, Clone, Debug, Default, Deserialize, Serialize, PartialEq, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Service {
    /// The ID of the service.
    #[validate(length(max = 64))]
    pub id: String,
    /// The service type, i.e. `identity` or `compute`.
    #[validate(length(min = 1, max = 255))]
    pub r#type: String,
    /// The service name.
    pub name: String,
    /// Disabled services and their endpoints are not part of the catalog.
    #[builder(default = "true")]
    pub enabled: bool,
}
