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
//! Resource provider types.

pub mod domain;
pub mod project;
pub mod provider_api;

pub use domain::*;
pub use project::*;
pub use provider_api::ResourceApi;

/// ID of the hidden root domain every top level domain is a child of.
pub const ROOT_DOMAIN_ID: &str = "<<keystone.domain.root>>";

/// ID of the default domain.
pub const DEFAULT_DOMAIN_ID: &str = "default";
