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
//! Identity providers API.
use utoipa_axum::{router::OpenApiRouter, routes};

use crate::keystone::ServiceState;

mod sync;

pub(crate) const DESCRIPTION: &str = r#"Identity providers.

Users and groups of the external directories (LDAP) are mirrored into the
local tables by the background sync. The sync can also be triggered on demand.
"#;

pub(crate) fn openapi_router() -> OpenApiRouter<ServiceState> {
    OpenApiRouter::new().routes(routes!(sync::sync))
}
