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

use serde::Deserialize;

/// Global LDAP defaults. Individual IdPs may override them in their own
/// options.
#[derive(Debug, Deserialize, Clone)]
pub struct LdapSection {
    #[serde(default = "default_page_size")]
    pub page_size: i32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_page_size() -> i32 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LdapSection {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
