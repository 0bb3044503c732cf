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

use secrecy::SecretString;
use serde::Deserialize;

/// System administrator and bootstrap names.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminSection {
    /// Name of the system project in the `default` domain.
    #[serde(default = "default_system_project_name")]
    pub system_project_name: String,
    /// Name of the system administrator user.
    #[serde(default = "default_admin_user_name")]
    pub admin_user_name: String,
    #[serde(default = "default_admin_role_name")]
    pub admin_role_name: String,
    #[serde(default = "default_member_role_name")]
    pub member_role_name: String,
    /// Password set for the administrator by `keystone-manage bootstrap`.
    pub admin_password: Option<SecretString>,
}

fn default_system_project_name() -> String {
    "system".into()
}

fn default_admin_user_name() -> String {
    "sysadmin".into()
}

fn default_admin_role_name() -> String {
    "admin".into()
}

fn default_member_role_name() -> String {
    "member".into()
}

impl Default for AdminSection {
    fn default() -> Self {
        Self {
            system_project_name: default_system_project_name(),
            admin_user_name: default_admin_user_name(),
            admin_role_name: default_admin_role_name(),
            member_role_name: default_member_role_name(),
            admin_password: None,
        }
    }
}
