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

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::BuilderError;

/// User record.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct UserResponse {
    /// The user ID.
    #[validate(length(max = 64))]
    pub id: String,

    /// The user name. Must be unique within the owning domain.
    #[validate(length(max = 255))]
    pub name: String,

    /// The ID of the domain.
    #[validate(length(max = 64))]
    pub domain_id: String,

    /// If the user is enabled, this value is true. If the user is disabled,
    /// this value is false.
    pub enabled: bool,

    #[builder(default)]
    pub displayname: Option<String>,

    #[builder(default)]
    pub email: Option<String>,

    #[builder(default)]
    pub mobile: Option<String>,

    /// The ID of the default project for the user. Setting this attribute does
    /// not grant any actual authorization on the project.
    #[builder(default)]
    #[validate(length(max = 64))]
    pub default_project_id: Option<String>,

    /// System accounts are exempt from the password expiry.
    #[builder(default)]
    pub is_system_account: bool,

    /// Time of the last successful authentication.
    #[builder(default)]
    pub last_active_at: Option<DateTime<Utc>>,

    #[builder(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// User creation data.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct UserCreate {
    /// The ID of the user. When unset a new UUID would be assigned.
    #[builder(default)]
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,

    /// The user name. Must be unique within the owning domain.
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// The ID of the domain.
    #[validate(length(min = 1, max = 64))]
    pub domain_id: String,

    #[builder(default = "true")]
    pub enabled: bool,

    #[builder(default)]
    pub displayname: Option<String>,

    #[builder(default)]
    pub email: Option<String>,

    #[builder(default)]
    pub mobile: Option<String>,

    #[builder(default)]
    #[validate(length(min = 1, max = 64))]
    pub default_project_id: Option<String>,

    #[builder(default)]
    pub is_system_account: bool,

    /// User password. Users created without a password are not local and can
    /// only authenticate through an identity provider.
    #[builder(default)]
    pub password: Option<String>,
}

/// User update data. Only the set attributes are changed.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct UserUpdate {
    #[builder(default)]
    #[validate(length(max = 255))]
    pub name: Option<String>,

    #[builder(default)]
    pub enabled: Option<bool>,

    #[builder(default)]
    pub displayname: Option<String>,

    #[builder(default)]
    pub email: Option<String>,

    #[builder(default)]
    pub mobile: Option<String>,

    #[builder(default)]
    #[validate(length(max = 64))]
    pub default_project_id: Option<String>,

    /// New user password.
    #[builder(default)]
    pub password: Option<String>,
}

/// User listing parameters.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct UserListParameters {
    /// Filter users by the domain.
    #[builder(default)]
    pub domain_id: Option<String>,
    /// Filter users by the name attribute.
    #[builder(default)]
    pub name: Option<String>,
}

/// Password authentication request.
///
/// Either the `id` or the `name` together with the `domain_id` identify the
/// user.
#[derive(Builder, Clone, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct UserPasswordAuthRequest {
    #[builder(default)]
    pub id: Option<String>,
    #[builder(default)]
    pub name: Option<String>,
    #[builder(default)]
    pub domain_id: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for UserPasswordAuthRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPasswordAuthRequest")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("domain_id", &self.domain_id)
            .finish_non_exhaustive()
    }
}

/// Origin of a login.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct LoginContext {
    #[builder(default)]
    pub source: Option<String>,
    #[builder(default)]
    pub ip: Option<String>,
}
