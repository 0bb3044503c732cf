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

use crate::config::common::default_sql_driver;

/// Identity provider.
#[derive(Debug, Deserialize, Clone)]
pub struct IdentitySection {
    /// Identity provider driver.
    #[serde(default = "default_sql_driver")]
    pub driver: String,

    /// Maximal password length.
    #[serde(default = "default_max_password_length")]
    pub max_password_length: usize,

    /// Default password hashing algorithm.
    #[serde(default)]
    pub password_hashing_algorithm: PasswordHashingAlgo,

    /// Number of bcrypt rounds.
    pub password_hash_rounds: Option<u32>,

    /// Newly set passwords expire after that many days.
    pub password_expires_days: Option<i64>,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            driver: default_sql_driver(),
            max_password_length: default_max_password_length(),
            password_hashing_algorithm: PasswordHashingAlgo::Bcrypt,
            password_hash_rounds: None,
            password_expires_days: None,
        }
    }
}

/// Password hashing algorithm.
#[derive(Debug, Default, Deserialize, Clone)]
pub enum PasswordHashingAlgo {
    /// Bcrypt.
    #[default]
    Bcrypt,
    /// None. Should not be used outside of testing where the stored value is
    /// compared as is.
    #[serde(skip)]
    None,
}

fn default_max_password_length() -> usize {
    4096
}
