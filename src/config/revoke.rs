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

/// Token cache and revocation configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct RevokeSection {
    #[serde(default = "default_sql_driver")]
    pub driver: String,
    /// Interval (in seconds) of the expired records sweeper.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Records whose token expired more than that many seconds ago are
    /// purged.
    #[serde(default = "default_retention")]
    pub retention: i64,
}

fn default_cleanup_interval() -> u64 {
    3600
}

fn default_retention() -> i64 {
    86400
}

impl Default for RevokeSection {
    fn default() -> Self {
        Self {
            driver: default_sql_driver(),
            cleanup_interval: default_cleanup_interval(),
            retention: default_retention(),
        }
    }
}
