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

/// Token provider.
#[derive(Debug, Deserialize, Clone)]
pub struct TokenSection {
    /// Token provider driver.
    #[serde(default)]
    pub provider: TokenProviderDriver,
    /// The amount of time that a token should remain valid (in seconds).
    #[serde(default = "default_token_expiration")]
    pub expiration: u64,
    /// Capacity of the in-memory cache of verified tokens.
    #[serde(default = "default_cache_size")]
    pub cache_size: u64,
}

fn default_token_expiration() -> u64 {
    86400
}

fn default_cache_size() -> u64 {
    2048
}

impl Default for TokenSection {
    fn default() -> Self {
        Self {
            provider: TokenProviderDriver::Fernet,
            expiration: default_token_expiration(),
            cache_size: default_cache_size(),
        }
    }
}

/// Token provider driver.
#[derive(Debug, Default, Deserialize, Clone)]
pub enum TokenProviderDriver {
    /// Fernet.
    #[default]
    #[serde(rename = "fernet")]
    Fernet,
}
