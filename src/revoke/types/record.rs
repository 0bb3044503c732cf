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

use crate::error::BuilderError;

/// Method of the tokens minted from another token. Their chain is the parent
/// token.
pub const TOKEN_METHOD: &str = "token";

/// Separator of the audit ids in the stored chain.
pub const AUDIT_ID_SEP: &str = ",";

/// Token cache record.
#[derive(Builder, Clone, Debug, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct TokenRecord {
    /// The token string.
    pub token: String,
    pub expires_at: DateTime<Utc>,
    /// Authentication method the token was issued by.
    pub method: String,
    /// Audit ids of the token or, for tokens minted from another token, the
    /// parent token.
    #[builder(default)]
    pub audit_ids: Vec<String>,
}

impl TokenRecord {
    /// The stored form of the audit chain.
    pub fn chain(&self) -> String {
        self.audit_ids.join(AUDIT_ID_SEP)
    }

    /// Split the stored chain.
    pub fn split_chain(chain: &str) -> Vec<String> {
        chain
            .split(AUDIT_ID_SEP)
            .filter(|x| !x.is_empty())
            .map(String::from)
            .collect()
    }
}
