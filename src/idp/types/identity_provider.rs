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
use std::fmt;
use validator::Validate;

use crate::error::BuilderError;

/// Identity provider.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct IdentityProvider {
    #[validate(length(min = 1, max = 64))]
    pub id: String,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Name of the identity driver (`sql`, `ldap`, `saml`, ...).
    #[validate(length(min = 1, max = 32))]
    pub driver: String,

    /// Driver template preloading the option defaults.
    #[builder(default)]
    pub template: Option<String>,

    /// Domain the users of a single domain provider land in.
    #[builder(default)]
    pub target_domain_id: Option<String>,

    #[builder(default)]
    pub auto_create_project: bool,

    #[builder(default = "true")]
    pub auto_create_user: bool,

    #[builder(default = "true")]
    pub enabled: bool,

    #[builder(default)]
    pub is_sso: bool,

    #[builder(default)]
    pub is_default: bool,

    #[builder(default)]
    pub sync_status: SyncStatus,

    #[builder(default)]
    pub sync_status_at: Option<DateTime<Utc>>,

    #[builder(default)]
    pub status: IdpHealth,

    #[builder(default)]
    pub error_count: i32,

    #[builder(default)]
    pub sync_interval_seconds: Option<i32>,

    #[builder(default)]
    pub last_sync: Option<DateTime<Utc>>,

    #[builder(default)]
    pub last_sync_end_at: Option<DateTime<Utc>>,

    #[builder(default)]
    pub description: Option<String>,
}

impl IdentityProvider {
    /// Whether a background sync is due at `now`.
    pub fn is_sync_due(&self, now: DateTime<Utc>, default_interval: i64) -> bool {
        let interval = self
            .sync_interval_seconds
            .map(i64::from)
            .unwrap_or(default_interval);
        match self.last_sync {
            None => true,
            Some(last) => (now - last).num_seconds() >= interval,
        }
    }
}

/// Identity provider creation request.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct IdentityProviderCreate {
    /// The ID. A new one is generated when unset.
    #[builder(default)]
    pub id: Option<String>,

    #[validate(length(min = 1, max = 255))]
    pub name: String,

    #[validate(length(min = 1, max = 32))]
    pub driver: String,

    #[builder(default)]
    pub template: Option<String>,

    #[builder(default)]
    pub target_domain_id: Option<String>,

    #[builder(default)]
    pub auto_create_project: bool,

    #[builder(default = "true")]
    pub auto_create_user: bool,

    #[builder(default = "true")]
    pub enabled: bool,

    #[builder(default)]
    pub is_sso: bool,

    #[builder(default)]
    pub is_default: bool,

    #[builder(default)]
    pub sync_interval_seconds: Option<i32>,

    #[builder(default)]
    pub description: Option<String>,
}

/// Synchronization state of the identity provider.
///
/// Moves `idle → queued → syncing → idle`.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Idle,
    Queued,
    Syncing,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Syncing => "syncing",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SyncStatus {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "idle" => Ok(Self::Idle),
            "queued" => Ok(Self::Queued),
            "syncing" => Ok(Self::Syncing),
            other => Err(format!("unknown sync status {other}")),
        }
    }
}

/// Reachability of the identity provider.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IdpHealth {
    #[default]
    Connected,
    Disconnected,
}

impl IdpHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for IdpHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for IdpHealth {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "connected" => Ok(Self::Connected),
            "disconnected" => Ok(Self::Disconnected),
            other => Err(format!("unknown identity provider status {other}")),
        }
    }
}
