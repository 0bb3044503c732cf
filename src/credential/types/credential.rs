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
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::error::BuilderError;

/// Credential type.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    Aksk,
    Totp,
    RecoverySecret,
    Oidc,
    EncKey,
    ContainerImage,
}

impl CredentialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aksk => "aksk",
            Self::Totp => "totp",
            Self::RecoverySecret => "recovery_secret",
            Self::Oidc => "oidc",
            Self::EncKey => "enc_key",
            Self::ContainerImage => "container_image",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CredentialType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "aksk" => Ok(Self::Aksk),
            "totp" => Ok(Self::Totp),
            "recovery_secret" => Ok(Self::RecoverySecret),
            "oidc" => Ok(Self::Oidc),
            "enc_key" => Ok(Self::EncKey),
            "container_image" => Ok(Self::ContainerImage),
            other => Err(format!("unsupported credential type {other}")),
        }
    }
}

/// Credential with the decrypted blob.
#[derive(Builder, Clone, Debug, Deserialize, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Credential {
    pub id: String,
    pub user_id: String,
    #[builder(default)]
    pub project_id: Option<String>,
    pub r#type: CredentialType,
    /// The plain text of the blob.
    #[serde(skip_serializing)]
    pub blob: SecretString,
    /// Identifier of the key the blob was encrypted with.
    pub key_hash: String,
    #[builder(default = "true")]
    pub enabled: bool,
    #[builder(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Blob of the access key credential.
#[derive(Clone, Debug, Deserialize)]
pub struct AccessKeySecret {
    /// Shared secret the requests are signed with.
    pub secret: SecretString,
    /// Expiration, the key never expires when unset.
    #[serde(default)]
    pub expire: Option<DateTime<Utc>>,
}

impl AccessKeySecret {
    /// Whether the key is usable at the given time.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.secret.expose_secret().is_empty() && self.expire.is_none_or(|x| x > now)
    }
}

/// New credential.
#[derive(Builder, Clone, Debug, Deserialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct CredentialCreate {
    /// Credential ID. A new one is generated when unset.
    #[builder(default)]
    #[validate(length(min = 1, max = 64))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub user_id: String,
    #[builder(default)]
    pub project_id: Option<String>,
    pub r#type: CredentialType,
    pub blob: SecretString,
    #[builder(default = "true")]
    pub enabled: bool,
}

/// Credential as persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct EncryptedCredential {
    pub id: String,
    pub user_id: String,
    pub project_id: Option<String>,
    pub r#type: CredentialType,
    pub key_hash: String,
    pub encrypted_blob: String,
    pub enabled: bool,
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn test_access_key_secret_validity() {
        let now = Utc::now();
        let secret: AccessKeySecret = serde_json::from_str(r#"{"secret": "s3cr3t"}"#).unwrap();
        assert!(secret.is_valid_at(now));

        let secret = AccessKeySecret {
            expire: Some(now - TimeDelta::seconds(1)),
            ..secret
        };
        assert!(!secret.is_valid_at(now));

        let empty: AccessKeySecret = serde_json::from_str(r#"{"secret": ""}"#).unwrap();
        assert!(!empty.is_valid_at(now));
    }
}
