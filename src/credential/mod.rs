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
//! # Credential store
//!
//! Per user credentials (access keys, TOTP secrets, etc). The blob is
//! encrypted with the credential key ring before it reaches the backend and
//! the identifier of the primary key is stored next to it.
use async_trait::async_trait;
use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::config::Config;
use crate::credential::backend::{CredentialBackend, sql::SqlBackend};
use crate::credential::types::*;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

pub use error::CredentialProviderError;
#[cfg(test)]
pub use mock::MockCredentialProvider;
pub use types::CredentialApi;

#[derive(Clone)]
pub struct CredentialProvider {
    backend_driver: Arc<dyn CredentialBackend>,
}

impl CredentialProvider {
    pub fn new(
        config: &Config,
        plugin_manager: &PluginManager,
    ) -> Result<Self, CredentialProviderError> {
        let backend_driver = if let Some(driver) =
            plugin_manager.get_credential_backend(config.credential_store.driver.clone())
        {
            driver.clone()
        } else {
            match config.credential_store.driver.as_str() {
                "sql" => Arc::new(SqlBackend::default()),
                _ => {
                    return Err(CredentialProviderError::UnsupportedDriver(
                        config.credential_store.driver.clone(),
                    ));
                }
            }
        };
        Ok(Self { backend_driver })
    }
}

/// Decrypt the stored blob.
fn decrypt(
    state: &ServiceState,
    stored: EncryptedCredential,
) -> Result<Credential, CredentialProviderError> {
    let plain = state.key_rings.credential.decrypt(&stored.encrypted_blob)?;
    let blob = String::from_utf8(plain)
        .map_err(|_| CredentialProviderError::BlobEncoding(stored.id.clone()))?;
    Ok(Credential {
        id: stored.id,
        user_id: stored.user_id,
        project_id: stored.project_id,
        r#type: stored.r#type,
        blob: SecretString::from(blob),
        key_hash: stored.key_hash,
        enabled: stored.enabled,
        created_at: stored.created_at,
    })
}

#[async_trait]
impl CredentialApi for CredentialProvider {
    #[tracing::instrument(level = "info", skip(self, state, credential), fields(user_id = %credential.user_id))]
    async fn create_credential(
        &self,
        state: &ServiceState,
        credential: CredentialCreate,
    ) -> Result<Credential, CredentialProviderError> {
        credential.validate()?;
        let ring = &state.key_rings.credential;
        let stored = EncryptedCredential {
            id: credential
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            user_id: credential.user_id.clone(),
            project_id: credential.project_id.clone(),
            r#type: credential.r#type,
            key_hash: ring.primary_key_id()?,
            encrypted_blob: ring.encrypt(credential.blob.expose_secret().as_bytes())?,
            enabled: credential.enabled,
            created_at: Some(Utc::now()),
        };
        let stored = self.backend_driver.create(state, stored).await?;
        decrypt(state, stored)
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_credential<'a>(
        &self,
        state: &ServiceState,
        id: &'a str,
    ) -> Result<Option<Credential>, CredentialProviderError> {
        self.backend_driver
            .get(state, id)
            .await?
            .map(|x| decrypt(state, x))
            .transpose()
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_credentials<'a>(
        &self,
        state: &ServiceState,
        user_id: &'a str,
        r#type: Option<CredentialType>,
    ) -> Result<Vec<Credential>, CredentialProviderError> {
        self.backend_driver
            .list(state, user_id, r#type)
            .await?
            .into_iter()
            .map(|x| decrypt(state, x))
            .collect()
    }
}
