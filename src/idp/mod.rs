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
//! # Identity provider
//!
//! An identity provider (IdP) is an external source of users: an LDAP
//! directory, a SAML, OpenID Connect, OAuth2 or CAS server, or the local
//! password store. Every IdP is served by a driver picked by its name and
//! configured with the options stored in the config tables. Options that
//! hold secrets are encrypted with the credential key ring.
//!
//! Directory drivers are mirrored into the local tables by the background
//! [sync], the single sign-on drivers create the users on their first login
//! through the attribute [mapper].
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

pub mod backend;
pub mod driver;
pub mod error;
pub mod linkage;
pub mod mapper;
#[cfg(test)]
mod mock;
pub mod sync;
pub mod types;

use crate::config::Config;
use crate::identity_mapping::IdentityMappingApi;
use crate::idp::backend::{IdpBackend, sql::SqlBackend};
use crate::idp::driver::{DriverRegistry, IdentityDriver, driver_class};
use crate::idp::types::*;
use crate::keystone::ServiceState;
use crate::plugin_manager::PluginManager;

pub use error::IdpProviderError;
#[cfg(test)]
pub use mock::MockIdpProvider;
pub use types::IdpApi;

#[derive(Clone)]
pub struct IdpProvider {
    backend_driver: Arc<dyn IdpBackend>,
    registry: DriverRegistry,
}

impl IdpProvider {
    pub fn new(config: &Config, plugin_manager: &PluginManager) -> Result<Self, IdpProviderError> {
        let backend_driver =
            if let Some(driver) = plugin_manager.get_idp_backend(config.idp.driver.clone()) {
                driver.clone()
            } else {
                match config.idp.driver.as_str() {
                    "sql" => Arc::new(SqlBackend::default()),
                    _ => {
                        return Err(IdpProviderError::UnsupportedDriver(
                            config.idp.driver.clone(),
                        ));
                    }
                }
            };
        let mut registry = DriverRegistry::default();
        for (name, factory) in plugin_manager.get_identity_drivers() {
            registry.register(name, factory.clone());
        }
        Ok(Self {
            backend_driver,
            registry,
        })
    }
}

/// Split the options into the plain ones and the encrypted sensitive ones.
fn seal_config(
    state: &ServiceState,
    driver: &str,
    config: &IdpConfig,
) -> Result<(IdpConfig, IdpConfig), IdpProviderError> {
    let mut whitelisted = IdpConfig::default();
    let mut sensitive = IdpConfig::default();
    for (group, option, value) in config.iter() {
        if is_sensitive_option(driver, group, option) {
            let ciphertext = state
                .key_rings
                .credential
                .encrypt(serde_json::to_string(value)?.as_bytes())?;
            sensitive.set(group.clone(), option.clone(), ciphertext);
        } else {
            whitelisted.set(group.clone(), option.clone(), value.clone());
        }
    }
    Ok((whitelisted, sensitive))
}

/// Decrypt the sensitive options and merge them into the plain ones.
fn open_config(
    state: &ServiceState,
    mut whitelisted: IdpConfig,
    sensitive: IdpConfig,
) -> Result<IdpConfig, IdpProviderError> {
    for (group, option, value) in sensitive.iter() {
        let broken = || IdpProviderError::ConfigValue {
            group: group.clone(),
            option: option.clone(),
        };
        let ciphertext = value.as_str().ok_or_else(broken)?;
        let plain = state.key_rings.credential.decrypt(ciphertext)?;
        let value: Value = serde_json::from_slice(&plain).map_err(|_| broken())?;
        whitelisted.set(group.clone(), option.clone(), value);
    }
    Ok(whitelisted)
}

#[async_trait]
impl IdpApi for IdpProvider {
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError> {
        self.backend_driver.get(state, idp_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn list_idps(
        &self,
        state: &ServiceState,
    ) -> Result<Vec<IdentityProvider>, IdpProviderError> {
        self.backend_driver.list(state).await
    }

    /// Register the identity provider.
    ///
    /// Drivers of the singleton class accept one identity provider only.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn create_idp(
        &self,
        state: &ServiceState,
        idp: IdentityProviderCreate,
    ) -> Result<IdentityProvider, IdpProviderError> {
        idp.validate()?;
        let class = driver_class(&idp.driver)
            .ok_or_else(|| IdpProviderError::UnsupportedDriver(idp.driver.clone()))?;
        if class.singleton
            && self
                .backend_driver
                .list(state)
                .await?
                .iter()
                .any(|existing| existing.driver == idp.driver)
        {
            return Err(IdpProviderError::DriverSingleton(idp.driver.clone()));
        }
        let new = IdentityProvider {
            id: idp
                .id
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
            name: idp.name,
            driver: idp.driver,
            template: idp.template,
            target_domain_id: idp.target_domain_id,
            auto_create_project: idp.auto_create_project,
            auto_create_user: idp.auto_create_user,
            enabled: idp.enabled,
            is_sso: idp.is_sso,
            is_default: idp.is_default,
            sync_interval_seconds: idp.sync_interval_seconds,
            description: idp.description,
            sync_status_at: Some(Utc::now()),
            ..Default::default()
        };
        new.validate()?;
        self.backend_driver.create(state, new).await
    }

    /// Remove the identity provider, its options and the id mappings. The
    /// linked users, groups and domains stay.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn delete_idp<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<(), IdpProviderError> {
        if self.backend_driver.get(state, idp_id).await?.is_none() {
            return Err(IdpProviderError::NotFound(idp_id.to_string()));
        }
        state
            .provider
            .get_identity_mapping_provider()
            .delete_by_idp(state, idp_id)
            .await?;
        self.backend_driver.delete(state, idp_id).await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn find_idp_for_domain<'a>(
        &self,
        state: &ServiceState,
        domain_id: &'a str,
    ) -> Result<Option<IdentityProvider>, IdpProviderError> {
        self.backend_driver
            .find_by_target_domain(state, domain_id)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn get_idp_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
    ) -> Result<IdpConfig, IdpProviderError> {
        let (whitelisted, sensitive) = self.backend_driver.get_config(state, idp_id).await?;
        open_config(state, whitelisted, sensitive)
    }

    #[tracing::instrument(level = "info", skip(self, state, config))]
    async fn set_idp_config<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        config: &IdpConfig,
    ) -> Result<(), IdpProviderError> {
        let idp = self
            .backend_driver
            .get(state, idp_id)
            .await?
            .ok_or_else(|| IdpProviderError::NotFound(idp_id.to_string()))?;
        let (whitelisted, sensitive) = seal_config(state, &idp.driver, config)?;
        self.backend_driver
            .set_config(state, idp_id, &whitelisted, &sensitive)
            .await
    }

    /// Move the sync status. Queueing is also allowed from a state that did
    /// not change for longer than `[idp_sync] stuck_timeout`.
    #[tracing::instrument(level = "info", skip(self, state))]
    async fn transition_sync_status<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        from: SyncStatus,
        to: SyncStatus,
    ) -> Result<bool, IdpProviderError> {
        let stuck_before = match (from, to) {
            (SyncStatus::Idle, SyncStatus::Queued) => {
                Some(Utc::now() - TimeDelta::seconds(state.config.idp_sync.stuck_timeout))
            }
            _ => None,
        };
        self.backend_driver
            .transition_sync_status(state, idp_id, from, to, stuck_before)
            .await
    }

    #[tracing::instrument(level = "info", skip(self, state))]
    async fn set_health<'a>(
        &self,
        state: &ServiceState,
        idp_id: &'a str,
        health: IdpHealth,
    ) -> Result<(), IdpProviderError> {
        self.backend_driver.set_health(state, idp_id, health).await
    }

    #[tracing::instrument(level = "info", skip(self, state, idp), fields(idp_id = %idp.id))]
    async fn get_driver(
        &self,
        state: &ServiceState,
        idp: &IdentityProvider,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        let options = self.get_idp_config(state, &idp.id).await?;
        self.registry.build(idp, &options, &state.config)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::provider::Provider;
    use crate::tests::get_state;

    #[test]
    fn test_seal_and_open_config() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let mut config = IdpConfig::default();
        config
            .set("ldap", "url", "ldap://dir")
            .set("ldap", "password", "secret")
            .set("ldap", "page_size", json!(100));

        let (whitelisted, sensitive) = seal_config(&state, "ldap", &config).unwrap();
        assert!(whitelisted.get("ldap", "password").is_none());
        assert_eq!(Some(&json!(100)), whitelisted.get("ldap", "page_size"));
        let ciphertext = sensitive.get_str("ldap", "password").unwrap();
        assert_ne!("secret", ciphertext);

        let merged = open_config(&state, whitelisted, sensitive).unwrap();
        assert_eq!(config, merged);
    }

    #[test]
    fn test_open_config_foreign_key() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let other = crate::key_ring::KeyRing::generate(1).unwrap();
        let mut sensitive = IdpConfig::default();
        sensitive.set("oidc", "client_secret", other.encrypt(b"\"x\"").unwrap());
        assert!(matches!(
            open_config(&state, IdpConfig::default(), sensitive),
            Err(IdpProviderError::KeyRing { .. })
        ));
    }

    #[test]
    fn test_saml_has_no_sensitive_options() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let mut config = IdpConfig::default();
        config.set("saml", "client_secret", "visible");
        let (whitelisted, sensitive) = seal_config(&state, "saml", &config).unwrap();
        assert_eq!(config, whitelisted);
        assert_eq!(IdpConfig::default(), sensitive);
    }
}
