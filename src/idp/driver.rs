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
//! # Identity drivers
//!
//! Every identity provider is served by a driver selected by its name. The
//! driver authenticates users against the external source and, for the
//! directory drivers, mirrors the directory into the local entity tables.
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::identity::types::UserResponse;
use crate::idp::IdpProviderError;
use crate::idp::types::{IdentityProvider, IdpAttributeOptions, IdpConfig};
use crate::keystone::ServiceState;

pub mod cas;
pub mod ldap;
pub mod oauth2;
pub mod oidc;
pub mod saml;
pub mod sql;

/// How the users of the identity provider reach the local tables.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncMethod {
    /// Users are local already.
    Local,
    /// The whole directory is mirrored by the background sync.
    Full,
    /// Users are created on their first login.
    OnAuth,
}

/// Static properties of a driver.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DriverClass {
    pub name: &'static str,
    /// Only one identity provider may use the driver.
    pub singleton: bool,
    pub sync_method: SyncMethod,
    /// The user record is refreshed on every login.
    pub force_sync_user: bool,
}

pub const SQL_CLASS: DriverClass = DriverClass {
    name: "sql",
    singleton: true,
    sync_method: SyncMethod::Local,
    force_sync_user: false,
};

pub const LDAP_CLASS: DriverClass = DriverClass {
    name: "ldap",
    singleton: false,
    sync_method: SyncMethod::Full,
    force_sync_user: false,
};

pub const SAML_CLASS: DriverClass = DriverClass {
    name: "saml",
    singleton: false,
    sync_method: SyncMethod::OnAuth,
    force_sync_user: true,
};

pub const OIDC_CLASS: DriverClass = DriverClass {
    name: "oidc",
    singleton: false,
    sync_method: SyncMethod::OnAuth,
    force_sync_user: true,
};

pub const OAUTH2_CLASS: DriverClass = DriverClass {
    name: "oauth2",
    singleton: false,
    sync_method: SyncMethod::OnAuth,
    force_sync_user: true,
};

pub const CAS_CLASS: DriverClass = DriverClass {
    name: "cas",
    singleton: true,
    sync_method: SyncMethod::OnAuth,
    force_sync_user: true,
};

pub static DRIVER_CLASSES: [DriverClass; 6] = [
    SQL_CLASS,
    LDAP_CLASS,
    SAML_CLASS,
    OIDC_CLASS,
    OAUTH2_CLASS,
    CAS_CLASS,
];

pub fn driver_class(name: &str) -> Option<&'static DriverClass> {
    DRIVER_CLASSES.iter().find(|class| class.name == name)
}

/// Whether the driver verifies passwords.
pub fn is_password_driver(name: &str) -> bool {
    matches!(name, "sql" | "ldap")
}

/// Claims asserted by an identity provider. Every claim may carry several
/// values.
pub type Claims = BTreeMap<String, Vec<String>>;

/// Flatten a JSON document into claims. Nested objects are ignored.
pub fn claims_from_json(value: &serde_json::Value) -> Claims {
    let mut claims = Claims::new();
    if let serde_json::Value::Object(map) = value {
        for (key, val) in map {
            let values: Vec<String> = match val {
                serde_json::Value::String(s) => vec![s.clone()],
                serde_json::Value::Number(n) => vec![n.to_string()],
                serde_json::Value::Bool(b) => vec![b.to_string()],
                serde_json::Value::Array(items) => items
                    .iter()
                    .filter_map(|item| match item {
                        serde_json::Value::String(s) => Some(s.clone()),
                        serde_json::Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            if !values.is_empty() {
                claims.insert(key.clone(), values);
            }
        }
    }
    claims
}

/// Identity presented for the authentication.
#[derive(Clone)]
pub enum AuthIdentity {
    Password { user_name: String, password: String },
    Saml { response: String },
    Oidc { code: String, redirect_uri: String },
    OAuth2 { code: String, redirect_uri: String },
    Cas { ticket: String, service: String },
}

impl AuthIdentity {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Password { .. } => "password",
            Self::Saml { .. } => "saml",
            Self::Oidc { .. } => "oidc",
            Self::OAuth2 { .. } => "oauth2",
            Self::Cas { .. } => "cas",
        }
    }
}

/// Identity driver interface.
#[async_trait]
pub trait IdentityDriver: Send + Sync {
    fn class(&self) -> &'static DriverClass;

    /// Check that the identity source is reachable.
    async fn probe(&self) -> Result<(), IdpProviderError>;

    /// Authenticate the identity and return the local user.
    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError>;

    /// Mirror the directory into the local tables.
    async fn sync(
        &self,
        _state: &ServiceState,
        _cancel: &CancellationToken,
    ) -> Result<(), IdpProviderError> {
        Err(self.unsupported("sync"))
    }

    /// Where the browser goes to start the single sign-on.
    async fn get_sso_redirect_uri(
        &self,
        _callback: &str,
        _state: &str,
    ) -> Result<String, IdpProviderError> {
        Err(self.unsupported("single sign-on"))
    }

    fn unsupported(&self, operation: &str) -> IdpProviderError {
        IdpProviderError::DriverUnsupportedOperation {
            driver: self.class().name.to_string(),
            operation: operation.to_string(),
        }
    }
}

/// Constructor of a driver instance for the identity provider and its
/// merged options.
pub type DriverFactory = Arc<
    dyn Fn(&IdentityProvider, &IdpConfig, &Config) -> Result<Arc<dyn IdentityDriver>, IdpProviderError>
        + Send
        + Sync,
>;

/// Driver factories by the driver name.
#[derive(Clone)]
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
}

impl Default for DriverRegistry {
    fn default() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("sql", Arc::new(sql::SqlDriver::factory));
        registry.register("ldap", Arc::new(ldap::LdapDriver::factory));
        registry.register("saml", Arc::new(saml::SamlDriver::factory));
        registry.register("oidc", Arc::new(oidc::OidcDriver::factory));
        registry.register("oauth2", Arc::new(oauth2::OAuth2Driver::factory));
        registry.register("cas", Arc::new(cas::CasDriver::factory));
        registry
    }
}

impl DriverRegistry {
    /// Register the factory. An existing factory of the name is replaced.
    pub fn register<S: AsRef<str>>(&mut self, name: S, factory: DriverFactory) {
        self.factories.insert(name.as_ref().to_string(), factory);
    }

    pub fn build(
        &self,
        idp: &IdentityProvider,
        options: &IdpConfig,
        config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        let factory = self
            .factories
            .get(&idp.driver)
            .ok_or_else(|| IdpProviderError::UnsupportedDriver(idp.driver.clone()))?;
        factory(idp, options, config)
    }
}

/// Read the required option.
pub(crate) fn required_option(
    options: &IdpConfig,
    group: &str,
    option: &str,
) -> Result<String, IdpProviderError> {
    options
        .get_str(group, option)
        .ok_or_else(|| IdpProviderError::MissingOption {
            group: group.to_string(),
            option: option.to_string(),
        })
}

/// Attribute options of the driver group with the driver defaults for the
/// unset ones.
pub(crate) fn attribute_options(
    options: &IdpConfig,
    group: &str,
    defaults: &[(&str, &str)],
) -> IdpAttributeOptions {
    let mut fallback = IdpConfig::default();
    for (option, value) in defaults {
        fallback.set(group, *option, *value);
    }
    IdpAttributeOptions::from_config(&options.clone().with_defaults(&fallback), group)
}

/// HTTP client for the calls to the identity provider. Redirects are not
/// followed.
pub(crate) fn http_client(
    options: &IdpConfig,
    group: &str,
    config: &Config,
) -> Result<reqwest::Client, IdpProviderError> {
    let timeout = options
        .get_i64(group, "timeout_secs")
        .and_then(|val| u64::try_from(val).ok())
        .unwrap_or(config.ldap.timeout_secs);
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(timeout))
        .build()?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_driver_classes() {
        assert!(driver_class("cas").unwrap().singleton);
        assert_eq!(SyncMethod::Full, driver_class("ldap").unwrap().sync_method);
        assert!(driver_class("saml").unwrap().force_sync_user);
        assert!(driver_class("kerberos").is_none());
        assert!(is_password_driver("ldap"));
        assert!(!is_password_driver("oidc"));
    }

    #[test]
    fn test_claims_from_json() {
        let claims = claims_from_json(&json!({
            "sub": "123",
            "groups": ["a", "b"],
            "age": 42,
            "address": {"street": "x"},
        }));
        assert_eq!(vec!["123".to_string()], claims["sub"]);
        assert_eq!(2, claims["groups"].len());
        assert_eq!(vec!["42".to_string()], claims["age"]);
        assert!(!claims.contains_key("address"));
    }

    #[test]
    fn test_attribute_options_defaults() {
        let mut options = IdpConfig::default();
        options.set("oidc", "user_name_attribute", "email");
        let attrs = attribute_options(
            &options,
            "oidc",
            &[("user_id_attribute", "sub"), ("user_name_attribute", "preferred_username")],
        );
        assert_eq!(Some("sub".to_string()), attrs.user_id_attribute);
        assert_eq!(Some("email".to_string()), attrs.user_name_attribute);
        assert!(attrs.roles_attribute.is_none());
    }

    #[test]
    fn test_unknown_driver() {
        let registry = DriverRegistry::default();
        let idp = IdentityProvider {
            id: "idp".into(),
            driver: "kerberos".into(),
            ..Default::default()
        };
        assert!(matches!(
            registry.build(&idp, &IdpConfig::default(), &Config::default()),
            Err(IdpProviderError::UnsupportedDriver(_))
        ));
    }
}
