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
//! # Keystone configuration
//!
//! Parsing of the Keystone configuration file. The file is in the INI format
//! and every section has defaults so that an empty file results in a usable
//! configuration.
use config::{File, FileFormat};
use eyre::{Report, WrapErr};
use serde::Deserialize;
use std::path::PathBuf;

mod admin;
mod common;
mod credential;
mod database;
mod fernet_token;
mod identity;
mod idp_sync;
mod ldap;
mod revoke;
mod security_compliance;
mod token;

pub use admin::AdminSection;
pub use common::{DriverSection, csv};
pub use credential::CredentialSection;
pub use database::DatabaseSection;
pub use fernet_token::FernetTokenSection;
pub use identity::{IdentitySection, PasswordHashingAlgo};
pub use idp_sync::IdpSyncSection;
pub use ldap::LdapSection;
pub use revoke::RevokeSection;
pub use security_compliance::SecurityComplianceSection;
pub use token::{TokenProviderDriver, TokenSection};

#[derive(Debug, Default, Deserialize, Clone)]
pub struct Config {
    /// Global configuration options
    #[serde(rename = "DEFAULT", default)]
    pub default: DefaultSection,

    /// Bootstrap names and credentials of the system administrator.
    #[serde(default)]
    pub admin: AdminSection,

    /// Assignments (roles) related configuration
    #[serde(default)]
    pub assignment: DriverSection,

    /// Catalog
    #[serde(default)]
    pub catalog: DriverSection,

    /// Credential key ring.
    #[serde(default)]
    pub credential: CredentialSection,

    /// Credential store.
    #[serde(default)]
    pub credential_store: DriverSection,

    /// Database configuration
    #[serde(default)]
    pub database: DatabaseSection,

    /// Fernet tokens
    #[serde(default)]
    pub fernet_tokens: FernetTokenSection,

    /// Identity related configuration
    #[serde(default)]
    pub identity: IdentitySection,

    /// Identity mapping
    #[serde(default)]
    pub identity_mapping: DriverSection,

    /// Identity providers
    #[serde(default)]
    pub idp: DriverSection,

    /// Identity provider synchronization
    #[serde(default)]
    pub idp_sync: IdpSyncSection,

    /// LDAP driver global defaults
    #[serde(default)]
    pub ldap: LdapSection,

    /// Role policies
    #[serde(default)]
    pub policy: DriverSection,

    /// Resource provider related configuration.
    #[serde(default)]
    pub resource: DriverSection,

    /// Revoke provider configuration.
    #[serde(default)]
    pub revoke: RevokeSection,

    /// Security compliance
    #[serde(default)]
    pub security_compliance: SecurityComplianceSection,

    /// Token
    #[serde(default)]
    pub token: TokenSection,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct DefaultSection {
    /// Debug logging
    #[serde(default)]
    pub debug: bool,
    /// Public endpoint
    pub public_endpoint: Option<String>,
}

impl Config {
    pub fn new(path: PathBuf) -> Result<Self, Report> {
        let mut builder = config::Config::builder();

        if std::path::Path::new(&path).is_file() {
            builder = builder.add_source(File::from(path).format(FileFormat::Ini));
        }

        builder.try_into()
    }
}

impl TryFrom<config::ConfigBuilder<config::builder::DefaultState>> for Config {
    type Error = Report;
    fn try_from(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, Self::Error> {
        builder
            .build()
            .wrap_err("Failed to read configuration file")?
            .try_deserialize()
            .wrap_err("Failed to parse configuration file")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_defaults() {
        let conf = Config::try_from(config::Config::builder()).unwrap();
        assert_eq!(86400, conf.token.expiration);
        assert_eq!(2048, conf.token.cache_size);
        assert_eq!("sql", conf.assignment.driver);
        assert_eq!(1, conf.idp_sync.worker_count);
        assert_eq!(2048, conf.idp_sync.queue_size);
        assert_eq!(1000, conf.ldap.page_size);
        assert_eq!(30, conf.ldap.timeout_secs);
        assert_eq!("system", conf.admin.system_project_name);
        assert!(conf.security_compliance.lockout_failure_attempts.is_none());
        assert!(conf.credential.key_repository.is_none());
    }

    #[test]
    fn test_ini_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[DEFAULT]
debug = true

[database]
connection = sqlite::memory:

[token]
expiration = 600

[security_compliance]
lockout_failure_attempts = 3

[idp_sync]
worker_count = 2
"#
        )
        .unwrap();
        let conf = Config::new(file.path().into()).unwrap();
        assert!(conf.default.debug);
        assert_eq!(600, conf.token.expiration);
        assert_eq!(Some(3), conf.security_compliance.lockout_failure_attempts);
        assert_eq!(2, conf.idp_sync.worker_count);
        assert_eq!(2048, conf.idp_sync.queue_size);
    }
}
