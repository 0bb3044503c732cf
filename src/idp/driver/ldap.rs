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
//! # LDAP driver
//!
//! Authenticates the users by binding with their DN and mirrors the
//! directory users, groups and (in the multi domain mode) domains into the
//! local tables.
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::identity::IdentityApi;
use crate::identity::error::IdentityProviderError;
use crate::identity::types::UserResponse;
use crate::identity_mapping::IdentityMappingApi;
use crate::identity_mapping::types::IdMappingEntityType;
use crate::idp::IdpProviderError;
use crate::idp::driver::{AuthIdentity, DriverClass, DriverFactory, IdentityDriver, LDAP_CLASS};
use crate::idp::linkage::{self, ExternalUser};
use crate::idp::types::{IdentityProvider, IdpConfig};
use crate::keystone::ServiceState;

pub mod connector;
pub mod options;

pub use connector::{Ldap3Connector, LdapConnector, LdapEntry, MemoryDirectory};
pub use options::LdapOptions;

/// Public IDs of the entities seen by one sync pass.
#[derive(Debug, Default)]
struct SyncedIds {
    users: HashSet<String>,
    groups: HashSet<String>,
    domains: HashSet<String>,
}

pub struct LdapDriver {
    idp: IdentityProvider,
    options: LdapOptions,
    connector: Arc<dyn LdapConnector>,
}

impl LdapDriver {
    pub fn new(idp: IdentityProvider, options: LdapOptions, connector: Arc<dyn LdapConnector>) -> Self {
        Self {
            idp,
            options,
            connector,
        }
    }

    pub fn factory(
        idp: &IdentityProvider,
        options: &IdpConfig,
        config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        let options = LdapOptions::from_config(options, idp.template.as_deref(), config)?;
        let connector = Arc::new(Ldap3Connector::new(&options));
        Ok(Arc::new(Self::new(idp.clone(), options, connector)))
    }

    /// Factory of drivers sharing the given connector.
    pub fn factory_with_connector(connector: Arc<dyn LdapConnector>) -> DriverFactory {
        Arc::new(
            move |idp: &IdentityProvider,
                  options: &IdpConfig,
                  config: &Config|
                  -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
                let options = LdapOptions::from_config(options, idp.template.as_deref(), config)?;
                Ok(Arc::new(LdapDriver::new(
                    idp.clone(),
                    options,
                    connector.clone(),
                )))
            },
        )
    }

    fn external_user(&self, entry: &LdapEntry) -> Option<ExternalUser> {
        let id = entry.first(&self.options.user_id_attribute)?.to_string();
        let name = entry
            .first(&self.options.user_name_attribute)
            .map(ToString::to_string)
            .unwrap_or_else(|| id.clone());
        let optional = |attr: &Option<String>| {
            attr.as_ref()
                .and_then(|attr| entry.first(attr))
                .map(ToString::to_string)
        };
        Some(ExternalUser {
            id,
            name,
            displayname: optional(&self.options.user_displayname_attribute),
            email: optional(&self.options.user_email_attribute),
            mobile: optional(&self.options.user_mobile_attribute),
            enabled: self.options.is_enabled(
                self.options
                    .user_enabled_attribute
                    .as_ref()
                    .and_then(|attr| entry.first(attr)),
            ),
        })
    }

    fn target_domain_id(&self) -> Result<String, IdpProviderError> {
        self.idp
            .target_domain_id
            .clone()
            .ok_or_else(|| IdpProviderError::MissingOption {
                group: "identity_provider".into(),
                option: "target_domain_id".into(),
            })
    }

    fn check_cancelled(&self, cancel: &CancellationToken) -> Result<(), IdpProviderError> {
        if cancel.is_cancelled() {
            return Err(IdpProviderError::Cancelled(self.idp.id.clone()));
        }
        Ok(())
    }

    /// Domain entries directly below the domain tree.
    async fn list_domains(&self) -> Result<Vec<LdapEntry>, IdpProviderError> {
        let base = self.options.domain_tree_dn.to_lowercase();
        Ok(self
            .connector
            .search(
                &self.options.domain_tree_dn,
                &self.options.domain_search_filter(),
                &self.options.domain_attributes(),
            )
            .await?
            .into_iter()
            .filter(|entry| {
                entry
                    .dn
                    .split_once(',')
                    .is_some_and(|(_, parent)| parent.trim().to_lowercase() == base)
            })
            .collect())
    }

    fn domain_identity(&self, entry: &LdapEntry) -> (String, String) {
        let external_id = entry
            .first(&self.options.domain_id_attribute)
            .map(ToString::to_string)
            .unwrap_or_else(|| entry.dn.clone());
        let name = entry
            .first(&self.options.domain_name_attribute)
            .map(ToString::to_string)
            .unwrap_or_else(|| external_id.clone());
        (external_id, name)
    }

    /// Keep the entity linked when its sync failed.
    async fn keep_linked(
        &self,
        state: &ServiceState,
        external_id: &str,
        entity_type: IdMappingEntityType,
        keep: &mut HashSet<String>,
    ) {
        if let Ok(Some(mapping)) = state
            .provider
            .get_identity_mapping_provider()
            .get_by_local_id(state, &self.idp.id, external_id, entity_type)
            .await
        {
            keep.insert(mapping.public_id);
        }
    }

    /// Mirror the users and groups under `user_base` and `group_base` into
    /// the domain.
    async fn sync_domain_tree(
        &self,
        state: &ServiceState,
        cancel: &CancellationToken,
        domain_id: &str,
        user_base: &str,
        group_base: &str,
        synced: &mut SyncedIds,
    ) -> Result<(), IdpProviderError> {
        self.check_cancelled(cancel)?;
        let users = self
            .connector
            .search(
                user_base,
                &self.options.user_search_filter(),
                &self.options.user_attributes(),
            )
            .await?;
        let mut by_dn: HashMap<String, String> = HashMap::new();
        let mut by_external_id: HashMap<String, String> = HashMap::new();
        for entry in users.iter() {
            let Some(external) = self.external_user(entry) else {
                warn!(
                    idp_id = %self.idp.id,
                    entity_type = "user",
                    external_id = %entry.dn,
                    "entry has no {} attribute",
                    self.options.user_id_attribute
                );
                continue;
            };
            if !external.enabled {
                debug!("skipping the disabled user {}", entry.dn);
                continue;
            }
            match linkage::sync_user(state, &self.idp, domain_id, &external).await {
                Ok(user) => {
                    by_dn.insert(entry.dn.to_lowercase(), user.id.clone());
                    by_external_id.insert(external.id.clone(), user.id.clone());
                    synced.users.insert(user.id);
                }
                Err(err) => {
                    warn!(
                        idp_id = %self.idp.id,
                        entity_type = "user",
                        external_id = %external.id,
                        "failed to sync the user: {err}"
                    );
                    self.keep_linked(
                        state,
                        &external.id,
                        IdMappingEntityType::User,
                        &mut synced.users,
                    )
                    .await;
                }
            }
        }

        self.check_cancelled(cancel)?;
        let groups = self
            .connector
            .search(
                group_base,
                &self.options.group_search_filter(),
                &self.options.group_attributes(),
            )
            .await?;
        for entry in groups.iter() {
            let Some(external_id) = entry.first(&self.options.group_id_attribute) else {
                warn!(
                    idp_id = %self.idp.id,
                    entity_type = "group",
                    external_id = %entry.dn,
                    "entry has no {} attribute",
                    self.options.group_id_attribute
                );
                continue;
            };
            let name = entry
                .first(&self.options.group_name_attribute)
                .unwrap_or(external_id);
            let members: HashSet<String> = entry
                .values(&self.options.group_member_attribute)
                .iter()
                .filter_map(|member| {
                    if self.options.group_members_are_ids {
                        by_external_id.get(member)
                    } else {
                        by_dn.get(&member.to_lowercase())
                    }
                })
                .cloned()
                .collect();
            let res = async {
                let group =
                    linkage::sync_group(state, &self.idp, domain_id, external_id, name).await?;
                state
                    .provider
                    .get_identity_provider()
                    .set_group_members(state, &group.id, &members)
                    .await?;
                Ok::<_, IdpProviderError>(group)
            }
            .await;
            match res {
                Ok(group) => {
                    synced.groups.insert(group.id);
                }
                Err(err) => {
                    warn!(
                        idp_id = %self.idp.id,
                        entity_type = "group",
                        external_id = %external_id,
                        "failed to sync the group: {err}"
                    );
                    self.keep_linked(
                        state,
                        external_id,
                        IdMappingEntityType::Group,
                        &mut synced.groups,
                    )
                    .await;
                }
            }
        }
        Ok(())
    }

    /// Domain the user entry belongs to.
    async fn user_domain_id(
        &self,
        state: &ServiceState,
        entry: &LdapEntry,
    ) -> Result<String, IdpProviderError> {
        if !self.options.multi_domain {
            return self.target_domain_id();
        }
        let user_dn = entry.dn.to_lowercase();
        for domain in self.list_domains().await? {
            if user_dn.ends_with(&format!(",{}", domain.dn.to_lowercase())) {
                let (external_id, name) = self.domain_identity(&domain);
                return Ok(linkage::sync_domain(state, &self.idp, &external_id, &name)
                    .await?
                    .id);
            }
        }
        Err(IdpProviderError::Unauthenticated)
    }
}

#[async_trait]
impl IdentityDriver for LdapDriver {
    fn class(&self) -> &'static DriverClass {
        &LDAP_CLASS
    }

    async fn probe(&self) -> Result<(), IdpProviderError> {
        self.connector.probe().await
    }

    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError> {
        let AuthIdentity::Password {
            user_name,
            password,
        } = identity
        else {
            return Err(self.unsupported(identity.kind()));
        };
        let base = if self.options.multi_domain {
            &self.options.domain_tree_dn
        } else {
            &self.options.user_tree_dn
        };
        let mut entries = self
            .connector
            .search(
                base,
                &self.options.user_name_filter(user_name),
                &self.options.user_attributes(),
            )
            .await?;
        let entry = match entries.len() {
            0 => {
                return Err(IdentityProviderError::UserNotFound(user_name.clone()).into());
            }
            1 => entries.remove(0),
            _ => {
                warn!("user name {user_name} is ambiguous in {}", self.idp.id);
                return Err(IdpProviderError::Unauthenticated);
            }
        };
        let mut external = self
            .external_user(&entry)
            .ok_or(IdpProviderError::Unauthenticated)?;
        if !self.connector.check_bind(&entry.dn, password).await? {
            return Err(IdentityProviderError::InvalidPassword.into());
        }
        // The enabled attribute only filters the sync, the local user decides.
        if !external.enabled {
            debug!("{} is disabled in the directory", entry.dn);
            external.enabled = true;
        }
        let domain_id = self.user_domain_id(state, &entry).await?;
        linkage::sync_user(state, &self.idp, &domain_id, &external).await
    }

    async fn sync(
        &self,
        state: &ServiceState,
        cancel: &CancellationToken,
    ) -> Result<(), IdpProviderError> {
        let mut synced = SyncedIds::default();
        if self.options.multi_domain {
            self.check_cancelled(cancel)?;
            for entry in self.list_domains().await? {
                let (external_id, name) = self.domain_identity(&entry);
                let domain =
                    match linkage::sync_domain(state, &self.idp, &external_id, &name).await {
                        Ok(domain) => domain,
                        Err(err) => {
                            warn!(
                                idp_id = %self.idp.id,
                                entity_type = "domain",
                                external_id = %external_id,
                                "failed to sync the domain: {err}"
                            );
                            self.keep_linked(
                                state,
                                &external_id,
                                IdMappingEntityType::Domain,
                                &mut synced.domains,
                            )
                            .await;
                            continue;
                        }
                    };
                synced.domains.insert(domain.id.clone());
                self.sync_domain_tree(state, cancel, &domain.id, &entry.dn, &entry.dn, &mut synced)
                    .await?;
            }
        } else {
            let domain_id = self.target_domain_id()?;
            self.sync_domain_tree(
                state,
                cancel,
                &domain_id,
                &self.options.user_tree_dn,
                &self.options.group_tree_dn,
                &mut synced,
            )
            .await?;
        }

        self.check_cancelled(cancel)?;
        let users = linkage::prune(state, &self.idp, IdMappingEntityType::User, &synced.users).await?;
        let groups =
            linkage::prune(state, &self.idp, IdMappingEntityType::Group, &synced.groups).await?;
        let domains = if self.options.multi_domain {
            linkage::prune(state, &self.idp, IdMappingEntityType::Domain, &synced.domains).await?
        } else {
            0
        };
        info!(
            idp_id = %self.idp.id,
            "synced {} users, {} groups, {} domains; removed {users} users, {groups} groups, {domains} domains",
            synced.users.len(),
            synced.groups.len(),
            synced.domains.len(),
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::identity::MockIdentityProvider;
    use crate::identity::types::{Group, GroupCreate, UserCreate};
    use crate::identity_mapping::MockIdentityMappingProvider;
    use crate::identity_mapping::types::IdMapping;
    use crate::provider::Provider;
    use crate::tests::get_state;

    use super::*;

    fn idp() -> IdentityProvider {
        IdentityProvider {
            id: "corp".into(),
            driver: "ldap".into(),
            template: Some("openldap_one_domain".into()),
            target_domain_id: Some("dom".into()),
            enabled: true,
            ..Default::default()
        }
    }

    fn driver(dir: &MemoryDirectory) -> LdapDriver {
        let mut config = IdpConfig::default();
        config
            .set("ldap", "url", "ldap://localhost")
            .set("ldap", "suffix", "dc=example,dc=org")
            .set("ldap", "user_tree_dn", "ou=people,dc=example,dc=org")
            .set("ldap", "group_tree_dn", "ou=groups,dc=example,dc=org")
            .set("ldap", "user_enabled_attribute", "employeeActive");
        let options =
            LdapOptions::from_config(&config, idp().template.as_deref(), &Config::default())
                .unwrap();
        LdapDriver::new(idp(), options, Arc::new(dir.clone()))
    }

    fn person(uid: &str) -> LdapEntry {
        LdapEntry::new(format!("uid={uid},ou=people,dc=example,dc=org"))
            .with("objectClass", "inetOrgPerson")
            .with("uid", uid)
            .with("cn", uid.to_uppercase())
    }

    fn directory() -> MemoryDirectory {
        let dir = MemoryDirectory::default();
        dir.add(person("alice").with("mail", "alice@example.org"))
            .add(person("bob"))
            .add(person("carol").with("employeeActive", "false"))
            .add(
                LdapEntry::new("cn=devs,ou=groups,dc=example,dc=org")
                    .with("objectClass", "posixGroup")
                    .with("cn", "devs")
                    .with("memberUid", "alice")
                    .with("memberUid", "carol")
                    .with("memberUid", "nobody"),
            )
            .set_password("uid=alice,ou=people,dc=example,dc=org", "secret")
            .set_password("uid=carol,ou=people,dc=example,dc=org", "carol-secret");
        dir
    }

    fn mapping_mock() -> MockIdentityMappingProvider {
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock
            .expect_get_or_create_public_id()
            .returning(|_, _, local_id: &str, _| Ok(format!("pub-{local_id}")));
        mapping_mock
    }

    #[tokio::test]
    async fn test_authenticate() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock.expect_get_user().returning(|_, _| Ok(None));
        identity_mock
            .expect_create_user()
            .withf(|_, user: &UserCreate| {
                user.id.as_deref() == Some("pub-alice")
                    && user.domain_id == "dom"
                    && user.email.as_deref() == Some("alice@example.org")
            })
            .returning(|_, user| {
                Ok(UserResponse {
                    id: user.id.unwrap_or_default(),
                    name: user.name,
                    domain_id: user.domain_id,
                    enabled: true,
                    ..Default::default()
                })
            });
        identity_mock
            .expect_create_user()
            .withf(|_, user: &UserCreate| user.id.as_deref() == Some("pub-carol") && user.enabled)
            .times(1)
            .returning(|_, user| {
                Ok(UserResponse {
                    id: user.id.unwrap_or_default(),
                    name: user.name,
                    domain_id: user.domain_id,
                    enabled: user.enabled,
                    ..Default::default()
                })
            });
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock())
                .build()
                .unwrap(),
        );
        let dir = directory();
        let driver = driver(&dir);

        let user = driver
            .authenticate(
                &state,
                &AuthIdentity::Password {
                    user_name: "alice".into(),
                    password: "secret".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!("pub-alice", user.id);

        assert!(matches!(
            driver
                .authenticate(
                    &state,
                    &AuthIdentity::Password {
                        user_name: "alice".into(),
                        password: "wrong".into(),
                    },
                )
                .await,
            Err(IdpProviderError::IdentityProvider {
                source: IdentityProviderError::InvalidPassword
            })
        ));
        // disabled in the directory, still allowed to log in
        let carol = driver
            .authenticate(
                &state,
                &AuthIdentity::Password {
                    user_name: "carol".into(),
                    password: "carol-secret".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!("pub-carol", carol.id);
        assert!(carol.enabled);
        assert!(matches!(
            driver
                .authenticate(
                    &state,
                    &AuthIdentity::Password {
                        user_name: "mallory".into(),
                        password: "any".into(),
                    },
                )
                .await,
            Err(IdpProviderError::IdentityProvider {
                source: IdentityProviderError::UserNotFound(_)
            })
        ));
    }

    #[tokio::test]
    async fn test_sync_single_domain() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock.expect_get_user().returning(|_, _| Ok(None));
        identity_mock.expect_create_user().times(2).returning(|_, user| {
            Ok(UserResponse {
                id: user.id.unwrap_or_default(),
                name: user.name,
                domain_id: user.domain_id,
                enabled: true,
                ..Default::default()
            })
        });
        identity_mock.expect_get_group().returning(|_, _| Ok(None));
        identity_mock
            .expect_create_group()
            .times(1)
            .returning(|_, group: GroupCreate| {
                Ok(Group {
                    id: group.id.unwrap_or_default(),
                    name: group.name,
                    domain_id: group.domain_id,
                    ..Default::default()
                })
            });
        identity_mock
            .expect_set_group_members()
            .withf(|_, group_id: &str, members: &HashSet<String>| {
                group_id == "pub-devs"
                    && *members == HashSet::from(["pub-alice".to_string()])
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        identity_mock
            .expect_delete_user()
            .withf(|_, id: &str| id == "pub-gone")
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mapping_mock = mapping_mock();
        mapping_mock
            .expect_list_by_idp()
            .returning(|_, _, entity_type| {
                Ok(match entity_type {
                    Some(IdMappingEntityType::User) => vec![
                        IdMapping {
                            idp_id: "corp".into(),
                            entity_type: IdMappingEntityType::User,
                            local_id: "alice".into(),
                            public_id: "pub-alice".into(),
                        },
                        IdMapping {
                            idp_id: "corp".into(),
                            entity_type: IdMappingEntityType::User,
                            local_id: "gone".into(),
                            public_id: "pub-gone".into(),
                        },
                    ],
                    _ => Vec::new(),
                })
            });
        mapping_mock
            .expect_delete_by_public_id()
            .withf(|_, id: &str, _| id == "pub-gone")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock)
                .build()
                .unwrap(),
        );
        let dir = directory();
        driver(&dir)
            .sync(&state, &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_sync_cancelled() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            driver(&directory()).sync(&state, &cancel).await,
            Err(IdpProviderError::Cancelled(_))
        ));
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let dir = directory();
        dir.set_reachable(false);
        assert!(driver(&dir).probe().await.is_err());
    }
}
