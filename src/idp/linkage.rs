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
//! Linkage of the external entities to the local users, groups and domains.
//!
//! Every external entity gets a public ID through the identity mapping and
//! is created or refreshed under a lock keyed by the identity provider, the
//! entity type and the external ID.
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::identity::IdentityApi;
use crate::identity::types::{Group, GroupCreate, UserCreate, UserResponse, UserUpdate};
use crate::identity_mapping::IdentityMappingApi;
use crate::identity_mapping::types::IdMappingEntityType;
use crate::idp::IdpProviderError;
use crate::idp::types::IdentityProvider;
use crate::keystone::ServiceState;
use crate::resource::ResourceApi;
use crate::resource::types::{Domain, DomainCreate};

/// User as described by the identity provider.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExternalUser {
    /// Stable ID of the user in the identity provider.
    pub id: String,
    pub name: String,
    pub displayname: Option<String>,
    pub email: Option<String>,
    pub mobile: Option<String>,
    pub enabled: bool,
}

fn lock_key(idp: &IdentityProvider, entity_type: IdMappingEntityType, external_id: &str) -> String {
    format!("{entity_type}:{}-{external_id}", idp.id)
}

/// Link the external user and create or refresh the local user.
///
/// Display name, email and mobile are copied only into empty fields of an
/// existing user.
pub async fn sync_user(
    state: &ServiceState,
    idp: &IdentityProvider,
    domain_id: &str,
    external: &ExternalUser,
) -> Result<UserResponse, IdpProviderError> {
    let _guard = state
        .lock_entity(lock_key(idp, IdMappingEntityType::User, &external.id))
        .await;
    let public_id = state
        .provider
        .get_identity_mapping_provider()
        .get_or_create_public_id(state, &idp.id, &external.id, IdMappingEntityType::User)
        .await?;
    let identity = state.provider.get_identity_provider();
    match identity.get_user(state, &public_id).await? {
        None => {
            debug!("creating user {} linked to {}", external.name, idp.id);
            Ok(identity
                .create_user(
                    state,
                    UserCreate {
                        id: Some(public_id),
                        name: external.name.clone(),
                        domain_id: domain_id.to_string(),
                        enabled: external.enabled,
                        displayname: external.displayname.clone(),
                        email: external.email.clone(),
                        mobile: external.mobile.clone(),
                        ..Default::default()
                    },
                )
                .await?)
        }
        Some(user) => {
            let update = UserUpdate {
                name: Some(external.name.clone()).filter(|name| *name != user.name),
                displayname: external
                    .displayname
                    .clone()
                    .filter(|_| user.displayname.as_deref().unwrap_or_default().is_empty()),
                email: external
                    .email
                    .clone()
                    .filter(|_| user.email.as_deref().unwrap_or_default().is_empty()),
                mobile: external
                    .mobile
                    .clone()
                    .filter(|_| user.mobile.as_deref().unwrap_or_default().is_empty()),
                ..Default::default()
            };
            if update == UserUpdate::default() {
                return Ok(user);
            }
            Ok(identity.update_user(state, &user.id, update).await?)
        }
    }
}

/// Link the external group and create the local group when missing.
pub async fn sync_group(
    state: &ServiceState,
    idp: &IdentityProvider,
    domain_id: &str,
    external_id: &str,
    name: &str,
) -> Result<Group, IdpProviderError> {
    let _guard = state
        .lock_entity(lock_key(idp, IdMappingEntityType::Group, external_id))
        .await;
    let public_id = state
        .provider
        .get_identity_mapping_provider()
        .get_or_create_public_id(state, &idp.id, external_id, IdMappingEntityType::Group)
        .await?;
    let identity = state.provider.get_identity_provider();
    if let Some(group) = identity.get_group(state, &public_id).await? {
        return Ok(group);
    }
    Ok(identity
        .create_group(
            state,
            GroupCreate {
                id: Some(public_id),
                name: name.to_string(),
                domain_id: domain_id.to_string(),
                ..Default::default()
            },
        )
        .await?)
}

/// Link the external domain and create the local domain when missing.
pub async fn sync_domain(
    state: &ServiceState,
    idp: &IdentityProvider,
    external_id: &str,
    name: &str,
) -> Result<Domain, IdpProviderError> {
    let _guard = state
        .lock_entity(lock_key(idp, IdMappingEntityType::Domain, external_id))
        .await;
    let public_id = state
        .provider
        .get_identity_mapping_provider()
        .get_or_create_public_id(state, &idp.id, external_id, IdMappingEntityType::Domain)
        .await?;
    let resource = state.provider.get_resource_provider();
    if let Some(domain) = resource.get_domain(state, &public_id).await? {
        return Ok(domain);
    }
    Ok(resource
        .create_domain(
            state,
            DomainCreate {
                id: Some(public_id),
                name: name.to_string(),
                enabled: true,
                description: None,
            },
        )
        .await?)
}

/// Unlink and delete the entities of the identity provider missing from
/// `keep`. Failures are logged and the entity is skipped.
pub async fn prune(
    state: &ServiceState,
    idp: &IdentityProvider,
    entity_type: IdMappingEntityType,
    keep: &HashSet<String>,
) -> Result<usize, IdpProviderError> {
    let mapping_provider = state.provider.get_identity_mapping_provider();
    let mut removed = 0;
    for mapping in mapping_provider
        .list_by_idp(state, &idp.id, Some(entity_type))
        .await?
        .into_iter()
        .filter(|mapping| !keep.contains(&mapping.public_id))
    {
        let res: Result<(), IdpProviderError> = match entity_type {
            IdMappingEntityType::User => state
                .provider
                .get_identity_provider()
                .delete_user(state, &mapping.public_id)
                .await
                .map_err(Into::into),
            IdMappingEntityType::Group => state
                .provider
                .get_identity_provider()
                .delete_group(state, &mapping.public_id)
                .await
                .map_err(Into::into),
            IdMappingEntityType::Domain => state
                .provider
                .get_resource_provider()
                .delete_domain(state, &mapping.public_id)
                .await
                .map_err(Into::into),
        };
        match res {
            Ok(()) => {}
            Err(IdpProviderError::IdentityProvider {
                source: crate::identity::error::IdentityProviderError::UserNotFound(_),
            })
            | Err(IdpProviderError::IdentityProvider {
                source: crate::identity::error::IdentityProviderError::GroupNotFound(_),
            })
            | Err(IdpProviderError::ResourceProvider {
                source: crate::resource::error::ResourceProviderError::DomainNotFound(_),
            }) => {
                debug!("{} {} is gone already", entity_type, mapping.public_id);
            }
            Err(err) => {
                warn!(
                    idp_id = %idp.id,
                    entity_type = %entity_type,
                    external_id = %mapping.local_id,
                    "failed to remove the obsolete entity: {err}"
                );
                continue;
            }
        }
        mapping_provider
            .delete_by_public_id(state, &mapping.public_id, entity_type)
            .await?;
        removed += 1;
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use crate::identity::MockIdentityProvider;
    use crate::identity_mapping::MockIdentityMappingProvider;
    use crate::identity_mapping::types::IdMapping;
    use crate::provider::Provider;
    use crate::tests::get_state;

    use super::*;

    fn idp() -> IdentityProvider {
        IdentityProvider {
            id: "idp".into(),
            driver: "ldap".into(),
            ..Default::default()
        }
    }

    fn mapping_mock() -> MockIdentityMappingProvider {
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock
            .expect_get_or_create_public_id()
            .returning(|_, _, local_id: &str, _| Ok(format!("pub-{local_id}")));
        mapping_mock
    }

    #[tokio::test]
    async fn test_sync_new_user() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .withf(|_, id: &str| id == "pub-ext1")
            .returning(|_, _| Ok(None));
        identity_mock
            .expect_create_user()
            .withf(|_, user: &UserCreate| {
                user.id.as_deref() == Some("pub-ext1")
                    && user.name == "jdoe"
                    && user.domain_id == "dom"
                    && user.email.as_deref() == Some("j@doe")
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
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock())
                .build()
                .unwrap(),
        );
        let user = sync_user(
            &state,
            &idp(),
            "dom",
            &ExternalUser {
                id: "ext1".into(),
                name: "jdoe".into(),
                email: Some("j@doe".into()),
                enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!("pub-ext1", user.id);
    }

    #[tokio::test]
    async fn test_sync_existing_user_keeps_edited_fields() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock.expect_get_user().returning(|_, _| {
            Ok(Some(UserResponse {
                id: "pub-ext1".into(),
                name: "jdoe".into(),
                domain_id: "dom".into(),
                enabled: true,
                email: Some("operator@set".into()),
                ..Default::default()
            }))
        });
        identity_mock
            .expect_update_user()
            .withf(|_, id: &str, update: &UserUpdate| {
                id == "pub-ext1"
                    && update.email.is_none()
                    && update.name.is_none()
                    && update.mobile.as_deref() == Some("+1")
            })
            .returning(|_, _, _| Ok(UserResponse::default()));
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock())
                .build()
                .unwrap(),
        );
        sync_user(
            &state,
            &idp(),
            "dom",
            &ExternalUser {
                id: "ext1".into(),
                name: "jdoe".into(),
                email: Some("j@doe".into()),
                mobile: Some("+1".into()),
                enabled: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_prune() {
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock.expect_list_by_idp().returning(|_, _, _| {
            Ok(["keep", "drop", "stuck"]
                .iter()
                .map(|id| IdMapping {
                    idp_id: "idp".into(),
                    entity_type: IdMappingEntityType::User,
                    local_id: format!("ext-{id}"),
                    public_id: id.to_string(),
                })
                .collect())
        });
        mapping_mock
            .expect_delete_by_public_id()
            .withf(|_, id: &str, _| id == "drop")
            .times(1)
            .returning(|_, _, _| Ok(()));
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_delete_user()
            .withf(|_, id: &str| id == "drop")
            .returning(|_, _| Ok(()));
        identity_mock
            .expect_delete_user()
            .withf(|_, id: &str| id == "stuck")
            .returning(|_, _| {
                Err(crate::identity::error::IdentityProviderError::Conflict(
                    "in use".into(),
                ))
            });
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock)
                .build()
                .unwrap(),
        );
        let keep = HashSet::from(["keep".to_string()]);
        assert_eq!(
            1,
            prune(&state, &idp(), IdMappingEntityType::User, &keep)
                .await
                .unwrap()
        );
    }
}
