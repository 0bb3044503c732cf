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
//! # Authentication pipeline
//!
//! Shared by the v2 and v3 token endpoints. The identity is resolved and
//! verified first, the scope is resolved only afterwards so that the
//! response does not hint whether a project exists before the user is
//! authenticated.
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::Sha256;
use tracing::{debug, info, warn};

use crate::api::KeystoneApiError;
use crate::api::common::{find_project_from_scope, get_domain};
use crate::api::types::{Domain as ApiDomain, Scope};
use crate::auth::{AuthenticatedInfo, AuthenticationError, AuthzInfo};
use crate::credential::{
    CredentialApi,
    types::{AccessKeySecret, CredentialType},
};
use crate::identity::{
    IdentityApi,
    types::{LoginContext, UserListParameters, UserPasswordAuthRequest, UserResponse},
};
use crate::identity_mapping::{IdentityMappingApi, types::IdMappingEntityType};
use crate::idp::{
    IdpApi,
    driver::{AuthIdentity, is_password_driver},
    types::{IdentityProvider, IdpHealth},
};
use crate::keystone::ServiceState;
use crate::resource::ResourceApi;
use crate::token::{AuthMethod, TokenApi, TokenContext};

/// Password credentials of the user.
#[derive(Clone, Default)]
pub struct PasswordCredentials {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub domain: Option<ApiDomain>,
    pub password: String,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("user_id", &self.user_id)
            .field("user_name", &self.user_name)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Request signed with the access key secret.
#[derive(Clone, Debug, Default)]
pub struct AccessKeyRequest {
    /// Access key, the id of the credential.
    pub access_key: String,
    /// Signed text.
    pub string_to_sign: String,
    /// Base64 encoded HMAC-SHA256 of the signed text.
    pub signature: String,
}

impl AccessKeyRequest {
    /// Check the signature with the shared secret.
    fn verify(&self, secret: &str) -> Result<(), AuthenticationError> {
        let signature = STANDARD
            .decode(&self.signature)
            .map_err(|_| AuthenticationError::InvalidCredential)?;
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|_| AuthenticationError::InvalidCredential)?;
        mac.update(self.string_to_sign.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthenticationError::InvalidCredential)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|x| !x.is_empty())
}

/// Identity provider linked to the local user, `None` for local users.
async fn linked_idp(
    state: &ServiceState,
    user_id: &str,
) -> Result<Option<IdentityProvider>, KeystoneApiError> {
    let Some(mapping) = state
        .provider
        .get_identity_mapping_provider()
        .get_by_public_id(state, user_id, IdMappingEntityType::User)
        .await?
    else {
        return Ok(None);
    };
    Ok(state
        .provider
        .get_idp_provider()
        .get_idp(state, &mapping.idp_id)
        .await?)
}

/// Authenticate the identity through the identity provider driver.
///
/// A successful authentication through a disconnected provider marks it
/// connected again.
async fn authenticate_with_idp(
    state: &ServiceState,
    idp: &IdentityProvider,
    identity: &AuthIdentity,
) -> Result<UserResponse, KeystoneApiError> {
    if !idp.enabled {
        return Err(AuthenticationError::InvalidAuthMethod(format!(
            "identity provider {} is disabled",
            idp.id
        ))
        .into());
    }
    let provider = state.provider.get_idp_provider();
    let driver = provider.get_driver(state, idp).await?;
    let user = driver.authenticate(state, identity).await?;
    if idp.status == IdpHealth::Disconnected {
        info!(idp_id = %idp.id, "identity provider is reachable again");
        provider
            .set_health(state, &idp.id, IdpHealth::Connected)
            .await?;
    }
    Ok(user)
}

/// Complete the authentication of the verified user.
async fn authenticated(
    state: &ServiceState,
    user: UserResponse,
    method: AuthMethod,
    context: TokenContext,
    idp_id: Option<String>,
) -> Result<AuthenticatedInfo, KeystoneApiError> {
    if !user.enabled {
        return Err(AuthenticationError::UserDisabled(user.id).into());
    }
    let user_domain = state
        .provider
        .get_resource_provider()
        .get_domain(state, &user.domain_id)
        .await?;
    state
        .provider
        .get_identity_provider()
        .record_login(state, &user.id, &LoginContext::from(&context))
        .await?;
    let mut builder = AuthenticatedInfo::builder();
    builder
        .user_id(user.id.clone())
        .method(method)
        .context(context);
    if let Some(domain) = user_domain {
        builder.user_domain(domain);
    }
    if let Some(idp_id) = idp_id {
        builder.idp_id(idp_id);
    }
    let authn = builder
        .user(user)
        .build()
        .map_err(AuthenticationError::from)?;
    authn.validate()?;
    Ok(authn)
}

/// Users matching the name alone whose linkage permits the password login.
async fn find_users_by_name(
    state: &ServiceState,
    name: &str,
) -> Result<Vec<(UserResponse, Option<IdentityProvider>)>, KeystoneApiError> {
    let users = state
        .provider
        .get_identity_provider()
        .list_users(
            state,
            &UserListParameters {
                name: Some(name.to_string()),
                ..Default::default()
            },
        )
        .await?;
    let mut candidates = Vec::new();
    for user in users {
        let idp = linked_idp(state, &user.id).await?;
        if idp.as_ref().is_none_or(|idp| is_password_driver(&idp.driver)) {
            candidates.push((user, idp));
        }
    }
    Ok(candidates)
}

/// Authenticate the user with the password.
///
/// The user is identified by the id, by the name within the domain, or by
/// the name alone when it is unique among the users permitted to log in
/// with a password. Users linked to the LDAP identity provider are verified
/// by the directory. A user unknown in a domain owned by an identity
/// provider is looked up there and synced on the fly.
#[tracing::instrument(level = "debug", skip(state, credentials))]
pub async fn authenticate_password(
    state: &ServiceState,
    credentials: &PasswordCredentials,
    context: TokenContext,
) -> Result<AuthenticatedInfo, KeystoneApiError> {
    let user_id = non_empty(&credentials.user_id);
    let user_name = non_empty(&credentials.user_name);
    let domain = credentials.domain.as_ref().filter(|x| !x.is_empty());
    if user_id.is_none() && user_name.is_none() && domain.is_none() {
        return Err(AuthenticationError::EmptyAuth.into());
    }
    let identity = state.provider.get_identity_provider();

    let (user, idp) = if let Some(user_id) = user_id {
        let user = identity
            .get_user(state, user_id)
            .await?
            .ok_or_else(|| AuthenticationError::UserNotFound(user_id.to_string()))?;
        let idp = linked_idp(state, &user.id).await?;
        (user, idp)
    } else if let (Some(name), Some(domain)) = (user_name, domain) {
        let domain = get_domain(state, domain.id.as_ref(), domain.name.as_ref())
            .await
            .map_err(|_| AuthenticationError::UserNotFound(name.to_string()))?;
        if !domain.enabled {
            return Err(AuthenticationError::DomainDisabled(domain.id).into());
        }
        match identity.find_user_by_name(state, name, &domain.id).await? {
            Some(user) => {
                let idp = linked_idp(state, &user.id).await?;
                (user, idp)
            }
            None => {
                let idp = state
                    .provider
                    .get_idp_provider()
                    .find_idp_for_domain(state, &domain.id)
                    .await?
                    .filter(|idp| is_password_driver(&idp.driver) && idp.driver != "sql")
                    .ok_or_else(|| AuthenticationError::UserNotFound(name.to_string()))?;
                debug!("user {name} unknown locally, trying the identity provider {}", idp.id);
                let user = authenticate_with_idp(
                    state,
                    &idp,
                    &AuthIdentity::Password {
                        user_name: name.to_string(),
                        password: credentials.password.clone(),
                    },
                )
                .await?;
                return authenticated(state, user, AuthMethod::Password, context, Some(idp.id))
                    .await;
            }
        }
    } else if let Some(name) = user_name {
        let mut candidates = find_users_by_name(state, name).await?;
        if candidates.len() > 1 {
            return Err(AuthenticationError::DuplicateUser(name.to_string()).into());
        }
        candidates
            .pop()
            .ok_or_else(|| AuthenticationError::UserNotFound(name.to_string()))?
    } else {
        return Err(AuthenticationError::EmptyAuth.into());
    };

    match idp.filter(|idp| idp.driver != "sql") {
        Some(idp) => {
            let user = authenticate_with_idp(
                state,
                &idp,
                &AuthIdentity::Password {
                    user_name: user.name.clone(),
                    password: credentials.password.clone(),
                },
            )
            .await?;
            authenticated(state, user, AuthMethod::Password, context, Some(idp.id)).await
        }
        None => {
            let user = identity
                .authenticate_by_password(
                    state,
                    &UserPasswordAuthRequest {
                        id: Some(user.id.clone()),
                        password: credentials.password.clone(),
                        ..Default::default()
                    },
                )
                .await?;
            authenticated(state, user, AuthMethod::Password, context, None).await
        }
    }
}

/// Authenticate with the existing token.
///
/// The new token is minted from the presented one, revoking the latter
/// revokes the new token as well.
#[tracing::instrument(level = "debug", skip(state, token, context))]
pub async fn authenticate_token(
    state: &ServiceState,
    token: &str,
    context: TokenContext,
) -> Result<AuthenticatedInfo, KeystoneApiError> {
    let parent = state
        .provider
        .get_token_provider()
        .validate_token(state, token)
        .await?;
    let user = state
        .provider
        .get_identity_provider()
        .get_user(state, parent.user_id())
        .await?
        .ok_or_else(|| AuthenticationError::UserNotFound(parent.user_id().clone()))?;
    let mut authn = authenticated(state, user, AuthMethod::Token, context, None).await?;
    authn.parent_token = Some(token.to_string());
    Ok(authn)
}

/// Authenticate with the access key.
///
/// The access key is the id of an enabled `aksk` credential whose blob holds
/// the shared secret. Returns the project of the credential as well, the
/// token is scoped to it when set.
#[tracing::instrument(level = "debug", skip(state, request, context), fields(access_key = %request.access_key))]
pub async fn authenticate_aksk(
    state: &ServiceState,
    request: &AccessKeyRequest,
    context: TokenContext,
) -> Result<(AuthenticatedInfo, Option<String>), KeystoneApiError> {
    let invalid = || AuthenticationError::InvalidAccessKey(request.access_key.clone());
    if request.access_key.is_empty() {
        return Err(AuthenticationError::EmptyAuth.into());
    }
    let credential = state
        .provider
        .get_credential_provider()
        .get_credential(state, &request.access_key)
        .await?
        .filter(|x| x.r#type == CredentialType::Aksk)
        .ok_or_else(invalid)?;
    if !credential.enabled {
        return Err(AuthenticationError::AccessKeyDisabled(credential.id).into());
    }
    let secret: AccessKeySecret = serde_json::from_str(credential.blob.expose_secret())
        .map_err(|err| {
            warn!("access key {} blob is malformed: {err}", credential.id);
            invalid()
        })?;
    if !secret.is_valid_at(Utc::now()) {
        return Err(AuthenticationError::AccessKeyExpired(credential.id).into());
    }
    request.verify(secret.secret.expose_secret())?;

    let user = state
        .provider
        .get_identity_provider()
        .get_user(state, &credential.user_id)
        .await?
        .ok_or_else(|| AuthenticationError::UserNotFound(credential.user_id.clone()))?;
    let authn = authenticated(state, user, AuthMethod::Aksk, context, None).await?;
    Ok((authn, credential.project_id.filter(|x| !x.is_empty())))
}

/// Authenticate through the single sign-on identity provider.
///
/// The CAS method may omit the provider when exactly one enabled CAS
/// provider exists.
#[tracing::instrument(level = "debug", skip(state, identity, context))]
pub async fn authenticate_sso(
    state: &ServiceState,
    method: AuthMethod,
    idp_id: Option<&str>,
    identity: &AuthIdentity,
    context: TokenContext,
) -> Result<AuthenticatedInfo, KeystoneApiError> {
    let provider = state.provider.get_idp_provider();
    let idp = match idp_id.filter(|x| !x.is_empty()) {
        Some(idp_id) => provider
            .get_idp(state, idp_id)
            .await?
            .ok_or_else(|| KeystoneApiError::NotFound {
                resource: "identity provider".into(),
                identifier: idp_id.to_string(),
            })?,
        None if method == AuthMethod::Cas => {
            let mut idps: Vec<IdentityProvider> = provider
                .list_idps(state)
                .await?
                .into_iter()
                .filter(|idp| idp.enabled && idp.driver == AuthMethod::Cas.as_str())
                .collect();
            if idps.len() != 1 {
                return Err(AuthenticationError::InvalidAuthMethod(format!(
                    "{} enabled cas identity providers",
                    idps.len()
                ))
                .into());
            }
            idps.remove(0)
        }
        None => {
            return Err(AuthenticationError::InvalidAuthMethod(format!(
                "{method} requires the identity provider id"
            ))
            .into());
        }
    };
    if idp.driver != method.as_str() {
        return Err(AuthenticationError::InvalidAuthMethod(format!(
            "identity provider {} does not serve {method}",
            idp.id
        ))
        .into());
    }
    let user = authenticate_with_idp(state, &idp, identity).await?;
    authenticated(state, user, method, context, Some(idp.id)).await
}

/// Resolve the requested scope.
pub async fn resolve_scope(
    state: &ServiceState,
    scope: Option<&Scope>,
) -> Result<AuthzInfo, KeystoneApiError> {
    let authz_info = match scope {
        Some(Scope::Project(scope)) => match find_project_from_scope(state, scope).await {
            Ok(Some(project)) => AuthzInfo::Project(project),
            Ok(None) | Err(KeystoneApiError::NotFound { .. }) => {
                return Err(KeystoneApiError::Unauthorized(None));
            }
            Err(err) => return Err(err),
        },
        Some(Scope::Domain(scope)) => {
            match get_domain(state, scope.id.as_ref(), scope.name.as_ref()).await {
                Ok(domain) => AuthzInfo::Domain(domain),
                Err(KeystoneApiError::NotFound { .. }) => {
                    return Err(KeystoneApiError::Unauthorized(None));
                }
                Err(err) => return Err(err),
            }
        }
        None => AuthzInfo::Unscoped,
    };
    authz_info.validate()?;
    Ok(authz_info)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use tracing_test::traced_test;

    use super::*;
    use crate::credential::{
        MockCredentialProvider,
        types::{Credential, CredentialBuilder},
    };
    use crate::identity::MockIdentityProvider;
    use crate::identity::error::IdentityProviderError;
    use crate::identity_mapping::{MockIdentityMappingProvider, types::IdMapping};
    use crate::idp::driver::{DriverClass, IdentityDriver, LDAP_CLASS};
    use crate::idp::{IdpProviderError, MockIdpProvider};
    use crate::provider::Provider;
    use crate::resource::MockResourceProvider;
    use crate::tests::{default_domain, get_state, unscoped_token, user};
    use crate::token::MockTokenProvider;

    fn ctx() -> TokenContext {
        TokenContext {
            source: "cli".into(),
            ip: "10.0.0.1".into(),
        }
    }

    fn resource_mock() -> MockResourceProvider {
        let mut resource_mock = MockResourceProvider::default();
        resource_mock
            .expect_get_domain()
            .withf(|_, id: &str| id == "default")
            .returning(|_, _| Ok(Some(default_domain())));
        resource_mock
            .expect_find_domain_by_name()
            .withf(|_, name: &str| name == "Default")
            .returning(|_, _| Ok(Some(default_domain())));
        resource_mock
    }

    fn unlinked() -> MockIdentityMappingProvider {
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock
            .expect_get_by_public_id()
            .returning(|_, _, _| Ok(None));
        mapping_mock
    }

    fn password(name: &str, domain: Option<&str>) -> PasswordCredentials {
        PasswordCredentials {
            user_name: Some(name.into()),
            domain: domain.map(|x| ApiDomain {
                name: Some(x.into()),
                id: None,
            }),
            password: "p@ss".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_password_by_name_in_domain() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_find_user_by_name()
            .withf(|_, name: &str, domain_id: &str| name == "alice" && domain_id == "default")
            .returning(|_, _, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_authenticate_by_password()
            .withf(|_, req: &UserPasswordAuthRequest| {
                req.id.as_deref() == Some("alice") && req.password == "p@ss"
            })
            .returning(|_, _| Ok(user("alice")));
        identity_mock
            .expect_record_login()
            .withf(|_, id: &str, login: &LoginContext| {
                id == "alice" && login.ip.as_deref() == Some("10.0.0.1")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(unlinked())
                .resource(resource_mock())
                .build()
                .unwrap(),
        );

        let authn = authenticate_password(&state, &password("alice", Some("Default")), ctx())
            .await
            .unwrap();
        assert_eq!("alice", authn.user_id);
        assert_eq!(AuthMethod::Password, authn.method);
        assert_eq!(Some(default_domain()), authn.user_domain);
        assert_eq!(Some(ctx()), authn.context);
    }

    #[tokio::test]
    async fn test_password_empty() {
        let state = get_state(Provider::mocked_builder().build().unwrap());
        assert!(matches!(
            authenticate_password(&state, &PasswordCredentials::default(), ctx()).await,
            Err(KeystoneApiError::Unauthorized(None))
        ));
    }

    #[tokio::test]
    async fn test_password_wrong() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .returning(|_, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_authenticate_by_password()
            .returning(|_, _| Err(IdentityProviderError::InvalidPassword));
        identity_mock.expect_record_login().never();
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(unlinked())
                .build()
                .unwrap(),
        );
        let credentials = PasswordCredentials {
            user_id: Some("alice".into()),
            password: "wrong".into(),
            ..Default::default()
        };
        assert!(matches!(
            authenticate_password(&state, &credentials, ctx()).await,
            Err(KeystoneApiError::Unauthorized(None))
        ));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_password_name_only_duplicate() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_list_users()
            .withf(|_, params: &UserListParameters| params.name.as_deref() == Some("bob"))
            .returning(|_, _| Ok(vec![user("bob"), user("bob2")]));
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(unlinked())
                .build()
                .unwrap(),
        );
        let res = authenticate_password(&state, &password("bob", None), ctx()).await;
        assert!(matches!(res, Err(KeystoneApiError::Unauthorized(None))));
        assert!(logs_contain("more than one user named bob"));
    }

    #[tokio::test]
    async fn test_password_name_only_skips_sso_linked() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_list_users()
            .returning(|_, _| Ok(vec![user("bob"), user("bob-oidc")]));
        identity_mock
            .expect_authenticate_by_password()
            .withf(|_, req: &UserPasswordAuthRequest| req.id.as_deref() == Some("bob"))
            .returning(|_, _| Ok(user("bob")));
        identity_mock
            .expect_record_login()
            .returning(|_, _, _| Ok(()));
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock
            .expect_get_by_public_id()
            .withf(|_, id: &str, _| id == "bob-oidc")
            .returning(|_, _, _| {
                Ok(Some(IdMapping {
                    idp_id: "oidc-idp".into(),
                    entity_type: IdMappingEntityType::User,
                    local_id: "sub".into(),
                    public_id: "bob-oidc".into(),
                }))
            });
        mapping_mock
            .expect_get_by_public_id()
            .withf(|_, id: &str, _| id != "bob-oidc")
            .returning(|_, _, _| Ok(None));
        let mut idp_mock = MockIdpProvider::default();
        idp_mock
            .expect_get_idp()
            .withf(|_, id: &str| id == "oidc-idp")
            .returning(|_, _| {
                Ok(Some(IdentityProvider {
                    id: "oidc-idp".into(),
                    driver: "oidc".into(),
                    enabled: true,
                    ..Default::default()
                }))
            });
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock)
                .idp(idp_mock)
                .resource(resource_mock())
                .build()
                .unwrap(),
        );
        let authn = authenticate_password(&state, &password("bob", None), ctx())
            .await
            .unwrap();
        assert_eq!("bob", authn.user_id);
    }

    struct FakeLdap;

    #[async_trait::async_trait]
    impl IdentityDriver for FakeLdap {
        fn class(&self) -> &'static DriverClass {
            &LDAP_CLASS
        }

        async fn probe(&self) -> Result<(), IdpProviderError> {
            Ok(())
        }

        async fn authenticate(
            &self,
            _state: &ServiceState,
            identity: &AuthIdentity,
        ) -> Result<UserResponse, IdpProviderError> {
            match identity {
                AuthIdentity::Password {
                    user_name,
                    password,
                } if (user_name == "carol" || user_name == "carol-name") && password == "p@ss" => {
                    Ok(user("carol"))
                }
                _ => Err(IdpProviderError::Unauthenticated),
            }
        }
    }

    fn ldap_idp(status: IdpHealth) -> IdentityProvider {
        IdentityProvider {
            id: "ldap-idp".into(),
            driver: "ldap".into(),
            enabled: true,
            status,
            target_domain_id: Some("default".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_password_ldap_fallback_marks_connected() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_find_user_by_name()
            .returning(|_, _, _| Ok(None));
        identity_mock
            .expect_record_login()
            .returning(|_, _, _| Ok(()));
        let mut idp_mock = MockIdpProvider::default();
        idp_mock
            .expect_find_idp_for_domain()
            .withf(|_, domain_id: &str| domain_id == "default")
            .returning(|_, _| Ok(Some(ldap_idp(IdpHealth::Disconnected))));
        idp_mock
            .expect_get_driver()
            .returning(|_, _| Ok(Arc::new(FakeLdap)));
        idp_mock
            .expect_set_health()
            .withf(|_, id: &str, health: &IdpHealth| {
                id == "ldap-idp" && *health == IdpHealth::Connected
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .idp(idp_mock)
                .resource(resource_mock())
                .build()
                .unwrap(),
        );
        let authn = authenticate_password(&state, &password("carol", Some("Default")), ctx())
            .await
            .unwrap();
        assert_eq!("carol", authn.user_id);
        assert_eq!(Some("ldap-idp".to_string()), authn.idp_id);
    }

    #[tokio::test]
    async fn test_password_linked_ldap_user() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .returning(|_, _| Ok(Some(user("carol"))));
        identity_mock.expect_authenticate_by_password().never();
        identity_mock
            .expect_record_login()
            .returning(|_, _, _| Ok(()));
        let mut mapping_mock = MockIdentityMappingProvider::default();
        mapping_mock.expect_get_by_public_id().returning(|_, _, _| {
            Ok(Some(IdMapping {
                idp_id: "ldap-idp".into(),
                entity_type: IdMappingEntityType::User,
                local_id: "carol".into(),
                public_id: "carol".into(),
            }))
        });
        let mut idp_mock = MockIdpProvider::default();
        idp_mock
            .expect_get_idp()
            .returning(|_, _| Ok(Some(ldap_idp(IdpHealth::Connected))));
        idp_mock
            .expect_get_driver()
            .returning(|_, _| Ok(Arc::new(FakeLdap)));
        idp_mock.expect_set_health().never();
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .identity_mapping(mapping_mock)
                .idp(idp_mock)
                .resource(resource_mock())
                .build()
                .unwrap(),
        );
        let credentials = PasswordCredentials {
            user_id: Some("carol".into()),
            password: "p@ss".into(),
            ..Default::default()
        };
        let authn = authenticate_password(&state, &credentials, ctx())
            .await
            .unwrap();
        assert_eq!(Some("ldap-idp".to_string()), authn.idp_id);
    }

    #[tokio::test]
    async fn test_token_method() {
        let mut token_mock = MockTokenProvider::default();
        token_mock
            .expect_validate_token()
            .withf(|_, credential: &str| credential == "parent")
            .returning(|_, _| Ok(unscoped_token("alice")));
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .returning(|_, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_record_login()
            .returning(|_, _, _| Ok(()));
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .resource(resource_mock())
                .token(token_mock)
                .build()
                .unwrap(),
        );
        let authn = authenticate_token(&state, "parent", ctx()).await.unwrap();
        assert_eq!(AuthMethod::Token, authn.method);
        assert_eq!(Some("parent".to_string()), authn.parent_token);
    }

    #[tokio::test]
    async fn test_sso_cas_requires_single_provider() {
        let mut idp_mock = MockIdpProvider::default();
        idp_mock.expect_list_idps().returning(|_| {
            Ok(vec![
                IdentityProvider {
                    id: "cas1".into(),
                    driver: "cas".into(),
                    enabled: true,
                    ..Default::default()
                },
                IdentityProvider {
                    id: "cas2".into(),
                    driver: "cas".into(),
                    enabled: true,
                    ..Default::default()
                },
            ])
        });
        let state = get_state(Provider::mocked_builder().idp(idp_mock).build().unwrap());
        let identity = AuthIdentity::Cas {
            ticket: "ST-1".into(),
            service: "https://keystone/cb".into(),
        };
        assert!(matches!(
            authenticate_sso(&state, AuthMethod::Cas, None, &identity, ctx()).await,
            Err(KeystoneApiError::Unauthorized(None))
        ));
    }

    #[tokio::test]
    async fn test_sso_driver_mismatch() {
        let mut idp_mock = MockIdpProvider::default();
        idp_mock
            .expect_get_idp()
            .returning(|_, _| Ok(Some(ldap_idp(IdpHealth::Connected))));
        idp_mock.expect_get_driver().never();
        let state = get_state(Provider::mocked_builder().idp(idp_mock).build().unwrap());
        let identity = AuthIdentity::Oidc {
            code: "c".into(),
            redirect_uri: "https://keystone/cb".into(),
        };
        assert!(
            authenticate_sso(&state, AuthMethod::Oidc, Some("ldap-idp"), &identity, ctx())
                .await
                .is_err()
        );
    }

    fn access_key(id: &str, enabled: bool, blob: serde_json::Value) -> Credential {
        CredentialBuilder::default()
            .id(id)
            .user_id("alice")
            .project_id("p1")
            .r#type(CredentialType::Aksk)
            .blob(blob.to_string())
            .key_hash("k0")
            .enabled(enabled)
            .build()
            .unwrap()
    }

    fn credential_mock() -> MockCredentialProvider {
        let mut credential_mock = MockCredentialProvider::default();
        credential_mock
            .expect_get_credential()
            .returning(|_, id: &'_ str| {
                Ok(match id {
                    "ak1" => Some(access_key("ak1", true, serde_json::json!({"secret": "s3cr3t"}))),
                    "ak-disabled" => Some(access_key(
                        "ak-disabled",
                        false,
                        serde_json::json!({"secret": "s3cr3t"}),
                    )),
                    "ak-expired" => Some(access_key(
                        "ak-expired",
                        true,
                        serde_json::json!({"secret": "s3cr3t", "expire": "2020-01-01T00:00:00Z"}),
                    )),
                    "totp1" => Some(Credential {
                        r#type: CredentialType::Totp,
                        ..access_key("totp1", true, serde_json::json!({"secret": "s3cr3t"}))
                    }),
                    _ => None,
                })
            });
        credential_mock
    }

    fn signed(access_key: &str, secret: &str, text: &str) -> AccessKeyRequest {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(text.as_bytes());
        AccessKeyRequest {
            access_key: access_key.into(),
            string_to_sign: text.into(),
            signature: STANDARD.encode(mac.finalize().into_bytes()),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn test_aksk() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .withf(|_, id: &str| id == "alice")
            .returning(|_, _| Ok(Some(user("alice"))));
        identity_mock
            .expect_record_login()
            .times(1)
            .returning(|_, _, _| Ok(()));
        let state = get_state(
            Provider::mocked_builder()
                .credential(credential_mock())
                .identity(identity_mock)
                .resource(resource_mock())
                .build()
                .unwrap(),
        );
        let (authn, project_id) =
            authenticate_aksk(&state, &signed("ak1", "s3cr3t", "GET\n/v3/auth/tokens"), ctx())
                .await
                .unwrap();
        assert_eq!("alice", authn.user_id);
        assert_eq!(AuthMethod::Aksk, authn.method);
        assert_eq!(Some("p1".to_string()), project_id);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_aksk_rejected() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock.expect_get_user().never();
        identity_mock.expect_record_login().never();
        let state = get_state(
            Provider::mocked_builder()
                .credential(credential_mock())
                .identity(identity_mock)
                .build()
                .unwrap(),
        );
        for (request, message) in [
            (signed("ak1", "wrong", "text"), "invalid credential"),
            (
                AccessKeyRequest {
                    string_to_sign: "other text".into(),
                    ..signed("ak1", "s3cr3t", "text")
                },
                "invalid credential",
            ),
            (signed("unknown", "s3cr3t", "text"), "invalid access key unknown"),
            (signed("totp1", "s3cr3t", "text"), "invalid access key totp1"),
            (signed("ak-disabled", "s3cr3t", "text"), "access key ak-disabled is disabled"),
            (signed("ak-expired", "s3cr3t", "text"), "access key ak-expired expired"),
        ] {
            assert!(
                matches!(
                    authenticate_aksk(&state, &request, ctx()).await,
                    Err(KeystoneApiError::Unauthorized(None))
                ),
                "{message}"
            );
            assert!(logs_contain(message));
        }
    }
}
