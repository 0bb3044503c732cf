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
//! # Token provider.
//!
//! A token is an alpha-numeric text string that enables access to the APIs.
//! It is a Fernet envelope around a MessagePack payload naming the user, the
//! scope, the authentication method, the expiration and the audit ids. A
//! token may be revoked at any time and is valid for a finite duration.

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;
use validator::Validate;

pub mod backend;
pub mod error;
#[cfg(test)]
mod mock;
pub mod types;

use crate::assignment::AssignmentApi;
use crate::auth::{AuthenticatedInfo, AuthzInfo};
use crate::config::{Config, TokenProviderDriver};
use crate::identity::IdentityApi;
use crate::keystone::ServiceState;
use crate::policy::{
    PolicyApi,
    types::{PolicyGroup, PolicyRequest},
};
use crate::resource::ResourceApi;
use crate::revoke::{RevokeApi, types::TokenRecord};
use backend::{TokenBackend, fernet::FernetTokenProvider};
pub use error::TokenProviderError;

pub use crate::token::types::*;
#[cfg(test)]
pub use mock::MockTokenProvider;

#[derive(Clone)]
pub struct TokenProvider {
    config: Config,
    backend_driver: Arc<dyn TokenBackend>,
}

impl TokenProvider {
    pub fn new(config: &Config) -> Result<Self, TokenProviderError> {
        let backend_driver = match config.token.provider {
            TokenProviderDriver::Fernet => FernetTokenProvider::new(config),
        };
        Ok(Self {
            config: config.clone(),
            backend_driver: Arc::new(backend_driver),
        })
    }

    /// Expiration of a new token, never later than the `cap`.
    fn get_new_token_expiry(
        &self,
        cap: Option<DateTime<Utc>>,
    ) -> Result<DateTime<Utc>, TokenProviderError> {
        let expiry = Utc::now()
            .checked_add_signed(TimeDelta::seconds(self.config.token.expiration as i64))
            .ok_or(TokenProviderError::ExpiryCalculation)?;
        Ok(cap.map(|cap| cap.min(expiry)).unwrap_or(expiry))
    }

    /// Create unscoped token.
    fn create_unscoped_token(
        &self,
        authentication_info: &AuthenticatedInfo,
        audit_ids: &[String],
    ) -> Result<Token, TokenProviderError> {
        let payload = UnscopedPayloadBuilder::default()
            .user_id(authentication_info.user_id.clone())
            .user(authentication_info.user.clone())
            .method(authentication_info.method)
            .audit_ids(audit_ids.iter())
            .expires_at(self.get_new_token_expiry(authentication_info.expires_at)?)
            .context(authentication_info.context.clone())
            .build()?;
        payload.validate()?;
        Ok(Token::Unscoped(payload))
    }

    /// Create project scoped token.
    fn create_project_scope_token(
        &self,
        authentication_info: &AuthenticatedInfo,
        audit_ids: &[String],
        project: &crate::resource::types::Project,
    ) -> Result<Token, TokenProviderError> {
        let payload = ProjectScopePayloadBuilder::default()
            .user_id(authentication_info.user_id.clone())
            .user(authentication_info.user.clone())
            .method(authentication_info.method)
            .audit_ids(audit_ids.iter())
            .expires_at(self.get_new_token_expiry(authentication_info.expires_at)?)
            .context(authentication_info.context.clone())
            .project_id(project.id.clone())
            .project(project.clone())
            .build()?;
        payload.validate()?;
        Ok(Token::ProjectScope(payload))
    }

    /// Create domain scoped token.
    fn create_domain_scope_token(
        &self,
        authentication_info: &AuthenticatedInfo,
        audit_ids: &[String],
        domain: &crate::resource::types::Domain,
    ) -> Result<Token, TokenProviderError> {
        let payload = DomainScopePayloadBuilder::default()
            .user_id(authentication_info.user_id.clone())
            .user(authentication_info.user.clone())
            .method(authentication_info.method)
            .audit_ids(audit_ids.iter())
            .expires_at(self.get_new_token_expiry(authentication_info.expires_at)?)
            .context(authentication_info.context.clone())
            .domain_id(domain.id.clone())
            .domain(domain.clone())
            .build()?;
        payload.validate()?;
        Ok(Token::DomainScope(payload))
    }

    /// Expand user information in the token.
    ///
    /// The user and the owning domain must still exist and be enabled.
    async fn expand_user_information(
        &self,
        state: &ServiceState,
        token: &mut Token,
    ) -> Result<(), TokenProviderError> {
        let user = match token.user() {
            Some(user) => user.clone(),
            None => state
                .provider
                .get_identity_provider()
                .get_user(state, token.user_id())
                .await?
                .ok_or_else(|| TokenProviderError::UserNotFound(token.user_id().clone()))?,
        };
        if !user.enabled {
            return Err(TokenProviderError::UserDisabled(user.id));
        }
        if let Some(domain) = state
            .provider
            .get_resource_provider()
            .get_domain(state, &user.domain_id)
            .await?
            && !domain.enabled
        {
            return Err(TokenProviderError::DomainDisabled(domain.id));
        }
        token.set_user(Some(user));
        Ok(())
    }

    /// Expand the target scope information in the token.
    async fn expand_scope_information(
        &self,
        state: &ServiceState,
        token: &mut Token,
    ) -> Result<(), TokenProviderError> {
        match token {
            Token::ProjectScope(data) => {
                if data.project.is_none() {
                    data.project = state
                        .provider
                        .get_resource_provider()
                        .get_project(state, &data.project_id)
                        .await?;
                }
                match &data.project {
                    None => return Err(TokenProviderError::ProjectNotFound(data.project_id.clone())),
                    Some(project) if !project.enabled => {
                        return Err(TokenProviderError::ProjectDisabled(project.id.clone()));
                    }
                    _ => {}
                }
            }
            Token::DomainScope(data) => {
                if data.domain.is_none() {
                    data.domain = state
                        .provider
                        .get_resource_provider()
                        .get_domain(state, &data.domain_id)
                        .await?;
                }
                match &data.domain {
                    None => return Err(TokenProviderError::DomainNotFound(data.domain_id.clone())),
                    Some(domain) if !domain.enabled => {
                        return Err(TokenProviderError::DomainDisabled(domain.id.clone()));
                    }
                    _ => {}
                }
            }
            Token::Unscoped(_) => {}
        };
        Ok(())
    }

    /// Populate the effective roles of the user on the token scope.
    async fn populate_role_assignments(
        &self,
        state: &ServiceState,
        token: &mut Token,
    ) -> Result<(), TokenProviderError> {
        let (user_id, target_id, roles) = match token {
            Token::ProjectScope(data) => (&data.user_id, &data.project_id, &mut data.roles),
            Token::DomainScope(data) => (&data.user_id, &data.domain_id, &mut data.roles),
            Token::Unscoped(_) => return Ok(()),
        };
        let effective = state
            .provider
            .get_assignment_provider()
            .list_effective_roles(state, user_id, target_id)
            .await?;
        if effective.is_empty() {
            debug!("user {} has no roles on {}", user_id, target_id);
            return Err(TokenProviderError::ActorHasNoRolesOnTarget);
        }
        *roles = Some(effective);
        Ok(())
    }
}

#[async_trait]
impl TokenApi for TokenProvider {
    /// Issue the token.
    #[tracing::instrument(level = "info", skip(self, state, authentication_info, authz_info), fields(user_id = %authentication_info.user_id))]
    async fn issue_token(
        &self,
        state: &ServiceState,
        authentication_info: AuthenticatedInfo,
        authz_info: AuthzInfo,
    ) -> Result<IssuedToken, TokenProviderError> {
        authentication_info.validate()?;
        authz_info.validate()?;

        let mut audit_ids = vec![URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())];
        audit_ids.extend(authentication_info.audit_ids.iter().cloned());

        let token = match &authz_info {
            AuthzInfo::Unscoped => self.create_unscoped_token(&authentication_info, &audit_ids)?,
            AuthzInfo::Project(project) => {
                self.create_project_scope_token(&authentication_info, &audit_ids, project)?
            }
            AuthzInfo::Domain(domain) => {
                self.create_domain_scope_token(&authentication_info, &audit_ids, domain)?
            }
        };
        let token = self.expand_token_information(state, &token).await?;
        let credential = self.encode_token(state, &token)?;

        // Tokens minted from a token are chained to the parent so that the
        // revocation of the parent reaches them.
        let record = TokenRecord {
            token: credential.clone(),
            expires_at: *token.expires_at(),
            method: authentication_info.method.to_string(),
            audit_ids: match &authentication_info.parent_token {
                Some(parent) => vec![parent.clone()],
                None => token.audit_ids().clone(),
            },
        };
        state
            .provider
            .get_revoke_provider()
            .record_token(state, &record)
            .await?;
        state
            .token_cache
            .insert(credential.clone(), token.clone())
            .await;
        Ok(IssuedToken { credential, token })
    }

    /// Validate token.
    #[tracing::instrument(level = "info", skip(self, state, credential))]
    async fn validate_token<'a>(
        &self,
        state: &ServiceState,
        credential: &'a str,
    ) -> Result<Token, TokenProviderError> {
        if let Some(token) = state.token_cache.get(credential).await {
            if *token.expires_at() > Utc::now() {
                trace!("token found in the cache");
                return Ok(token);
            }
            state.token_cache.invalidate(credential).await;
        }
        let token = self
            .backend_driver
            .decode(&state.key_rings.token, credential)?;

        if state
            .provider
            .get_revoke_provider()
            .is_token_revoked(state, credential)
            .await?
        {
            return Err(TokenProviderError::TokenRevoked);
        }

        let token = self.expand_token_information(state, &token).await?;
        state
            .token_cache
            .insert(credential.to_string(), token.clone())
            .await;
        Ok(token)
    }

    /// Encode the token into a `String` representation.
    fn encode_token(&self, state: &ServiceState, token: &Token) -> Result<String, TokenProviderError> {
        self.backend_driver.encode(&state.key_rings.token, token)
    }

    /// Expand the token information.
    ///
    /// Query and expand information about the user, scope and the role
    /// assignments into the token.
    async fn expand_token_information(
        &self,
        state: &ServiceState,
        token: &Token,
    ) -> Result<Token, TokenProviderError> {
        let mut new_token = token.clone();
        self.expand_user_information(state, &mut new_token).await?;
        self.expand_scope_information(state, &mut new_token).await?;
        self.populate_role_assignments(state, &mut new_token)
            .await?;
        Ok(new_token)
    }

    #[tracing::instrument(level = "info", skip(self, state, token))]
    async fn get_token_policies(
        &self,
        state: &ServiceState,
        token: &Token,
    ) -> Result<PolicyGroup, TokenProviderError> {
        let request = PolicyRequest {
            role_ids: token
                .roles()
                .map(|roles| roles.iter().map(|role| role.id.clone()).collect())
                .unwrap_or_default(),
            project_id: token.project_id().cloned(),
            ip: token
                .context()
                .map(|ctx| ctx.ip.clone())
                .filter(|ip| !ip.is_empty()),
        };
        Ok(state
            .provider
            .get_policy_provider()
            .get_policy_group(state, &request)
            .await?)
    }

    #[tracing::instrument(level = "info", skip(self, state, credential, token))]
    async fn revoke_token<'a>(
        &self,
        state: &ServiceState,
        credential: &'a str,
        token: &Token,
    ) -> Result<Vec<String>, TokenProviderError> {
        let record = TokenRecord {
            token: credential.to_string(),
            expires_at: *token.expires_at(),
            method: token.method().to_string(),
            audit_ids: token.audit_ids().clone(),
        };
        let revoked = state
            .provider
            .get_revoke_provider()
            .revoke_token(state, &record)
            .await?;
        for item in revoked.iter() {
            state.token_cache.invalidate(item).await;
        }
        Ok(revoked)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::assignment::{MockAssignmentProvider, types::Role};
    use crate::identity::{MockIdentityProvider, types::UserResponse};
    use crate::policy::MockPolicyProvider;
    use crate::provider::Provider;
    use crate::resource::{
        MockResourceProvider,
        types::{Domain, Project},
    };
    use crate::revoke::MockRevokeProvider;
    use crate::tests::get_state;

    fn user_mock(enabled: bool) -> MockIdentityProvider {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_get_user()
            .withf(|_, id: &str| id == "uid")
            .returning(move |_, _| {
                Ok(Some(UserResponse {
                    id: "uid".into(),
                    domain_id: "default".into(),
                    enabled,
                    ..Default::default()
                }))
            });
        identity_mock
    }

    fn resource_mock() -> MockResourceProvider {
        let mut resource_mock = MockResourceProvider::default();
        resource_mock
            .expect_get_domain()
            .withf(|_, id: &str| id == "default")
            .returning(|_, _| {
                Ok(Some(Domain {
                    id: "default".into(),
                    name: "Default".into(),
                    enabled: true,
                    ..Default::default()
                }))
            });
        resource_mock
            .expect_get_project()
            .withf(|_, id: &str| id == "pid")
            .returning(|_, _| Ok(Some(project())));
        resource_mock
    }

    fn project() -> Project {
        Project {
            id: "pid".into(),
            name: "demo".into(),
            domain_id: "default".into(),
            enabled: true,
            ..Default::default()
        }
    }

    fn assignment_mock(roles: Vec<Role>) -> MockAssignmentProvider {
        let mut assignment_mock = MockAssignmentProvider::default();
        assignment_mock
            .expect_list_effective_roles()
            .returning(move |_, _, _| Ok(roles.clone()));
        assignment_mock
    }

    fn member() -> Role {
        Role {
            id: "rid".into(),
            name: "member".into(),
            ..Default::default()
        }
    }

    fn authn(method: AuthMethod) -> AuthenticatedInfo {
        AuthenticatedInfo::builder()
            .user_id("uid")
            .user(UserResponse {
                id: "uid".into(),
                domain_id: "default".into(),
                enabled: true,
                ..Default::default()
            })
            .method(method)
            .build()
            .unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_issue_and_validate_project_token() {
        let mut revoke_mock = MockRevokeProvider::default();
        revoke_mock
            .expect_record_token()
            .withf(|_, record: &TokenRecord| record.method == "password" && record.audit_ids.len() == 1)
            .returning(|_, _| Ok(()));
        revoke_mock
            .expect_is_token_revoked()
            .returning(|_, _| Ok(false));
        let provider = Provider::mocked_builder()
            .identity(user_mock(true))
            .resource(resource_mock())
            .assignment(assignment_mock(vec![member()]))
            .revoke(revoke_mock)
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();

        let issued = token_provider
            .issue_token(&state, authn(AuthMethod::Password), AuthzInfo::Project(project()))
            .await
            .unwrap();
        assert_eq!(Some(&"pid".to_string()), issued.token.project_id());
        assert_eq!(Some(&vec![member()]), issued.token.roles());
        assert!(*issued.token.expires_at() > Utc::now());

        // Served from the in-memory cache.
        let validated = token_provider
            .validate_token(&state, &issued.credential)
            .await
            .unwrap();
        assert_eq!(issued.token, validated);

        // Decoded again after the cache eviction.
        state.token_cache.invalidate(&issued.credential).await;
        let validated = token_provider
            .validate_token(&state, &issued.credential)
            .await
            .unwrap();
        assert_eq!(issued.token.audit_ids(), validated.audit_ids());
        assert_eq!(Some(&vec![member()]), validated.roles());
    }

    #[tokio::test]
    async fn test_issue_no_roles() {
        let provider = Provider::mocked_builder()
            .identity(user_mock(true))
            .resource(resource_mock())
            .assignment(assignment_mock(vec![]))
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();

        assert!(matches!(
            token_provider
                .issue_token(&state, authn(AuthMethod::Password), AuthzInfo::Project(project()))
                .await,
            Err(TokenProviderError::ActorHasNoRolesOnTarget)
        ));
    }

    #[tokio::test]
    async fn test_issue_chained_token() {
        let mut revoke_mock = MockRevokeProvider::default();
        revoke_mock
            .expect_record_token()
            .withf(|_, record: &TokenRecord| {
                record.method == "token" && record.audit_ids == vec!["parent-token".to_string()]
            })
            .returning(|_, _| Ok(()));
        let provider = Provider::mocked_builder()
            .identity(user_mock(true))
            .resource(resource_mock())
            .revoke(revoke_mock)
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();

        let mut info = authn(AuthMethod::Token);
        info.parent_token = Some("parent-token".into());
        info.audit_ids = vec!["operator".into()];
        let cap = Utc::now() + TimeDelta::seconds(60);
        info.expires_at = Some(cap);
        let issued = token_provider
            .issue_token(&state, info, AuthzInfo::Unscoped)
            .await
            .unwrap();
        assert_eq!(2, issued.token.audit_ids().len());
        assert_eq!("operator", issued.token.audit_ids()[1]);
        assert!(*issued.token.expires_at() <= cap);
    }

    #[tokio::test]
    async fn test_validate_revoked() {
        let mut revoke_mock = MockRevokeProvider::default();
        revoke_mock
            .expect_is_token_revoked()
            .returning(|_, _| Ok(true));
        let provider = Provider::mocked_builder()
            .revoke(revoke_mock)
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();
        let token = Token::Unscoped(UnscopedPayload {
            user_id: "uid".into(),
            audit_ids: vec!["Zm9vCg".into()],
            expires_at: Utc::now() + TimeDelta::seconds(60),
            ..Default::default()
        });
        let credential = token_provider.encode_token(&state, &token).unwrap();
        assert!(matches!(
            token_provider.validate_token(&state, &credential).await,
            Err(TokenProviderError::TokenRevoked)
        ));
    }

    #[tokio::test]
    async fn test_validate_disabled_user() {
        let mut revoke_mock = MockRevokeProvider::default();
        revoke_mock
            .expect_is_token_revoked()
            .returning(|_, _| Ok(false));
        let provider = Provider::mocked_builder()
            .identity(user_mock(false))
            .revoke(revoke_mock)
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();
        let token = Token::Unscoped(UnscopedPayload {
            user_id: "uid".into(),
            audit_ids: vec!["Zm9vCg".into()],
            expires_at: Utc::now() + TimeDelta::seconds(60),
            ..Default::default()
        });
        let credential = token_provider.encode_token(&state, &token).unwrap();
        assert!(matches!(
            token_provider.validate_token(&state, &credential).await,
            Err(TokenProviderError::UserDisabled(_))
        ));
    }

    #[tokio::test]
    async fn test_revoke_evicts_cache() {
        let mut revoke_mock = MockRevokeProvider::default();
        revoke_mock
            .expect_revoke_token()
            .returning(|_, record| Ok(vec![record.token.clone(), "child".into()]));
        let provider = Provider::mocked_builder()
            .revoke(revoke_mock)
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();
        let token = Token::Unscoped(UnscopedPayload {
            user_id: "uid".into(),
            audit_ids: vec!["Zm9vCg".into()],
            expires_at: Utc::now() + TimeDelta::seconds(60),
            ..Default::default()
        });
        state
            .token_cache
            .insert("parent".into(), token.clone())
            .await;
        state.token_cache.insert("child".into(), token.clone()).await;

        let revoked = token_provider
            .revoke_token(&state, "parent", &token)
            .await
            .unwrap();
        assert_eq!(vec!["parent".to_string(), "child".to_string()], revoked);
        assert!(state.token_cache.get("parent").await.is_none());
        assert!(state.token_cache.get("child").await.is_none());
    }

    #[tokio::test]
    async fn test_token_policies_request() {
        let mut policy_mock = MockPolicyProvider::default();
        policy_mock
            .expect_get_policy_group()
            .withf(|_, req: &PolicyRequest| {
                req.role_ids == vec!["rid".to_string()]
                    && req.project_id.as_deref() == Some("pid")
                    && req.ip.as_deref() == Some("10.0.0.1")
            })
            .returning(|_, _| Ok(PolicyGroup::default()));
        let provider = Provider::mocked_builder()
            .policy(policy_mock)
            .build()
            .unwrap();
        let state = get_state(provider);
        let token_provider = TokenProvider::new(&state.config).unwrap();
        let token = Token::ProjectScope(ProjectScopePayload {
            user_id: "uid".into(),
            project_id: "pid".into(),
            roles: Some(vec![member()]),
            context: Some(TokenContext {
                source: "cli".into(),
                ip: "10.0.0.1".into(),
            }),
            ..Default::default()
        });
        assert!(
            token_provider
                .get_token_policies(&state, &token)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
