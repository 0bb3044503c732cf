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
//! Local password driver.
use async_trait::async_trait;
use std::sync::Arc;

use crate::config::Config;
use crate::identity::IdentityApi;
use crate::identity::types::{UserPasswordAuthRequest, UserResponse};
use crate::idp::IdpProviderError;
use crate::idp::driver::{AuthIdentity, DriverClass, IdentityDriver, SQL_CLASS};
use crate::idp::types::{IdentityProvider, IdpConfig};
use crate::keystone::ServiceState;

/// Domain of the users of an identity provider without a target domain.
const DEFAULT_DOMAIN_ID: &str = "default";

/// Driver verifying the passwords stored in the local tables.
pub struct SqlDriver {
    domain_id: String,
}

impl SqlDriver {
    pub fn factory(
        idp: &IdentityProvider,
        _options: &IdpConfig,
        _config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        Ok(Arc::new(Self {
            domain_id: idp
                .target_domain_id
                .clone()
                .unwrap_or_else(|| DEFAULT_DOMAIN_ID.to_string()),
        }))
    }
}

#[async_trait]
impl IdentityDriver for SqlDriver {
    fn class(&self) -> &'static DriverClass {
        &SQL_CLASS
    }

    async fn probe(&self) -> Result<(), IdpProviderError> {
        Ok(())
    }

    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError> {
        match identity {
            AuthIdentity::Password {
                user_name,
                password,
            } => Ok(state
                .provider
                .get_identity_provider()
                .authenticate_by_password(
                    state,
                    &UserPasswordAuthRequest {
                        id: None,
                        name: Some(user_name.clone()),
                        domain_id: Some(self.domain_id.clone()),
                        password: password.clone(),
                    },
                )
                .await?),
            other => Err(self.unsupported(other.kind())),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::identity::MockIdentityProvider;
    use crate::provider::Provider;
    use crate::tests::get_state;

    use crate::idp::driver::driver_class;

    use super::*;

    #[tokio::test]
    async fn test_authenticate_in_default_domain() {
        let mut identity_mock = MockIdentityProvider::default();
        identity_mock
            .expect_authenticate_by_password()
            .withf(|_, req: &UserPasswordAuthRequest| {
                req.name.as_deref() == Some("alice")
                    && req.domain_id.as_deref() == Some("default")
                    && req.password == "p@ss"
            })
            .returning(|_, _| {
                Ok(UserResponse {
                    id: "alice-id".into(),
                    name: "alice".into(),
                    domain_id: "default".into(),
                    enabled: true,
                    ..Default::default()
                })
            });
        let state = get_state(
            Provider::mocked_builder()
                .identity(identity_mock)
                .build()
                .unwrap(),
        );
        let driver = SqlDriver::factory(
            &IdentityProvider::default(),
            &IdpConfig::default(),
            &Config::default(),
        )
        .unwrap();
        assert_eq!(Some(driver.class()), driver_class("sql"));
        let user = driver
            .authenticate(
                &state,
                &AuthIdentity::Password {
                    user_name: "alice".into(),
                    password: "p@ss".into(),
                },
            )
            .await
            .unwrap();
        assert_eq!("alice-id", user.id);

        assert!(matches!(
            driver
                .authenticate(
                    &state,
                    &AuthIdentity::Cas {
                        ticket: "t".into(),
                        service: "s".into()
                    }
                )
                .await,
            Err(IdpProviderError::DriverUnsupportedOperation { .. })
        ));
    }
}
