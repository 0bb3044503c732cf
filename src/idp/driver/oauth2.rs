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
//! # OAuth2 driver
//!
//! Plain OAuth2 authorization code flow against providers without OpenID
//! Connect support. The user is described by the userinfo endpoint.
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::config::Config;
use crate::identity::types::UserResponse;
use crate::idp::IdpProviderError;
use crate::idp::driver::{
    AuthIdentity, Claims, DriverClass, IdentityDriver, OAUTH2_CLASS, attribute_options,
    claims_from_json, http_client, required_option,
};
use crate::idp::mapper;
use crate::idp::types::{IdentityProvider, IdpAttributeOptions, IdpConfig};
use crate::keystone::ServiceState;

const GROUP: &str = "oauth2";

/// Pick the access token out of the token endpoint response. Some
/// providers answer with a form encoded body instead of JSON.
pub fn parse_access_token(body: &str) -> Result<String, IdpProviderError> {
    let fields: HashMap<String, String> = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k, v.to_string())))
            .collect(),
        _ => serde_urlencoded::from_str(body)
            .map_err(|err| IdpProviderError::OAuth2(err.to_string()))?,
    };
    if let Some(error) = fields.get("error") {
        warn!("token endpoint refused the code: {error}");
        return Err(IdpProviderError::Unauthenticated);
    }
    fields
        .get("access_token")
        .filter(|x| !x.is_empty())
        .cloned()
        .ok_or_else(|| IdpProviderError::OAuth2("no access token in the response".into()))
}

pub struct OAuth2Driver {
    idp: IdentityProvider,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
    client_id: String,
    client_secret: Option<String>,
    scope: Option<String>,
    client: reqwest::Client,
    attributes: IdpAttributeOptions,
}

impl OAuth2Driver {
    pub fn factory(
        idp: &IdentityProvider,
        options: &IdpConfig,
        config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        Ok(Arc::new(Self {
            idp: idp.clone(),
            auth_url: Url::parse(&required_option(options, GROUP, "auth_url")?)?,
            token_url: Url::parse(&required_option(options, GROUP, "token_url")?)?,
            userinfo_url: Url::parse(&required_option(options, GROUP, "userinfo_url")?)?,
            client_id: required_option(options, GROUP, "client_id")?,
            client_secret: options.get_str(GROUP, "client_secret"),
            scope: options.get_str(GROUP, "scope"),
            client: http_client(options, GROUP, config)?,
            attributes: attribute_options(
                options,
                GROUP,
                &[
                    ("user_id_attribute", "id"),
                    ("user_name_attribute", "login"),
                    ("user_displayname_attribute", "name"),
                    ("user_email_attribute", "email"),
                ],
            ),
        }))
    }

    /// Exchange the authorization code for the access token.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, IdpProviderError> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.as_str()));
        }
        let body = self
            .client
            .post(self.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&form)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_access_token(&body)
    }

    pub async fn fetch_userinfo(&self, access_token: &str) -> Result<Claims, IdpProviderError> {
        let body = self
            .client
            .get(self.userinfo_url.clone())
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(claims_from_json(&serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl IdentityDriver for OAuth2Driver {
    fn class(&self) -> &'static DriverClass {
        &OAUTH2_CLASS
    }

    async fn probe(&self) -> Result<(), IdpProviderError> {
        Ok(())
    }

    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError> {
        let AuthIdentity::OAuth2 { code, redirect_uri } = identity else {
            return Err(self.unsupported(identity.kind()));
        };
        let access_token = self.exchange_code(code, redirect_uri).await?;
        let claims = self.fetch_userinfo(&access_token).await?;
        mapper::map_claims(state, &self.idp, &self.attributes, &claims).await
    }

    async fn get_sso_redirect_uri(
        &self,
        callback: &str,
        state: &str,
    ) -> Result<String, IdpProviderError> {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", callback)
            .append_pair("state", state);
        if let Some(scope) = &self.scope {
            url.query_pairs_mut().append_pair("scope", scope);
        }
        Ok(url.to_string())
    }
}
