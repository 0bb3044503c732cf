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
//! # OpenID Connect driver
//!
//! The provider is discovered from its issuer URL. The authorization code
//! is exchanged for the tokens, the ID token is verified against the
//! provider keys and its claims are merged with the userinfo response.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use openidconnect::core::{
    CoreAuthDisplay, CoreAuthPrompt, CoreAuthenticationFlow, CoreErrorResponseType,
    CoreGenderClaim, CoreJsonWebKey, CoreJweContentEncryptionAlgorithm, CoreJwsSigningAlgorithm,
    CoreProviderMetadata, CoreRevocableToken, CoreRevocationErrorResponse,
    CoreTokenIntrospectionResponse, CoreTokenType,
};
use openidconnect::{
    AdditionalClaims, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointMaybeSet,
    EndpointNotSet, EndpointSet, ExtraTokenFields, IdTokenFields, IssuerUrl, Nonce,
    OAuth2TokenResponse, RedirectUrl, Scope, StandardErrorResponse, StandardTokenResponse,
    TokenResponse,
};

use crate::config::Config;
use crate::identity::types::UserResponse;
use crate::idp::IdpProviderError;
use crate::idp::driver::{
    AuthIdentity, Claims, DriverClass, IdentityDriver, OIDC_CLASS, attribute_options,
    claims_from_json, http_client, required_option,
};
use crate::idp::mapper;
use crate::idp::types::{IdentityProvider, IdpAttributeOptions, IdpConfig};
use crate::keystone::ServiceState;

const GROUP: &str = "oidc";

const DEFAULT_SCOPES: &str = "openid profile email";

#[derive(Debug, Deserialize, Serialize)]
struct AllOtherClaims(HashMap<String, serde_json::Value>);
impl AdditionalClaims for AllOtherClaims {}

#[derive(Debug, Deserialize, Serialize)]
struct ExtraFields(HashMap<String, serde_json::Value>);
impl ExtraTokenFields for ExtraFields {}

type OidcIdTokenFields = IdTokenFields<
    AllOtherClaims,
    ExtraFields,
    CoreGenderClaim,
    CoreJweContentEncryptionAlgorithm,
    CoreJwsSigningAlgorithm,
>;

type OidcTokenResponse = StandardTokenResponse<OidcIdTokenFields, CoreTokenType>;

type OidcClient<
    HasAuthUrl = EndpointSet,
    HasDeviceAuthUrl = EndpointNotSet,
    HasIntrospectionUrl = EndpointNotSet,
    HasRevocationUrl = EndpointNotSet,
    HasTokenUrl = EndpointMaybeSet,
    HasUserInfoUrl = EndpointMaybeSet,
> = openidconnect::Client<
    AllOtherClaims,
    CoreAuthDisplay,
    CoreGenderClaim,
    CoreJweContentEncryptionAlgorithm,
    CoreJsonWebKey,
    CoreAuthPrompt,
    StandardErrorResponse<CoreErrorResponseType>,
    OidcTokenResponse,
    CoreTokenIntrospectionResponse,
    CoreRevocableToken,
    CoreRevocationErrorResponse,
    HasAuthUrl,
    HasDeviceAuthUrl,
    HasIntrospectionUrl,
    HasRevocationUrl,
    HasTokenUrl,
    HasUserInfoUrl,
>;

fn oauth2_error<E: std::fmt::Display>(err: E) -> IdpProviderError {
    IdpProviderError::OAuth2(err.to_string())
}

/// Merge the userinfo claims into the ID token claims.
///
/// Both documents must name the same subject.
pub fn merge_userinfo(mut claims: Claims, userinfo: Claims) -> Result<Claims, IdpProviderError> {
    if let (Some(sub), Some(info_sub)) = (claims.get("sub"), userinfo.get("sub"))
        && sub != info_sub
    {
        warn!("userinfo subject {:?} differs from the id token {:?}", info_sub, sub);
        return Err(IdpProviderError::Unauthenticated);
    }
    claims.extend(userinfo);
    Ok(claims)
}

pub struct OidcDriver {
    idp: IdentityProvider,
    issuer: String,
    client_id: String,
    client_secret: Option<String>,
    scopes: Vec<String>,
    userinfo_url: Option<String>,
    fetch_userinfo: bool,
    client: reqwest::Client,
    attributes: IdpAttributeOptions,
}

impl OidcDriver {
    pub fn factory(
        idp: &IdentityProvider,
        options: &IdpConfig,
        config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        let mut scopes: Vec<String> = options
            .get_str(GROUP, "scopes")
            .unwrap_or_else(|| DEFAULT_SCOPES.to_string())
            .split([' ', ','])
            .filter(|x| !x.is_empty())
            .map(Into::into)
            .collect();
        if !scopes.iter().any(|x| x == "openid") {
            scopes.insert(0, "openid".into());
        }
        Ok(Arc::new(Self {
            idp: idp.clone(),
            issuer: required_option(options, GROUP, "issuer")?,
            client_id: required_option(options, GROUP, "client_id")?,
            client_secret: options.get_str(GROUP, "client_secret"),
            scopes,
            userinfo_url: options.get_str(GROUP, "userinfo_url"),
            fetch_userinfo: options.get_bool(GROUP, "fetch_userinfo").unwrap_or(true),
            client: http_client(options, GROUP, config)?,
            attributes: attribute_options(
                options,
                GROUP,
                &[
                    ("user_id_attribute", "sub"),
                    ("user_name_attribute", "preferred_username"),
                    ("user_displayname_attribute", "name"),
                    ("user_email_attribute", "email"),
                    ("user_mobile_attribute", "phone_number"),
                ],
            ),
        }))
    }

    async fn discover(&self) -> Result<CoreProviderMetadata, IdpProviderError> {
        CoreProviderMetadata::discover_async(
            IssuerUrl::new(self.issuer.clone()).map_err(oauth2_error)?,
            &self.client,
        )
        .await
        .map_err(oauth2_error)
    }

    /// Client bound to the discovered provider. The userinfo URL is
    /// returned next to it.
    async fn oidc_client(
        &self,
        redirect_uri: &str,
    ) -> Result<(OidcClient, Option<Url>), IdpProviderError> {
        let metadata = self.discover().await?;
        let userinfo_url = match &self.userinfo_url {
            Some(url) => Some(Url::parse(url)?),
            None => metadata.userinfo_endpoint().map(|x| x.url().clone()),
        };
        let client = OidcClient::from_provider_metadata(
            metadata,
            ClientId::new(self.client_id.clone()),
            self.client_secret.clone().map(ClientSecret::new),
        )
        .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string()).map_err(oauth2_error)?);
        Ok((client, userinfo_url))
    }

    /// Read the userinfo document with the access token.
    pub async fn fetch_userinfo(
        &self,
        url: &Url,
        access_token: &str,
    ) -> Result<Claims, IdpProviderError> {
        let body = self
            .client
            .get(url.clone())
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(claims_from_json(&serde_json::from_str(&body)?))
    }

    /// Exchange the code and return the verified claims.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Claims, IdpProviderError> {
        let (client, userinfo_url) = self.oidc_client(redirect_uri).await?;
        let token_response = client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .map_err(oauth2_error)?
            .request_async(&self.client)
            .await
            .map_err(oauth2_error)?;

        let id_token = token_response
            .id_token()
            .ok_or_else(|| IdpProviderError::OAuth2("no id token in the response".into()))?;
        // The authorization request is stateless, there is no nonce to match.
        let id_claims = id_token
            .claims(&client.id_token_verifier(), |_: Option<&Nonce>| Ok(()))
            .map_err(oauth2_error)?;
        let mut claims = claims_from_json(&serde_json::to_value(id_claims)?);
        debug!("id token claims {:?}", claims);

        if self.fetch_userinfo
            && let Some(url) = userinfo_url
        {
            let userinfo = self
                .fetch_userinfo(&url, token_response.access_token().secret())
                .await?;
            claims = merge_userinfo(claims, userinfo)?;
        }
        Ok(claims)
    }
}

#[async_trait]
impl IdentityDriver for OidcDriver {
    fn class(&self) -> &'static DriverClass {
        &OIDC_CLASS
    }

    async fn probe(&self) -> Result<(), IdpProviderError> {
        self.discover().await.map(|_| ())
    }

    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError> {
        let AuthIdentity::Oidc { code, redirect_uri } = identity else {
            return Err(self.unsupported(identity.kind()));
        };
        let claims = self.exchange_code(code, redirect_uri).await?;
        mapper::map_claims(state, &self.idp, &self.attributes, &claims).await
    }

    async fn get_sso_redirect_uri(
        &self,
        callback: &str,
        state: &str,
    ) -> Result<String, IdpProviderError> {
        let (client, _) = self.oidc_client(callback).await?;
        let csrf = state.to_string();
        let (url, _, _) = client
            .authorize_url(
                CoreAuthenticationFlow::AuthorizationCode,
                move || CsrfToken::new(csrf),
                Nonce::new_random,
            )
            .add_scopes(
                self.scopes
                    .iter()
                    .filter(|x| *x != "openid")
                    .cloned()
                    .map(Scope::new),
            )
            .url();
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;

    fn discovery(server: &MockServer) -> serde_json::Value {
        json!({
            "issuer": server.url("/realm"),
            "authorization_endpoint": server.url("/realm/auth"),
            "token_endpoint": server.url("/realm/token"),
            "userinfo_endpoint": server.url("/realm/userinfo"),
            "jwks_uri": server.url("/realm/certs"),
            "response_types_supported": ["code"],
            "subject_types_supported": ["public"],
            "id_token_signing_alg_values_supported": ["RS256"],
        })
    }

    fn options(issuer: &str) -> IdpConfig {
        let mut options = IdpConfig::default();
        options
            .set(GROUP, "issuer", issuer)
            .set(GROUP, "client_id", "keystone")
            .set(GROUP, "client_secret", "secret");
        options
    }

    async fn mock_discovery(server: &MockServer) {
        let doc = discovery(server);
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/realm/.well-known/openid-configuration");
                then.status(200).json_body(doc);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/realm/certs");
                then.status(200).json_body(json!({"keys": []}));
            })
            .await;
    }

    #[test]
    fn test_merge_userinfo() {
        let mut claims = Claims::new();
        claims.insert("sub".into(), vec!["u1".into()]);
        claims.insert("email".into(), vec!["old@example.org".into()]);
        let mut userinfo = Claims::new();
        userinfo.insert("sub".into(), vec!["u1".into()]);
        userinfo.insert("email".into(), vec!["new@example.org".into()]);
        userinfo.insert("groups".into(), vec!["dev".into()]);

        let merged = merge_userinfo(claims.clone(), userinfo.clone()).unwrap();
        assert_eq!(vec!["new@example.org".to_string()], merged["email"]);
        assert_eq!(vec!["dev".to_string()], merged["groups"]);

        userinfo.insert("sub".into(), vec!["u2".into()]);
        assert!(matches!(
            merge_userinfo(claims, userinfo),
            Err(IdpProviderError::Unauthenticated)
        ));
    }

    #[test]
    fn test_factory() {
        assert!(matches!(
            OidcDriver::factory(
                &IdentityProvider::default(),
                &IdpConfig::default(),
                &Config::default()
            ),
            Err(IdpProviderError::MissingOption { .. })
        ));
        let mut opts = options("https://idp.example.org/realm");
        opts.set(GROUP, "scopes", "email,groups");
        assert!(
            OidcDriver::factory(&IdentityProvider::default(), &opts, &Config::default()).is_ok()
        );
    }

    #[tokio::test]
    async fn test_probe() {
        let server = MockServer::start_async().await;
        let driver = OidcDriver::factory(
            &IdentityProvider::default(),
            &options(&server.url("/realm")),
            &Config::default(),
        )
        .unwrap();
        assert!(driver.probe().await.is_err());

        mock_discovery(&server).await;
        driver.probe().await.unwrap();
    }

    #[tokio::test]
    async fn test_sso_redirect() {
        let server = MockServer::start_async().await;
        mock_discovery(&server).await;
        let driver = OidcDriver::factory(
            &IdentityProvider::default(),
            &options(&server.url("/realm")),
            &Config::default(),
        )
        .unwrap();

        let uri = driver
            .get_sso_redirect_uri("https://keystone/callback", "st-1")
            .await
            .unwrap();
        let url = Url::parse(&uri).unwrap();
        assert_eq!("/realm/auth", url.path());
        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!("code", query["response_type"]);
        assert_eq!("keystone", query["client_id"]);
        assert_eq!("st-1", query["state"]);
        assert_eq!("https://keystone/callback", query["redirect_uri"]);
        assert_eq!("openid profile email", query["scope"]);
    }

    #[tokio::test]
    async fn test_fetch_userinfo() {
        let server = MockServer::start_async().await;
        let userinfo = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/realm/userinfo")
                    .header("authorization", "Bearer at-1");
                then.status(200)
                    .json_body(json!({"sub": "u1", "preferred_username": "jdoe"}));
            })
            .await;
        let driver = OidcDriver {
            idp: IdentityProvider::default(),
            issuer: server.url("/realm"),
            client_id: "keystone".into(),
            client_secret: None,
            scopes: vec!["openid".into()],
            userinfo_url: None,
            fetch_userinfo: true,
            client: http_client(&IdpConfig::default(), GROUP, &Config::default()).unwrap(),
            attributes: IdpAttributeOptions::default(),
        };
        let claims = driver
            .fetch_userinfo(&Url::parse(&server.url("/realm/userinfo")).unwrap(), "at-1")
            .await
            .unwrap();
        userinfo.assert_async().await;
        assert_eq!(vec!["jdoe".to_string()], claims["preferred_username"]);
    }
}
