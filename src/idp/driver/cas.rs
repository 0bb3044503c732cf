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
//! # CAS driver
//!
//! Validates the service tickets with the `serviceValidate` endpoint of the
//! CAS server.
use async_trait::async_trait;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::sync::Arc;
use tracing::warn;
use url::Url;

use crate::config::Config;
use crate::identity::types::UserResponse;
use crate::idp::IdpProviderError;
use crate::idp::driver::{
    AuthIdentity, CAS_CLASS, Claims, DriverClass, IdentityDriver, attribute_options, http_client,
    required_option,
};
use crate::idp::mapper;
use crate::idp::types::{IdentityProvider, IdpAttributeOptions, IdpConfig};
use crate::keystone::ServiceState;

const GROUP: &str = "cas";

/// Claim carrying the authenticated user name.
pub const USER_CLAIM: &str = "user";

/// Read the `serviceValidate` response. Returns the user and the released
/// attributes.
pub fn parse_service_response(xml: &str) -> Result<Claims, IdpProviderError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut path: Vec<String> = Vec::new();
    let mut claims = Claims::new();
    let mut success = false;
    let mut failure: Option<String> = None;
    loop {
        match reader.read_event()? {
            Event::Start(element) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                match name.as_str() {
                    "authenticationSuccess" => success = true,
                    "authenticationFailure" => {
                        failure = Some(String::new());
                        for attr in element.attributes() {
                            let attr = attr?;
                            if attr.key.local_name().as_ref() == b"code" {
                                failure = Some(attr.unescape_value()?.into_owned());
                            }
                        }
                    }
                    _ => {}
                }
                path.push(name);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let text = text.unescape()?.into_owned();
                let len = path.len();
                if len >= 2 && path[len - 2] == "authenticationSuccess" && path[len - 1] == "user"
                {
                    claims.insert(USER_CLAIM.to_string(), vec![text]);
                } else if len >= 2 && path[len - 2] == "attributes" {
                    claims.entry(path[len - 1].clone()).or_default().push(text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if let Some(code) = failure {
        warn!("cas ticket validation failed: {code}");
        return Err(IdpProviderError::Unauthenticated);
    }
    if !success || !claims.contains_key(USER_CLAIM) {
        return Err(IdpProviderError::Assertion(
            "cas response carries no authenticated user".into(),
        ));
    }
    Ok(claims)
}

pub struct CasDriver {
    idp: IdentityProvider,
    server_url: Url,
    client: reqwest::Client,
    attributes: IdpAttributeOptions,
}

impl CasDriver {
    pub fn factory(
        idp: &IdentityProvider,
        options: &IdpConfig,
        config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        let mut server_url = required_option(options, GROUP, "cas_server_url")?;
        if !server_url.ends_with('/') {
            server_url.push('/');
        }
        Ok(Arc::new(Self {
            idp: idp.clone(),
            server_url: Url::parse(&server_url)?,
            client: http_client(options, GROUP, config)?,
            attributes: attribute_options(
                options,
                GROUP,
                &[
                    ("user_id_attribute", USER_CLAIM),
                    ("user_name_attribute", USER_CLAIM),
                ],
            ),
        }))
    }

    /// Validate the ticket issued for the service.
    pub async fn validate_ticket(
        &self,
        ticket: &str,
        service: &str,
    ) -> Result<Claims, IdpProviderError> {
        let mut url = self.server_url.join("serviceValidate")?;
        url.query_pairs_mut()
            .append_pair("service", service)
            .append_pair("ticket", ticket);
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_service_response(&body)
    }
}

#[async_trait]
impl IdentityDriver for CasDriver {
    fn class(&self) -> &'static DriverClass {
        &CAS_CLASS
    }

    async fn probe(&self) -> Result<(), IdpProviderError> {
        Ok(())
    }

    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError> {
        let AuthIdentity::Cas { ticket, service } = identity else {
            return Err(self.unsupported(identity.kind()));
        };
        let claims = self.validate_ticket(ticket, service).await?;
        mapper::map_claims(state, &self.idp, &self.attributes, &claims).await
    }

    async fn get_sso_redirect_uri(
        &self,
        callback: &str,
        _state: &str,
    ) -> Result<String, IdpProviderError> {
        let mut url = self.server_url.join("login")?;
        url.query_pairs_mut().append_pair("service", callback);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    const SUCCESS: &str = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationSuccess>
    <cas:user>jdoe</cas:user>
    <cas:attributes>
      <cas:email>jdoe@example.org</cas:email>
      <cas:memberOf>dev</cas:memberOf>
      <cas:memberOf>ops</cas:memberOf>
    </cas:attributes>
  </cas:authenticationSuccess>
</cas:serviceResponse>"#;

    fn driver(url: &str) -> CasDriver {
        let mut options = IdpConfig::default();
        options.set(GROUP, "cas_server_url", url);
        CasDriver {
            idp: IdentityProvider::default(),
            server_url: Url::parse(&format!("{url}/")).unwrap(),
            client: http_client(&options, GROUP, &Config::default()).unwrap(),
            attributes: IdpAttributeOptions::default(),
        }
    }

    #[test]
    fn test_parse_success() {
        let claims = parse_service_response(SUCCESS).unwrap();
        assert_eq!(vec!["jdoe".to_string()], claims[USER_CLAIM]);
        assert_eq!(vec!["jdoe@example.org".to_string()], claims["email"]);
        assert_eq!(2, claims["memberOf"].len());
    }

    #[test]
    fn test_parse_failure() {
        let xml = r#"<cas:serviceResponse xmlns:cas="http://www.yale.edu/tp/cas">
  <cas:authenticationFailure code="INVALID_TICKET">Ticket ST-1 not recognized</cas:authenticationFailure>
</cas:serviceResponse>"#;
        assert!(matches!(
            parse_service_response(xml),
            Err(IdpProviderError::Unauthenticated)
        ));
        assert!(matches!(
            parse_service_response("<cas:serviceResponse/>"),
            Err(IdpProviderError::Assertion(_))
        ));
    }

    #[tokio::test]
    async fn test_validate_ticket() {
        let server = MockServer::start_async().await;
        let validate = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/cas/serviceValidate")
                    .query_param("ticket", "ST-1")
                    .query_param("service", "https://app/cb");
                then.status(200).body(SUCCESS);
            })
            .await;
        let claims = driver(&server.url("/cas"))
            .validate_ticket("ST-1", "https://app/cb")
            .await
            .unwrap();
        validate.assert_async().await;
        assert_eq!(vec!["jdoe".to_string()], claims[USER_CLAIM]);
    }

    #[tokio::test]
    async fn test_sso_redirect() {
        let driver = driver("https://cas.example.org/cas");
        assert_eq!(
            "https://cas.example.org/cas/login?service=https%3A%2F%2Fapp%2Fcb",
            driver
                .get_sso_redirect_uri("https://app/cb", "ignored")
                .await
                .unwrap()
        );
    }

    #[test]
    fn test_factory_requires_server() {
        assert!(matches!(
            CasDriver::factory(
                &IdentityProvider::default(),
                &IdpConfig::default(),
                &Config::default()
            ),
            Err(IdpProviderError::MissingOption { .. })
        ));
    }
}
