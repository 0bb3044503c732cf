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
//! # SAML 2.0 driver
//!
//! Accepts the base64 encoded `SAMLResponse` posted back by the identity
//! provider. The response or its assertion must be signed with the key of
//! the `idp_cert` certificate, the claims are read from the assertion only.
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rsa::RsaPublicKey;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

use crate::config::Config;
use crate::identity::types::UserResponse;
use crate::idp::IdpProviderError;
use crate::idp::driver::{
    AuthIdentity, Claims, DriverClass, IdentityDriver, SAML_CLASS, attribute_options,
};
use crate::idp::mapper;
use crate::idp::types::{IdentityProvider, IdpAttributeOptions, IdpConfig};
use crate::keystone::ServiceState;

pub mod signature;

const GROUP: &str = "saml";

pub const STATUS_SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";

/// Claim carrying the subject `NameID`.
pub const NAME_ID_CLAIM: &str = "NameID";

/// Facts read from the SAML response.
#[derive(Debug, Default, PartialEq)]
pub struct SamlAssertion {
    pub status: Option<String>,
    pub issuer: Option<String>,
    pub audiences: Vec<String>,
    pub not_on_or_after: Option<String>,
    pub name_id: Option<String>,
    pub attributes: Claims,
}

fn attribute(element: &BytesStart, name: &[u8]) -> Result<Option<String>, IdpProviderError> {
    for attr in element.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn in_assertion(path: &[String]) -> bool {
    path.iter().any(|element| element == "Assertion")
}

impl SamlAssertion {
    /// Read the response document. Subject, conditions and attributes are
    /// taken from the assertion, the status from the response.
    pub fn parse(xml: &str) -> Result<Self, IdpProviderError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut assertion = Self::default();
        let mut path: Vec<String> = Vec::new();
        let mut current_attribute: Option<String> = None;
        loop {
            match reader.read_event()? {
                Event::Start(element) => {
                    assertion.on_element(&element, &path, &mut current_attribute)?;
                    path.push(String::from_utf8_lossy(element.local_name().as_ref()).into_owned());
                }
                Event::Empty(element) => {
                    assertion.on_element(&element, &path, &mut current_attribute)?;
                }
                Event::End(element) => {
                    if element.local_name().as_ref() == b"Attribute" {
                        current_attribute = None;
                    }
                    path.pop();
                }
                Event::Text(text) => {
                    if !in_assertion(&path) {
                        continue;
                    }
                    let text = text.unescape()?.into_owned();
                    match path.last().map(String::as_str) {
                        Some("Issuer") if assertion.issuer.is_none() => {
                            assertion.issuer = Some(text)
                        }
                        Some("Audience") => assertion.audiences.push(text),
                        Some("NameID") if assertion.name_id.is_none() => {
                            assertion.name_id = Some(text)
                        }
                        Some("AttributeValue") => {
                            if let Some(name) = &current_attribute {
                                assertion
                                    .attributes
                                    .entry(name.clone())
                                    .or_default()
                                    .push(text);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(assertion)
    }

    fn on_element(
        &mut self,
        element: &BytesStart,
        path: &[String],
        current_attribute: &mut Option<String>,
    ) -> Result<(), IdpProviderError> {
        let in_assertion = in_assertion(path);
        match element.local_name().as_ref() {
            b"StatusCode" if self.status.is_none() && !in_assertion => {
                self.status = attribute(element, b"Value")?;
            }
            b"Conditions" if in_assertion => {
                self.not_on_or_after = attribute(element, b"NotOnOrAfter")?;
            }
            b"Attribute" if in_assertion => {
                *current_attribute = attribute(element, b"Name")?;
            }
            _ => {}
        }
        Ok(())
    }
}

pub struct SamlDriver {
    idp: IdentityProvider,
    entity_id: Option<String>,
    sp_entity_id: Option<String>,
    sso_url: Option<String>,
    idp_key: Option<RsaPublicKey>,
    attributes: IdpAttributeOptions,
}

impl SamlDriver {
    pub fn factory(
        idp: &IdentityProvider,
        options: &IdpConfig,
        _config: &Config,
    ) -> Result<Arc<dyn IdentityDriver>, IdpProviderError> {
        Ok(Arc::new(Self {
            idp: idp.clone(),
            entity_id: options.get_str(GROUP, "entity_id"),
            sp_entity_id: options.get_str(GROUP, "sp_entity_id"),
            sso_url: options.get_str(GROUP, "sso_url"),
            idp_key: options
                .get_str(GROUP, "idp_cert")
                .map(|cert| signature::public_key(&cert))
                .transpose()?,
            attributes: attribute_options(
                options,
                GROUP,
                &[
                    ("user_id_attribute", NAME_ID_CLAIM),
                    ("user_name_attribute", NAME_ID_CLAIM),
                ],
            ),
        }))
    }

    /// Decode and check the response. Returns the asserted claims.
    pub fn verified_claims(
        &self,
        response: &str,
        now: DateTime<Utc>,
    ) -> Result<Claims, IdpProviderError> {
        let compact: String = response.chars().filter(|c| !c.is_whitespace()).collect();
        let xml = String::from_utf8(STANDARD.decode(compact)?)
            .map_err(|err| IdpProviderError::Assertion(err.to_string()))?;
        let key = self
            .idp_key
            .as_ref()
            .ok_or_else(|| IdpProviderError::MissingOption {
                group: GROUP.into(),
                option: "idp_cert".into(),
            })?;
        if let Err(err) = signature::verify(&xml, key) {
            warn!(idp_id = %self.idp.id, "saml response rejected: {}", err);
            return Err(err);
        }
        let assertion = SamlAssertion::parse(&xml)?;
        debug!("saml assertion {:?}", assertion);

        if assertion.status.as_deref() != Some(STATUS_SUCCESS) {
            warn!(
                idp_id = %self.idp.id,
                "saml response status is {:?}", assertion.status
            );
            return Err(IdpProviderError::Unauthenticated);
        }
        if let Some(entity_id) = &self.entity_id
            && assertion.issuer.as_ref() != Some(entity_id)
        {
            return Err(IdpProviderError::Assertion(format!(
                "unexpected issuer {:?}",
                assertion.issuer
            )));
        }
        if let Some(sp_entity_id) = &self.sp_entity_id
            && !assertion.audiences.contains(sp_entity_id)
        {
            return Err(IdpProviderError::Assertion(
                "assertion is not addressed to this service provider".into(),
            ));
        }
        if let Some(not_on_or_after) = &assertion.not_on_or_after {
            let expiry = DateTime::parse_from_rfc3339(not_on_or_after)
                .map_err(|err| IdpProviderError::Assertion(err.to_string()))?;
            if expiry <= now {
                return Err(IdpProviderError::Assertion("assertion has expired".into()));
            }
        }

        let mut claims = assertion.attributes;
        if let Some(name_id) = assertion.name_id {
            claims.insert(NAME_ID_CLAIM.to_string(), vec![name_id]);
        }
        Ok(claims)
    }
}

#[async_trait]
impl IdentityDriver for SamlDriver {
    fn class(&self) -> &'static DriverClass {
        &SAML_CLASS
    }

    async fn probe(&self) -> Result<(), IdpProviderError> {
        Ok(())
    }

    async fn authenticate(
        &self,
        state: &ServiceState,
        identity: &AuthIdentity,
    ) -> Result<UserResponse, IdpProviderError> {
        let AuthIdentity::Saml { response } = identity else {
            return Err(self.unsupported(identity.kind()));
        };
        let claims = self.verified_claims(response, Utc::now())?;
        mapper::map_claims(state, &self.idp, &self.attributes, &claims).await
    }

    async fn get_sso_redirect_uri(
        &self,
        _callback: &str,
        state: &str,
    ) -> Result<String, IdpProviderError> {
        let sso_url = self
            .sso_url
            .as_ref()
            .ok_or_else(|| IdpProviderError::MissingOption {
                group: GROUP.into(),
                option: "sso_url".into(),
            })?;
        Ok(Url::parse_with_params(sso_url, &[("RelayState", state)])?.to_string())
    }
}
