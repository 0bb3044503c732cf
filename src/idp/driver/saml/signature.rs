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
//! # XML signature of the SAML response
//!
//! Enveloped XML-DSig signatures over the `Response` or the single
//! `Assertion` element, canonicalized with the exclusive XML
//! canonicalization and signed with RSA-SHA256.
use base64::{Engine as _, engine::general_purpose::STANDARD};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use rsa::RsaPublicKey;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use x509_cert::Certificate;
use x509_cert::der::{Decode, DecodePem, Encode};

use crate::idp::IdpProviderError;

pub const EXC_C14N: &str = "http://www.w3.org/2001/10/xml-exc-c14n#";
pub const EXC_C14N_WITH_COMMENTS: &str = "http://www.w3.org/2001/10/xml-exc-c14n#WithComments";
pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";
pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";

fn invalid(message: impl Into<String>) -> IdpProviderError {
    IdpProviderError::Assertion(message.into())
}

/// Read the public key of the identity provider.
///
/// Accepts a PEM certificate, a PEM public key or the base64 DER
/// certificate as published in the metadata.
pub fn public_key(value: &str) -> Result<RsaPublicKey, IdpProviderError> {
    let value = value.trim();
    let certificate = if value.starts_with("-----BEGIN PUBLIC KEY") {
        return RsaPublicKey::from_public_key_pem(value)
            .map_err(|err| invalid(format!("invalid public key: {err}")));
    } else if value.starts_with("-----BEGIN CERTIFICATE") {
        Certificate::from_pem(value)
    } else {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        Certificate::from_der(&STANDARD.decode(compact)?)
    }
    .map_err(|err| invalid(format!("invalid certificate: {err}")))?;
    let spki = certificate
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|err| invalid(format!("invalid certificate: {err}")))?;
    RsaPublicKey::from_public_key_der(&spki)
        .map_err(|err| invalid(format!("certificate does not carry a RSA key: {err}")))
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    namespaces: Vec<(String, String)>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

fn prefix(name: &str) -> &str {
    name.split_once(':').map(|(prefix, _)| prefix).unwrap_or("")
}

fn local(name: &str) -> &str {
    name.split_once(':').map(|(_, local)| local).unwrap_or(name)
}

impl Element {
    fn from_start(start: &BytesStart) -> Result<Self, IdpProviderError> {
        let mut element = Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            if key == "xmlns" {
                element.namespaces.push((String::new(), value));
            } else if let Some(prefix) = key.strip_prefix("xmlns:") {
                element.namespaces.push((prefix.to_string(), value));
            } else {
                element.attributes.push((key, value));
            }
        }
        Ok(element)
    }

    fn local_name(&self) -> &str {
        local(&self.name)
    }

    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|child| child.local_name() == name)
    }

    fn required(&self, name: &str) -> Result<&Element, IdpProviderError> {
        self.child(name)
            .ok_or_else(|| invalid(format!("{} has no {name}", self.local_name())))
    }

    fn algorithm(&self) -> &str {
        self.attribute("Algorithm").unwrap_or_default()
    }

    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }

    /// Chain of elements from this one down to the first element with the
    /// local name.
    fn path_to<'a>(&'a self, name: &str, path: &mut Vec<&'a Element>) -> bool {
        path.push(self);
        if self.local_name() == name {
            return true;
        }
        for child in self.elements() {
            if child.path_to(name, path) {
                return true;
            }
        }
        path.pop();
        false
    }

    fn count(&self, matches: &impl Fn(&Element) -> bool) -> usize {
        usize::from(matches(self)) + self.elements().map(|child| child.count(matches)).sum::<usize>()
    }
}

fn parse_document(xml: &str) -> Result<Element, IdpProviderError> {
    fn attach(
        stack: &mut [Element],
        root: &mut Option<Element>,
        element: Element,
    ) -> Result<(), IdpProviderError> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(Node::Element(element)),
            None if root.is_none() => *root = Some(element),
            None => return Err(invalid("document has more than one root element")),
        }
        Ok(())
    }

    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| invalid("unbalanced document"))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                if let Some(parent) = stack.last_mut() {
                    parent
                        .children
                        .push(Node::Text(text.unescape()?.replace("\r\n", "\n")));
                }
            }
            Event::CData(data) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(Node::Text(
                        String::from_utf8_lossy(&data.into_inner()).into_owned(),
                    ));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(invalid("unbalanced document"));
    }
    root.ok_or_else(|| invalid("empty document"))
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '"' => out.push_str("&quot;"),
            '\t' => out.push_str("&#x9;"),
            '\n' => out.push_str("&#xA;"),
            '\r' => out.push_str("&#xD;"),
            c => out.push(c),
        }
    }
}

fn lookup<'a>(scope: &'a BTreeMap<String, String>, prefix: &str) -> &'a str {
    scope.get(prefix).map(String::as_str).unwrap_or_default()
}

/// Namespaces in scope at the last element of the path.
fn scope_of(path: &[&Element]) -> BTreeMap<String, String> {
    let mut scope = BTreeMap::new();
    for element in path {
        for (prefix, uri) in &element.namespaces {
            scope.insert(prefix.clone(), uri.clone());
        }
    }
    scope
}

/// Exclusive canonical form of the element. Namespaces are rendered where
/// they are visibly used. The `skip` element is left out of the output.
fn canonicalize(
    element: &Element,
    inherited: &BTreeMap<String, String>,
    rendered: &BTreeMap<String, String>,
    skip: Option<&Element>,
    out: &mut String,
) {
    let mut scope = inherited.clone();
    for (prefix, uri) in &element.namespaces {
        scope.insert(prefix.clone(), uri.clone());
    }

    let mut used: BTreeSet<&str> = BTreeSet::new();
    used.insert(prefix(&element.name));
    for (name, _) in &element.attributes {
        if name.contains(':') {
            used.insert(prefix(name));
        }
    }
    let mut now_rendered = rendered.clone();
    let mut declarations = Vec::new();
    for prefix in used {
        let uri = lookup(&scope, prefix);
        if prefix == "xml" || rendered.get(prefix).map(String::as_str) == Some(uri) {
            continue;
        }
        if prefix.is_empty() && uri.is_empty() && !rendered.contains_key("") {
            continue;
        }
        declarations.push((prefix, uri));
        now_rendered.insert(prefix.to_string(), uri.to_string());
    }

    let mut attributes: Vec<(&str, &str, &str, &str)> = element
        .attributes
        .iter()
        .map(|(name, value)| {
            let uri = if name.contains(':') {
                lookup(&scope, prefix(name))
            } else {
                ""
            };
            (uri, local(name), name.as_str(), value.as_str())
        })
        .collect();
    attributes.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

    out.push('<');
    out.push_str(&element.name);
    for (prefix, uri) in declarations {
        if prefix.is_empty() {
            out.push_str(" xmlns=\"");
        } else {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
        }
        escape_attribute(uri, out);
        out.push('"');
    }
    for (_, _, name, value) in attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        escape_attribute(value, out);
        out.push('"');
    }
    out.push('>');
    for child in &element.children {
        match child {
            Node::Text(text) => escape_text(text, out),
            Node::Element(child) if skip.is_some_and(|skip| std::ptr::eq(skip, child)) => {}
            Node::Element(child) => canonicalize(child, &scope, &now_rendered, skip, out),
        }
    }
    out.push_str("</");
    out.push_str(&element.name);
    out.push('>');
}

/// Canonical form of the element at the end of the path.
fn canonical(path: &[&Element], skip: Option<&Element>) -> Result<String, IdpProviderError> {
    let (element, ancestors) = path
        .split_last()
        .ok_or_else(|| invalid("nothing to canonicalize"))?;
    let mut out = String::new();
    canonicalize(element, &scope_of(ancestors), &BTreeMap::new(), skip, &mut out);
    Ok(out)
}

fn decode(element: &Element) -> Result<Vec<u8>, IdpProviderError> {
    let compact: String = element
        .text()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    Ok(STANDARD.decode(compact)?)
}

/// Check the enveloped signature of the element at the end of the path.
fn verify_enveloped(
    document: &Element,
    path: &[&Element],
    signature: &Element,
    key: &RsaPublicKey,
) -> Result<(), IdpProviderError> {
    let element = path.last().ok_or_else(|| invalid("nothing is signed"))?;
    let signed_info = signature.required("SignedInfo")?;
    let c14n = signed_info.required("CanonicalizationMethod")?.algorithm();
    if c14n != EXC_C14N && c14n != EXC_C14N_WITH_COMMENTS {
        return Err(invalid(format!("unsupported canonicalization {c14n}")));
    }
    let method = signed_info.required("SignatureMethod")?.algorithm();
    if method != RSA_SHA256 {
        return Err(invalid(format!("unsupported signature method {method}")));
    }

    let id = element
        .attribute("ID")
        .ok_or_else(|| invalid("signed element has no ID"))?;
    if document.count(&|candidate: &Element| candidate.attribute("ID") == Some(id)) != 1 {
        return Err(invalid(format!("element id {id} is not unique")));
    }
    let reference = signed_info.required("Reference")?;
    if reference.attribute("URI") != Some(format!("#{id}").as_str()) {
        return Err(invalid("signature does not reference the signed element"));
    }
    if let Some(transforms) = reference.child("Transforms") {
        for transform in transforms.elements() {
            let algorithm = transform.algorithm();
            if ![ENVELOPED_SIGNATURE, EXC_C14N, EXC_C14N_WITH_COMMENTS].contains(&algorithm) {
                return Err(invalid(format!("unsupported transform {algorithm}")));
            }
        }
    }
    let digest_method = reference.required("DigestMethod")?.algorithm();
    if digest_method != SHA256 {
        return Err(invalid(format!("unsupported digest {digest_method}")));
    }

    let digest = Sha256::digest(canonical(path, Some(signature))?.as_bytes());
    if digest.as_slice() != decode(reference.required("DigestValue")?)?.as_slice() {
        return Err(invalid("digest of the signed element does not match"));
    }

    let mut info_path = path.to_vec();
    info_path.push(signature);
    info_path.push(signed_info);
    let signature_value = Signature::try_from(decode(signature.required("SignatureValue")?)?.as_slice())
        .map_err(|err| invalid(format!("invalid signature value: {err}")))?;
    VerifyingKey::<Sha256>::new(key.clone())
        .verify(canonical(&info_path, None)?.as_bytes(), &signature_value)
        .map_err(|_| invalid("signature verification failed"))
}

/// Verify the signature of the response document.
///
/// Either the response or its only assertion must carry an enveloped
/// signature made with the identity provider key.
pub fn verify(xml: &str, key: &RsaPublicKey) -> Result<(), IdpProviderError> {
    let document = parse_document(xml)?;
    if document.count(&|element: &Element| element.local_name() == "Assertion") != 1 {
        return Err(invalid("response must carry exactly one assertion"));
    }
    let mut assertion = Vec::new();
    document.path_to("Assertion", &mut assertion);
    for path in [vec![&document], assertion] {
        if let Some(element) = path.last()
            && let Some(signature) = element.child("Signature")
        {
            return verify_enveloped(&document, &path, signature, key);
        }
    }
    Err(invalid("response is not signed"))
}
