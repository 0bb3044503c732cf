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
//! Access to the LDAP directory.
//!
//! The driver talks to the directory through the [`LdapConnector`] trait.
//! [`Ldap3Connector`] is the network implementation, [`MemoryDirectory`]
//! serves the entries from memory.
use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::debug;

use crate::idp::IdpProviderError;
use crate::idp::driver::ldap::options::LdapOptions;

/// Directory entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LdapEntry {
    pub dn: String,
    pub attrs: HashMap<String, Vec<String>>,
}

impl LdapEntry {
    pub fn new<S: Into<String>>(dn: S) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Add the attribute value.
    pub fn with<K: Into<String>, V: Into<String>>(mut self, attr: K, value: V) -> Self {
        self.attrs.entry(attr.into()).or_default().push(value.into());
        self
    }

    /// Values of the attribute. Attribute names are case insensitive.
    pub fn values(&self, attr: &str) -> &[String] {
        self.attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attr))
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// First non empty value of the attribute.
    pub fn first(&self, attr: &str) -> Option<&str> {
        self.values(attr)
            .iter()
            .find(|value| !value.is_empty())
            .map(String::as_str)
    }
}

#[async_trait]
pub trait LdapConnector: Send + Sync {
    /// Check that the directory accepts the service account.
    async fn probe(&self) -> Result<(), IdpProviderError>;

    /// Search the subtree of the `base` as the service account.
    async fn search(
        &self,
        base: &str,
        filter: &str,
        attrs: &[String],
    ) -> Result<Vec<LdapEntry>, IdpProviderError>;

    /// Whether the password is valid for the DN.
    async fn check_bind(&self, dn: &str, password: &str) -> Result<bool, IdpProviderError>;
}

/// Connector to a real directory server.
pub struct Ldap3Connector {
    url: String,
    bind_dn: Option<String>,
    password: Option<SecretString>,
    page_size: i32,
    timeout: Duration,
}

impl Ldap3Connector {
    pub fn new(options: &LdapOptions) -> Self {
        Self {
            url: options.url.clone(),
            bind_dn: options.bind_dn.clone(),
            password: options.password.clone(),
            page_size: options.page_size,
            timeout: options.timeout,
        }
    }

    async fn connect(&self) -> Result<ldap3::Ldap, IdpProviderError> {
        let settings = LdapConnSettings::new().set_conn_timeout(self.timeout);
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.url).await?;
        ldap3::drive!(conn);
        Ok(ldap)
    }

    async fn connect_service(&self) -> Result<ldap3::Ldap, IdpProviderError> {
        let mut ldap = self.connect().await?;
        if let Some(dn) = &self.bind_dn {
            let password = self
                .password
                .as_ref()
                .map(|pw| pw.expose_secret().to_string())
                .unwrap_or_default();
            ldap.with_timeout(self.timeout)
                .simple_bind(dn, &password)
                .await?
                .success()?;
        }
        Ok(ldap)
    }
}

#[async_trait]
impl LdapConnector for Ldap3Connector {
    async fn probe(&self) -> Result<(), IdpProviderError> {
        let mut ldap = self.connect_service().await?;
        ldap.unbind().await?;
        Ok(())
    }

    async fn search(
        &self,
        base: &str,
        filter: &str,
        attrs: &[String],
    ) -> Result<Vec<LdapEntry>, IdpProviderError> {
        let mut ldap = self.connect_service().await?;
        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(self.page_size)),
        ];
        let mut search = ldap
            .streaming_search_with(adapters, base, Scope::Subtree, filter, attrs.to_vec())
            .await?;
        let mut entries = Vec::new();
        while let Some(entry) = search.next().await? {
            let entry = SearchEntry::construct(entry);
            entries.push(LdapEntry {
                dn: entry.dn,
                attrs: entry.attrs,
            });
        }
        search.finish().await.success()?;
        ldap.unbind().await?;
        debug!("ldap search {filter} under {base} returned {}", entries.len());
        Ok(entries)
    }

    async fn check_bind(&self, dn: &str, password: &str) -> Result<bool, IdpProviderError> {
        if password.is_empty() {
            return Ok(false);
        }
        let mut ldap = self.connect().await?;
        let res = ldap
            .with_timeout(self.timeout)
            .simple_bind(dn, password)
            .await?;
        ldap.unbind().await?;
        Ok(res.rc == 0)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Filter {
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Present(String),
    Equal(String, String),
    Substring(String, String),
}

fn unescape(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'\\'
            && let Some(hex) = value.get(idx + 1..idx + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            out.push(byte);
            idx += 3;
            continue;
        }
        out.push(bytes[idx]);
        idx += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn parse_filter(input: &str) -> Result<(Filter, &str), IdpProviderError> {
    let invalid = || IdpProviderError::Ldap(format!("invalid filter {input}"));
    let rest = input.trim_start().strip_prefix('(').ok_or_else(invalid)?;
    fn parse_list(mut rest: &str) -> Result<(Vec<Filter>, &str), IdpProviderError> {
        let mut items = Vec::new();
        while rest.trim_start().starts_with('(') {
            let (item, tail) = parse_filter(rest)?;
            items.push(item);
            rest = tail;
        }
        Ok((items, rest))
    }
    let (filter, rest) = if let Some(rest) = rest.strip_prefix('&') {
        let (items, rest) = parse_list(rest)?;
        (Filter::And(items), rest)
    } else if let Some(rest) = rest.strip_prefix('|') {
        let (items, rest) = parse_list(rest)?;
        (Filter::Or(items), rest)
    } else if let Some(rest) = rest.strip_prefix('!') {
        let (item, rest) = parse_filter(rest)?;
        (Filter::Not(Box::new(item)), rest)
    } else {
        let end = rest.find(')').ok_or_else(invalid)?;
        let (attr, value) = rest[..end].split_once('=').ok_or_else(invalid)?;
        let filter = if value == "*" {
            Filter::Present(attr.to_string())
        } else if value.contains('*') {
            Filter::Substring(attr.to_string(), value.to_string())
        } else {
            Filter::Equal(attr.to_string(), unescape(value))
        };
        (filter, &rest[end..])
    };
    let rest = rest.trim_start().strip_prefix(')').ok_or_else(invalid)?;
    Ok((filter, rest))
}

fn wildcard_match(pattern: &str, value: &str) -> bool {
    let parts: Vec<String> = pattern.split('*').map(unescape).collect();
    let value = value.to_lowercase();
    let mut pos = 0;
    for (idx, part) in parts.iter().enumerate() {
        let part = part.to_lowercase();
        if part.is_empty() {
            continue;
        }
        if idx == 0 {
            if !value.starts_with(&part) {
                return false;
            }
            pos = part.len();
        } else if let Some(found) = value[pos..].find(&part) {
            pos += found + part.len();
        } else {
            return false;
        }
    }
    parts
        .last()
        .is_none_or(|last| last.is_empty() || value.ends_with(&last.to_lowercase()))
}

impl Filter {
    fn matches(&self, entry: &LdapEntry) -> bool {
        match self {
            Self::And(items) => items.iter().all(|item| item.matches(entry)),
            Self::Or(items) => items.iter().any(|item| item.matches(entry)),
            Self::Not(item) => !item.matches(entry),
            Self::Present(attr) => !entry.values(attr).is_empty(),
            Self::Equal(attr, value) => entry
                .values(attr)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),
            Self::Substring(attr, pattern) => entry
                .values(attr)
                .iter()
                .any(|v| wildcard_match(pattern, v)),
        }
    }
}

#[derive(Default)]
struct DirectoryState {
    entries: Vec<LdapEntry>,
    passwords: HashMap<String, String>,
    reachable: bool,
}

/// Directory kept in memory.
///
/// Supports the `&`, `|`, `!`, presence, equality and wildcard filters
/// over the subtree of the search base.
#[derive(Clone)]
pub struct MemoryDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

impl Default for MemoryDirectory {
    fn default() -> Self {
        Self {
            state: Arc::new(RwLock::new(DirectoryState {
                reachable: true,
                ..Default::default()
            })),
        }
    }
}

impl MemoryDirectory {
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, DirectoryState> {
        self.state.write().unwrap_or_else(|err| err.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DirectoryState> {
        self.state.read().unwrap_or_else(|err| err.into_inner())
    }

    /// Add or replace the entry.
    pub fn add(&self, entry: LdapEntry) -> &Self {
        let mut state = self.write();
        state
            .entries
            .retain(|existing| !existing.dn.eq_ignore_ascii_case(&entry.dn));
        state.entries.push(entry);
        self
    }

    pub fn remove(&self, dn: &str) -> &Self {
        self.write()
            .entries
            .retain(|existing| !existing.dn.eq_ignore_ascii_case(dn));
        self
    }

    pub fn set_password<D: Into<String>, P: Into<String>>(&self, dn: D, password: P) -> &Self {
        self.write()
            .passwords
            .insert(dn.into().to_lowercase(), password.into());
        self
    }

    /// Simulate the network failure.
    pub fn set_reachable(&self, reachable: bool) -> &Self {
        self.write().reachable = reachable;
        self
    }

    fn check_reachable(&self) -> Result<(), IdpProviderError> {
        if self.read().reachable {
            Ok(())
        } else {
            Err(IdpProviderError::Ldap("directory is not reachable".into()))
        }
    }
}

#[async_trait]
impl LdapConnector for MemoryDirectory {
    async fn probe(&self) -> Result<(), IdpProviderError> {
        self.check_reachable()
    }

    async fn search(
        &self,
        base: &str,
        filter: &str,
        _attrs: &[String],
    ) -> Result<Vec<LdapEntry>, IdpProviderError> {
        self.check_reachable()?;
        let (filter, _) = parse_filter(filter)?;
        let base = base.to_lowercase();
        Ok(self
            .read()
            .entries
            .iter()
            .filter(|entry| {
                let dn = entry.dn.to_lowercase();
                dn == base || dn.ends_with(&format!(",{base}"))
            })
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }

    async fn check_bind(&self, dn: &str, password: &str) -> Result<bool, IdpProviderError> {
        self.check_reachable()?;
        Ok(!password.is_empty()
            && self
                .read()
                .passwords
                .get(&dn.to_lowercase())
                .is_some_and(|stored| stored == password))
    }
}
