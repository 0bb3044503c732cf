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

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Resource type of the identity provider options in the config tables.
pub const IDP_CONFIG_RES_TYPE: &str = "identity_provider";

/// Options whose values are stored encrypted with the credential key ring.
pub fn is_sensitive_option(driver: &str, group: &str, option: &str) -> bool {
    matches!(
        (driver, group, option),
        ("ldap", "ldap", "password")
            | ("oidc", "oidc", "client_secret")
            | ("oauth2", "oauth2", "client_secret")
    )
}

/// Merged view of the identity provider options, grouped.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct IdpConfig(pub BTreeMap<String, BTreeMap<String, Value>>);

impl IdpConfig {
    pub fn set<G: Into<String>, O: Into<String>, V: Into<Value>>(
        &mut self,
        group: G,
        option: O,
        value: V,
    ) -> &mut Self {
        self.0
            .entry(group.into())
            .or_default()
            .insert(option.into(), value.into());
        self
    }

    pub fn get(&self, group: &str, option: &str) -> Option<&Value> {
        self.0.get(group).and_then(|opts| opts.get(option))
    }

    /// Option as a non empty string.
    pub fn get_str(&self, group: &str, option: &str) -> Option<String> {
        match self.get(group, option)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn get_bool(&self, group: &str, option: &str) -> Option<bool> {
        match self.get(group, option)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            },
            Value::Number(n) => n.as_i64().map(|x| x != 0),
            _ => None,
        }
    }

    pub fn get_i64(&self, group: &str, option: &str) -> Option<i64> {
        match self.get(group, option)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Fill the options not set explicitly from the `defaults`.
    pub fn with_defaults(mut self, defaults: &IdpConfig) -> Self {
        for (group, opts) in defaults.0.iter() {
            let target = self.0.entry(group.clone()).or_default();
            for (opt, value) in opts.iter() {
                target.entry(opt.clone()).or_insert_with(|| value.clone());
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String, &Value)> {
        self.0
            .iter()
            .flat_map(|(group, opts)| opts.iter().map(move |(opt, value)| (group, opt, value)))
    }
}

/// Names of the claims carrying the user, domain and project information.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct IdpAttributeOptions {
    pub user_id_attribute: Option<String>,
    pub user_name_attribute: Option<String>,
    pub user_displayname_attribute: Option<String>,
    pub user_email_attribute: Option<String>,
    pub user_mobile_attribute: Option<String>,
    pub domain_id_attribute: Option<String>,
    pub domain_name_attribute: Option<String>,
    pub project_attribute: Option<String>,
    pub roles_attribute: Option<String>,
    pub default_project_id: Option<String>,
    pub default_role_id: Option<String>,
}

impl IdpAttributeOptions {
    /// Read the attribute options from the driver group of the config.
    pub fn from_config(config: &IdpConfig, group: &str) -> Self {
        let get = |opt: &str| config.get_str(group, opt);
        Self {
            user_id_attribute: get("user_id_attribute"),
            user_name_attribute: get("user_name_attribute"),
            user_displayname_attribute: get("user_displayname_attribute"),
            user_email_attribute: get("user_email_attribute"),
            user_mobile_attribute: get("user_mobile_attribute"),
            domain_id_attribute: get("domain_id_attribute"),
            domain_name_attribute: get("domain_name_attribute"),
            project_attribute: get("project_attribute"),
            roles_attribute: get("roles_attribute"),
            default_project_id: get("default_project_id"),
            default_role_id: get("default_role_id"),
        }
    }
}
