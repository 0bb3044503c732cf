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
//! LDAP driver options and the templates of the known directory products.
use secrecy::SecretString;
use std::time::Duration;

use crate::config::Config;
use crate::idp::IdpProviderError;
use crate::idp::driver::required_option;
use crate::idp::types::IdpConfig;

/// Option group of the LDAP driver.
pub const GROUP: &str = "ldap";

/// Options of one LDAP identity provider.
#[derive(Clone, Debug)]
pub struct LdapOptions {
    pub url: String,
    pub bind_dn: Option<String>,
    pub password: Option<SecretString>,
    pub suffix: String,

    pub user_tree_dn: String,
    pub user_objectclass: String,
    pub user_filter: Option<String>,
    pub user_id_attribute: String,
    pub user_name_attribute: String,
    pub user_displayname_attribute: Option<String>,
    pub user_email_attribute: Option<String>,
    pub user_mobile_attribute: Option<String>,
    pub user_enabled_attribute: Option<String>,
    /// Bits of the enabled attribute marking a disabled user. `0` reads the
    /// attribute as a boolean.
    pub user_enabled_mask: i64,
    pub user_enabled_invert: bool,
    /// Value assumed when the entry has no enabled attribute.
    pub user_enabled_default: String,

    pub group_tree_dn: String,
    pub group_objectclass: String,
    pub group_filter: Option<String>,
    pub group_id_attribute: String,
    pub group_name_attribute: String,
    pub group_member_attribute: String,
    /// Members are listed by the user ID attribute instead of the DN.
    pub group_members_are_ids: bool,

    /// Every entry of the domain tree is a domain holding its own users and
    /// groups.
    pub multi_domain: bool,
    pub domain_tree_dn: String,
    pub domain_objectclass: String,
    pub domain_id_attribute: String,
    pub domain_name_attribute: String,

    pub page_size: i32,
    pub timeout: Duration,
}

/// Option defaults of the directory template.
pub fn template(name: &str) -> Option<IdpConfig> {
    let mut config = IdpConfig::default();
    match name {
        "msad_one_domain" | "msad_multi_domain" => {
            config
                .set(GROUP, "user_objectclass", "organizationalPerson")
                .set(GROUP, "user_id_attribute", "sAMAccountName")
                .set(GROUP, "user_name_attribute", "sAMAccountName")
                .set(GROUP, "user_displayname_attribute", "displayName")
                .set(GROUP, "user_email_attribute", "mail")
                .set(GROUP, "user_mobile_attribute", "mobile")
                .set(GROUP, "user_enabled_attribute", "userAccountControl")
                .set(GROUP, "user_enabled_mask", 2)
                .set(GROUP, "user_enabled_default", "512")
                .set(GROUP, "group_objectclass", "group")
                .set(GROUP, "group_id_attribute", "sAMAccountName")
                .set(GROUP, "group_name_attribute", "cn")
                .set(GROUP, "group_member_attribute", "member")
                .set(GROUP, "group_members_are_ids", false);
            if name == "msad_multi_domain" {
                config
                    .set(GROUP, "multi_domain", true)
                    .set(GROUP, "domain_objectclass", "organizationalUnit")
                    .set(GROUP, "domain_id_attribute", "objectGUID")
                    .set(GROUP, "domain_name_attribute", "name");
            }
        }
        "openldap_one_domain" => {
            config
                .set(GROUP, "user_objectclass", "inetOrgPerson")
                .set(GROUP, "user_id_attribute", "uid")
                .set(GROUP, "user_name_attribute", "uid")
                .set(GROUP, "user_displayname_attribute", "cn")
                .set(GROUP, "user_email_attribute", "mail")
                .set(GROUP, "user_mobile_attribute", "mobile")
                .set(GROUP, "group_objectclass", "posixGroup")
                .set(GROUP, "group_id_attribute", "cn")
                .set(GROUP, "group_name_attribute", "cn")
                .set(GROUP, "group_member_attribute", "memberUid")
                .set(GROUP, "group_members_are_ids", true);
        }
        _ => return None,
    }
    Some(config)
}

impl LdapOptions {
    /// Read the options. Values of the template fill the unset options.
    pub fn from_config(
        options: &IdpConfig,
        template_name: Option<&str>,
        config: &Config,
    ) -> Result<Self, IdpProviderError> {
        let options = match template_name.and_then(template) {
            Some(defaults) => options.clone().with_defaults(&defaults),
            None => options.clone(),
        };
        let get = |opt: &str| options.get_str(GROUP, opt);
        let get_or = |opt: &str, default: &str| get(opt).unwrap_or_else(|| default.to_string());
        let suffix = required_option(&options, GROUP, "suffix")?;
        let page_size = match options.get_i64(GROUP, "page_size") {
            Some(size) => i32::try_from(size).map_err(|_| IdpProviderError::ConfigValue {
                group: GROUP.into(),
                option: "page_size".into(),
            })?,
            None => config.ldap.page_size,
        };
        let timeout = options
            .get_i64(GROUP, "timeout_secs")
            .and_then(|val| u64::try_from(val).ok())
            .unwrap_or(config.ldap.timeout_secs);

        Ok(Self {
            url: required_option(&options, GROUP, "url")?,
            bind_dn: get("user"),
            password: get("password").map(SecretString::from),
            user_tree_dn: get("user_tree_dn").unwrap_or_else(|| suffix.clone()),
            user_objectclass: get_or("user_objectclass", "inetOrgPerson"),
            user_filter: get("user_filter"),
            user_id_attribute: get_or("user_id_attribute", "cn"),
            user_name_attribute: get_or("user_name_attribute", "sn"),
            user_displayname_attribute: get("user_displayname_attribute"),
            user_email_attribute: get("user_email_attribute"),
            user_mobile_attribute: get("user_mobile_attribute"),
            user_enabled_attribute: get("user_enabled_attribute"),
            user_enabled_mask: options.get_i64(GROUP, "user_enabled_mask").unwrap_or(0),
            user_enabled_invert: options
                .get_bool(GROUP, "user_enabled_invert")
                .unwrap_or(false),
            user_enabled_default: get_or("user_enabled_default", "true"),
            group_tree_dn: get("group_tree_dn").unwrap_or_else(|| suffix.clone()),
            group_objectclass: get_or("group_objectclass", "groupOfNames"),
            group_filter: get("group_filter"),
            group_id_attribute: get_or("group_id_attribute", "cn"),
            group_name_attribute: get_or("group_name_attribute", "ou"),
            group_member_attribute: get_or("group_member_attribute", "member"),
            group_members_are_ids: options
                .get_bool(GROUP, "group_members_are_ids")
                .unwrap_or(false),
            multi_domain: options.get_bool(GROUP, "multi_domain").unwrap_or(false),
            domain_tree_dn: get("domain_tree_dn").unwrap_or_else(|| suffix.clone()),
            domain_objectclass: get_or("domain_objectclass", "organizationalUnit"),
            domain_id_attribute: get_or("domain_id_attribute", "ou"),
            domain_name_attribute: get_or("domain_name_attribute", "ou"),
            page_size,
            timeout: Duration::from_secs(timeout),
            suffix,
        })
    }

    fn object_filter(objectclass: &str, extra: &Option<String>) -> String {
        match extra {
            Some(extra) if !extra.is_empty() => {
                let extra = if extra.starts_with('(') {
                    extra.clone()
                } else {
                    format!("({extra})")
                };
                format!("(&(objectClass={objectclass}){extra})")
            }
            _ => format!("(objectClass={objectclass})"),
        }
    }

    /// Filter selecting every user.
    pub fn user_search_filter(&self) -> String {
        Self::object_filter(&self.user_objectclass, &self.user_filter)
    }

    /// Filter selecting the user by the name.
    pub fn user_name_filter(&self, name: &str) -> String {
        format!(
            "(&{}({}={}))",
            self.user_search_filter(),
            self.user_name_attribute,
            ldap3::ldap_escape(name)
        )
    }

    pub fn group_search_filter(&self) -> String {
        Self::object_filter(&self.group_objectclass, &self.group_filter)
    }

    pub fn domain_search_filter(&self) -> String {
        Self::object_filter(&self.domain_objectclass, &None)
    }

    /// Attributes fetched for the users.
    pub fn user_attributes(&self) -> Vec<String> {
        let mut attrs = vec![
            self.user_id_attribute.clone(),
            self.user_name_attribute.clone(),
        ];
        attrs.extend(
            [
                &self.user_displayname_attribute,
                &self.user_email_attribute,
                &self.user_mobile_attribute,
                &self.user_enabled_attribute,
            ]
            .into_iter()
            .flatten()
            .cloned(),
        );
        attrs.dedup();
        attrs
    }

    pub fn group_attributes(&self) -> Vec<String> {
        vec![
            self.group_id_attribute.clone(),
            self.group_name_attribute.clone(),
            self.group_member_attribute.clone(),
        ]
    }

    pub fn domain_attributes(&self) -> Vec<String> {
        vec![
            self.domain_id_attribute.clone(),
            self.domain_name_attribute.clone(),
        ]
    }

    /// Evaluate the enabled attribute value.
    pub fn is_enabled(&self, value: Option<&str>) -> bool {
        let value = value.unwrap_or(&self.user_enabled_default);
        let enabled = if self.user_enabled_mask != 0 {
            match value.trim().parse::<i64>() {
                Ok(bits) => bits & self.user_enabled_mask == 0,
                Err(_) => false,
            }
        } else {
            matches!(
                value.trim().to_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            )
        };
        enabled != self.user_enabled_invert
    }
}
