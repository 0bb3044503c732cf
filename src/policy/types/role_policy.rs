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

use chrono::{DateTime, Utc};
use derive_builder::Builder;
use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::str::FromStr;

use super::policy::{Decision, Policy, PolicyScope};
use crate::error::BuilderError;

/// Separator of the networks in the stored whitelist.
pub const IP_PREFIX_SEP: &str = ";";

/// Binding of a policy to a role in a project.
#[derive(Builder, Clone, Debug, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct RolePolicy {
    /// Role the binding applies to. Any role when unset.
    #[builder(default)]
    pub role_id: Option<String>,
    /// Project the binding applies to. Any project when unset.
    #[builder(default)]
    pub project_id: Option<String>,
    pub policy_id: String,
    /// Whether the binding requires an authenticated request.
    #[builder(default = "true")]
    pub auth: bool,
    /// Source address whitelist. Any address when empty.
    #[builder(default)]
    pub ips: Vec<Ipv4Net>,
    #[builder(default)]
    pub valid_since: Option<DateTime<Utc>>,
    #[builder(default)]
    pub valid_until: Option<DateTime<Utc>>,
}

/// Parse the `;` separated whitelist. Plain addresses are single host
/// networks.
pub fn parse_ip_whitelist(value: &str) -> Result<Vec<Ipv4Net>, String> {
    value
        .split(IP_PREFIX_SEP)
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|item| {
            Ipv4Net::from_str(item)
                .or_else(|_| Ipv4Addr::from_str(item).map(Ipv4Net::from))
                .map(|net| net.trunc())
                .map_err(|_| format!("invalid ip prefix {item}"))
        })
        .collect()
}

pub fn format_ip_whitelist(ips: &[Ipv4Net]) -> String {
    ips.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(IP_PREFIX_SEP)
}

impl RolePolicy {
    /// An empty whitelist matches every caller including the ones without
    /// an address. A non-empty whitelist never matches a caller without one.
    pub fn match_ip(&self, ip: Option<&str>) -> bool {
        if self.ips.is_empty() {
            return true;
        }
        match ip.filter(|x| !x.is_empty()).map(Ipv4Addr::from_str) {
            Some(Ok(addr)) => self.ips.iter().any(|net| net.contains(&addr)),
            _ => false,
        }
    }

    pub fn match_time(&self, now: &DateTime<Utc>) -> bool {
        if let Some(since) = &self.valid_since
            && now < since
        {
            return false;
        }
        if let Some(until) = &self.valid_until
            && now > until
        {
            return false;
        }
        true
    }
}

/// The identity a policy group is computed for.
#[derive(Builder, Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct PolicyRequest {
    /// IDs of the roles the token carries.
    #[builder(default)]
    pub role_ids: Vec<String>,
    #[builder(default)]
    pub project_id: Option<String>,
    /// Source address of the request.
    #[builder(default)]
    pub ip: Option<String>,
}

impl PolicyRequest {
    /// A request without a project or without roles is a guest request.
    pub fn is_guest(&self) -> bool {
        self.role_ids.is_empty() || self.project_id.as_ref().is_none_or(|x| x.is_empty())
    }
}

/// Policies applying to the request indexed by their scope.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PolicyGroup(pub BTreeMap<PolicyScope, Vec<Policy>>);

impl PolicyGroup {
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn get(&self, scope: PolicyScope) -> &[Policy] {
        self.0.get(&scope).map(Vec::as_slice).unwrap_or_default()
    }

    /// Names of the policies per scope.
    pub fn names(&self) -> BTreeMap<PolicyScope, Vec<String>> {
        self.0
            .iter()
            .map(|(scope, policies)| (*scope, policies.iter().map(|p| p.name.clone()).collect()))
            .collect()
    }

    /// The broadest scope whose policies allow the request.
    pub fn decide(
        &self,
        service: &str,
        resource: &str,
        action: &str,
        extra: Option<&str>,
    ) -> Option<PolicyScope> {
        self.0.iter().find_map(|(scope, policies)| {
            policies
                .iter()
                .any(|p| {
                    p.blob.evaluate(service, resource, action, extra) == Some(Decision::Allow)
                })
                .then_some(*scope)
        })
    }
}
