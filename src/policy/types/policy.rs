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

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use validator::Validate;

use crate::error::BuilderError;

/// Scope a policy applies at. The declaration order runs from the broadest
/// scope to the narrowest.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PolicyScope {
    System,
    Domain,
    Project,
}

impl PolicyScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Domain => "domain",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for PolicyScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PolicyScope {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "system" => Ok(Self::System),
            "domain" => Ok(Self::Domain),
            "project" => Ok(Self::Project),
            other => Err(format!("unsupported policy scope {other}")),
        }
    }
}

/// Outcome of a single policy rule.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

/// Rule document of a policy.
///
/// The document is the nested object
/// `{"<service>": {"<resource>": {"<action>": <rule>}}}` where the rule is
/// either `"allow"`/`"deny"` or an object mapping an extra qualifier to
/// `"allow"`/`"deny"`. Every key may be the `*` wildcard.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PolicyDocument(pub Value);

const WILDCARD: &str = "*";

fn candidates<'a>(value: &'a Value, key: Option<&str>) -> Vec<(bool, &'a Value)> {
    let mut res = Vec::new();
    if let Some(key) = key
        && key != WILDCARD
        && let Some(val) = value.get(key)
    {
        res.push((true, val));
    }
    if let Some(val) = value.get(WILDCARD) {
        res.push((false, val));
    }
    res
}

fn decision(value: &Value) -> Option<Decision> {
    match value.as_str() {
        Some("allow") => Some(Decision::Allow),
        Some("deny") => Some(Decision::Deny),
        _ => None,
    }
}

impl PolicyDocument {
    /// Evaluate the document. The most specific matching rule wins and
    /// `deny` wins over `allow` at equal specificity. `None` when no rule
    /// matches.
    pub fn evaluate(
        &self,
        service: &str,
        resource: &str,
        action: &str,
        extra: Option<&str>,
    ) -> Option<Decision> {
        // (depth, exact key matches) orders the specificity.
        let mut best: Option<((u8, u8), Decision)> = None;
        let mut consider = |rank: (u8, u8), res: Decision| {
            best = match best {
                Some((cur_rank, cur)) if cur_rank > rank => Some((cur_rank, cur)),
                Some((cur_rank, Decision::Deny)) if cur_rank == rank => {
                    Some((cur_rank, Decision::Deny))
                }
                _ => Some((rank, res)),
            };
        };
        for (svc_exact, svc) in candidates(&self.0, Some(service)) {
            for (res_exact, res) in candidates(svc, Some(resource)) {
                for (act_exact, act) in candidates(res, Some(action)) {
                    let exact = u8::from(svc_exact) + u8::from(res_exact) + u8::from(act_exact);
                    if let Some(val) = decision(act) {
                        consider((3, exact), val);
                    } else if act.is_object() {
                        for (extra_exact, rule) in candidates(act, extra) {
                            if let Some(val) = decision(rule) {
                                consider((4, exact + u8::from(extra_exact)), val);
                            }
                        }
                    }
                }
            }
        }
        best.map(|(_, res)| res)
    }
}

/// Policy.
#[derive(Builder, Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[builder(build_fn(error = "BuilderError"))]
#[builder(setter(strip_option, into))]
pub struct Policy {
    #[validate(length(max = 64))]
    pub id: String,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub scope: PolicyScope,
    pub blob: PolicyDocument,
    #[builder(default = "true")]
    pub enabled: bool,
    #[builder(default)]
    pub description: Option<String>,
}
