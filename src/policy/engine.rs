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
//! Role policy matching.
//!
//! The matching is a pure function of the bindings, the request and the
//! evaluation time so that the same input always selects the same policies.
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

use crate::policy::types::*;

fn match_binding(binding: &RolePolicy, request: &PolicyRequest, now: &DateTime<Utc>) -> bool {
    if request.is_guest() {
        if binding.auth {
            return false;
        }
    } else {
        if let Some(role_id) = binding.role_id.as_ref().filter(|x| !x.is_empty())
            && !request.role_ids.contains(role_id)
        {
            return false;
        }
        if let Some(project_id) = binding.project_id.as_ref().filter(|x| !x.is_empty())
            && request.project_id.as_ref() != Some(project_id)
        {
            return false;
        }
    }
    binding.match_ip(request.ip.as_deref()) && binding.match_time(now)
}

/// IDs of the policies bound to the request, sorted and deduplicated.
pub fn match_bindings(
    bindings: &[RolePolicy],
    request: &PolicyRequest,
    now: &DateTime<Utc>,
) -> Vec<String> {
    bindings
        .iter()
        .filter(|binding| match_binding(binding, request, now))
        .map(|binding| binding.policy_id.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Bucket the enabled policies by their scope.
pub fn group_policies<I: IntoIterator<Item = Policy>>(policies: I) -> PolicyGroup {
    let mut group: BTreeMap<PolicyScope, Vec<Policy>> = BTreeMap::new();
    for policy in policies.into_iter().filter(|p| p.enabled) {
        group.entry(policy.scope).or_default().push(policy);
    }
    for policies in group.values_mut() {
        policies.sort_by(|a, b| a.name.cmp(&b.name));
    }
    PolicyGroup(group)
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use serde_json::json;

    use super::*;

    fn request(ip: Option<&str>) -> PolicyRequest {
        let mut builder = PolicyRequestBuilder::default();
        builder.role_ids(vec!["member".to_string()]).project_id("demo");
        if let Some(ip) = ip {
            builder.ip(ip);
        }
        builder.build().unwrap()
    }

    fn binding(policy_id: &str) -> RolePolicyBuilder {
        let mut builder = RolePolicyBuilder::default();
        builder.policy_id(policy_id);
        builder
    }

    #[test]
    fn test_role_and_project_filter() {
        let now = Utc::now();
        let bindings = vec![
            binding("any").build().unwrap(),
            binding("member").role_id("member").build().unwrap(),
            binding("admin").role_id("admin").build().unwrap(),
            binding("demo").project_id("demo").build().unwrap(),
            binding("other").project_id("other").build().unwrap(),
            binding("member").project_id("demo").build().unwrap(),
        ];
        assert_eq!(
            vec!["any", "demo", "member"],
            match_bindings(&bindings, &request(None), &now)
        );
    }

    #[test]
    fn test_guest() {
        let now = Utc::now();
        let bindings = vec![
            binding("auth").build().unwrap(),
            binding("guest").auth(false).role_id("nobody").build().unwrap(),
        ];
        assert_eq!(
            vec!["guest"],
            match_bindings(&bindings, &PolicyRequest::default(), &now)
        );
        assert_eq!(
            vec!["auth"],
            match_bindings(&bindings, &request(None), &now)
        );
    }

    #[test]
    fn test_ip_whitelist() {
        let now = Utc::now();
        let bindings = vec![
            binding("lan")
                .ips(parse_ip_whitelist("10.0.0.0/24").unwrap())
                .build()
                .unwrap(),
            binding("office")
                .ips(parse_ip_whitelist("192.168.0.0/24").unwrap())
                .build()
                .unwrap(),
            binding("open").build().unwrap(),
        ];
        assert_eq!(
            vec!["lan", "open"],
            match_bindings(&bindings, &request(Some("10.0.0.1")), &now)
        );
        assert_eq!(
            vec!["open"],
            match_bindings(&bindings, &request(None), &now)
        );
    }

    #[test]
    fn test_time_window() {
        let now = Utc::now();
        let bindings = vec![
            binding("future")
                .valid_since(now + Duration::hours(1))
                .build()
                .unwrap(),
            binding("past")
                .valid_until(now - Duration::hours(1))
                .build()
                .unwrap(),
            binding("current")
                .valid_since(now - Duration::hours(1))
                .valid_until(now + Duration::hours(1))
                .build()
                .unwrap(),
        ];
        assert_eq!(
            vec!["current"],
            match_bindings(&bindings, &request(None), &now)
        );
    }

    #[test]
    fn test_group_and_decide() {
        let mk = |id: &str, scope: PolicyScope, blob: serde_json::Value| {
            PolicyBuilder::default()
                .id(id)
                .name(id)
                .scope(scope)
                .blob(PolicyDocument(blob))
                .build()
                .unwrap()
        };
        let mut disabled = mk("disabled", PolicyScope::System, json!({"*": {"*": {"*": "allow"}}}));
        disabled.enabled = false;
        let group = group_policies([
            mk("proj", PolicyScope::Project, json!({"identity": {"*": {"*": "allow"}}})),
            mk("dom", PolicyScope::Domain, json!({"identity": {"users": {"list": "allow"}}})),
            disabled,
        ]);
        assert!(group.get(PolicyScope::System).is_empty());
        assert_eq!(
            Some(PolicyScope::Domain),
            group.decide("identity", "users", "list", None)
        );
        assert_eq!(
            Some(PolicyScope::Project),
            group.decide("identity", "projects", "list", None)
        );
        assert_eq!(None, group.decide("compute", "servers", "list", None));
        assert_eq!(
            vec!["dom".to_string()],
            group.names()[&PolicyScope::Domain]
        );
    }
}
