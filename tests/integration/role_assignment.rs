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

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use eyre::{Result, eyre};
use serde_json::{Value, json};
use tracing_test::traced_test;

use keystone_iam::keystone::ServiceState;
use keystone_iam::policy::{
    PolicyApi,
    types::{PolicyBuilder, PolicyDocument, PolicyScope, RolePolicyBuilder, parse_ip_whitelist},
};

use crate::common::{ADMIN_PASSWORD, call, get_bootstrapped_state, login_from, token_for};

async fn list(state: &ServiceState, token: &str, query: &str) -> Result<(StatusCode, Value)> {
    let (status, _, body) = call(
        state,
        Request::builder()
            .uri(format!("/v3/role_assignments{query}"))
            .header("x-auth-token", token)
            .body(Body::empty())?,
    )
    .await?;
    Ok((status, body))
}

/// Allow listing the role assignments to the role, optionally only from the
/// given networks.
async fn allow_listing(state: &ServiceState, role_id: &str, ips: &str) -> Result<()> {
    let policy = state
        .provider
        .get_policy_provider()
        .create_policy(
            state,
            PolicyBuilder::default()
                .id("list-assignments")
                .name("list-assignments")
                .scope(PolicyScope::Project)
                .blob(PolicyDocument(json!({
                    "identity": {"role_assignments": {"list": "allow"}}
                })))
                .build()?,
        )
        .await?;
    state
        .provider
        .get_policy_provider()
        .set_role_policy(
            state,
            RolePolicyBuilder::default()
                .policy_id(policy.id)
                .role_id(role_id)
                .ips(parse_ip_whitelist(ips).map_err(|e| eyre!(e))?)
                .build()?,
        )
        .await?;
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_list_own_assignments() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let token = token_for(&state, &info.user.name, ADMIN_PASSWORD, None).await?;

    // The administrator is a system account and hidden by default.
    let (status, body) = list(&state, &token, &format!("?user.id={}", info.user.id)).await?;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(json!(0), body["total"]);

    let (status, body) = list(
        &state,
        &token,
        &format!("?user.id={}&include_system&include_names", info.user.id),
    )
    .await?;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(json!(1), body["total"]);
    let assignment = &body["role_assignments"][0];
    assert_eq!(json!(info.admin_role.id), assignment["role"]["id"]);
    assert_eq!(json!(info.admin_role.name), assignment["role"]["name"]);
    assert_eq!(json!(info.project.id), assignment["scope"]["project"]["id"]);
    assert_eq!(json!(info.project.name), assignment["scope"]["project"]["name"]);

    // Listing everything needs a policy.
    let (status, _) = list(&state, &token, "").await?;
    assert_eq!(StatusCode::FORBIDDEN, status);
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_list_with_policy() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    allow_listing(&state, &info.admin_role.id, "").await?;

    let unscoped = token_for(&state, &info.user.name, ADMIN_PASSWORD, None).await?;
    let (status, _) = list(&state, &unscoped, "?include_system").await?;
    assert_eq!(StatusCode::FORBIDDEN, status);

    let scoped = token_for(&state, &info.user.name, ADMIN_PASSWORD, Some(&info.project.id)).await?;
    let (status, body) = list(&state, &scoped, "?include_system").await?;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(json!(1), body["total"]);

    // The project policy does not reach other projects.
    let (status, _) = list(&state, &scoped, "?scope.project.id=another-project").await?;
    assert_eq!(StatusCode::FORBIDDEN, status);
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_list_ip_whitelist() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    allow_listing(&state, &info.admin_role.id, "10.0.0.0/24").await?;

    for (addr, expected) in [
        ("10.0.0.5", StatusCode::OK),
        ("192.0.2.10, 10.0.0.1", StatusCode::FORBIDDEN),
    ] {
        let (status, token, _) = login_from(
            &state,
            &info.user.name,
            ADMIN_PASSWORD,
            Some(&info.project.id),
            Some(addr),
        )
        .await?;
        assert_eq!(StatusCode::CREATED, status);
        let token = token.ok_or_else(|| eyre!("token is missing"))?;
        let (status, _) = list(&state, &token, "").await?;
        assert_eq!(expected, status, "listing from {addr}");
    }
    Ok(())
}
