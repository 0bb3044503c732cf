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
    http::{Request, StatusCode, header},
};
use eyre::{Result, eyre};
use serde_json::{Value, json};
use tracing_test::traced_test;

use keystone_iam::assignment::{
    AssignmentApi,
    types::{Assignment, AssignmentType},
};
use keystone_iam::identity::{IdentityApi, types::UserCreateBuilder};
use keystone_iam::key_ring::{KeyRing, KeyRingKind};
use keystone_iam::keystone::ServiceState;

use crate::common::{ADMIN_PASSWORD, call, get_bootstrapped_state, login, token_for};

async fn validate(state: &ServiceState, caller: &str, subject: &str) -> Result<(StatusCode, Value)> {
    let (status, _, body) = call(
        state,
        Request::builder()
            .uri("/v3/auth/tokens")
            .header("x-auth-token", caller)
            .header("x-subject-token", subject)
            .body(Body::empty())?,
    )
    .await?;
    Ok((status, body))
}

fn role_names(token: &Value) -> Vec<String> {
    token["roles"]
        .as_array()
        .map(|roles| {
            roles
                .iter()
                .filter_map(|role| role["name"].as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
#[traced_test]
async fn test_password_login_and_validate() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let (status, subject, body) = login(
        &state,
        &info.user.name,
        ADMIN_PASSWORD,
        Some(&info.project.id),
    )
    .await?;
    assert_eq!(StatusCode::CREATED, status);
    let subject = subject.ok_or_else(|| eyre!("token is missing"))?;
    assert_eq!(json!(["password"]), body["token"]["methods"]);
    assert_eq!(json!(info.user.id), body["token"]["user"]["id"]);
    assert_eq!(json!(info.project.id), body["token"]["project"]["id"]);
    assert_eq!(vec![info.admin_role.name.clone()], role_names(&body["token"]));

    let (status, body) = validate(&state, &subject, &subject).await?;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(json!(info.project.id), body["token"]["project"]["id"]);
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_wrong_password() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let (status, subject, _) = login(&state, &info.user.name, "wrong", None).await?;
    assert_eq!(StatusCode::UNAUTHORIZED, status);
    assert!(subject.is_none());
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_member_scope() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let user = state
        .provider
        .get_identity_provider()
        .create_user(
            &state,
            UserCreateBuilder::default()
                .name("alice")
                .domain_id(info.domain.id.clone())
                .enabled(true)
                .password("alice-pass")
                .build()?,
        )
        .await?;

    // No role on the project yet.
    let (status, _, _) = login(&state, "alice", "alice-pass", Some(&info.project.id)).await?;
    assert_eq!(StatusCode::UNAUTHORIZED, status);

    state
        .provider
        .get_assignment_provider()
        .create_grant(
            &state,
            Assignment {
                role_id: info.member_role.id.clone(),
                role_name: None,
                actor_id: user.id.clone(),
                target_id: info.project.id.clone(),
                r#type: AssignmentType::UserProject,
                inherited: false,
            },
        )
        .await?;
    let (status, _, body) = login(&state, "alice", "alice-pass", Some(&info.project.id)).await?;
    assert_eq!(StatusCode::CREATED, status);
    assert_eq!(vec![info.member_role.name.clone()], role_names(&body["token"]));
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_revoke_reaches_chained_token() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let parent = token_for(&state, &info.user.name, ADMIN_PASSWORD, None).await?;

    let (status, child, _) = call(
        &state,
        Request::builder()
            .method("POST")
            .uri("/v3/auth/tokens")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json!({
                "auth": {
                    "identity": {
                        "methods": ["token"],
                        "token": {"id": parent}
                    },
                    "scope": {"project": {"id": info.project.id}}
                }
            }))?))?,
    )
    .await?;
    assert_eq!(StatusCode::CREATED, status);
    let child = child.ok_or_else(|| eyre!("token is missing"))?;
    assert_eq!(StatusCode::OK, validate(&state, &child, &child).await?.0);

    let (status, _, _) = call(
        &state,
        Request::builder()
            .method("DELETE")
            .uri("/v3/auth/tokens")
            .header("x-auth-token", &parent)
            .header("x-subject-token", &parent)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(StatusCode::NO_CONTENT, status);

    // The revoked token no longer authenticates the caller.
    assert_eq!(StatusCode::UNAUTHORIZED, validate(&state, &parent, &parent).await?.0);

    let observer = token_for(&state, &info.user.name, ADMIN_PASSWORD, None).await?;
    assert_eq!(StatusCode::NOT_FOUND, validate(&state, &observer, &parent).await?.0);
    assert_eq!(StatusCode::NOT_FOUND, validate(&state, &observer, &child).await?.0);
    assert_eq!(StatusCode::OK, validate(&state, &observer, &observer).await?.0);
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_v2_tenant_login() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let (status, _, body) = call(
        &state,
        Request::builder()
            .method("POST")
            .uri("/v2.0/tokens")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json!({
                "auth": {
                    "tenantName": info.project.name,
                    "passwordCredentials": {
                        "username": info.user.name,
                        "password": ADMIN_PASSWORD
                    }
                }
            }))?))?,
    )
    .await?;
    assert_eq!(StatusCode::OK, status);
    let access = &body["access"];
    assert_eq!(json!(info.project.id), access["token"]["tenant"]["id"]);
    assert_eq!(json!(info.user.id), access["user"]["id"]);
    assert_eq!(
        json!([{"name": info.admin_role.name}]),
        access["user"]["roles"]
    );
    let credential = access["token"]["id"]
        .as_str()
        .ok_or_else(|| eyre!("token id is missing"))?;

    let (status, _, body) = call(
        &state,
        Request::builder()
            .uri(format!("/v2.0/tokens/{credential}"))
            .header("x-auth-token", credential)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(StatusCode::OK, status);
    assert_eq!(json!(info.user.id), body["access"]["user"]["id"]);
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn test_key_rotation() -> Result<()> {
    let (state, info) = get_bootstrapped_state().await?;
    let old_keys = state.key_rings.token.keys()?;
    let before = token_for(&state, &info.user.name, ADMIN_PASSWORD, None).await?;

    state
        .key_rings
        .rotate(&state.db, &state.config, KeyRingKind::Token)
        .await?;
    state.token_cache.invalidate_all();
    assert_eq!(old_keys.len() + 1, state.key_rings.token.len());

    let after = token_for(&state, &info.user.name, ADMIN_PASSWORD, None).await?;
    assert_eq!(StatusCode::OK, validate(&state, &after, &before).await?.0);

    let old_ring = KeyRing::new(&old_keys)?;
    assert!(old_ring.decrypt(&before).is_ok());
    assert!(old_ring.decrypt(&after).is_err());
    Ok(())
}
