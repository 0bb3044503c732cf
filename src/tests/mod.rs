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
//! Shared unit test helpers.
use chrono::{TimeDelta, Utc};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::assignment::types::Role;
use crate::config::Config;
use crate::identity::types::UserResponse;
use crate::key_ring::KeyRings;
use crate::keystone::{Service, ServiceState};
use crate::policy::types::{Policy, PolicyDocument, PolicyGroup, PolicyScope};
use crate::provider::Provider;
use crate::resource::types::{Domain, Project};
use crate::token::{ProjectScopePayload, Token, TokenContext, UnscopedPayload};

/// Service state around the (mocked) providers.
pub(crate) fn get_state(provider: Provider) -> ServiceState {
    Arc::new(
        Service::new(
            Config::default(),
            DatabaseConnection::Disconnected,
            provider,
            KeyRings::generate().unwrap(),
        )
        .unwrap(),
    )
}

pub(crate) fn user(id: &str) -> UserResponse {
    UserResponse {
        id: id.into(),
        name: format!("{id}-name"),
        domain_id: "default".into(),
        enabled: true,
        ..Default::default()
    }
}

pub(crate) fn default_domain() -> Domain {
    Domain {
        id: "default".into(),
        name: "Default".into(),
        enabled: true,
        ..Default::default()
    }
}

pub(crate) fn project(id: &str) -> Project {
    Project {
        id: id.into(),
        name: format!("{id}-name"),
        domain_id: "default".into(),
        enabled: true,
        ..Default::default()
    }
}

pub(crate) fn role(name: &str) -> Role {
    Role {
        id: format!("{name}-id"),
        name: name.into(),
        ..Default::default()
    }
}

/// Unscoped token of the user as returned by the verification.
pub(crate) fn unscoped_token(user_id: &str) -> Token {
    Token::Unscoped(UnscopedPayload {
        user_id: user_id.into(),
        user: Some(user(user_id)),
        audit_ids: vec!["Zm9vYmFyYmF6MTIzNDU2".into()],
        issued_at: Utc::now(),
        expires_at: Utc::now() + TimeDelta::hours(1),
        ..Default::default()
    })
}

/// Project scoped token of the user with the given roles.
pub(crate) fn project_token(user_id: &str, project_id: &str, roles: &[&str]) -> Token {
    Token::ProjectScope(ProjectScopePayload {
        user_id: user_id.into(),
        user: Some(user(user_id)),
        project_id: project_id.into(),
        project: Some(project(project_id)),
        roles: Some(roles.iter().map(|x| role(x)).collect()),
        audit_ids: vec!["Zm9vYmFyYmF6MTIzNDU2".into()],
        issued_at: Utc::now(),
        expires_at: Utc::now() + TimeDelta::hours(1),
        context: Some(TokenContext {
            source: "api".into(),
            ip: "10.0.0.1".into(),
        }),
        ..Default::default()
    })
}

/// Policy group allowing everything at the given scope.
pub(crate) fn allow_all(scope: PolicyScope) -> PolicyGroup {
    let mut group = PolicyGroup::default();
    group.0.insert(
        scope,
        vec![Policy {
            id: "allow-all".into(),
            name: "allow-all".into(),
            scope,
            blob: PolicyDocument(serde_json::json!({"*": {"*": {"*": "allow"}}})),
            enabled: true,
            description: None,
        }],
    );
    group
}
