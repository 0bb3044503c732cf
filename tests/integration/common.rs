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
use eyre::{Result, WrapErr, eyre};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use keystone_iam::api::openapi_router;
use keystone_iam::bootstrap::{BootstrapInfo, bootstrap};
use keystone_iam::config::Config;
use keystone_iam::db::schema::create_tables;
use keystone_iam::key_ring::KeyRings;
use keystone_iam::keystone::{Service, ServiceState};
use keystone_iam::plugin_manager::PluginManager;
use keystone_iam::provider::Provider;

pub const ADMIN_PASSWORD: &str = "secret-admin-pass";

/// Prepare the database.
///
/// The `DATABASE_URL` environment variable selects the database, inmemory
/// sqlite is used by default.
pub async fn get_database() -> Result<DatabaseConnection> {
    let db_conn = std::env::var("DATABASE_URL").unwrap_or("sqlite::memory:".to_string());
    let opts: ConnectOptions = ConnectOptions::new(&db_conn).sqlx_logging(false).to_owned();
    let db = Database::connect(opts)
        .await
        .wrap_err_with(|| format!("Failed to connect to database at {db_conn}"))?;
    create_tables(&db).await?;
    Ok(db)
}

/// Service backed by the real providers.
pub async fn get_state() -> Result<ServiceState> {
    let cfg = Config::default();
    let db = get_database().await?;
    let provider = Provider::new(cfg.clone(), PluginManager::default())?;
    Ok(Arc::new(Service::new(
        cfg,
        db,
        provider,
        KeyRings::generate()?,
    )?))
}

/// Service with the bootstrap data in place.
pub async fn get_bootstrapped_state() -> Result<(ServiceState, BootstrapInfo)> {
    let state = get_state().await?;
    let info = bootstrap(&state, ADMIN_PASSWORD, None).await?;
    Ok((state, info))
}

/// Send the request through the full router and return the status, the
/// subject token header and the json body.
pub async fn call(
    state: &ServiceState,
    request: Request<Body>,
) -> Result<(StatusCode, Option<String>, Value)> {
    let mut api = openapi_router().with_state(state.clone());
    let response = api.as_service().oneshot(request).await?;
    let status = response.status();
    let subject = response
        .headers()
        .get("X-Subject-Token")
        .map(|x| x.to_str().map(String::from))
        .transpose()?;
    let body = response.into_body().collect().await?.to_bytes();
    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)?
    };
    Ok((status, subject, body))
}

/// Password authentication with the optional project scope.
pub async fn login(
    state: &ServiceState,
    user: &str,
    password: &str,
    project_id: Option<&str>,
) -> Result<(StatusCode, Option<String>, Value)> {
    login_from(state, user, password, project_id, None).await
}

/// Password authentication of a client behind a proxy.
pub async fn login_from(
    state: &ServiceState,
    user: &str,
    password: &str,
    project_id: Option<&str>,
    forwarded_for: Option<&str>,
) -> Result<(StatusCode, Option<String>, Value)> {
    let mut auth = json!({
        "identity": {
            "methods": ["password"],
            "password": {
                "user": {
                    "name": user,
                    "domain": {"id": "default"},
                    "password": password
                }
            }
        }
    });
    if let Some(project_id) = project_id {
        auth["scope"] = json!({"project": {"id": project_id}});
    }
    let mut request = Request::builder()
        .method("POST")
        .uri("/v3/auth/tokens")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(addr) = forwarded_for {
        request = request.header("X-Forwarded-For", addr);
    }
    call(
        state,
        request.body(Body::from(serde_json::to_vec(&json!({"auth": auth}))?))?,
    )
    .await
}

/// Log in and return the issued token.
pub async fn token_for(
    state: &ServiceState,
    user: &str,
    password: &str,
    project_id: Option<&str>,
) -> Result<String> {
    let (status, subject, _) = login(state, user, password, project_id).await?;
    if status != StatusCode::CREATED {
        return Err(eyre!("login of {user} failed with {status}"));
    }
    subject.ok_or_else(|| eyre!("no token issued for {user}"))
}
