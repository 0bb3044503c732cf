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
//! Main Keystone executable.
//!
//! This is the entry point of the `keystone` binary. Next to the HTTP service
//! it runs the token cache sweeper, the identity provider sync workers and
//! their scheduler.

use axum::extract::DefaultBodyLimit;
use axum::http::{self, HeaderName, Request, header};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Report, Result};
use eyre::WrapErr;
use sea_orm::{ConnectOptions, Database};
use secrecy::ExposeSecret;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{net::TcpListener, signal, spawn, time};
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    LatencyUnit, ServiceBuilderExt,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, error, info, info_span, trace};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{LevelFilter, Targets},
    prelude::*,
};
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use keystone_iam::api;
use keystone_iam::config::Config;
use keystone_iam::idp::sync::{run_scheduler, start_workers};
use keystone_iam::key_ring::KeyRings;
use keystone_iam::keystone::{Service, ServiceState};
use keystone_iam::plugin_manager::PluginManager;
use keystone_iam::provider::Provider;
use keystone_iam::revoke::RevokeApi;

// Default body limit 256kB
const DEFAULT_BODY_LIMIT: usize = 1024 * 256;

/// Keystone identity and access management service.
///
/// Issues, verifies and revokes Fernet tokens for the users of a multi-tenant
/// cloud and keeps the external identity providers in sync.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the keystone config file.
    #[arg(short, long, default_value = "/etc/keystone/keystone.conf")]
    config: PathBuf,

    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0:5000")]
    listen: SocketAddr,

    /// Verbosity level. Repeat to increase level. `RUST_LOG` takes precedence
    /// when set.
    #[arg(short, long, global=true, action = clap::ArgAction::Count, display_order = 920)]
    pub verbose: u8,

    /// Print the `OpenAPI` schema json instead of running the Keystone.
    #[arg(long)]
    pub dump_openapi: Option<OpenApiFormat>,
}

#[derive(Clone, Debug, Default, PartialEq, ValueEnum)]
enum OpenApiFormat {
    /// Json.
    Json,
    #[default]
    /// Yaml.
    Yaml,
}

/// `req-<uuid>` request ids.
#[derive(Clone, Default)]
struct OpenStackRequestId {}

impl MakeRequestId for OpenStackRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        let req_id = Uuid::new_v4().simple().to_string();

        Some(RequestId::new(
            http::HeaderValue::from_str(format!("req-{req_id}").as_str())
                .unwrap_or_else(|_| http::HeaderValue::from_static("req-unknown")),
        ))
    }
}

fn init_tracing(verbose: u8) {
    let log_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);
    match EnvFilter::try_from_default_env() {
        Ok(env_filter) => tracing_subscriber::registry()
            .with(log_layer.with_filter(env_filter))
            .init(),
        Err(_) => {
            let filter = Targets::new()
                .with_default(match verbose {
                    0 => LevelFilter::WARN,
                    1 => LevelFilter::INFO,
                    2 => LevelFilter::DEBUG,
                    _ => LevelFilter::TRACE,
                })
                .with_target("sqlx", Level::WARN)
                .with_target("ldap3", Level::INFO);
            tracing_subscriber::registry()
                .with(log_layer.with_filter(filter))
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;
    let args = Args::parse();
    init_tracing(args.verbose);

    info!("Starting Keystone...");

    let openapi = api::ApiDoc::openapi();

    let (router, api) = OpenApiRouter::with_openapi(openapi.clone())
        .merge(api::openapi_router())
        .split_for_parts();

    if let Some(dump_format) = &args.dump_openapi {
        println!(
            "{}",
            match dump_format {
                OpenApiFormat::Yaml => api.to_yaml()?,
                OpenApiFormat::Json => api.to_pretty_json()?,
            }
        );
        return Ok(());
    }

    let cfg = Config::new(args.config)?;
    let opt: ConnectOptions = ConnectOptions::new(cfg.database.get_connection().expose_secret())
        // Prevent dumping the password in plaintext.
        .sqlx_logging(false)
        .to_owned();

    debug!("Establishing the database connection...");
    let conn = Database::connect(opt)
        .await
        .wrap_err("Database connection failed")?;

    let key_rings = KeyRings::bootstrap(&conn, &cfg)
        .await
        .wrap_err("Loading the key rings failed")?;

    let plugin_manager = PluginManager::default();

    let provider = Provider::new(cfg.clone(), plugin_manager)?;

    let shared_state = Arc::new(Service::new(cfg, conn, provider, key_rings)?);
    let cancel: CancellationToken = shared_state.shutdown.clone();

    let mut tasks = start_workers(&shared_state, &cancel);
    tasks.push(spawn(run_scheduler(shared_state.clone(), cancel.clone())));
    tasks.push(spawn(cleanup(cancel.clone(), shared_state.clone())));

    let x_request_id = HeaderName::from_static("x-openstack-request-id");
    let sensitive_headers: Arc<[_]> = vec![
        header::AUTHORIZATION,
        header::COOKIE,
        header::HeaderName::from_static("x-auth-token"),
        header::HeaderName::from_static("x-subject-token"),
    ]
    .into();

    let middleware = ServiceBuilder::new()
        // make sure to set request ids before the request reaches `TraceLayer`
        .layer(SetRequestIdLayer::new(
            x_request_id.clone(),
            OpenStackRequestId::default(),
        ))
        .sensitive_request_headers(sensitive_headers.clone())
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    info_span!(
                        "request",
                        method = ?request.method(),
                        uri = ?request.uri().path(),
                        x_request_id = ?request.headers().get("x-openstack-request-id")
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Micros),
                ),
        )
        .compression()
        .sensitive_response_headers(sensitive_headers)
        // propagate the header to the response before the response reaches `TraceLayer`
        .layer(PropagateRequestIdLayer::new(x_request_id));

    let app = router
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api))
        .layer(middleware)
        .with_state(shared_state.clone());

    let listener = TcpListener::bind(&args.listen).await?;
    info!("Listening on {}", args.listen);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shared_state))
        .await?;

    cancel.cancel();
    for task in tasks {
        task.await.ok();
    }
    Ok(())
}

/// Periodic purge of the expired token cache records.
async fn cleanup(cancel: CancellationToken, state: ServiceState) {
    let mut interval = time::interval(Duration::from_secs(
        state.config.revoke.cleanup_interval.max(1),
    ));
    interval.tick().await;
    info!("Start the periodic cleanup thread");
    loop {
        tokio::select! {
            _ = interval.tick() => {
                trace!("cleanup job tick");
                if let Err(e) = state.provider.get_revoke_provider().cleanup(&state).await {
                    error!("Error during cleanup job: {}", e);
                }
            },
            () = cancel.cancelled() => {
                info!("Cancellation requested. Stopping cleanup task.");
                break;
            }
        }
    }
}

/// Install shutdown and interrupt signal handler
async fn shutdown_signal(state: ServiceState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .inspect_err(|e| error!("failed to install Ctrl+C handler: {e}"))
            .ok();
    };

    #[cfg(unix)]
    let terminate = async {
        if let Ok(mut sig) = signal::unix::signal(signal::unix::SignalKind::terminate())
            .inspect_err(|e| error!("failed to install signal handler: {e}"))
        {
            sig.recv().await;
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {state.terminate().await.ok();},
        () = terminate => {state.terminate().await.ok();},
    }
}
