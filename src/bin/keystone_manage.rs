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
//! Keystone management tool.
use clap::{Parser, Subcommand};
use color_eyre::Report;
use eyre::{WrapErr, eyre};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use secrecy::{ExposeSecret, SecretString};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    prelude::*,
};
use url::Url;

use keystone_iam::bootstrap::bootstrap;
use keystone_iam::config::Config;
use keystone_iam::db::schema::create_tables;
use keystone_iam::key_ring::{KeyRingKind, KeyRings};
use keystone_iam::keystone::Service;
use keystone_iam::plugin_manager::PluginManager;
use keystone_iam::provider::Provider;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Path to the keystone config file.
    #[arg(short, long, default_value = "/etc/keystone/keystone.conf")]
    config: PathBuf,

    /// Verbosity level. Repeat to increase level.
    #[arg(short, long, global=true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the missing database tables.
    DbSync,
    /// Create the default domain, the system project, the roles and the
    /// system administrator.
    Bootstrap {
        /// Password of the system administrator. `[admin] admin_password` is
        /// used when not given.
        #[arg(long, env = "KEYSTONE_BOOTSTRAP_PASSWORD")]
        bootstrap_password: Option<String>,
        /// Register the identity service with this public URL.
        #[arg(long)]
        bootstrap_public_url: Option<Url>,
    },
    /// Set up the token key ring.
    FernetSetup,
    /// Rotate the token key ring.
    FernetRotate,
    /// Set up the credential key ring.
    CredentialSetup,
    /// Rotate the credential key ring.
    CredentialRotate,
}

async fn connect(cfg: &Config) -> Result<DatabaseConnection, Report> {
    let opt: ConnectOptions = ConnectOptions::new(cfg.database.get_connection().expose_secret())
        // Prevent dumping the password in plaintext.
        .sqlx_logging(false)
        .to_owned();

    info!("Establishing the database connection...");
    Database::connect(opt)
        .await
        .wrap_err("Database connection failed")
}

#[allow(clippy::print_stdout)]
#[tokio::main]
async fn main() -> Result<(), Report> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let filter = Targets::new().with_default(match cli.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    });

    let log_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter);

    // build the tracing registry
    tracing_subscriber::registry().with(log_layer).init();
    let cfg = Config::new(cli.config)?;
    let conn = connect(&cfg).await?;

    match cli.command {
        Commands::DbSync => {
            create_tables(&conn).await?;
            println!("Database is in sync");
        }
        Commands::Bootstrap {
            bootstrap_password,
            bootstrap_public_url,
        } => {
            let password = bootstrap_password
                .map(SecretString::from)
                .or_else(|| cfg.admin.admin_password.clone())
                .ok_or_else(|| {
                    eyre!("either --bootstrap-password or [admin] admin_password is required")
                })?;
            let key_rings = KeyRings::bootstrap(&conn, &cfg).await?;
            let provider = Provider::new(cfg.clone(), PluginManager::default())?;
            let state = Arc::new(Service::new(cfg, conn, provider, key_rings)?);
            let info = bootstrap(
                &state,
                password.expose_secret(),
                bootstrap_public_url.as_ref(),
            )
            .await?;
            println!(
                "User {} ({}) is {} of the project {} ({})",
                info.user.name, info.user.id, info.admin_role.name, info.project.name, info.project.id
            );
        }
        Commands::FernetSetup | Commands::CredentialSetup => {
            let key_rings = KeyRings::bootstrap(&conn, &cfg).await?;
            println!(
                "{} token keys, {} credential keys",
                key_rings.token.len(),
                key_rings.credential.len()
            );
        }
        Commands::FernetRotate => {
            let key_rings = KeyRings::bootstrap(&conn, &cfg).await?;
            key_rings.rotate(&conn, &cfg, KeyRingKind::Token).await?;
            println!("{} token keys active", key_rings.token.len());
        }
        Commands::CredentialRotate => {
            if cfg.credential.key_repository.is_none() {
                return Err(eyre!("[credential] key_repository is not configured"));
            }
            let key_rings = KeyRings::bootstrap(&conn, &cfg).await?;
            key_rings.rotate(&conn, &cfg, KeyRingKind::Credential).await?;
            println!("{} credential keys active", key_rings.credential.len());
        }
    }
    Ok(())
}
