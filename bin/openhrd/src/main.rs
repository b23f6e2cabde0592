//! `openhrd` — the OpenHR server binary.
//!
//! Usage:
//!   openhrd -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/openhr/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use openhr_core::Module;
use tracing::info;

use auth::api::AuthGate;
use config::ServerConfig;
use hr::service::polish::HttpPolisher;

/// OpenHR server.
#[derive(Parser, Debug)]
#[command(name = "openhrd", about = "OpenHR server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    // Initialize storage.
    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = openhr_core::ServiceConfig {
        data_dir: Some(data_dir),
        listen: cli.listen.clone(),
    };

    let sql: Arc<dyn openhr_sql::SQLStore> = Arc::new(
        openhr_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    // ── Initialize modules ──

    let auth_config = auth::service::AuthConfig {
        jwt_secret: server_config.jwt.secret.clone(),
        access_token_ttl: server_config.jwt.access_expire_secs,
        refresh_token_ttl: server_config.jwt.refresh_expire_secs,
    };
    let auth_module = auth::AuthModule::new(Arc::clone(&sql), auth_config)?;
    info!("Auth module initialized");

    let polisher = Arc::new(HttpPolisher::new(
        server_config.polish.api_url.clone(),
        server_config.polish.api_key.clone(),
        server_config.polish.model.clone(),
    ));
    let hr_module = hr::HrModule::new(
        Arc::clone(&sql),
        Arc::clone(auth_module.service()),
        polisher,
    )?;
    info!("HR module initialized");

    // Bootstrap: ensure the seed admin exists.
    bootstrap::ensure_admin(auth_module.service(), &server_config)?;

    let module_routes = vec![
        (auth_module.name().to_string(), auth_module.routes()),
        (hr_module.name().to_string(), hr_module.routes()),
    ];

    // Middleware state: verifier + the route policy, composed once.
    let gate = AuthGate {
        service: Arc::clone(auth_module.service()),
        policy: Arc::new(routes::route_policy()),
    };

    // Build router.
    let app = routes::build_router(module_routes, gate);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&cli.listen).await?;
    info!("OpenHR server listening on {}", cli.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
