use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use apikit::{health_check, with_http_stack, HttpStackConfig};
use apikit_db::{
    absolutize_sqlite_dsn, redact_credentials_in_dsn, ConnectOpts, DbEngine, DbHandle,
};
use axum::{routing::get, Router};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use products::{ProductsConfig, ProductsModule};
use runtime::{AppConfig, CliArgs, DatabaseConfig, ServerConfig};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const PRODUCTS_MODULE: &str = "products";

/// Catalog Server - products and categories over HTTP
#[derive(Parser)]
#[command(name = "catalog-server")]
#[command(about = "Catalog Server - products and categories over HTTP")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // home_dir is normalized and created while loading
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::info!("Catalog Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

/// Final DSN for the configured database; relative SQLite paths resolve
/// against the home directory.
fn resolve_dsn(db_config: &DatabaseConfig, config: &AppConfig) -> Result<String> {
    let dsn = db_config.url.trim();
    if dsn.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    match DbHandle::detect(dsn)? {
        DbEngine::Sqlite => Ok(absolutize_sqlite_dsn(dsn, &config.home_dir(), true)?),
        DbEngine::Postgres => Ok(dsn.to_string()),
    }
}

async fn connect_db(config: &AppConfig) -> Result<DbHandle> {
    let db_config = config
        .database
        .clone()
        .ok_or_else(|| anyhow!("No database configuration found (use --mock for an in-memory store)"))?;
    let dsn = resolve_dsn(&db_config, config)?;

    let connect_opts = ConnectOpts {
        max_conns: db_config.max_conns,
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms))),
        create_sqlite_dirs: true,
    };

    let db = DbHandle::connect(&dsn, connect_opts)
        .await
        .context("database connection failed")?;
    tracing::info!(
        "Connected DB backend {:?} at {}",
        db.engine(),
        redact_credentials_in_dsn(db.dsn())
    );
    Ok(db)
}

fn build_router(module: &ProductsModule, server: &ServerConfig) -> Router {
    let router = Router::new().route("/health", get(health_check));
    let router = module.register_rest(router);

    let http = HttpStackConfig {
        timeout: (server.timeout_sec > 0).then(|| Duration::from_secs(server.timeout_sec)),
        body_limit_bytes: server.body_limit_bytes,
    };
    with_http_stack(router, &http)
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let products_cfg: ProductsConfig = config.module_config(PRODUCTS_MODULE)?;
    let db = connect_db(&config).await?;
    let module = ProductsModule::init(db.sea(), products_cfg).await?;
    let app = build_router(&module, &config.server);

    let host = config.server.host.as_str();
    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .with_context(|| format!("failed to bind HTTP listener on {host}:{port}"))?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .context("HTTP server failed")?;

    db.close().await?;
    tracing::info!("Catalog Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let _: ProductsConfig = config.module_config(PRODUCTS_MODULE)?;
    if let Some(db_config) = &config.database {
        DbHandle::detect(db_config.url.trim())?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);
    Ok(())
}

/// Resolves on SIGTERM or Ctrl+C.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("shutdown: ctrl_c");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("shutdown: SIGTERM");
                    }
                }
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {e}; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("shutdown: ctrl_c");
    }
}
