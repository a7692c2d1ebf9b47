//! NAS gateway - REST API for a multi-disk storage device

use clap::Parser;
use nas_gateway::{config::SeedUser, run_server_with_shutdown, GatewayConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "nas-gateway")]
#[command(about = "REST gateway for a multi-disk network attached storage device")]
#[command(version)]
struct Args {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, env = "NAS_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// PEM file with the RSA private key used to sign tokens
    #[arg(long)]
    private_key: Option<PathBuf>,

    /// PEM file with the RSA public key used to verify tokens
    #[arg(long)]
    public_key: Option<PathBuf>,

    /// Username of an account to create at startup
    #[arg(long, env = "NAS_ADMIN_USER", requires = "admin_password")]
    admin_user: Option<String>,

    /// Password of the startup account
    #[arg(long, env = "NAS_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "NAS_DEBUG")]
    debug: bool,

    /// Emit logs as JSON
    #[arg(long, env = "NAS_LOG_JSON")]
    log_json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("nas_gateway={log_level},tower_http=debug").into());
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let mut config = GatewayConfig::load(args.config.as_deref())?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(path) = args.private_key {
        config.private_key_path = path;
    }
    if let Some(path) = args.public_key {
        config.public_key_path = path;
    }
    if let (Some(username), Some(password)) = (args.admin_user, args.admin_password) {
        config.seed_user = Some(SeedUser { username, password });
    }

    tracing::info!("Starting NAS gateway on {}", config.bind_addr());
    for disk in &config.disks {
        tracing::info!(id = disk.id, mount_point = %disk.mount_point, capacity = disk.capacity, "Disk");
    }

    run_server_with_shutdown(config, async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
    })
    .await
}
