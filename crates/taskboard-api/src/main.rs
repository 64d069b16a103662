//! taskboard-api: REST API server for the taskboard service
//!
//! Serves boards, ordered lists and cards, the audit trail, free-tier limits
//! and subscription billing under `/api`.

mod app;
mod error;
mod extract;
mod handlers;

use app::AppState;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use taskboard_core::{BillingGateway, Config, DisabledGateway, StripeGateway, Taskboard};

#[derive(Debug, Parser)]
#[command(name = "taskboard-api", version, about = "REST API server for the taskboard service")]
struct Args {
    /// TOML config file
    #[arg(long, env = "TASKBOARD_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "TASKBOARD_PORT", default_value_t = 5000)]
    port: u16,

    #[arg(long, env = "TASKBOARD_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Persist data here instead of keeping it in memory
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Persist to the platform data directory when no --data-dir is given
    #[arg(long)]
    persist: bool,

    /// Frontend base URL used for billing return links
    #[arg(long, env = "CLIENT_URL")]
    client_url: Option<String>,

    /// Payment provider secret key; billing is disabled without it
    #[arg(long, env = "STRIPE_API_KEY", hide_env_values = true)]
    billing_api_key: Option<String>,

    /// Secret used to verify webhook signatures
    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,

    /// Print a commented default config and exit
    #[arg(long)]
    print_config: bool,
}

impl Args {
    /// File config with command line overrides applied
    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", path.display(), e))?,
            None => Config::default(),
        };

        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        } else if self.persist && config.data_dir.is_none() {
            config.data_dir = Config::default_data_dir();
        }
        if let Some(url) = &self.client_url {
            config.billing.client_url = url.clone();
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.print_config {
        print!("{}", Config::default_with_comments());
        return Ok(());
    }

    init_tracing();

    let config = args.config()?;
    let gateway: Arc<dyn BillingGateway> = match &args.billing_api_key {
        Some(key) => Arc::new(StripeGateway::new(key.clone(), config.billing.clone())),
        None => {
            tracing::warn!("No billing API key configured, checkout is disabled");
            Arc::new(DisabledGateway)
        }
    };
    if args.webhook_secret.is_none() {
        tracing::warn!("No webhook secret configured, webhook signatures are not checked");
    }

    let taskboard =
        Taskboard::open(config).map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let state = Arc::new(AppState {
        taskboard,
        gateway,
        webhook_secret: args.webhook_secret.clone(),
    });
    let app = app::router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    tracing::info!("Starting taskboard-api on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
