use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use questboard::app::spawn_midnight_timer;
use questboard::{AppState, Config, Lifecycle, Store, SystemClock, build_router};

#[derive(Parser, Debug)]
#[command(name = "questboard", version, about = "Gamified task board server")]
struct Cli {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(long)]
    bind: Option<String>,

    /// Path of the JSON database
    #[arg(long)]
    data: Option<PathBuf>,

    /// Directory with the web frontend
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    // RUST_LOG wins over --verbose when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to set up logging")?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }
    if let Some(data) = cli.data {
        config.data_path = data;
    }
    if let Some(dir) = cli.static_dir {
        config.static_dir = dir;
    }

    let store = Store::new(&config.data_path);
    let db = store.load()?;
    info!(path = %store.path().display(), tasks = db.tasks.len(), "database loaded");

    let state = AppState::new(
        Lifecycle::new(db, config.rules()),
        store,
        Arc::new(SystemClock),
    );

    // Mount: catch up on anything missed while the server was down
    let report = state.tick().await?;
    info!(reset = report.reset.is_some(), penalties = report.penalties.penalties.len(), "startup tick");

    spawn_midnight_timer(state.clone(), config.reset_minute_after_midnight);

    let app = build_router(state, &config.static_dir);
    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!("Server running at http://{}", config.bind);
    info!("Static files: {}", config.static_dir.display());
    info!("API base:     http://{}/api", config.bind);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
