//! bookshop server binary.

use std::process::ExitCode;
use std::sync::Arc;

use bookshop::api::{self, App};
use bookshop::store::Database;
use bookshop::{Config, Result, Server, config, seed};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bookshop=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let config = Config::parse();
    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<()> {
    info!(?config, "bookshop v{}", env!("CARGO_PKG_VERSION"));

    let settings = config.auth_settings()?;
    if settings.secret.len() < config::RECOMMENDED_SECRET_LEN {
        warn!(
            "JWT_SECRET is shorter than {} bytes; tokens are easier to forge",
            config::RECOMMENDED_SECRET_LEN
        );
    }

    let db = Database::open(&config.database)?;
    db.migrate().await?;

    let app = Arc::new(App::new(db, &settings));
    if config.seed {
        seed::load_sample_data(&app).await?;
    }

    Server::bind(config.addr()).serve(api::router(app)).await
}
