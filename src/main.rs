use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use hunter_quest::cli::{self, Cli};

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

/// HUNTER_QUEST_LOG sets the filter, HUNTER_QUEST_LOG_FORMAT=json for json lines
fn init_tracing() {
    let filter = EnvFilter::try_from_env("HUNTER_QUEST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("hunter_quest=info,tower_http=info"));

    let json = std::env::var("HUNTER_QUEST_LOG_FORMAT").is_ok_and(|f| f == "json");
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
