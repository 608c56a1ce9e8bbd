//! `entoscope` -- one-shot detection history viewer.
//!
//! Reads its settings from the environment (see
//! [`ViewerConfig::from_env`](entoscope_cli::config::ViewerConfig::from_env)),
//! runs a single query against the dashboard API and prints the resulting
//! view model as JSON on stdout.

use entoscope_cli::config::ViewerConfig;
use entoscope_cli::viewer;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "entoscope_cli=info,entoscope_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ViewerConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid configuration");
        std::process::exit(1);
    });

    let view = viewer::run(&config).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Query failed");
        std::process::exit(1);
    });

    match serde_json::to_string_pretty(&view) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render view");
            std::process::exit(1);
        }
    }
}
