use std::path::PathBuf;

use herdbook_backend::config::AppConfig;
use herdbook_backend::{initialize_backend, logging};
use log::info;

const DEFAULT_CONFIG_PATH: &str = "herdbook.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    let config = AppConfig::load(&config_path)?;
    logging::init(&config.logging)?;

    info!("Starting Herdbook backend ({:?})", config.backend);
    let state = initialize_backend(config)?;

    // Follow the session until interrupted
    let mut router = state.router();
    info!("Showing {}", router.current().title());
    loop {
        let changed = tokio::select! {
            changed = router.next_change() => changed,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                false
            }
        };
        if !changed {
            break;
        }
        info!("Showing {}", router.current().title());
    }

    state.shutdown().await
}
