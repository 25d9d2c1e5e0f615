use std::path::Path;
use std::sync::Arc;

use devsecops_demo::config::{AppState, Config};
use devsecops_demo::{logger, server};

/// Config file used when no path is given on the command line
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Worker thread count follows server.workers when set
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;

    if cfg.upload.create_dir && !Path::new(&cfg.upload.dir).exists() {
        tokio::fs::create_dir_all(&cfg.upload.dir).await?;
    }

    let state = Arc::new(AppState::new(&cfg)?);
    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for Ctrl+C: {e}"));
            std::future::pending::<()>().await;
        }
    };

    // Use LocalSet for spawn_local support
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await;
    Ok(())
}
