use asset_server::assets::Assets;
use asset_server::config::{self, AppState, Config};
use asset_server::{logger, server};
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    // Worker count from config, CPU cores otherwise
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

    let assets = Arc::new(Assets::new(cfg.assets.clone())?);
    logger::log_assets_mode(assets.options());
    Arc::clone(&assets).compile().await?;

    let state = Arc::new(AppState::new(&cfg, assets));
    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            logger::log_error(&format!("Failed to listen for shutdown signal: {e}"));
            std::future::pending::<()>().await;
        }
    };
    let drain_timeout = Duration::from_secs(cfg.performance.write_timeout);

    server::start_server_loop(listener, state, shutdown, drain_timeout).await?;
    logger::log_info("Server stopped");
    Ok(())
}
