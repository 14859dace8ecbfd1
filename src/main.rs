use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use waypoint::runtime_config::RuntimeConfig;
use waypoint::server::{AppService, HttpServer};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let pipeline = Arc::new(waypoint::app::reference_pipeline(Some("static".into())));
    let service = AppService::new(pipeline);

    let addr = format!("0.0.0.0:{}", config.port);
    info!(addr = %addr, "Listening");
    let handle = HttpServer(service).start(addr.as_str())?;
    handle
        .join()
        .map_err(|_| anyhow::anyhow!("server coroutine panicked"))?;
    Ok(())
}
