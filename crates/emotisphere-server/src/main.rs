//! Emotisphere binary entry point.
//!
//! Startup sequence:
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load server and adapter configuration from the environment
//! 3. Spawn the broadcast hub
//! 4. Build the upstream clients, the pipeline, and its scheduler
//! 5. Auto-start the pipeline if both API keys are present
//! 6. Serve HTTP + `WebSocket` until `Ctrl-C`

use std::sync::Arc;

use emotisphere_adapters::{AdapterConfig, Adapters};
use emotisphere_core::{Hub, Pipeline, PipelineConfig, PipelineControl, RunConfig, Scheduler};
use emotisphere_server::{AppState, ServerConfig, start_server};
use emotisphere_types::RegionCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("emotisphere starting");

    // 2. Load configuration.
    let server_config = ServerConfig::from_env()?;
    let adapter_config = AdapterConfig::from_env();
    info!(
        host = %server_config.host,
        port = server_config.port,
        model = %adapter_config.huggingface_model,
        "configuration loaded"
    );

    // 3. Broadcast hub.
    let (hub, _hub_task) = Hub::spawn();

    // 4. Pipeline and scheduler.
    let adapters = Adapters::from_config(&adapter_config)?;
    let pipeline = Pipeline::new(
        adapters.source,
        adapters.classifier,
        adapters.geocoder,
        hub.clone(),
        PipelineConfig::default(),
    );
    let scheduler = Arc::new(Scheduler::new(Arc::new(pipeline)));

    // 5. Auto-start.
    let missing = adapter_config.missing_credentials();
    if missing.is_empty() {
        let regions = RegionCode::defaults();
        info!(
            interval_secs = server_config.auto_start_interval.as_secs(),
            "API keys present, starting pipeline automatically"
        );
        scheduler.start(RunConfig::new(server_config.auto_start_interval, regions));
    } else {
        warn!(
            missing = %missing.join(", "),
            "API keys not set, pipeline will not start automatically"
        );
    }

    // 6. Serve.
    let control: Arc<dyn PipelineControl> = Arc::clone(&scheduler) as Arc<dyn PipelineControl>;
    let state = Arc::new(AppState::new(hub, control, missing));
    start_server(&server_config, state).await?;

    scheduler.stop();
    info!("emotisphere stopped");
    Ok(())
}
