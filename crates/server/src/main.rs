use std::sync::Arc;
use std::time::Duration;

use server::analysis::{Analyzer, HttpAnalyzer, UnavailableAnalyzer};
use server::auth::JwtKeys;
use server::db::AppState;
use server::service::Core;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = server::config::load_config();
    server::logging::init_logging(&config.server.log_level, &config.server.log_format)?;

    let flags = server::config::feature_flags();
    if flags.telemetry {
        if let Err(e) = server::telemetry::init_telemetry() {
            tracing::error!(error = %e, "Telemetry disabled");
        }
    }
    server::health::record_start_time();

    let store = server::db::open_store(config).await?;

    let analyzer: Arc<dyn Analyzer> = match &config.analysis.endpoint {
        Some(endpoint) => {
            let request_timeout = config.analysis.request_timeout_secs.map(Duration::from_secs);
            tracing::info!(endpoint = %endpoint, "Using HTTP evidence analyzer");
            Arc::new(HttpAnalyzer::new(endpoint.clone(), request_timeout)?)
        }
        None => {
            tracing::warn!("No analyzer endpoint configured; analyses will fail as unavailable");
            Arc::new(UnavailableAnalyzer)
        }
    };

    let core = Core::new(store, analyzer, server::config::analysis_deadline(config));
    let state = AppState {
        core,
        auth: JwtKeys::from_env()?,
    };

    let router = server::openapi::app(state, flags.telemetry);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr).await?;
    tracing::info!(addr = %config.server.bind_addr, "Case intake server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
