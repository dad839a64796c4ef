use anyhow::Context;
use lotsignal::config::{Config, RunMode};
use lotsignal::orchestration::{CycleSettings, Evaluator};
use lotsignal::{api, AlpacaBrokerage, Brokerage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = Config::from_env().context("Configuration error")?;

    let brokerage: Arc<dyn Brokerage> = Arc::new(AlpacaBrokerage::new(
        config.broker_api_url.clone(),
        config.market_data_url.clone(),
        config.api_key_id.clone(),
        config.api_secret_key.clone(),
    ));

    let mut evaluator = Evaluator::connect(brokerage, CycleSettings::from(&config))
        .await
        .context("Failed to load account equity")?;

    match config.run_mode {
        RunMode::Once => {
            let cycle = evaluator.evaluate_cycle().await?;
            println!("{}", serde_json::to_string_pretty(&cycle)?);
        }
        RunMode::Poll => {
            let mut interval =
                tokio::time::interval(Duration::from_millis(config.poll_interval_ms));
            loop {
                interval.tick().await;
                match evaluator.evaluate_cycle().await {
                    Ok(cycle) => tracing::info!(
                        "Cycle for {}: action={:?} position={:?} error={:?}",
                        cycle.symbol,
                        cycle.action,
                        cycle.resulting_position,
                        cycle.error
                    ),
                    Err(e) => tracing::error!("Cycle failed: {}", e),
                }
            }
        }
        RunMode::Server => {
            let app = api::create_router(api::AppState::new(evaluator));

            let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind to {}", addr))?;

            tracing::info!("Server listening on {}", addr);
            axum::serve(listener, app).await.context("Server error")?;
        }
    }

    Ok(())
}
