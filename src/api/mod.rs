pub mod evaluate;
pub mod health;

use crate::domain::{Decimal, Symbol};
use crate::orchestration::Evaluator;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    /// Serializes cycles: only one evaluation runs at a time.
    pub evaluator: Arc<Mutex<Evaluator>>,
    /// Read without the evaluator lock so readiness never waits on a cycle.
    pub symbol: Symbol,
    pub equity: Decimal,
}

impl AppState {
    pub fn new(evaluator: Evaluator) -> Self {
        Self {
            symbol: evaluator.settings().symbol.clone(),
            equity: evaluator.context().equity,
            evaluator: Arc::new(Mutex::new(evaluator)),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/evaluate", post(evaluate::evaluate))
        .layer(cors)
        .with_state(state)
}
