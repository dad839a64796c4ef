use crate::api::AppState;
use crate::error::AppError;
use crate::orchestration::EvaluationCycle;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

/// Serverless-style response envelope.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    pub status_code: u16,
    pub body: EvaluationCycle,
}

pub async fn evaluate(State(state): State<AppState>) -> Result<Json<EvaluateResponse>, AppError> {
    let mut evaluator = state.evaluator.lock().await;
    let cycle = evaluator.evaluate_cycle().await?;

    Ok(Json(EvaluateResponse {
        status_code: 200,
        body: cycle,
    }))
}
