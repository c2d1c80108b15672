use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::ax_state::AppState;
use crate::core::metrics::stop_duration_options;
use crate::core::predictor::{predict, render_summary};
use crate::error::{AppError, AppResult};
use crate::models::prediction::{NewStopLog, PredictionResult, MAX_DRIVER_AGE, MIN_DRIVER_AGE};
use crate::models::stop::{records_from, Gender};

#[derive(Debug, Serialize)]
pub struct FormOptions {
    pub genders: [Gender; 2],
    pub flags: [u8; 2],
    pub stop_durations: Vec<String>,
    pub min_age: i64,
    pub max_age: i64,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub prediction: PredictionResult,
    pub summary: String,
    pub notice: Option<String>,
}

/// 新增日志表单的可选项
pub async fn form_options(State(state): State<Arc<AppState>>) -> Json<FormOptions> {
    let outcome = state.gateway.fetch_stops().await;
    let records = records_from(&outcome.table);
    Json(FormOptions {
        genders: Gender::ALL,
        flags: [0, 1],
        stop_durations: stop_duration_options(&records),
        min_age: MIN_DRIVER_AGE,
        max_age: MAX_DRIVER_AGE,
        notice: outcome.notice,
    })
}

fn validate(log: &NewStopLog) -> AppResult<()> {
    if !(MIN_DRIVER_AGE..=MAX_DRIVER_AGE).contains(&log.driver_age) {
        return Err(AppError::Validation(format!(
            "driver_age must be between {} and {}",
            MIN_DRIVER_AGE, MAX_DRIVER_AGE
        )));
    }
    if log.stop_duration.trim().is_empty() {
        return Err(AppError::Validation("stop_duration is required".to_string()));
    }
    Ok(())
}

/// Predicts the outcome and violation of a new stop from the current snapshot.
/// The log itself is not stored.
pub async fn predict_outcome(
    State(state): State<Arc<AppState>>,
    Json(log): Json<NewStopLog>,
) -> AppResult<Json<PredictionResponse>> {
    validate(&log)?;

    let outcome = state.gateway.fetch_stops().await;
    let records = records_from(&outcome.table);
    let prediction = predict(&log.criteria(), &records);
    info!(
        fallback = prediction.is_fallback(),
        "预测完成: violation={}, outcome={}, matched={}",
        prediction.predicted_violation,
        prediction.predicted_outcome,
        prediction.matched_stops
    );

    let summary = render_summary(&log, &prediction);
    Ok(Json(PredictionResponse {
        prediction,
        summary,
        notice: outcome.notice,
    }))
}
