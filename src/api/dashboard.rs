use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::ax_state::AppState;
use crate::core::insights::SnapshotInsights;
use crate::core::metrics::{gender_distribution, violation_distribution, CategoryCount, KeyMetrics};
use crate::infra::gateway::QueryOutcome;
use crate::models::stop::records_from;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub metrics: KeyMetrics,
    pub violations: Vec<CategoryCount>,
    pub genders: Vec<CategoryCount>,
    pub notice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: SnapshotInsights,
    pub notice: Option<String>,
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// 原始巡逻日志全表
pub async fn list_logs(State(state): State<Arc<AppState>>) -> Json<QueryOutcome> {
    Json(state.gateway.fetch_stops().await)
}

/// 关键指标 + 两张图表的数据
pub async fn dashboard(State(state): State<Arc<AppState>>) -> Json<DashboardResponse> {
    let outcome = state.gateway.fetch_stops().await;
    let records = records_from(&outcome.table);
    let metrics = KeyMetrics::compute(&records);
    info!(
        "仪表盘指标: stops={}, arrests={}, warnings={}, drugs={}",
        metrics.total_stops, metrics.total_arrests, metrics.total_warnings, metrics.drug_related_stops
    );

    Json(DashboardResponse {
        metrics,
        violations: violation_distribution(&records),
        genders: gender_distribution(&records),
        notice: outcome.notice,
    })
}

pub async fn insights(State(state): State<Arc<AppState>>) -> Json<InsightsResponse> {
    let outcome = state.gateway.fetch_stops().await;
    let records = records_from(&outcome.table);
    Json(InsightsResponse {
        insights: SnapshotInsights::compute(&records),
        notice: outcome.notice,
    })
}
