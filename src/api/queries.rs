use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::ax_state::AppState;
use crate::error::{AppError, AppResult};
use crate::models::table::Table;

#[derive(Debug, Serialize)]
pub struct QueryListItem {
    pub index: usize,
    pub label: &'static str,
}

/// 按标签或按下拉框位置选择查询，标签优先
#[derive(Debug, Deserialize)]
pub struct RunQueryRequest {
    pub label: Option<String>,
    pub index: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RunQueryResponse {
    pub label: String,
    pub table: Table,
    pub notice: Option<String>,
}

pub async fn list_queries(State(state): State<Arc<AppState>>) -> Json<Vec<QueryListItem>> {
    let items = state
        .catalog
        .labels()
        .into_iter()
        .enumerate()
        .map(|(index, label)| QueryListItem { index, label })
        .collect();
    Json(items)
}

pub async fn run_query(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RunQueryRequest>,
) -> AppResult<Json<RunQueryResponse>> {
    let (label, statement) = match (payload.label, payload.index) {
        (Some(label), _) => {
            let statement = state.catalog.statement_for(&label)?;
            (label, statement)
        }
        (None, Some(index)) => {
            let entry = state.catalog.entry_at(index)?;
            (entry.label.to_string(), entry.statement)
        }
        (None, None) => {
            return Err(AppError::Validation("either label or index is required".to_string()))
        }
    };

    info!("执行预置查询: {}", label);
    let outcome = state.gateway.execute(statement).await;

    Ok(Json(RunQueryResponse {
        label,
        table: outcome.table,
        notice: outcome.notice,
    }))
}
