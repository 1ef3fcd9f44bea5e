use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::ScannerError;
use crate::fixtures::{self, HealthScore, ScanInfo, StoreInfo};
use crate::results::{classify, summarize, ResultFilter, ResultRecord, ResultsPage, SortKey};
use crate::state::SessionState;
use crate::state::SharedState;
use crate::store_url::store_host;

#[derive(Deserialize)]
pub struct ResultsQuery {
    pub filter: Option<ResultFilter>,
    pub sort: Option<SortKey>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub store: StoreInfo,
    pub scan: ScanHeader,
    pub health_score: HealthScore,
    #[serde(flatten)]
    pub page: ResultsPage,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHeader {
    #[serde(flatten)]
    pub info: ScanInfo,
    pub tests_run: usize,
}

/// Records for this session: the tests picked in setup, or all of them.
fn session_records(s: &SessionState) -> Vec<ResultRecord> {
    match s.handoff() {
        Some(handoff) => fixtures::results_for(&handoff.selected_test_ids),
        None => fixtures::results().to_vec(),
    }
}

fn store_header(s: &SessionState) -> StoreInfo {
    let mut store = fixtures::dashboard().store.clone();
    if let Some(host) = s.handoff().and_then(|h| store_host(&h.store_url)) {
        store.url = host;
    }
    store
}

/// GET /api/sessions/{id}/results?filter=&sort=
pub async fn list(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<ResultsQuery>,
) -> Result<Json<ResultsResponse>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    if let Some(filter) = query.filter {
        s.results.filter = filter;
    }
    if let Some(sort) = query.sort {
        s.results.sort = sort;
    }

    let records = session_records(&s);
    let dashboard = fixtures::dashboard();
    Ok(Json(ResultsResponse {
        store: store_header(&s),
        scan: ScanHeader {
            info: dashboard.scan.clone(),
            tests_run: records.len(),
        },
        health_score: dashboard.health_score,
        page: s.results.render(&records),
    }))
}

/// POST /api/sessions/{id}/results/{record_id}/toggle
pub async fn toggle(
    State(state): State<SharedState>,
    Path((id, record_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    if !session_records(&s).iter().any(|r| r.id == record_id) {
        return Err(ScannerError::NotFound(format!("result '{}'", record_id)));
    }
    let expanded = s.results.expanded.toggle(&record_id);
    Ok(Json(serde_json::json!({
        "id": record_id,
        "expanded": expanded,
    })))
}

/// GET /api/sessions/{id}/results/export: classified records as a JSON file.
pub async fn export(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ScannerError> {
    let session = state.session(&id).await?;
    let s = session.read().await;
    let records = session_records(&s);
    let exported_at = chrono::Utc::now();

    let body = serde_json::json!({
        "exportedAt": exported_at.to_rfc3339(),
        "store": store_header(&s),
        "healthScore": fixtures::dashboard().health_score,
        "summary": summarize(&records),
        "filter": s.results.filter,
        "sort": s.results.sort,
        "results": classify(&records, s.results.filter, s.results.sort),
    });
    let data = serde_json::to_vec_pretty(&body)
        .map_err(|e| ScannerError::Other(format!("Failed to export results: {}", e)))?;

    let disposition = format!(
        "attachment; filename=\"klaviyo-diagnostic-results-{}.json\"",
        exported_at.timestamp_millis()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}
