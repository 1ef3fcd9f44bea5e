use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Serialize;

use crate::error::ScannerError;
use crate::fixes::{CompletionStats, FixChecklist, FixIssue, IssueQuery};
use crate::state::SharedState;

#[derive(Serialize)]
pub struct FixesResponse {
    pub issues: Vec<FixIssue>,
    pub selected: Option<FixIssue>,
    pub stats: CompletionStats,
    pub remaining_high_priority: usize,
}

fn fixes_response(checklist: &FixChecklist, query: &IssueQuery) -> FixesResponse {
    FixesResponse {
        issues: checklist.filtered(query).into_iter().cloned().collect(),
        selected: checklist.selected().cloned(),
        stats: checklist.stats(),
        remaining_high_priority: checklist.remaining_high_priority(),
    }
}

/// GET /api/sessions/{id}/fixes?search=&severity=
pub async fn list(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Query(query): Query<IssueQuery>,
) -> Result<Json<FixesResponse>, ScannerError> {
    let session = state.session(&id).await?;
    let s = session.read().await;
    Ok(Json(fixes_response(&s.fixes, &query)))
}

/// POST /api/sessions/{id}/fixes/{issue_id}/select
pub async fn select(
    State(state): State<SharedState>,
    Path((id, issue_id)): Path<(String, String)>,
) -> Result<Json<FixesResponse>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    if !s.fixes.select(&issue_id) {
        return Err(ScannerError::NotFound(format!("fix issue '{}'", issue_id)));
    }
    Ok(Json(fixes_response(&s.fixes, &IssueQuery::default())))
}

/// POST /api/sessions/{id}/fixes/{issue_id}/toggle
pub async fn toggle(
    State(state): State<SharedState>,
    Path((id, issue_id)): Path<(String, String)>,
) -> Result<Json<FixesResponse>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    s.fixes
        .toggle_complete(&issue_id)
        .ok_or_else(|| ScannerError::NotFound(format!("fix issue '{}'", issue_id)))?;
    Ok(Json(fixes_response(&s.fixes, &IssueQuery::default())))
}
