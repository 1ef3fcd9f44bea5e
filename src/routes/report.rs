use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;

use crate::error::ScannerError;
use crate::generation::{self, ReportView};
use crate::lead::{FieldValue, LeadField, LeadForm, LeadFormView};
use crate::report::{Delivery, SectionError};
use crate::state::SharedState;

/// GET /api/sessions/{id}/report
pub async fn status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ReportView>, ScannerError> {
    let session = state.session(&id).await?;
    Ok(Json(generation::view(&session).await))
}

/// POST /api/sessions/{id}/report/sections/{section_id}/toggle
pub async fn toggle_section(
    State(state): State<SharedState>,
    Path((id, section_id)): Path<(String, String)>,
) -> Result<Json<ReportView>, ScannerError> {
    let session = state.session(&id).await?;
    session
        .write()
        .await
        .report
        .sections
        .toggle(&section_id)
        .map_err(|e| match e {
            SectionError::Unknown(_) => ScannerError::NotFound(e.to_string()),
            SectionError::Required(_) => ScannerError::Validation(e.to_string()),
        })?;
    Ok(Json(generation::view(&session).await))
}

/// PUT /api/sessions/{id}/report/delivery
pub async fn set_delivery(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(delivery): Json<Delivery>,
) -> Result<Json<ReportView>, ScannerError> {
    delivery
        .validate()
        .map_err(|msg| ScannerError::Validation(msg.to_string()))?;
    let session = state.session(&id).await?;
    session.write().await.report.delivery = delivery;
    Ok(Json(generation::view(&session).await))
}

#[derive(Deserialize)]
pub struct FieldUpdate {
    pub value: FieldValue,
}

/// PUT /api/sessions/{id}/report/lead/{field}: type into one field.
pub async fn set_lead_field(
    State(state): State<SharedState>,
    Path((id, field)): Path<(String, LeadField)>,
    Json(update): Json<FieldUpdate>,
) -> Result<Json<LeadFormView>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    if !s.report.lead_form.set(field, update.value) {
        return Err(ScannerError::Validation(format!(
            "{:?} does not take that kind of value",
            field
        )));
    }
    Ok(Json(s.report.lead_form.view()))
}

/// POST /api/sessions/{id}/report/lead/{field}/blur: validate one field.
pub async fn blur_lead_field(
    State(state): State<SharedState>,
    Path((id, field)): Path<(String, LeadField)>,
) -> Result<Json<LeadFormView>, ScannerError> {
    let session = state.session(&id).await?;
    let mut s = session.write().await;
    s.report.lead_form.blur(field);
    Ok(Json(s.report.lead_form.view()))
}

/// POST /api/sessions/{id}/report: submit the lead form and generate.
/// An empty body submits the values typed so far.
pub async fn submit(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<ReportView>), ScannerError> {
    let form = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        let form: LeadForm = serde_json::from_slice(&body)
            .map_err(|e| ScannerError::Validation(format!("Invalid lead form: {}", e)))?;
        Some(form)
    };
    let session = state.session(&id).await?;
    let view = generation::submit(&state, &session, form).await?;
    Ok((StatusCode::ACCEPTED, Json(view)))
}

/// POST /api/sessions/{id}/report/cancel
pub async fn cancel(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ScannerError> {
    let session = state.session(&id).await?;
    let cancelled = generation::cancel(&state, &session).await?;
    Ok(Json(serde_json::json!({ "cancelled": cancelled })))
}

/// GET /api/sessions/{id}/report/download
pub async fn download(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ScannerError> {
    let session = state.session(&id).await?;
    let artifact = generation::download(&session).await?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, artifact.media_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    ))
}
