use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::lead::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("No scan has been started for this session")]
    NoActiveScan,

    #[error("No report generation has been started for this session")]
    NoActiveReport,

    #[error("Scan cannot start: {0}")]
    ScanNotReady(String),

    #[error("Lead form has {} invalid field(s)", .0.len())]
    InvalidLead(FieldErrors),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Report is not ready for download")]
    ReportNotReady,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl IntoResponse for ScannerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ScannerError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ScannerError::NoActiveScan => StatusCode::CONFLICT,
            ScannerError::NoActiveReport => StatusCode::CONFLICT,
            ScannerError::ScanNotReady(_) => StatusCode::CONFLICT,
            ScannerError::InvalidLead(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ScannerError::Validation(_) => StatusCode::BAD_REQUEST,
            ScannerError::ReportNotReady => StatusCode::CONFLICT,
            ScannerError::NotFound(_) => StatusCode::NOT_FOUND,
            ScannerError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match &self {
            ScannerError::InvalidLead(fields) => serde_json::json!({
                "error": self.to_string(),
                "fields": fields,
            }),
            _ => serde_json::json!({
                "error": self.to_string(),
            }),
        };

        (status, axum::Json(body)).into_response()
    }
}
