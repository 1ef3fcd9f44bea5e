use axum::extract::Query;
use axum::Json;
use serde::Deserialize;

use crate::screen::{Screen, ScreenChrome};

#[derive(Deserialize)]
pub struct ScreenQuery {
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_path() -> String {
    "/".to_string()
}

/// GET /api/screens?path=: resolve a path and describe its chrome.
pub async fn resolve(Query(query): Query<ScreenQuery>) -> Json<ScreenChrome> {
    Json(Screen::from_path(&query.path).chrome())
}
