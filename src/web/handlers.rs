//! HTTP request handlers.

use super::AppState;
use crate::metrics;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse},
};

const INDEX_TEMPLATE: &str = r#"<html>
<head><title>Jenkins Exporter</title></head>
<body>
<h1>Jenkins Exporter</h1>
<p><a href='{{metrics_path}}'>Metrics</a></p>
</body>
</html>"#;

pub async fn handle_index(State(state): State<AppState>) -> impl IntoResponse {
    Html(INDEX_TEMPLATE.replace("{{metrics_path}}", &state.config.telemetry_path))
}

/// Serve the cached snapshot. Never calls Jenkins.
pub async fn handle_metrics(State(state): State<AppState>) -> impl IntoResponse {
    match metrics::render(&state.cache) {
        Ok(body) => ([(header::CONTENT_TYPE, metrics::content_type())], body).into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response()
        }
    }
}

pub async fn handle_healthz() -> &'static str {
    "ok"
}
