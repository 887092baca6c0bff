use axum::Json;

use crate::api::types::HealthResponse;

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { ok: true })
}
