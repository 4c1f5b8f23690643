//! Liveness probe.

use actix_web::{HttpResponse, get};
use serde::Serialize;
use utoipa::ToSchema;

/// Liveness payload.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HealthResponseBody {
    pub status: &'static str,
}

/// Report process liveness.
#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "Process is alive", body = HealthResponseBody)),
    tags = ["health"],
    operation_id = "healthz"
)]
#[get("/healthz")]
pub async fn healthz() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponseBody { status: "ok" })
}
