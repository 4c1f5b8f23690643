//! Slot catalogue, history and balance read endpoints.
//!
//! ```text
//! GET /api/v1/slots/available?kind=
//! GET /api/v1/instructors/{id}/slots
//! GET /api/v1/instructors/me/history
//! GET /api/v1/students/me/bookings
//! GET /api/v1/students/me/history
//! GET /api/v1/students/me/balance
//! ```

use actix_web::{get, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Role, Slot, SlotStatus};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_slot_kind, parse_uuid};

/// One slot as returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlotResponseBody {
    #[schema(format = "uuid")]
    pub id: String,
    #[schema(format = "date-time")]
    pub start: String,
    pub duration_hours: u8,
    pub kind: String,
    #[schema(format = "uuid")]
    pub instructor_id: String,
    #[schema(value_type = Option<uuid::Uuid>)]
    pub student_id: Option<String>,
    pub status: String,
    pub exam_result: String,
    pub rating: Option<u8>,
}

impl From<Slot> for SlotResponseBody {
    fn from(slot: Slot) -> Self {
        Self {
            id: slot.id.to_string(),
            start: slot.start.to_rfc3339(),
            duration_hours: slot.duration_hours,
            kind: slot.kind.as_str().to_owned(),
            instructor_id: slot.instructor_id.to_string(),
            student_id: slot.student_id.map(|id| id.to_string()),
            status: slot.status.as_str().to_owned(),
            exam_result: slot.exam_result.as_str().to_owned(),
            rating: slot.rating,
        }
    }
}

fn to_bodies(slots: Vec<Slot>) -> Vec<SlotResponseBody> {
    slots.into_iter().map(SlotResponseBody::from).collect()
}

/// Student credit counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponseBody {
    pub lesson_credits: u32,
    pub exam_credits: u32,
}

/// Query parameters for the available-slot listing.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct AvailableSlotsQuery {
    /// Slot kind to browse: `lesson` or `exam`.
    pub kind: String,
}

/// Browse bookable slots of one kind.
#[utoipa::path(
    get,
    path = "/api/v1/slots/available",
    params(AvailableSlotsQuery),
    responses(
        (status = 200, description = "Available slots ordered by start time", body = Vec<SlotResponseBody>),
        (status = 400, description = "Unknown slot kind", body = crate::domain::Error),
        (status = 401, description = "Missing identity", body = crate::domain::Error)
    ),
    tags = ["slots"],
    operation_id = "listAvailableSlots"
)]
#[get("/slots/available")]
pub async fn available_slots(
    state: web::Data<HttpState>,
    _caller: CallerContext,
    query: web::Query<AvailableSlotsQuery>,
) -> ApiResult<web::Json<Vec<SlotResponseBody>>> {
    let kind = parse_slot_kind(&query.kind, FieldName::new("kind"))?;
    let slots = state.slots.list_available(kind).await?;
    Ok(web::Json(to_bodies(slots)))
}

/// Full calendar of one instructor.
#[utoipa::path(
    get,
    path = "/api/v1/instructors/{id}/slots",
    params(("id" = String, Path, description = "Instructor id")),
    responses(
        (status = 200, description = "Every slot of the instructor", body = Vec<SlotResponseBody>),
        (status = 400, description = "Malformed id", body = crate::domain::Error),
        (status = 401, description = "Missing identity", body = crate::domain::Error)
    ),
    tags = ["slots"],
    operation_id = "listInstructorSlots"
)]
#[get("/instructors/{id}/slots")]
pub async fn instructor_slots(
    state: web::Data<HttpState>,
    _caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<SlotResponseBody>>> {
    let instructor_id = parse_uuid(&path.into_inner(), FieldName::new("id"))?;
    let slots = state.slots.list_for_instructor(instructor_id).await?;
    Ok(web::Json(to_bodies(slots)))
}

/// The calling student's upcoming bookings.
#[utoipa::path(
    get,
    path = "/api/v1/students/me/bookings",
    responses(
        (status = 200, description = "Booked slots of the caller", body = Vec<SlotResponseBody>),
        (status = 401, description = "Missing identity", body = crate::domain::Error),
        (status = 403, description = "Caller is not a student", body = crate::domain::Error)
    ),
    tags = ["students"],
    operation_id = "listMyBookings"
)]
#[get("/students/me/bookings")]
pub async fn my_bookings(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<SlotResponseBody>>> {
    let student = caller.require(Role::Student)?;
    let slots = state
        .slots
        .list_for_student(student.user_id, &[SlotStatus::Booked])
        .await?;
    Ok(web::Json(to_bodies(slots)))
}

/// The calling student's finished and canceled slots.
#[utoipa::path(
    get,
    path = "/api/v1/students/me/history",
    responses(
        (status = 200, description = "Completed and canceled slots of the caller", body = Vec<SlotResponseBody>),
        (status = 401, description = "Missing identity", body = crate::domain::Error),
        (status = 403, description = "Caller is not a student", body = crate::domain::Error)
    ),
    tags = ["students"],
    operation_id = "listMyHistory"
)]
#[get("/students/me/history")]
pub async fn my_history(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<SlotResponseBody>>> {
    let student = caller.require(Role::Student)?;
    let slots = state
        .slots
        .list_for_student(
            student.user_id,
            &[SlotStatus::Completed, SlotStatus::Canceled],
        )
        .await?;
    Ok(web::Json(to_bodies(slots)))
}

/// The calling instructor's finished and canceled slots.
#[utoipa::path(
    get,
    path = "/api/v1/instructors/me/history",
    responses(
        (status = 200, description = "Completed and canceled slots of the caller", body = Vec<SlotResponseBody>),
        (status = 401, description = "Missing identity", body = crate::domain::Error),
        (status = 403, description = "Caller is not an instructor", body = crate::domain::Error)
    ),
    tags = ["instructors"],
    operation_id = "listInstructorHistory"
)]
#[get("/instructors/me/history")]
pub async fn instructor_history(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<SlotResponseBody>>> {
    let instructor = caller.require(Role::Instructor)?;
    let slots = state.slots.list_for_instructor(instructor.user_id).await?;
    let finished = slots
        .into_iter()
        .filter(|s| matches!(s.status, SlotStatus::Completed | SlotStatus::Canceled))
        .collect();
    Ok(web::Json(to_bodies(finished)))
}

/// The calling student's credit counters.
#[utoipa::path(
    get,
    path = "/api/v1/students/me/balance",
    responses(
        (status = 200, description = "Remaining credits", body = BalanceResponseBody),
        (status = 401, description = "Missing identity", body = crate::domain::Error),
        (status = 403, description = "Caller is not a student", body = crate::domain::Error)
    ),
    tags = ["students"],
    operation_id = "getMyBalance"
)]
#[get("/students/me/balance")]
pub async fn my_balance(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<BalanceResponseBody>> {
    let student = caller.require(Role::Student)?;
    // A student with no purchases simply has empty counters.
    let balance = state
        .balance
        .balance(student.user_id)
        .await?
        .unwrap_or_default();
    Ok(web::Json(BalanceResponseBody {
        lesson_credits: balance.lesson_credits,
        exam_credits: balance.exam_credits,
    }))
}
