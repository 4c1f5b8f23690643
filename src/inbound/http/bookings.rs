//! Slot mutation endpoints.
//!
//! ```text
//! POST /api/v1/slots/{id}/book
//! POST /api/v1/slots/{id}/cancel
//! POST /api/v1/slots/{id}/change
//! POST /api/v1/slots/{id}/result
//! POST /api/v1/slots/{id}/rating
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{Error, Role};
use crate::inbound::http::ApiResult;
use crate::inbound::http::identity::CallerContext;
use crate::inbound::http::slots::SlotResponseBody;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_exam_result, parse_rfc3339_timestamp, parse_uuid,
};

fn slot_id_from(path: web::Path<String>) -> Result<Uuid, Error> {
    parse_uuid(&path.into_inner(), FieldName::new("id"))
}

/// Response for a student cancellation.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponseBody {
    pub slot: SlotResponseBody,
    pub refunded: bool,
    /// Hours between the cancellation and the slot start.
    pub hours_until: f64,
}

/// Request body for an instructor reschedule.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRequestBody {
    /// New start instant, RFC 3339.
    #[schema(format = "date-time")]
    pub new_start: String,
}

/// Response for an instructor reschedule.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangeResponseBody {
    pub old_slot: SlotResponseBody,
    pub new_slot: SlotResponseBody,
    pub refunded: bool,
}

/// Request body for recording an exam result.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultRequestBody {
    /// `passed`, `failed`, or `pending` to reset a recorded result.
    pub result: String,
}

/// Request body for rating a finished slot.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequestBody {
    /// Stars, 1 through 5.
    pub rating: u8,
}

/// Book an available slot, consuming one credit.
#[utoipa::path(
    post,
    path = "/api/v1/slots/{id}/book",
    params(("id" = String, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Slot booked", body = SlotResponseBody),
        (status = 402, description = "No matching credits left", body = crate::domain::Error),
        (status = 403, description = "Caller is not a student", body = crate::domain::Error),
        (status = 404, description = "Slot or student unknown", body = crate::domain::Error),
        (status = 409, description = "Slot is not available", body = crate::domain::Error)
    ),
    tags = ["bookings"],
    operation_id = "bookSlot"
)]
#[post("/slots/{id}/book")]
pub async fn book_slot(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<SlotResponseBody>> {
    let student = caller.require(Role::Student)?;
    let slot_id = slot_id_from(path)?;
    let slot = state.booking.book(slot_id, student.user_id).await?;
    Ok(web::Json(SlotResponseBody::from(slot)))
}

/// Cancel the caller's booking; refunds when far enough ahead.
#[utoipa::path(
    post,
    path = "/api/v1/slots/{id}/cancel",
    params(("id" = String, Path, description = "Slot id")),
    responses(
        (status = 200, description = "Booking canceled", body = CancelResponseBody),
        (status = 403, description = "Caller does not hold this booking", body = crate::domain::Error),
        (status = 404, description = "Slot unknown", body = crate::domain::Error),
        (status = 409, description = "Slot is not booked", body = crate::domain::Error)
    ),
    tags = ["bookings"],
    operation_id = "cancelSlot"
)]
#[post("/slots/{id}/cancel")]
pub async fn cancel_slot(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CancelResponseBody>> {
    let student = caller.require(Role::Student)?;
    let slot_id = slot_id_from(path)?;
    let outcome = state.booking.cancel(slot_id, student.user_id).await?;
    Ok(web::Json(CancelResponseBody {
        slot: SlotResponseBody::from(outcome.slot),
        refunded: outcome.refunded,
        hours_until: outcome.hours_until,
    }))
}

/// Reschedule a slot to a new start, displacing any booking.
#[utoipa::path(
    post,
    path = "/api/v1/slots/{id}/change",
    params(("id" = String, Path, description = "Slot id")),
    request_body = ChangeRequestBody,
    responses(
        (status = 200, description = "Slot rescheduled", body = ChangeResponseBody),
        (status = 403, description = "Caller does not own this slot", body = crate::domain::Error),
        (status = 404, description = "Slot unknown", body = crate::domain::Error),
        (status = 409, description = "Slot finished, or the new time overlaps", body = crate::domain::Error)
    ),
    tags = ["bookings"],
    operation_id = "changeSlot"
)]
#[post("/slots/{id}/change")]
pub async fn change_slot(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
    payload: web::Json<ChangeRequestBody>,
) -> ApiResult<web::Json<ChangeResponseBody>> {
    let owner = caller.require_any(&[Role::Instructor, Role::Admin])?;
    let slot_id = slot_id_from(path)?;
    let new_start = parse_rfc3339_timestamp(&payload.new_start, FieldName::new("newStart"))?;
    let outcome = state.booking.change(slot_id, new_start, owner).await?;
    Ok(web::Json(ChangeResponseBody {
        old_slot: SlotResponseBody::from(outcome.old_slot),
        new_slot: SlotResponseBody::from(outcome.new_slot),
        refunded: outcome.refunded,
    }))
}

/// Record the result of a completed exam.
#[utoipa::path(
    post,
    path = "/api/v1/slots/{id}/result",
    params(("id" = String, Path, description = "Slot id")),
    request_body = ExamResultRequestBody,
    responses(
        (status = 200, description = "Result recorded", body = SlotResponseBody),
        (status = 400, description = "Unknown result value", body = crate::domain::Error),
        (status = 403, description = "Caller does not own this slot", body = crate::domain::Error),
        (status = 404, description = "Slot unknown", body = crate::domain::Error),
        (status = 409, description = "Not a completed exam", body = crate::domain::Error)
    ),
    tags = ["bookings"],
    operation_id = "setExamResult"
)]
#[post("/slots/{id}/result")]
pub async fn set_exam_result(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
    payload: web::Json<ExamResultRequestBody>,
) -> ApiResult<web::Json<SlotResponseBody>> {
    let instructor = caller.require(Role::Instructor)?;
    let slot_id = slot_id_from(path)?;
    let result = parse_exam_result(&payload.result, FieldName::new("result"))?;
    let slot = state
        .booking
        .set_exam_result(slot_id, instructor.user_id, result)
        .await?;
    Ok(web::Json(SlotResponseBody::from(slot)))
}

/// Rate a finished slot, once.
#[utoipa::path(
    post,
    path = "/api/v1/slots/{id}/rating",
    params(("id" = String, Path, description = "Slot id")),
    request_body = RatingRequestBody,
    responses(
        (status = 200, description = "Rating recorded", body = SlotResponseBody),
        (status = 400, description = "Rating outside 1..=5", body = crate::domain::Error),
        (status = 403, description = "Caller did not book this slot", body = crate::domain::Error),
        (status = 404, description = "Slot unknown", body = crate::domain::Error),
        (status = 409, description = "Slot unfinished or already rated", body = crate::domain::Error)
    ),
    tags = ["bookings"],
    operation_id = "rateSlot"
)]
#[post("/slots/{id}/rating")]
pub async fn rate_slot(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
    payload: web::Json<RatingRequestBody>,
) -> ApiResult<web::Json<SlotResponseBody>> {
    let student = caller.require(Role::Student)?;
    let slot_id = slot_id_from(path)?;
    let slot = state
        .booking
        .rate(slot_id, student.user_id, payload.rating)
        .await?;
    Ok(web::Json(SlotResponseBody::from(slot)))
}
