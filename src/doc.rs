//! OpenAPI documentation configuration.
//!
//! Defines [`ApiDoc`], the generated specification for the REST API. The
//! document is served by Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::bookings::{
    CancelResponseBody, ChangeRequestBody, ChangeResponseBody, ExamResultRequestBody,
    RatingRequestBody,
};
use crate::inbound::http::health::HealthResponseBody;
use crate::inbound::http::slots::{BalanceResponseBody, SlotResponseBody};

/// Enrich the generated document with the gateway identity scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "GatewayIdentity",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "x-user-id",
                "User id forwarded by the authenticating gateway, paired with x-user-role.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Autoschool scheduling API",
        description = "Slot scheduling, booking and credit accounting for a driving school."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("GatewayIdentity" = [])),
    paths(
        crate::inbound::http::slots::available_slots,
        crate::inbound::http::slots::instructor_slots,
        crate::inbound::http::slots::instructor_history,
        crate::inbound::http::slots::my_bookings,
        crate::inbound::http::slots::my_history,
        crate::inbound::http::slots::my_balance,
        crate::inbound::http::bookings::book_slot,
        crate::inbound::http::bookings::cancel_slot,
        crate::inbound::http::bookings::change_slot,
        crate::inbound::http::bookings::set_exam_result,
        crate::inbound::http::bookings::rate_slot,
        crate::inbound::http::health::healthz,
    ),
    components(schemas(
        Error,
        ErrorCode,
        SlotResponseBody,
        BalanceResponseBody,
        CancelResponseBody,
        ChangeRequestBody,
        ChangeResponseBody,
        ExamResultRequestBody,
        RatingRequestBody,
        HealthResponseBody,
    )),
    tags(
        (name = "slots", description = "Browsing the slot catalogue"),
        (name = "bookings", description = "Booking and slot lifecycle operations"),
        (name = "students", description = "Student-facing views"),
        (name = "instructors", description = "Instructor-facing views"),
        (name = "health", description = "Liveness probes")
    )
)]
pub struct ApiDoc;
