//! HTTP inbound adapter.
//!
//! Thin actix handlers: extract the caller, validate the payload, call a
//! domain service, serialize the outcome. No business rules live here.

pub mod bookings;
pub mod error;
pub mod health;
pub mod identity;
pub mod slots;
pub mod state;
pub(crate) mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Mount every versioned API route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(slots::available_slots)
            .service(slots::instructor_slots)
            .service(slots::instructor_history)
            .service(slots::my_bookings)
            .service(slots::my_history)
            .service(slots::my_balance)
            .service(bookings::book_slot)
            .service(bookings::cancel_slot)
            .service(bookings::change_slot)
            .service(bookings::set_exam_result)
            .service(bookings::rate_slot),
    );
}
