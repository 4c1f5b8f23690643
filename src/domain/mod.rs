//! Core domain for the scheduling and booking engine.
//!
//! The domain is transport-agnostic: services depend on the ports in
//! [`ports`] and on injected clock/randomness, never on actix or any
//! concrete store. Inbound adapters translate HTTP into service calls;
//! outbound adapters implement the ports.

pub mod auth;
mod availability_scheduler;
mod balance_service;
mod booking_service;
mod error;
mod lifecycle_reconciler;
pub mod ports;
mod slot;
mod slot_generator;
mod week;

pub use auth::{Caller, ParseRoleError, Role};
pub use availability_scheduler::{AvailabilityScheduler, GenerationOutcome};
pub use balance_service::BalanceService;
pub use booking_service::{BookingService, CancelOutcome, ChangeOutcome};
pub use error::{Error, ErrorCode};
pub use lifecycle_reconciler::{
    LifecycleReconciler, ReconcileOutcome, ReconcilerConfig, Sleeper, TokioSleeper,
};
pub use slot::{
    ExamResult, ParseExamResultError, ParseSlotKindError, RATING_MAX, RATING_MIN, Slot, SlotKind,
    SlotStatus,
};
pub use slot_generator::{ScheduleConfig, generate_slots};
pub use week::{WeekBounds, week_bounds};
