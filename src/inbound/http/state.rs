//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` so they depend
//! only on domain services and ports, not on concrete adapters.

use std::sync::Arc;

use crate::domain::ports::SlotRepository;
use crate::domain::{BalanceService, BookingService};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub booking: Arc<BookingService>,
    pub balance: Arc<BalanceService>,
    pub slots: Arc<dyn SlotRepository>,
}

impl HttpState {
    pub fn new(
        booking: Arc<BookingService>,
        balance: Arc<BalanceService>,
        slots: Arc<dyn SlotRepository>,
    ) -> Self {
        Self {
            booking,
            balance,
            slots,
        }
    }
}
