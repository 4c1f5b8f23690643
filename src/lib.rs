//! Scheduling and booking engine for a driving-school platform.
//!
//! The crate is organised hexagonally:
//! - [`domain`] holds the services, the slot state machine and the ports;
//! - [`inbound`] adapts HTTP requests onto domain calls;
//! - [`outbound`] implements the ports (in-memory stores, notifier);
//! - [`server`] wires configuration and the periodic jobs.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod server;
