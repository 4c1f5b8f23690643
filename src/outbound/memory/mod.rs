//! In-memory adapters backed by `tokio::sync::Mutex` maps.
//!
//! Every conditional operation performs its precondition check and write
//! under a single lock acquisition, which is what makes the repository
//! CAS contracts hold.

mod directory;
mod ledger;
mod slot_store;

pub use directory::InMemoryInstructorDirectory;
pub use ledger::InMemoryCreditLedger;
pub use slot_store::InMemorySlotStore;
