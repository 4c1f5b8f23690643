//! Domain ports defining the edges of the hexagon.
//!
//! Ports describe how the domain interacts with driven adapters (the slot
//! store, the credit ledger, the identity directory, the notification
//! gateway). Each trait exposes strongly typed errors so adapters map
//! their failures into predictable variants.

mod balance_repository;
mod instructor_directory;
mod notifier;
mod slot_repository;

#[cfg(test)]
pub use balance_repository::MockBalanceRepository;
pub use balance_repository::{
    BalanceRepository, BalanceRepositoryError, CreditBalance, CreditKind, DebitOutcome,
};
#[cfg(test)]
pub use instructor_directory::MockInstructorDirectory;
pub use instructor_directory::{InstructorDirectory, InstructorDirectoryError};
#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{Notifier, NotifierError, PushNote};
#[cfg(test)]
pub use slot_repository::MockSlotRepository;
pub use slot_repository::{SlotRepository, SlotRepositoryError};
