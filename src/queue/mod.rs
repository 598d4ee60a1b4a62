//! Task intake, the bounded queue and the role-matching dispatcher

pub mod coordinator;
pub mod dead_letter;
pub mod dispatcher;
pub mod inflight;

pub use coordinator::{Coordinator, CoordinatorOptions};
pub use dead_letter::{DeadLetter, DeadLetters, UnroutableReason};
pub use dispatcher::{DispatchOutcome, RoundRobinDispatcher};
pub use inflight::InFlight;
