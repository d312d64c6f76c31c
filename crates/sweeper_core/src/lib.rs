//! Sweeper core: pure retention-policy domain types and classification.
mod batch;
mod boundary;
mod classify;
mod message;
mod stats;

pub use batch::{DeletionBatch, DEFAULT_BATCH_CAPACITY};
pub use boundary::DayBoundary;
pub use classify::{classify, Outcome};
pub use message::{ContainerId, ContainerInfo, ContainerKind, MediaKind, Message, MessageId};
pub use stats::ScanStats;
