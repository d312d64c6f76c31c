//! Sweeper engine: chat-service IO and the retention scan.
mod client;
mod ledger;
mod preview;
mod scanner;
mod types;

pub use client::{BatchDeleter, ChatClient, ClientSettings, HistoryStream, MessageSource};
pub use ledger::{load_candidates, pending_candidates, Candidate, LedgerError, SentLedger};
pub use preview::message_preview;
pub use scanner::{CancelFlag, RetentionScanner, ScanSettings};
pub use types::{ApiError, ApiFailure, NullSink, ScanError, ScanEvent, ScanSink};
