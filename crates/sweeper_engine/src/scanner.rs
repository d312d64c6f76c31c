//! The retention scan: classify each message, accumulate a bounded deletion
//! batch, flush in bulk, pace between flushes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sweeper_core::{
    classify, ContainerId, DayBoundary, DeletionBatch, Outcome, ScanStats, DEFAULT_BATCH_CAPACITY,
};

use crate::client::{BatchDeleter, MessageSource};
use crate::preview::message_preview;
use crate::{ScanError, ScanEvent, ScanSink};

/// Tuning knobs for one scan.
#[derive(Debug, Clone)]
pub struct ScanSettings {
    /// Cap on identifiers per bulk-delete call.
    pub batch_size: usize,
    /// Pause after each successful full-batch flush. Backpressure against
    /// the source's rate limiter, not a correctness requirement.
    pub flush_pause: Duration,
    /// Classify and count, but issue no delete calls.
    pub dry_run: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_CAPACITY,
            flush_pause: Duration::from_secs(1),
            dry_run: false,
        }
    }
}

/// Shared cancellation flag, typically set from a Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives one destructive pass over a container's history.
///
/// At most one bulk-delete request is outstanding at a time; the batch
/// buffer and the statistics are owned exclusively by the scan.
pub struct RetentionScanner<'a, S, D> {
    source: S,
    deleter: &'a D,
    sink: &'a dyn ScanSink,
    settings: ScanSettings,
    cancel: CancelFlag,
}

impl<'a, S, D> RetentionScanner<'a, S, D>
where
    S: MessageSource,
    D: BatchDeleter,
{
    pub fn new(source: S, deleter: &'a D, sink: &'a dyn ScanSink, settings: ScanSettings) -> Self {
        Self {
            source,
            deleter,
            sink,
            settings,
            cancel: CancelFlag::new(),
        }
    }

    /// Replace the default (never-set) cancellation flag with a shared one.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run the scan and return the final statistics.
    ///
    /// `confirmed` is the safety gate: without an explicit affirmative the
    /// scanner refuses to start a destructive pass. Cancellation is honored
    /// between messages; a flush already issued always completes and is
    /// recorded before the scan returns. The pending partial batch is not
    /// flushed on cancellation; classification is a pure function of each
    /// message and the boundary, so an immediate rerun picks those messages
    /// up again safely.
    pub async fn run(
        self,
        container: ContainerId,
        boundary: &DayBoundary,
        confirmed: bool,
    ) -> Result<ScanStats, ScanError> {
        if !confirmed {
            return Err(ScanError::ConfirmationRequired);
        }

        let Self {
            mut source,
            deleter,
            sink,
            settings,
            cancel,
        } = self;

        let mut stats = ScanStats::new();
        let mut batch = DeletionBatch::new(settings.batch_size);
        sink.emit(ScanEvent::Started {
            container,
            today: boundary.today(),
        });

        'scan: while let Some(page) = source.next_page().await? {
            for message in page {
                if cancel.is_cancelled() {
                    sink.emit(ScanEvent::Cancelled);
                    break 'scan;
                }

                stats.checked += 1;
                match classify(&message, boundary) {
                    Outcome::KeepMedia => stats.kept_media += 1,
                    Outcome::KeepToday => stats.kept_today += 1,
                    Outcome::KeepOther => stats.kept_other += 1,
                    Outcome::Delete => {
                        sink.emit(ScanEvent::MessageQueued {
                            id: message.id,
                            date: message.date,
                            preview: message_preview(message.text.as_deref().unwrap_or_default()),
                        });
                        batch.push(message.id);
                        if batch.is_full() {
                            let flushed =
                                flush(deleter, sink, &settings, container, &mut batch, &mut stats)
                                    .await;
                            if flushed && !settings.flush_pause.is_zero() {
                                tokio::time::sleep(settings.flush_pause).await;
                            }
                        }
                    }
                }
            }
        }

        // Whatever is left under the cap goes out in one final call.
        if !batch.is_empty() && !cancel.is_cancelled() {
            flush(deleter, sink, &settings, container, &mut batch, &mut stats).await;
        }

        sink.emit(ScanEvent::Finished { stats });
        Ok(stats)
    }
}

/// Issue one bulk-delete for the whole batch. Returns whether the flush
/// succeeded (a dry run counts as success). A failed call credits the entire
/// batch to the error counter; there is no retry within this run.
async fn flush<D: BatchDeleter>(
    deleter: &D,
    sink: &dyn ScanSink,
    settings: &ScanSettings,
    container: ContainerId,
    batch: &mut DeletionBatch,
    stats: &mut ScanStats,
) -> bool {
    let ids = batch.take();
    let len = ids.len();

    if settings.dry_run {
        stats.deleted += len as u64;
        sink.emit(ScanEvent::BatchFlushed { len, dry_run: true });
        return true;
    }

    match deleter.delete_batch(container, &ids).await {
        Ok(()) => {
            stats.deleted += len as u64;
            log::info!("deleted batch of {len} messages");
            sink.emit(ScanEvent::BatchFlushed {
                len,
                dry_run: false,
            });
            true
        }
        Err(err) => {
            stats.errors += len as u64;
            log::warn!("bulk delete of {len} messages failed: {err}");
            sink.emit(ScanEvent::BatchFailed {
                len,
                error: err.to_string(),
            });
            false
        }
    }
}
