use std::collections::VecDeque;
use std::sync::{Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use sweeper_core::{ContainerId, DayBoundary, MediaKind, Message, MessageId};
use sweeper_engine::{
    ApiError, ApiFailure, BatchDeleter, CancelFlag, MessageSource, NullSink, RetentionScanner,
    ScanError, ScanEvent, ScanSink, ScanSettings,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sweeper_logging::initialize_for_tests);
}

const CONTAINER: ContainerId = ContainerId(-100123);

fn boundary() -> DayBoundary {
    DayBoundary::utc(chrono::NaiveDate::from_ymd_opt(2026, 8, 7).unwrap())
}

fn old_text(id: i64) -> Message {
    Message {
        id: MessageId(id),
        date: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        text: Some(format!("message {id}")),
        media: None,
    }
}

fn todays_text(id: i64) -> Message {
    Message {
        id: MessageId(id),
        date: Utc.with_ymd_and_hms(2026, 8, 7, 10, 0, 0).unwrap(),
        text: Some("fresh".to_string()),
        media: None,
    }
}

fn old_media(id: i64, kind: MediaKind) -> Message {
    Message {
        id: MessageId(id),
        date: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        text: Some("caption".to_string()),
        media: Some(kind),
    }
}

fn bare(id: i64) -> Message {
    Message {
        id: MessageId(id),
        date: Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap(),
        text: None,
        media: None,
    }
}

fn fast_settings() -> ScanSettings {
    ScanSettings {
        flush_pause: Duration::ZERO,
        ..ScanSettings::default()
    }
}

struct FakeSource {
    pages: VecDeque<Vec<Message>>,
    requests: usize,
    fail_on_request: Option<usize>,
    cancel_on_request: Option<(usize, CancelFlag)>,
}

impl FakeSource {
    fn new(pages: Vec<Vec<Message>>) -> Self {
        Self {
            pages: pages.into(),
            requests: 0,
            fail_on_request: None,
            cancel_on_request: None,
        }
    }

    fn single(messages: Vec<Message>) -> Self {
        Self::new(vec![messages])
    }
}

#[async_trait]
impl MessageSource for FakeSource {
    async fn next_page(&mut self) -> Result<Option<Vec<Message>>, ApiError> {
        let request = self.requests;
        self.requests += 1;
        if self.fail_on_request == Some(request) {
            return Err(ApiError::new(ApiFailure::Network, "connection reset"));
        }
        if let Some((at, cancel)) = &self.cancel_on_request {
            if *at == request {
                cancel.cancel();
            }
        }
        Ok(self.pages.pop_front())
    }
}

#[derive(Default)]
struct RecordingDeleter {
    calls: Mutex<Vec<Vec<MessageId>>>,
    fail_call: Option<usize>,
}

impl RecordingDeleter {
    fn failing_on(call: usize) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_call: Some(call),
        }
    }

    fn call_lens(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(Vec::len).collect()
    }

    fn all_ids(&self) -> Vec<MessageId> {
        self.calls.lock().unwrap().iter().flatten().copied().collect()
    }
}

#[async_trait]
impl BatchDeleter for RecordingDeleter {
    async fn delete_batch(
        &self,
        _container: ContainerId,
        ids: &[MessageId],
    ) -> Result<(), ApiError> {
        let mut calls = self.calls.lock().unwrap();
        let index = calls.len();
        calls.push(ids.to_vec());
        if self.fail_call == Some(index) {
            return Err(ApiError::new(
                ApiFailure::HttpStatus(500),
                "internal server error",
            ));
        }
        Ok(())
    }
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<ScanEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<ScanEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl ScanSink for TestSink {
    fn emit(&self, event: ScanEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[tokio::test]
async fn eligible_messages_flush_in_capped_batches() {
    init_logging();
    let messages: Vec<Message> = (1..=250).map(old_text).collect();
    // Page size deliberately differs from the batch cap.
    let pages = messages.chunks(80).map(<[Message]>::to_vec).collect();
    let source = FakeSource::new(pages);
    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();

    let stats = RetentionScanner::new(source, &deleter, &sink, fast_settings())
        .run(CONTAINER, &boundary(), true)
        .await
        .expect("scan ok");

    assert_eq!(deleter.call_lens(), vec![100, 100, 50]);
    assert_eq!(stats.checked, 250);
    assert_eq!(stats.deleted, 250);
    assert_eq!(stats.errors, 0);
    assert!(stats.is_balanced());

    let events = sink.take();
    assert!(matches!(events.first(), Some(ScanEvent::Started { .. })));
    assert!(matches!(events.last(), Some(ScanEvent::Finished { .. })));
}

#[tokio::test]
async fn media_and_today_are_never_deleted() {
    init_logging();
    let source = FakeSource::single(vec![
        old_media(1, MediaKind::Photo),
        todays_text(2),
        old_text(3),
        bare(4),
        old_media(5, MediaKind::VideoNote),
    ]);
    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();

    let stats = RetentionScanner::new(source, &deleter, &sink, fast_settings())
        .run(CONTAINER, &boundary(), true)
        .await
        .expect("scan ok");

    assert_eq!(deleter.all_ids(), vec![MessageId(3)]);
    assert_eq!(stats.checked, 5);
    assert_eq!(stats.deleted, 1);
    assert_eq!(stats.kept_media, 2);
    assert_eq!(stats.kept_today, 1);
    assert_eq!(stats.kept_other, 1);
    assert!(stats.is_balanced());
}

#[tokio::test]
async fn failed_batch_is_counted_and_scan_continues() {
    init_logging();
    let source = FakeSource::single((1..=74).map(old_text).collect());
    let deleter = RecordingDeleter::failing_on(0);
    let sink = TestSink::default();
    let settings = ScanSettings {
        batch_size: 37,
        ..fast_settings()
    };

    let stats = RetentionScanner::new(source, &deleter, &sink, settings)
        .run(CONTAINER, &boundary(), true)
        .await
        .expect("scan ok");

    assert_eq!(deleter.call_lens(), vec![37, 37]);
    assert_eq!(stats.errors, 37);
    assert_eq!(stats.deleted, 37);
    assert_eq!(stats.checked, 74);
    assert!(stats.is_balanced());

    let failures: Vec<_> = sink
        .take()
        .into_iter()
        .filter(|event| matches!(event, ScanEvent::BatchFailed { len: 37, .. }))
        .collect();
    assert_eq!(failures.len(), 1);
}

#[tokio::test]
async fn final_partial_batch_is_flushed_once() {
    init_logging();
    let mut messages: Vec<Message> = (1..=30).map(old_text).collect();
    messages.push(todays_text(31));
    let source = FakeSource::single(messages);
    let deleter = RecordingDeleter::default();

    let stats = RetentionScanner::new(source, &deleter, &NullSink, fast_settings())
        .run(CONTAINER, &boundary(), true)
        .await
        .expect("scan ok");

    assert_eq!(deleter.call_lens(), vec![30]);
    assert_eq!(stats.deleted, 30);
}

#[tokio::test]
async fn rerun_after_successful_sweep_deletes_nothing() {
    init_logging();
    let mut history: Vec<Message> = (1..=120).map(old_text).collect();
    history.push(old_media(121, MediaKind::Document));
    history.push(todays_text(122));
    history.push(bare(123));

    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();
    let first = RetentionScanner::new(
        FakeSource::single(history.clone()),
        &deleter,
        &sink,
        fast_settings(),
    )
    .run(CONTAINER, &boundary(), true)
    .await
    .expect("first scan ok");
    assert_eq!(first.deleted, 120);

    let removed = deleter.all_ids();
    let survivors: Vec<Message> = history
        .into_iter()
        .filter(|message| !removed.contains(&message.id))
        .collect();

    let second_deleter = RecordingDeleter::default();
    let second = RetentionScanner::new(
        FakeSource::single(survivors),
        &second_deleter,
        &sink,
        fast_settings(),
    )
    .run(CONTAINER, &boundary(), true)
    .await
    .expect("second scan ok");

    assert_eq!(second.deleted, 0);
    assert!(second_deleter.call_lens().is_empty());
    assert_eq!(second.checked, 3);
    assert!(second.is_balanced());
}

#[tokio::test]
async fn unconfirmed_scan_refuses_to_run() {
    init_logging();
    let source = FakeSource::single((1..=5).map(old_text).collect());
    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();

    let err = RetentionScanner::new(source, &deleter, &sink, fast_settings())
        .run(CONTAINER, &boundary(), false)
        .await
        .expect_err("must refuse");

    assert!(matches!(err, ScanError::ConfirmationRequired));
    assert!(deleter.call_lens().is_empty());
    assert!(sink.take().is_empty());
}

#[tokio::test]
async fn dry_run_issues_no_delete_calls() {
    init_logging();
    let source = FakeSource::single((1..=42).map(old_text).collect());
    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();
    let settings = ScanSettings {
        dry_run: true,
        ..fast_settings()
    };

    let stats = RetentionScanner::new(source, &deleter, &sink, settings)
        .run(CONTAINER, &boundary(), true)
        .await
        .expect("scan ok");

    assert!(deleter.call_lens().is_empty());
    assert_eq!(stats.deleted, 42);
    assert!(sink
        .take()
        .iter()
        .any(|event| matches!(event, ScanEvent::BatchFlushed { len: 42, dry_run: true })));
}

#[tokio::test]
async fn cancellation_drops_pending_partial_batch() {
    init_logging();
    let cancel = CancelFlag::new();
    let mut source = FakeSource::new(vec![
        (1..=10).map(old_text).collect(),
        (11..=15).map(old_text).collect(),
    ]);
    // Cancellation lands between the first and second page, while ten
    // eligible messages sit in a partial batch.
    source.cancel_on_request = Some((1, cancel.clone()));
    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();

    let stats = RetentionScanner::new(source, &deleter, &sink, fast_settings())
        .with_cancel_flag(cancel)
        .run(CONTAINER, &boundary(), true)
        .await
        .expect("scan ok");

    assert!(deleter.call_lens().is_empty());
    assert_eq!(stats.checked, 10);
    assert_eq!(stats.deleted, 0);
    assert!(sink
        .take()
        .iter()
        .any(|event| matches!(event, ScanEvent::Cancelled)));
}

#[tokio::test]
async fn completed_flushes_are_recorded_before_a_source_failure_aborts() {
    init_logging();
    let mut source = FakeSource::new(vec![(1..=3).map(old_text).collect()]);
    source.fail_on_request = Some(1);
    let deleter = RecordingDeleter::default();
    let sink = TestSink::default();
    let settings = ScanSettings {
        batch_size: 2,
        ..fast_settings()
    };

    let err = RetentionScanner::new(source, &deleter, &sink, settings)
        .run(CONTAINER, &boundary(), true)
        .await
        .expect_err("source failure must abort");

    assert!(matches!(err, ScanError::Source(_)));
    assert_eq!(deleter.call_lens(), vec![2]);
}
