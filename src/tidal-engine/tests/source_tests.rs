//! Source construction and run-loop tests against in-memory collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use common_config::ReadErrorPolicy;
use common_error::{TidalError, TidalResult};
use common_runtime::{CancellationHandle, CancellationToken};
use tidal_core::{Bounds, DatasetId, Duration, ResolvedBounds, Time, Window};
use tidal_engine::{
    ExecutionContext, FromDependencies, RuntimeConfig, Source, StorageSource, Transformation,
    create_from_source,
};
use tidal_plan::{BucketRef, PhysicalReadSpec};
use tidal_storage::{
    Authorizer, DatabaseInfo, MemoryManager, MemoryMetaClient, MemoryReader, Privilege, ReadSpec,
    Reader, Series, StaticAuthorizer, Table, TableStream, User,
    memory::MemoryBudget,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Process { key: String, rows: usize, reserved: usize },
    ProcessingTime,
    Watermark(i64),
    Finish(Option<String>),
}

/// Consumer that records every signal it receives.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    /// Fail the n-th `process` call, counting from one.
    fail_on_process: Option<usize>,
    processed: AtomicUsize,
}

impl Recorder {
    fn failing_on(n: usize) -> Self {
        Self {
            fail_on_process: Some(n),
            ..Self::default()
        }
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, e: Event) {
        self.events.lock().unwrap().push(e);
    }

    fn processed(&self) -> Vec<(String, usize)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Process { key, rows, .. } => Some((key, rows)),
                _ => None,
            })
            .collect()
    }

    fn finish(&self) -> Vec<Option<String>> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Finish(err) => Some(err),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transformation for Recorder {
    async fn process(&self, _id: DatasetId, table: &Table) -> TidalResult<()> {
        let n = self.processed.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_process == Some(n) {
            return Err(TidalError::execution("consumer rejected table"));
        }
        self.push(Event::Process {
            key: table.key().to_string(),
            rows: table.num_rows(),
            reserved: table.reserved_bytes(),
        });
        Ok(())
    }

    async fn update_processing_time(&self, _id: DatasetId, _now: Time) -> TidalResult<()> {
        self.push(Event::ProcessingTime);
        Ok(())
    }

    async fn update_watermark(&self, _id: DatasetId, mark: Time) -> TidalResult<()> {
        self.push(Event::Watermark(mark.nanos()));
        Ok(())
    }

    async fn finish(&self, _id: DatasetId, err: Option<&TidalError>) {
        self.push(Event::Finish(err.map(ToString::to_string)));
    }
}

/// Reader whose every call fails.
struct FailingReader;

#[async_trait]
impl Reader for FailingReader {
    async fn read(
        &self,
        _cancel: &CancellationToken,
        _spec: &ReadSpec,
        _start: Time,
        _stop: Time,
        _alloc: Arc<dyn MemoryManager>,
    ) -> TidalResult<TableStream> {
        Err(TidalError::storage("connection reset"))
    }
}

/// Authorizer counting how often it is asked.
struct CountingAuthorizer {
    inner: StaticAuthorizer,
    calls: AtomicUsize,
}

impl Authorizer for CountingAuthorizer {
    fn authorize_database(&self, user: &User, privilege: Privilege, database: &str) -> TidalResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.authorize_database(user, privilege, database)
    }
}

fn catalog() -> Arc<MemoryMetaClient> {
    Arc::new(
        MemoryMetaClient::new()
            .with_database(DatabaseInfo::new("mydb", ["autogen"]))
            .with_database(DatabaseInfo::new("otherdb", ["rp0", "autogen"])),
    )
}

fn reader() -> Arc<MemoryReader> {
    Arc::new(
        MemoryReader::new()
            .with_series(
                "mydb",
                "autogen",
                Series::new([("host", "a")]).with_points([(10, 1.0), (20, 2.0), (60, 3.0)]),
            )
            .with_series(
                "mydb",
                "autogen",
                Series::new([("host", "b")]).with_points([(30, 4.0)]),
            ),
    )
}

fn read_of(bucket: &str) -> PhysicalReadSpec {
    let mut spec = PhysicalReadSpec::new(BucketRef::Name(bucket.into()));
    spec.bounds = Bounds::absolute(Time::from_nanos(0), Time::from_nanos(100));
    spec.bounds_set = true;
    spec
}

fn bounds(start: i64, stop: i64) -> ResolvedBounds {
    ResolvedBounds::new(Time::from_nanos(start), Time::from_nanos(stop))
}

fn ctx() -> ExecutionContext {
    ExecutionContext::new().with_bounds(bounds(0, 100))
}

fn deps(reader: Arc<dyn Reader>) -> FromDependencies {
    FromDependencies::new(reader, catalog())
}

async fn run_with(source: &mut StorageSource, consumers: &[Arc<Recorder>]) {
    for c in consumers {
        source.add_transformation(Arc::clone(c) as Arc<dyn Transformation>);
    }
    source.run().await;
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_whole_interval_is_one_window() {
    let source = create_from_source(&read_of("mydb/autogen"), DatasetId(7), &ctx(), &deps(reader())).unwrap();
    assert_eq!(source.id(), DatasetId(7));
    assert_eq!(source.bounds(), bounds(0, 100));
    assert_eq!(source.window().every, Duration::from_nanos(100));
    assert_eq!(source.window().period, Duration::from_nanos(100));
    assert_eq!(source.window().offset, Duration::ZERO);
    assert_eq!(source.current_time(), Time::from_nanos(100));
    assert_eq!(source.read_spec().database, "mydb");
    assert_eq!(source.read_spec().retention_policy, "autogen");
}

#[test]
fn test_bounds_fall_back_to_the_read() {
    let mut spec = read_of("mydb");
    spec.bounds = Bounds::absolute(Time::from_nanos(40), Time::from_nanos(50));
    let source = create_from_source(&spec, DatasetId(1), &ExecutionContext::new(), &deps(reader())).unwrap();
    assert_eq!(source.bounds(), bounds(40, 50));

    spec.bounds_set = false;
    let err = create_from_source(&spec, DatasetId(1), &ExecutionContext::new(), &deps(reader())).unwrap_err();
    assert!(matches!(err, TidalError::ValidationError(_)));
}

#[test]
fn test_pushed_state_reaches_the_read_spec() {
    let mut spec = read_of("mydb");
    spec.limit_set = true;
    spec.points_limit = -1;
    spec.series_limit = 5;
    spec.descending_set = true;
    spec.descending = true;
    spec.grouping_set = true;
    spec.group_mode = tidal_core::GroupMode::By;
    spec.group_keys = vec!["host".into()];

    let source = create_from_source(&spec, DatasetId(1), &ctx(), &deps(reader())).unwrap();
    let rs = source.read_spec();
    assert_eq!(rs.points_limit, -1);
    assert_eq!(rs.series_limit, 5);
    assert!(rs.descending);
    assert_eq!(rs.group_mode, tidal_storage::GroupMode::By);
    assert_eq!(rs.group_keys, vec!["host".to_string()]);
    assert_eq!(rs.ram_limit, 0);
}

#[test]
fn test_auth_disabled_never_asks_the_authorizer() {
    let authorizer = Arc::new(CountingAuthorizer {
        inner: StaticAuthorizer::new(),
        calls: AtomicUsize::new(0),
    });
    let mut d = deps(reader());
    d.authorizer = Some(authorizer.clone());
    d.auth_enabled = false;

    assert!(create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx(), &d).is_ok());
    assert_eq!(authorizer.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_default_retention_policy() {
    let source = create_from_source(&read_of("otherdb"), DatasetId(1), &ctx(), &deps(reader())).unwrap();
    assert_eq!(source.read_spec().database, "otherdb");
    assert_eq!(source.read_spec().retention_policy, "rp0");
}

#[test]
fn test_authorization() {
    let authorizer = Arc::new(StaticAuthorizer::new().grant("alice", "mydb", Privilege::Read));
    let d = deps(reader()).with_authorizer(authorizer);
    let spec = read_of("mydb");

    let err = create_from_source(&spec, DatasetId(1), &ctx(), &d).unwrap_err();
    assert!(err.is_authorization(), "missing user: {err}");

    let bob = ctx().with_user(User::new("bob"));
    let err = create_from_source(&spec, DatasetId(1), &bob, &d).unwrap_err();
    assert!(err.is_authorization(), "denied: {err}");

    let alice = ctx().with_user(User::new("alice"));
    assert!(create_from_source(&spec, DatasetId(1), &alice, &d).is_ok());

    let admin = ctx().with_user(User::admin("root"));
    assert!(create_from_source(&spec, DatasetId(1), &admin, &d).is_ok());
}

#[test]
fn test_unknown_database_fails_before_authorization() {
    let d = deps(reader()).with_authorizer(Arc::new(StaticAuthorizer::new()));
    let err = create_from_source(&read_of("nodb"), DatasetId(1), &ctx(), &d).unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.is_authorization());
}

#[test]
fn test_catalog_errors() {
    let err = create_from_source(&read_of("nodb/autogen"), DatasetId(1), &ctx(), &deps(reader())).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("no database"));

    let err = create_from_source(&read_of("mydb/weekly"), DatasetId(1), &ctx(), &deps(reader())).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("invalid retention policy"));
}

#[test]
fn test_bucket_id_is_unsupported() {
    let mut spec = read_of("mydb");
    spec.bucket = BucketRef::Id("0123456789abcdef".into());
    let err = create_from_source(&spec, DatasetId(1), &ctx(), &deps(reader())).unwrap_err();
    assert!(matches!(err, TidalError::Unsupported(_)));
}

#[test]
fn test_zero_every_window_is_rejected() {
    let mut spec = read_of("mydb");
    spec.window_set = true;
    spec.window = Window::new(Duration::ZERO, Duration::from_nanos(10), Duration::ZERO);
    let err = create_from_source(&spec, DatasetId(1), &ctx(), &deps(reader())).unwrap_err();
    assert!(matches!(err, TidalError::ValidationError(_)));
}

// ============================================================================
// Run loop
// ============================================================================

#[tokio::test]
async fn test_run_delivers_tables_then_watermark_then_finish() {
    let reader = reader();
    let mut source = create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx(), &deps(reader.clone())).unwrap();
    let a = Arc::new(Recorder::default());
    let b = Arc::new(Recorder::default());
    run_with(&mut source, &[a.clone(), b.clone()]).await;

    assert_eq!(reader.windows(), vec![bounds(0, 100)]);
    for consumer in [&a, &b] {
        let events = consumer.events();
        assert_eq!(events.len(), 6);
        assert!(matches!(&events[0], Event::Process { key, rows: 3, .. } if key == "{host=a}"));
        assert_eq!(events[1], Event::ProcessingTime);
        assert!(matches!(&events[2], Event::Process { key, rows: 1, .. } if key == "{host=b}"));
        assert_eq!(events[3], Event::ProcessingTime);
        assert_eq!(events[4], Event::Watermark(100));
        assert_eq!(events[5], Event::Finish(None));
    }
    assert_eq!(source.metrics().windows, 1);
    assert_eq!(source.metrics().tables, 2);
    assert_eq!(source.metrics().rows, 4);
}

#[tokio::test]
async fn test_explicit_windows_near_the_domain_edge() {
    let start = i64::MAX - 25;
    let mut spec = read_of("mydb/autogen");
    spec.window_set = true;
    spec.window = Window::new(Duration::from_nanos(10), Duration::from_nanos(10), Duration::ZERO);
    let ctx = ExecutionContext::new().with_bounds(bounds(start, i64::MAX));

    let reader = reader();
    let mut source = create_from_source(&spec, DatasetId(1), &ctx, &deps(reader.clone())).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    assert_eq!(reader.windows(), vec![bounds(start, start + 10), bounds(start + 10, start + 20)]);
    assert_eq!(
        c.events(),
        vec![Event::Watermark(start + 10), Event::Watermark(start + 20), Event::Finish(None)]
    );
}

#[tokio::test]
async fn test_tumbling_windows_each_get_a_watermark() {
    let mut spec = read_of("mydb/autogen");
    spec.window_set = true;
    spec.window = Window::new(Duration::from_nanos(50), Duration::from_nanos(50), Duration::ZERO);

    let mut source = create_from_source(&spec, DatasetId(1), &ctx(), &deps(reader())).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    let marks: Vec<_> = c
        .events()
        .into_iter()
        .filter(|e| matches!(e, Event::Watermark(_) | Event::Process { .. }))
        .collect();
    assert!(matches!(&marks[0], Event::Process { rows: 2, .. }));
    assert!(matches!(&marks[1], Event::Process { rows: 1, .. }));
    assert_eq!(marks[2], Event::Watermark(50));
    assert!(matches!(&marks[3], Event::Process { rows: 1, .. }));
    assert_eq!(marks[4], Event::Watermark(100));
}

#[tokio::test]
async fn test_empty_bounds_finish_without_reading() {
    let reader = reader();
    let ctx = ExecutionContext::new().with_bounds(bounds(50, 20));
    let mut source = create_from_source(&read_of("mydb"), DatasetId(1), &ctx, &deps(reader.clone())).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    assert!(reader.windows().is_empty());
    assert_eq!(c.events(), vec![Event::Finish(None)]);
}

#[tokio::test]
async fn test_read_error_is_swallowed_by_default() {
    let mut source = create_from_source(&read_of("mydb"), DatasetId(1), &ctx(), &deps(Arc::new(FailingReader))).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    assert_eq!(c.events(), vec![Event::Finish(None)]);
}

#[tokio::test]
async fn test_read_error_fails_fast_when_configured() {
    let ctx = ExecutionContext::with_config(
        RuntimeConfig::default().with_read_error_policy(ReadErrorPolicy::FailFast),
    )
    .with_bounds(bounds(0, 100));
    let mut source = create_from_source(&read_of("mydb"), DatasetId(1), &ctx, &deps(Arc::new(FailingReader))).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    let finish = c.finish();
    assert_eq!(finish.len(), 1);
    assert!(finish[0].as_deref().is_some_and(|e| e.contains("connection reset")));
}

#[tokio::test]
async fn test_consumer_error_unwinds_and_finishes_everyone() {
    let mut source = create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx(), &deps(reader())).unwrap();
    let failing = Arc::new(Recorder::failing_on(1));
    let next = Arc::new(Recorder::default());
    run_with(&mut source, &[failing.clone(), next.clone()]).await;

    // The table never reaches the second consumer and no watermark is sent.
    assert!(failing.processed().is_empty());
    assert!(next.processed().is_empty());
    for c in [&failing, &next] {
        let events = c.events();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Finish(Some(e)) if e.contains("consumer rejected table")));
    }
}

#[tokio::test]
async fn test_memory_is_released_as_tables_are_consumed() {
    let memory: Arc<dyn MemoryManager> = Arc::new(MemoryBudget::unbounded());
    let ctx = ctx().with_memory(Arc::clone(&memory));
    let mut source = create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx, &deps(reader())).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    let reserved: Vec<_> = c
        .events()
        .into_iter()
        .filter_map(|e| match e {
            Event::Process { reserved, .. } => Some(reserved),
            _ => None,
        })
        .collect();
    assert_eq!(reserved.len(), 2);
    assert!(reserved.iter().all(|r| *r > 0));
    assert_eq!(memory.in_use(), 0);
    assert_eq!(memory.live_tables(), 0);
    assert_eq!(source.metrics().peak_table_bytes, reserved[0].max(reserved[1]));
}

#[tokio::test]
async fn test_table_errors_are_not_swallowed() {
    let ctx = ExecutionContext::with_config(RuntimeConfig::default().with_memory_limit(1)).with_bounds(bounds(0, 100));
    let mut source = create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx, &deps(reader())).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    assert!(c.processed().is_empty());
    let finish = c.finish();
    assert!(finish[0].as_deref().is_some_and(|e| e.contains("ResourceExhausted")));
}

#[tokio::test]
async fn test_cancellation_reaches_the_reader() {
    let (handle, token) = CancellationHandle::new();
    handle.cancel();

    let reader = reader();
    let ctx = ctx().with_cancellation(token);
    let mut source = create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx, &deps(reader.clone())).unwrap();
    let c = Arc::new(Recorder::default());
    run_with(&mut source, &[c.clone()]).await;

    // The cancelled read ends the stream quietly under the default policy.
    assert!(reader.windows().is_empty());
    assert_eq!(c.events(), vec![Event::Finish(None)]);
}

#[test]
fn test_run_blocking() {
    let mut source = create_from_source(&read_of("mydb/autogen"), DatasetId(1), &ctx(), &deps(reader())).unwrap();
    let c = Arc::new(Recorder::default());
    source.add_transformation(c.clone());
    source.run_blocking().unwrap();
    assert_eq!(c.finish(), vec![None]);
    assert_eq!(c.processed().len(), 2);
}
