//! Reader over series held in memory.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use log::trace;

use common_error::{TidalError, TidalResult};
use common_runtime::CancellationToken;
use tidal_core::{ResolvedBounds, Time};

use super::eval::{PointEvaluator, PointRow};
use super::manager::{MemoryManager, TableReservation};
use crate::read_spec::{GroupMode, ReadSpec};
use crate::reader::Reader;
use crate::stream::{TableStream, iter_stream};
use crate::table::{GroupKey, Table, estimate_size};

/// One series: a tag set and its points in time order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    pub tags: BTreeMap<String, String>,
    pub points: Vec<(Time, f64)>,
}

impl Series {
    /// A series with the given tags and no points.
    pub fn new<I, K, V>(tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            points: Vec::new(),
        }
    }

    /// Add points given as `(nanos, value)`; points are kept sorted by time.
    #[must_use]
    pub fn with_points(mut self, points: impl IntoIterator<Item = (i64, f64)>) -> Self {
        self.points
            .extend(points.into_iter().map(|(t, v)| (Time::from_nanos(t), v)));
        self.points.sort_by_key(|(t, _)| *t);
        self
    }
}

/// Points of one output table before it is materialized.
struct PendingTable {
    key: GroupKey,
    points: Vec<(Time, f64)>,
}

/// [`Reader`] over series kept in memory, keyed by database and
/// retention policy.
///
/// Honors pushed-down predicates, points and series limits, descending
/// order and every grouping mode. Aggregates and regular expressions are
/// rejected. Each table reserves its memory when it is pulled from the
/// stream.
#[derive(Debug, Default)]
pub struct MemoryReader {
    data: HashMap<(String, String), Vec<Series>>,
    windows: Mutex<Vec<ResolvedBounds>>,
    closed: AtomicBool,
}

impl MemoryReader {
    /// Create an empty reader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a series to `database` / `retention_policy`.
    #[must_use]
    pub fn with_series(
        mut self,
        database: impl Into<String>,
        retention_policy: impl Into<String>,
        series: Series,
    ) -> Self {
        self.data
            .entry((database.into(), retention_policy.into()))
            .or_default()
            .push(series);
        self
    }

    /// Windows requested so far, in call order.
    pub fn windows(&self) -> Vec<ResolvedBounds> {
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether [`Reader::close`] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn select(&self, spec: &ReadSpec, bounds: ResolvedBounds) -> TidalResult<Vec<Series>> {
        let Some(all) = self
            .data
            .get(&(spec.database.clone(), spec.retention_policy.clone()))
        else {
            return Ok(Vec::new());
        };
        let evaluator = spec.predicate.as_ref().map(PointEvaluator::new).transpose()?;

        let mut selected = Vec::new();
        for series in all {
            let mut points = Vec::new();
            for &(t, value) in &series.points {
                if !bounds.contains(t) {
                    continue;
                }
                if let Some(eval) = &evaluator {
                    if !eval.matches(PointRow {
                        tags: &series.tags,
                        value,
                    })? {
                        continue;
                    }
                }
                points.push((t, value));
            }
            if !points.is_empty() {
                selected.push(Series {
                    tags: series.tags.clone(),
                    points,
                });
            }
        }

        // Series are produced in series-key order.
        selected.sort_by(|a, b| a.tags.cmp(&b.tags));

        let offset = usize::try_from(spec.series_offset).unwrap_or(0);
        let limit = usize::try_from(spec.series_limit)
            .ok()
            .filter(|l| *l > 0)
            .unwrap_or(usize::MAX);
        Ok(selected.into_iter().skip(offset).take(limit).collect())
    }
}

fn order_and_limit(points: &mut Vec<(Time, f64)>, spec: &ReadSpec) {
    if spec.descending {
        points.reverse();
    }
    match spec.points_limit {
        limit if limit < 0 => points.truncate(1),
        0 => {}
        limit => points.truncate(usize::try_from(limit).unwrap_or(usize::MAX)),
    }
}

fn group_key(series: &Series, spec: &ReadSpec) -> GroupKey {
    let columns = match spec.group_mode {
        GroupMode::Default | GroupMode::All => series
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
        GroupMode::None => Vec::new(),
        GroupMode::By => spec
            .group_keys
            .iter()
            .map(|k| (k.clone(), series.tags.get(k).cloned().unwrap_or_default()))
            .collect(),
        GroupMode::Except => series
            .tags
            .iter()
            .filter(|(k, _)| !spec.group_keys.contains(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };
    GroupKey::new(columns)
}

fn group(series: Vec<Series>, spec: &ReadSpec) -> Vec<PendingTable> {
    let mut groups: BTreeMap<GroupKey, Vec<(Time, f64)>> = BTreeMap::new();
    for mut s in series {
        order_and_limit(&mut s.points, spec);
        groups.entry(group_key(&s, spec)).or_default().extend(s.points);
    }

    groups
        .into_iter()
        .map(|(key, mut points)| {
            // Merged series interleave by time within the table.
            if spec.descending {
                points.sort_by(|a, b| b.0.cmp(&a.0));
            } else {
                points.sort_by_key(|p| p.0);
            }
            PendingTable { key, points }
        })
        .collect()
}

fn materialize(
    pending: PendingTable,
    bounds: ResolvedBounds,
    cancel: &CancellationToken,
    alloc: &Arc<dyn MemoryManager>,
) -> TidalResult<Table> {
    cancel.check("storage read")?;
    let bytes = estimate_size(&pending.key, pending.points.len());
    let reservation = TableReservation::acquire(alloc, bytes)?;
    let (times, values) = pending
        .points
        .into_iter()
        .map(|(t, v)| (t.nanos(), v))
        .unzip();
    Ok(Table::try_new(pending.key, bounds, times, values)?.with_reservation(reservation))
}

#[async_trait]
impl Reader for MemoryReader {
    async fn read(
        &self,
        cancel: &CancellationToken,
        spec: &ReadSpec,
        start: Time,
        stop: Time,
        alloc: Arc<dyn MemoryManager>,
    ) -> TidalResult<TableStream> {
        if self.is_closed() {
            return Err(TidalError::storage("reader is closed"));
        }
        cancel.check("storage read")?;
        if !spec.aggregate_method.is_empty() {
            return Err(TidalError::storage(format!(
                "aggregate {} is not supported by the in-memory reader",
                spec.aggregate_method
            )));
        }

        let bounds = ResolvedBounds::new(start, stop);
        self.windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(bounds);

        let tables = group(self.select(spec, bounds)?, spec);
        trace!(
            "memory read {}/{} [{start}, {stop}): {} tables",
            spec.database,
            spec.retention_policy,
            tables.len()
        );

        let cancel = cancel.clone();
        Ok(iter_stream(
            tables
                .into_iter()
                .map(move |pending| materialize(pending, bounds, &cancel, &alloc)),
        ))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryBudget, UnboundedMemory};
    use futures::StreamExt;
    use tidal_plan::FunctionExpr;
    use tidal_plan::expr::{lit, member, regex};

    fn reader() -> MemoryReader {
        MemoryReader::new()
            .with_series(
                "db",
                "rp",
                Series::new([("host", "a"), ("region", "east")]).with_points([(10, 1.0), (20, 2.0), (30, 3.0)]),
            )
            .with_series(
                "db",
                "rp",
                Series::new([("host", "b"), ("region", "east")]).with_points([(15, 4.0), (25, 5.0)]),
            )
            .with_series(
                "db",
                "rp",
                Series::new([("host", "c"), ("region", "west")]).with_points([(5, 6.0)]),
            )
    }

    async fn collect(spec: &ReadSpec, start: i64, stop: i64) -> Vec<Table> {
        let stream = reader()
            .read(
                &CancellationToken::never(),
                spec,
                Time::from_nanos(start),
                Time::from_nanos(stop),
                Arc::new(UnboundedMemory),
            )
            .await
            .unwrap();
        stream
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<TidalResult<Vec<_>>>()
            .unwrap()
    }

    #[tokio::test]
    async fn test_one_table_per_series_in_window() {
        let tables = collect(&ReadSpec::new("db", "rp"), 10, 30).await;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].key().value("host"), Some("a"));
        assert_eq!(tables[0].times(), vec![10, 20]);
        assert_eq!(tables[1].times(), vec![15, 25]);
    }

    #[tokio::test]
    async fn test_predicate_and_limits() {
        let mut spec = ReadSpec::new("db", "rp");
        spec.predicate = Some(FunctionExpr::predicate(
            "r",
            member("r", "region").equals(lit("east")),
        ));
        spec.points_limit = -1;
        spec.descending = true;
        let tables = collect(&spec, 0, 100).await;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].times(), vec![30]);
        assert_eq!(tables[1].times(), vec![25]);

        let mut spec = ReadSpec::new("db", "rp");
        spec.series_offset = 1;
        spec.series_limit = 1;
        let tables = collect(&spec, 0, 100).await;
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].key().value("host"), Some("b"));
    }

    #[tokio::test]
    async fn test_regex_predicates() {
        let hosts = |tables: &[Table]| -> Vec<String> {
            tables
                .iter()
                .filter_map(|t| t.key().value("host").map(str::to_string))
                .collect()
        };

        let mut spec = ReadSpec::new("db", "rp");
        spec.predicate = Some(FunctionExpr::predicate(
            "r",
            member("r", "host").regex_match(regex("^[ab]$")),
        ));
        assert_eq!(hosts(&collect(&spec, 0, 100).await), vec!["a", "b"]);

        spec.predicate = Some(FunctionExpr::predicate(
            "r",
            member("r", "region").not_regex_match(regex("^ea")),
        ));
        assert_eq!(hosts(&collect(&spec, 0, 100).await), vec!["c"]);
    }

    #[tokio::test]
    async fn test_invalid_regex_fails_the_read() {
        let mut spec = ReadSpec::new("db", "rp");
        spec.predicate = Some(FunctionExpr::predicate(
            "r",
            member("r", "host").regex_match(regex("[")),
        ));
        let result = reader()
            .read(
                &CancellationToken::never(),
                &spec,
                Time::from_nanos(0),
                Time::from_nanos(100),
                Arc::new(UnboundedMemory),
            )
            .await;
        assert!(matches!(result, Err(TidalError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_grouping_modes() {
        let mut spec = ReadSpec::new("db", "rp");
        spec.group_mode = GroupMode::By;
        spec.group_keys = vec!["region".into()];
        let tables = collect(&spec, 0, 100).await;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].key().columns(), &[("region".to_string(), "east".to_string())]);
        assert_eq!(tables[0].times(), vec![10, 15, 20, 25, 30]);

        spec.group_mode = GroupMode::Except;
        spec.group_keys = vec!["host".into()];
        assert_eq!(collect(&spec, 0, 100).await.len(), 2);

        spec.group_mode = GroupMode::None;
        let tables = collect(&spec, 0, 100).await;
        assert_eq!(tables.len(), 1);
        assert!(tables[0].key().is_empty());
        assert_eq!(tables[0].num_rows(), 6);
    }

    #[tokio::test]
    async fn test_memory_is_reserved_per_table() {
        let alloc: Arc<dyn MemoryManager> = Arc::new(MemoryBudget::unbounded());
        let reader = reader();
        let mut stream = reader
            .read(
                &CancellationToken::never(),
                &ReadSpec::new("db", "rp"),
                Time::from_nanos(0),
                Time::from_nanos(100),
                Arc::clone(&alloc),
            )
            .await
            .unwrap();

        // Nothing is held before the first table is pulled.
        assert_eq!(alloc.in_use(), 0);
        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(alloc.in_use(), first.reserved_bytes());
        assert_eq!(alloc.live_tables(), 1);
        drop(first);
        assert_eq!(alloc.in_use(), 0);
    }

    #[tokio::test]
    async fn test_memory_limit_fails_table() {
        let alloc: Arc<dyn MemoryManager> = Arc::new(MemoryBudget::new(1));
        let reader = reader();
        let mut stream = reader
            .read(
                &CancellationToken::never(),
                &ReadSpec::new("db", "rp"),
                Time::from_nanos(0),
                Time::from_nanos(100),
                alloc,
            )
            .await
            .unwrap();
        assert!(stream.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_cancelled_and_closed_reads_fail() {
        let (handle, token) = common_runtime::CancellationHandle::new();
        handle.cancel();
        let reader = reader();
        let spec = ReadSpec::new("db", "rp");
        let alloc: Arc<dyn MemoryManager> = Arc::new(UnboundedMemory);
        let result = reader
            .read(&token, &spec, Time::ZERO, Time::from_nanos(10), Arc::clone(&alloc))
            .await;
        assert!(result.is_err());

        reader.close();
        assert!(reader.is_closed());
        let result = reader
            .read(&CancellationToken::never(), &spec, Time::ZERO, Time::from_nanos(10), alloc)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_records_windows() {
        let reader = reader();
        let spec = ReadSpec::new("unknown", "rp");
        let stream = reader
            .read(
                &CancellationToken::never(),
                &spec,
                Time::ZERO,
                Time::from_nanos(10),
                Arc::new(UnboundedMemory),
            )
            .await
            .unwrap();
        assert_eq!(stream.count().await, 0);
        assert_eq!(
            reader.windows(),
            vec![ResolvedBounds::new(Time::ZERO, Time::from_nanos(10))]
        );
    }
}
