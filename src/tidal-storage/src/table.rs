//! Tables produced by storage reads.
//!
//! Every table holds the points of one group over one window. Its batch has
//! the columns `_start`, `_stop`, `_time` and `_value` followed by one string
//! column per key column, in key order.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, TimestampNanosecondArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;

use common_error::TidalResult;
use tidal_core::ResolvedBounds;
use tidal_core::labels::{DEFAULT_START_COL, DEFAULT_STOP_COL, DEFAULT_TIME_COL, DEFAULT_VALUE_COL};

use crate::memory::TableReservation;

/// Ordered key columns and values shared by every row of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    columns: Vec<(String, String)>,
}

impl GroupKey {
    /// Create a key; columns keep the given order.
    pub fn new(columns: Vec<(String, String)>) -> Self {
        Self { columns }
    }

    /// Key columns and their values.
    pub fn columns(&self) -> &[(String, String)] {
        &self.columns
    }

    /// Value of a key column.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the key has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("{")?;
        for (i, (c, v)) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{c}={v}")?;
        }
        f.write_str("}")
    }
}

/// One group of points over one window.
#[derive(Debug)]
pub struct Table {
    key: GroupKey,
    bounds: ResolvedBounds,
    batch: RecordBatch,
    /// Memory held for the batch, released when the table is dropped.
    reservation: Option<TableReservation>,
}

impl Table {
    /// Build a table from point columns.
    pub fn try_new(
        key: GroupKey,
        bounds: ResolvedBounds,
        times: Vec<i64>,
        values: Vec<f64>,
    ) -> TidalResult<Self> {
        let rows = times.len();
        let schema = table_schema(&key);

        let mut columns: Vec<ArrayRef> = vec![
            Arc::new(TimestampNanosecondArray::from(vec![bounds.start.nanos(); rows])),
            Arc::new(TimestampNanosecondArray::from(vec![bounds.stop.nanos(); rows])),
            Arc::new(TimestampNanosecondArray::from(times)),
            Arc::new(Float64Array::from(values)),
        ];
        for (_, value) in key.columns() {
            columns.push(Arc::new(StringArray::from(vec![value.as_str(); rows])));
        }

        let batch = RecordBatch::try_new(schema, columns)?;
        Ok(Self {
            key,
            bounds,
            batch,
            reservation: None,
        })
    }

    /// Attach a memory reservation released with the table.
    #[must_use]
    pub fn with_reservation(mut self, reservation: TableReservation) -> Self {
        self.reservation = Some(reservation);
        self
    }

    /// Group key of the table.
    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    /// Window the table covers.
    pub const fn bounds(&self) -> ResolvedBounds {
        self.bounds
    }

    /// Point data.
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Number of points.
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the table has no points.
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// Bytes reserved for this table.
    pub fn reserved_bytes(&self) -> usize {
        self.reservation.as_ref().map_or(0, TableReservation::bytes)
    }

    /// Timestamps of the points.
    pub fn times(&self) -> Vec<i64> {
        self.batch
            .column(2)
            .as_any()
            .downcast_ref::<TimestampNanosecondArray>()
            .map(|a| a.values().to_vec())
            .unwrap_or_default()
    }

    /// Values of the points.
    pub fn values(&self) -> Vec<f64> {
        self.batch
            .column(3)
            .as_any()
            .downcast_ref::<Float64Array>()
            .map(|a| a.values().to_vec())
            .unwrap_or_default()
    }
}

/// Schema of a table with the given key.
pub fn table_schema(key: &GroupKey) -> SchemaRef {
    let ts = DataType::Timestamp(TimeUnit::Nanosecond, None);
    let mut fields = vec![
        Field::new(DEFAULT_START_COL, ts.clone(), false),
        Field::new(DEFAULT_STOP_COL, ts.clone(), false),
        Field::new(DEFAULT_TIME_COL, ts, false),
        Field::new(DEFAULT_VALUE_COL, DataType::Float64, false),
    ];
    fields.extend(
        key.columns()
            .iter()
            .map(|(c, _)| Field::new(c.as_str(), DataType::Utf8, false)),
    );
    Arc::new(Schema::new(fields))
}

/// Approximate bytes held by `rows` points under `key`.
pub fn estimate_size(key: &GroupKey, rows: usize) -> usize {
    let per_row = 4 * 8 + key.columns().iter().map(|(_, v)| v.len()).sum::<usize>();
    per_row.saturating_mul(rows)
}
