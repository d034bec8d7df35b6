// src/process/mod.rs
use arrow::{
    array::{
        Array, ArrayRef, AsArray, Float32Array, Float32Builder, StringArray, StringBuilder,
        TimestampMillisecondArray, TimestampMillisecondBuilder,
    },
    datatypes::{DataType, Float32Type, TimestampMillisecondType},
    error::ArrowError,
    record_batch::RecordBatch,
};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::LoadError;

pub mod cleaning;
pub mod date_parser;
pub mod schema;
pub mod utils;

pub use schema::{usage_schema, Column};

/// Typed, cleaned trips for one month, one row per rental.
///
/// Backed by an Arrow [`RecordBatch`] with the [`usage_schema`]. Only
/// read-only views are handed out; every constructor runs the cleaning pass.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageTable {
    batch: RecordBatch,
}

impl UsageTable {
    /// Wrap a batch built elsewhere after checking it against the usage schema.
    pub fn from_batch(batch: RecordBatch) -> Result<Self, LoadError> {
        let schema = batch.schema();
        for col in Column::ALL {
            let matches = schema
                .fields()
                .get(col.index())
                .map(|f| f.name() == col.name() && f.data_type() == &col.data_type())
                .unwrap_or(false);
            if !matches {
                return Err(LoadError::Schema {
                    column: col.name().to_string(),
                });
            }
        }
        if schema.fields().len() != Column::ALL.len() {
            return Err(LoadError::Schema {
                column: schema.field(Column::ALL.len()).name().clone(),
            });
        }
        Ok(Self {
            batch: cleaning::clean(&batch)?,
        })
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// A Utf8 column. Panics if `col` is not one.
    pub fn strings(&self, col: Column) -> &StringArray {
        assert_eq!(col.data_type(), DataType::Utf8, "{} is not Utf8", col.name());
        self.batch.column(col.index()).as_string::<i32>()
    }

    pub fn trip_minutes(&self) -> &Float32Array {
        self.batch
            .column(Column::TripMinutes.index())
            .as_primitive::<Float32Type>()
    }

    /// A timestamp column. Panics if `col` is not one.
    pub fn timestamps(&self, col: Column) -> &TimestampMillisecondArray {
        self.batch
            .column(col.index())
            .as_primitive::<TimestampMillisecondType>()
    }

    /// Calendar day of the temporal key of `row`.
    pub fn day(&self, row: usize) -> Option<NaiveDate> {
        let fecha = self.timestamps(Column::Fecha);
        if fecha.is_null(row) {
            return None;
        }
        date_parser::day_of_millis(fecha.value(row))
    }

    /// Rows selected by `keep`, renumbered from zero.
    pub(crate) fn filter(&self, keep: &arrow::array::BooleanArray) -> Result<Self, ArrowError> {
        let batch = arrow::compute::filter_record_batch(&self.batch, keep)?;
        Ok(Self { batch })
    }
}

enum ColumnBuilder {
    Utf8(StringBuilder),
    Float32(Float32Builder),
    Timestamp(TimestampMillisecondBuilder),
}

impl ColumnBuilder {
    fn for_column(col: Column) -> Self {
        match col.data_type() {
            DataType::Float32 => ColumnBuilder::Float32(Float32Builder::new()),
            DataType::Timestamp(..) => {
                ColumnBuilder::Timestamp(TimestampMillisecondBuilder::new())
            }
            _ => ColumnBuilder::Utf8(StringBuilder::new()),
        }
    }

    fn push(&mut self, raw: Option<&str>, col: Column, record: u64) -> Result<(), LoadError> {
        let value = raw.and_then(utils::clean_str);
        let bad = |v: &str| LoadError::Parse {
            record,
            reason: format!("invalid value {v:?} for column `{}`", col.name()),
        };
        match self {
            ColumnBuilder::Utf8(b) => b.append_option(value),
            ColumnBuilder::Float32(b) => match value {
                Some(v) => b.append_value(v.trim().parse::<f32>().map_err(|_| bad(v))?),
                None => b.append_null(),
            },
            ColumnBuilder::Timestamp(b) => match value {
                Some(v) => b.append_value(date_parser::parse_timestamp_millis(v).ok_or_else(|| bad(v))?),
                None => b.append_null(),
            },
        }
        Ok(())
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Utf8(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Float32(mut b) => Arc::new(b.finish()),
            ColumnBuilder::Timestamp(mut b) => Arc::new(b.finish()),
        }
    }
}

/// Parse an EMT trips CSV (`;` separated, `'` quoted) into a cleaned [`UsageTable`].
///
/// Only the columns listed in [`Column::ALL`] are kept; any others are ignored.
#[instrument(level = "info", skip(text), fields(chars = text.len()))]
pub fn load(text: &str) -> Result<UsageTable, LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rdr = ReaderBuilder::new()
        .delimiter(b';')
        .quote(b'\'')
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| LoadError::Parse {
            record: 0,
            reason: e.to_string(),
        })?
        .clone();
    let width = headers.len();

    let mut positions = Vec::with_capacity(Column::ALL.len());
    for col in Column::ALL {
        let pos = headers
            .iter()
            .position(|h| h.trim() == col.name())
            .ok_or_else(|| LoadError::Schema {
                column: col.name().to_string(),
            })?;
        positions.push((col, pos));
    }
    debug!(?headers, "matched CSV header");

    let mut builders: Vec<ColumnBuilder> =
        Column::ALL.iter().map(|c| ColumnBuilder::for_column(*c)).collect();
    let mut rows: u64 = 0;
    for (idx, result) in rdr.records().enumerate() {
        let record_no = idx as u64 + 1;
        let record = result.map_err(|e| LoadError::Parse {
            record: record_no,
            reason: e.to_string(),
        })?;
        if record.len() > width {
            return Err(LoadError::Parse {
                record: record_no,
                reason: format!("expected {width} fields, saw {}", record.len()),
            });
        }
        for (builder, (col, pos)) in builders.iter_mut().zip(&positions) {
            builder.push(record.get(*pos), *col, record_no)?;
        }
        rows += 1;
    }

    if rows == 0 {
        return Err(LoadError::EmptyPayload);
    }

    let arrays: Vec<ArrayRef> = builders.into_iter().map(ColumnBuilder::finish).collect();
    let batch = RecordBatch::try_new(usage_schema(), arrays)?;
    let table = UsageTable {
        batch: cleaning::clean(&batch)?,
    };
    info!(parsed = rows, kept = table.num_rows(), "loaded usage table");
    Ok(table)
}
