use crate::process::schema::Column;
use crate::process::utils::clean_str;
use arrow::{
    array::{Array, ArrayRef, BooleanArray, Float32Array, StringArray},
    compute::filter_record_batch,
    error::ArrowError,
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

/// Normalize missing-value sentinels and drop rows with no data outside the
/// temporal key. Running it on its own output changes nothing.
pub fn clean(batch: &RecordBatch) -> Result<RecordBatch, ArrowError> {
    let normalized = normalize_missing(batch)?;
    drop_empty_rows(&normalized)
}

/// Replace blank and `nan` strings in Utf8 columns, and `NaN` in Float32
/// columns, with nulls.
pub fn normalize_missing(batch: &RecordBatch) -> Result<RecordBatch, ArrowError> {
    let mut cols = Vec::with_capacity(batch.num_columns());
    for arr in batch.columns() {
        if let Some(sarr) = arr.as_any().downcast_ref::<StringArray>() {
            let cleaned: StringArray = sarr.iter().map(|opt| opt.and_then(clean_str)).collect();
            cols.push(Arc::new(cleaned) as ArrayRef);
            continue;
        }
        if let Some(farr) = arr.as_any().downcast_ref::<Float32Array>() {
            let cleaned: Float32Array = farr.iter().map(|opt| opt.filter(|v| !v.is_nan())).collect();
            cols.push(Arc::new(cleaned) as ArrayRef);
            continue;
        }
        cols.push(arr.clone());
    }
    RecordBatch::try_new(batch.schema(), cols)
}

/// Remove rows whose every non-key column is null.
pub fn drop_empty_rows(batch: &RecordBatch) -> Result<RecordBatch, ArrowError> {
    let values: Vec<&ArrayRef> = Column::ALL
        .iter()
        .filter(|c| !c.is_key())
        .map(|c| batch.column(c.index()))
        .collect();

    let keep: BooleanArray = (0..batch.num_rows())
        .map(|row| Some(values.iter().any(|arr| arr.is_valid(row))))
        .collect();

    let kept = filter_record_batch(batch, &keep)?;
    let dropped = batch.num_rows() - kept.num_rows();
    if dropped > 0 {
        debug!(dropped, "dropped empty rows");
    }
    Ok(kept)
}
