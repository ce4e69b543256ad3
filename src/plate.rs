//! Well label and primary key computation.
//!
//! Labels are plate coordinates ("A1".."H12" on a 96-well plate), assigned
//! row by row from a zero-based ordinal index. The primary key prefixes the
//! label with the batch week and is the identifier under which result
//! artifacts are filed, so its format must never change once keys have
//! been handed out.

use crate::error::{Result, SampleFlowError};

/// Row labels in plate order, one letter per row.
pub const ROW_LABELS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Largest supported number of plate rows.
pub fn max_rows() -> usize {
    ROW_LABELS.len()
}

/// Computes the well label for the `index`-th sample on an
/// `n_rows` x `n_cols` plate.
///
/// Fails with `PlateFull` if `index` does not fit on the plate; callers
/// check capacity first and may treat this as the capacity-exceeded
/// signal. Grid dimensions are validated at settings load, see
/// [`crate::config::Settings::validate`].
pub fn compute_label(index: usize, n_rows: usize, n_cols: usize) -> Result<String> {
    if n_rows > max_rows() {
        return Err(SampleFlowError::TooManyRows {
            rows: n_rows,
            max_rows: max_rows(),
        });
    }
    if index >= n_rows * n_cols {
        return Err(SampleFlowError::PlateFull);
    }
    let i_row = index / n_cols;
    let i_col = index % n_cols;
    let row_label = ROW_LABELS.as_bytes()[i_row] as char;
    Ok(format!("{}{}", row_label, i_col + 1))
}

/// Combines the batch week and a well label into the externally exposed
/// primary key, e.g. week 3 and "A12" -> "3_A12".
///
/// Injective over (week, label) pairs: the separator never occurs in
/// either component. Frozen format, see module docs.
pub fn get_primary_key(week: u32, label: &str) -> String {
    format!("{}_{}", week, label)
}
