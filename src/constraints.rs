//! Constraint enforcement over coerced columns.
//!
//! Enforcement order is fixed and load-bearing: required-repair runs before
//! unique-repair, which runs before primary-key validation. Required and
//! unique violations are *repaired* deterministically and recorded as
//! diagnostics; primary-key violations are terminal.

use itertools::Itertools;

use crate::{
    data::Value,
    pipeline::{Diagnostic, Diagnostics, PrimaryKeyProblem, TransformError},
};

/// Sentinel written in place of a missing value in a required column.
pub const MISSING_SENTINEL: &str = "MISSING";

/// Replaces every null in a required column with the [`MISSING_SENTINEL`]
/// literal, making the gap visible instead of dropping the row.
pub fn enforce_required(column: &str, cells: &mut [Option<Value>], diagnostics: &mut Diagnostics) {
    let mut replaced = 0usize;
    for cell in cells.iter_mut() {
        if cell.is_none() {
            *cell = Some(Value::String(MISSING_SENTINEL.to_string()));
            replaced += 1;
        }
    }
    if replaced > 0 {
        diagnostics.record(Diagnostic::RequiredRepair {
            column: column.to_string(),
            replaced,
        });
    }
}

/// Rewrites every member of a duplicate group to `"<value>_<row-index>"`.
///
/// Grouping is by display text, so the required-repair sentinel collides with
/// itself like any other value. First and later occurrences are treated
/// identically; disambiguation is positional. Null cells carry no value and
/// never form a group.
pub fn enforce_unique(column: &str, cells: &mut [Option<Value>], diagnostics: &mut Diagnostics) {
    let occurrences = cells
        .iter()
        .flatten()
        .map(Value::as_display)
        .counts();
    let mut rewritten = 0usize;
    for (row_idx, cell) in cells.iter_mut().enumerate() {
        let Some(value) = cell else {
            continue;
        };
        let key = value.as_display();
        if occurrences.get(&key).copied().unwrap_or(0) > 1 {
            *cell = Some(Value::String(format!("{key}_{row_idx}")));
            rewritten += 1;
        }
    }
    if rewritten > 0 {
        diagnostics.record(Diagnostic::UniqueRewrite {
            column: column.to_string(),
            rewritten,
        });
    }
}

/// Zero-tolerance check run after the repairs above: a primary-key column
/// must contain no nulls and no duplicates, or the whole transformation
/// fails.
pub fn enforce_primary_key(column: &str, cells: &[Option<Value>]) -> Result<(), TransformError> {
    if cells.iter().any(Option::is_none) {
        return Err(TransformError::PrimaryKeyViolation {
            column: column.to_string(),
            problem: PrimaryKeyProblem::Missing,
        });
    }
    let occurrences = cells.iter().flatten().map(Value::as_display).counts();
    if occurrences.values().any(|&count| count > 1) {
        return Err(TransformError::PrimaryKeyViolation {
            column: column.to_string(),
            problem: PrimaryKeyProblem::Duplicate,
        });
    }
    Ok(())
}
