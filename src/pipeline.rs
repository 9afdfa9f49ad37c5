//! The schema-driven transformation pipeline.
//!
//! [`transform`] takes a raw [`TabularBatch`] and an immutable
//! [`SchemaMapping`] and produces a typed, constraint-satisfying [`Dataset`]
//! plus the diagnostics accumulated along the way, or a terminal
//! [`TransformError`]. There is no partial or row-level recovery: an invalid
//! mapping or a primary-key violation aborts the whole call, everything else
//! is repaired in place and reported.

use std::fmt;

use log::{debug, info, warn};
use thiserror::Error;

use crate::{
    batch::TabularBatch,
    coerce,
    constraints,
    data::Value,
    mapping::{MappingError, SchemaMapping},
};

/// Terminal failures of a transformation run.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("invalid schema mapping: {0}")]
    InvalidMapping(#[from] MappingError),
    #[error("primary key column '{column}' contains {problem} values")]
    PrimaryKeyViolation {
        column: String,
        problem: PrimaryKeyProblem,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryKeyProblem {
    Missing,
    Duplicate,
}

impl fmt::Display for PrimaryKeyProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimaryKeyProblem::Missing => write!(f, "missing"),
            PrimaryKeyProblem::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// A non-fatal event recorded during transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    MissingColumn { source: String, target: String },
    RequiredRepair { column: String, replaced: usize },
    UniqueRewrite { column: String, rewritten: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingColumn { source, target } => write!(
                f,
                "source column '{source}' is missing from the input; target '{target}' filled with nulls"
            ),
            Diagnostic::RequiredRepair { column, replaced } => write!(
                f,
                "required column '{column}' had {replaced} missing value(s) replaced with '{}'",
                constraints::MISSING_SENTINEL
            ),
            Diagnostic::UniqueRewrite { column, rewritten } => write!(
                f,
                "unique column '{column}' had {rewritten} duplicate value(s) rewritten positionally"
            ),
        }
    }
}

/// Accumulated diagnostics for one transformation run. Recording also logs
/// the event at `warn`, mirroring where the caller would surface it.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn record(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One finished output column: target name plus a typed cell per input row.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    pub name: String,
    pub cells: Vec<Option<Value>>,
}

/// The finished dataset: renamed target columns, same row count as the input
/// batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<OutputColumn>,
    row_count: usize,
}

impl Dataset {
    pub fn columns(&self) -> &[OutputColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&OutputColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Row-major display cells; null cells render empty.
    pub fn render_rows(&self) -> Vec<Vec<String>> {
        (0..self.row_count)
            .map(|row_idx| {
                self.columns
                    .iter()
                    .map(|column| {
                        column.cells[row_idx]
                            .as_ref()
                            .map(Value::as_display)
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct TransformOutcome {
    pub dataset: Dataset,
    pub diagnostics: Diagnostics,
}

// Raw target column staged for processing; owns its cells so that a later
// mapping entry renaming to the same target can replace them wholesale.
struct StagedColumn {
    target: String,
    raw: Vec<Option<String>>,
}

/// Runs the full pipeline: validate, fill missing sources, rename, coerce,
/// enforce constraints, in mapping order.
pub fn transform(
    batch: &TabularBatch,
    mapping: &SchemaMapping,
) -> Result<TransformOutcome, TransformError> {
    mapping.validate()?;
    debug!(
        "Mapping validated: {} column(s) over {} input row(s)",
        mapping.len(),
        batch.row_count()
    );

    let row_count = batch.row_count();
    let mut diagnostics = Diagnostics::default();

    // Stage raw target columns in mapping order. Two sources renaming to the
    // same target: the later entry overwrites the earlier one's data in
    // place, keeping the earlier position (documented tie-break).
    let mut staged: Vec<StagedColumn> = Vec::with_capacity(mapping.len());
    for (source, spec) in mapping.entries() {
        let raw: Vec<Option<String>> = match batch.column_cells(source) {
            Some(cells) => cells.iter().map(|cell| cell.map(str::to_string)).collect(),
            None => {
                diagnostics.record(Diagnostic::MissingColumn {
                    source: source.to_string(),
                    target: spec.target_name.clone(),
                });
                vec![None; row_count]
            }
        };
        match staged.iter_mut().find(|s| s.target == spec.target_name) {
            Some(existing) => existing.raw = raw,
            None => staged.push(StagedColumn {
                target: spec.target_name.clone(),
                raw,
            }),
        }
    }

    // Coerce and enforce per mapping entry, in order. Each entry processes
    // the column currently bound to its target name, so after a collision
    // both specs run and the later entry's pass lands last.
    let mut processed: Vec<Option<Vec<Option<Value>>>> = Vec::new();
    processed.resize_with(staged.len(), || None);
    for (_, spec) in mapping.entries() {
        let idx = staged
            .iter()
            .position(|s| s.target == spec.target_name)
            .expect("every mapping target is staged");
        let raw_cells: Vec<Option<&str>> =
            staged[idx].raw.iter().map(|cell| cell.as_deref()).collect();
        let mut cells = coerce::coerce_column(&raw_cells, &spec.target_type);
        if spec.constraints.required {
            constraints::enforce_required(&spec.target_name, &mut cells, &mut diagnostics);
        }
        if spec.constraints.unique {
            constraints::enforce_unique(&spec.target_name, &mut cells, &mut diagnostics);
        }
        if spec.primary_key {
            constraints::enforce_primary_key(&spec.target_name, &cells)?;
        }
        processed[idx] = Some(cells);
    }

    let columns = staged
        .into_iter()
        .zip(processed)
        .map(|(staged, cells)| OutputColumn {
            name: staged.target,
            cells: cells.expect("every staged target is processed"),
        })
        .collect::<Vec<_>>();

    info!(
        "Transformation completed: {} row(s) across {} column(s), {} diagnostic(s)",
        row_count,
        columns.len(),
        diagnostics.len()
    );
    Ok(TransformOutcome {
        dataset: Dataset { columns, row_count },
        diagnostics,
    })
}
