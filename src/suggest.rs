//! Candidate schema-mapping suggestion.
//!
//! [`MappingOracle`] is the seam for anything that proposes a mapping: the
//! bundled sampling heuristic here, or a remote suggestion service in a
//! larger deployment. Oracle output gets no special trust and is validated
//! exactly like a hand-written mapping document.

use std::collections::HashSet;

use anyhow::Result;
use log::debug;

use crate::{
    batch::TabularBatch,
    data::{self, Number},
    mapping::{ColumnSpec, Constraints, SchemaMapping, TargetType},
};

pub const DEFAULT_SAMPLE_ROWS: usize = 5;

/// Any producer of a candidate schema mapping.
pub trait MappingOracle {
    fn suggest(&self, batch: &TabularBatch) -> Result<SchemaMapping>;
}

/// Sampling heuristic oracle: tallies what each column's first rows parse as
/// and votes on a target type and constraints.
#[derive(Debug, Clone, Copy)]
pub struct TypeProbe {
    /// Rows sampled per column; 0 means the full batch.
    pub sample_rows: usize,
}

impl Default for TypeProbe {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }
}

struct TypeCandidate {
    non_empty: usize,
    integer_matches: usize,
    number_matches: usize,
    date_matches: usize,
    distinct: HashSet<String>,
}

impl TypeCandidate {
    fn new() -> Self {
        Self {
            non_empty: 0,
            integer_matches: 0,
            number_matches: 0,
            date_matches: 0,
            distinct: HashSet::new(),
        }
    }

    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return;
        }
        self.non_empty += 1;
        self.distinct.insert(trimmed.to_string());
        match data::parse_number(trimmed) {
            Some(Number::Integer(_)) => {
                self.integer_matches += 1;
                self.number_matches += 1;
            }
            Some(Number::Float(_)) => {
                self.number_matches += 1;
            }
            None => {
                if data::parse_naive_date(trimmed).is_ok()
                    || data::parse_naive_datetime(trimmed).is_ok()
                {
                    self.date_matches += 1;
                }
            }
        }
    }

    fn majority(&self, count: usize) -> bool {
        count > 0 && count * 2 > self.non_empty
    }

    fn decide(&self) -> TargetType {
        if self.non_empty == 0 {
            TargetType::String
        } else if self.majority(self.integer_matches)
            && self.integer_matches == self.number_matches
        {
            TargetType::Integer
        } else if self.majority(self.number_matches) {
            TargetType::Float
        } else if self.majority(self.date_matches) {
            TargetType::Date
        } else {
            TargetType::String
        }
    }
}

impl MappingOracle for TypeProbe {
    fn suggest(&self, batch: &TabularBatch) -> Result<SchemaMapping> {
        let sampled = if self.sample_rows == 0 {
            batch.row_count()
        } else {
            self.sample_rows.min(batch.row_count())
        };
        let mut mapping = SchemaMapping::new();
        let mut key_chosen = false;
        for source in batch.columns() {
            let cells = batch
                .column_cells(source)
                .expect("column names come from the batch itself");
            let mut candidate = TypeCandidate::new();
            for cell in cells.iter().take(sampled).flatten() {
                candidate.update(cell);
            }
            let target_type = candidate.decide();
            let required = sampled > 0 && candidate.non_empty == sampled;
            let unique =
                candidate.non_empty > 1 && candidate.distinct.len() == candidate.non_empty;
            // Nominate the first id-like column that could serve as a key.
            let primary_key = !key_chosen
                && required
                && unique
                && source.to_ascii_lowercase().contains("id");
            if primary_key {
                key_chosen = true;
            }
            debug!(
                "Column '{source}': type {target_type}, required={required}, unique={unique}, primary_key={primary_key}"
            );
            mapping.insert(
                source.as_str(),
                ColumnSpec {
                    target_name: data::normalize_column_name(source),
                    target_type,
                    constraints: Constraints { required, unique },
                    primary_key,
                },
            );
        }
        Ok(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch() -> TabularBatch {
        let columns = vec![
            "Order ID".to_string(),
            "Customer".to_string(),
            "Total".to_string(),
            "Placed".to_string(),
        ];
        let rows = vec![
            vec![
                Some("101".to_string()),
                Some("Ada".to_string()),
                Some("9.95".to_string()),
                Some("2024-05-06".to_string()),
            ],
            vec![
                Some("102".to_string()),
                Some("Grace".to_string()),
                Some("12.50".to_string()),
                Some("2024-05-07".to_string()),
            ],
            vec![
                Some("103".to_string()),
                None,
                Some("3".to_string()),
                Some("2024-05-08".to_string()),
            ],
        ];
        TabularBatch::from_rows(columns, rows).unwrap()
    }

    #[test]
    fn probe_votes_types_from_sampled_rows() {
        let mapping = TypeProbe::default().suggest(&sample_batch()).unwrap();
        assert_eq!(
            mapping.get("Order ID").unwrap().target_type,
            TargetType::Integer
        );
        assert_eq!(
            mapping.get("Customer").unwrap().target_type,
            TargetType::String
        );
        assert_eq!(mapping.get("Total").unwrap().target_type, TargetType::Float);
        assert_eq!(mapping.get("Placed").unwrap().target_type, TargetType::Date);
    }

    #[test]
    fn probe_marks_constraints_and_nominates_one_key() {
        let mapping = TypeProbe::default().suggest(&sample_batch()).unwrap();
        let id = mapping.get("Order ID").unwrap();
        assert!(id.constraints.required);
        assert!(id.constraints.unique);
        assert!(id.primary_key);
        assert_eq!(id.target_name, "order_id");

        let customer = mapping.get("Customer").unwrap();
        assert!(!customer.constraints.required);
        assert!(!customer.primary_key);
    }

    #[test]
    fn probe_with_zero_sample_rows_scans_the_full_batch() {
        let probe = TypeProbe { sample_rows: 0 };
        let mapping = probe.suggest(&sample_batch()).unwrap();
        assert_eq!(mapping.len(), 4);
    }
}
