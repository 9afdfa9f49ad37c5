use std::collections::HashSet;

use csv_harmonize::{
    batch::TabularBatch,
    data::Value,
    mapping::{ColumnSpec, Constraints, SchemaMapping, TargetType},
    pipeline,
};
use proptest::prelude::*;

// Cell values deliberately exclude '_' so that a positional rewrite can never
// collide with a value that was already in the input.
fn cell_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        2 => Just(None),
        5 => "[a-z0-9]{1,3}".prop_map(Some),
    ]
}

fn target_type_strategy() -> impl Strategy<Value = TargetType> {
    prop_oneof![
        Just(TargetType::String),
        Just(TargetType::Integer),
        Just(TargetType::Float),
        Just(TargetType::Date),
    ]
}

fn two_column_batch(rows: &[(Option<String>, Option<String>)]) -> TabularBatch {
    TabularBatch::from_rows(
        vec!["A".to_string(), "B".to_string()],
        rows.iter()
            .map(|(a, b)| vec![a.clone(), b.clone()])
            .collect(),
    )
    .expect("aligned batch")
}

proptest! {
    #[test]
    fn transform_never_drops_rows(
        rows in proptest::collection::vec((cell_strategy(), cell_strategy()), 0..40),
        ty_a in target_type_strategy(),
        ty_b in target_type_strategy(),
        required in any::<bool>(),
        unique in any::<bool>(),
    ) {
        let batch = two_column_batch(&rows);
        let mut mapping = SchemaMapping::new();
        mapping.insert(
            "A",
            ColumnSpec {
                constraints: Constraints { required, unique },
                ..ColumnSpec::new("a", ty_a)
            },
        );
        mapping.insert("B", ColumnSpec::new("b", ty_b));

        let outcome = pipeline::transform(&batch, &mapping).expect("repairs never abort");
        prop_assert_eq!(outcome.dataset.row_count(), rows.len());
        prop_assert_eq!(outcome.dataset.headers(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn required_columns_come_out_fully_populated(
        rows in proptest::collection::vec((cell_strategy(), cell_strategy()), 0..40),
        ty in target_type_strategy(),
    ) {
        let batch = two_column_batch(&rows);
        let mut mapping = SchemaMapping::new();
        mapping.insert(
            "A",
            ColumnSpec {
                constraints: Constraints { required: true, unique: false },
                ..ColumnSpec::new("a", ty)
            },
        );

        let outcome = pipeline::transform(&batch, &mapping).expect("repairs never abort");
        let column = outcome.dataset.column("a").expect("column a");
        prop_assert!(column.cells.iter().all(Option::is_some));
    }

    #[test]
    fn unique_columns_have_no_duplicate_present_values(
        rows in proptest::collection::vec((cell_strategy(), cell_strategy()), 0..40),
        ty in target_type_strategy(),
        required in any::<bool>(),
    ) {
        let batch = two_column_batch(&rows);
        let mut mapping = SchemaMapping::new();
        mapping.insert(
            "A",
            ColumnSpec {
                constraints: Constraints { required, unique: true },
                ..ColumnSpec::new("a", ty)
            },
        );

        let outcome = pipeline::transform(&batch, &mapping).expect("repairs never abort");
        let column = outcome.dataset.column("a").expect("column a");
        let displays: Vec<String> = column
            .cells
            .iter()
            .flatten()
            .map(Value::as_display)
            .collect();
        let distinct: HashSet<&String> = displays.iter().collect();
        prop_assert_eq!(distinct.len(), displays.len());
    }
}
