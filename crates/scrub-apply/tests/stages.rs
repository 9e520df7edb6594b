//! Stage-level apply semantics: ordering, identity churn and atomicity.

use polars::prelude::{Column, DataFrame};
use proptest::prelude::*;

use scrub_apply::{ApplyOptions, apply_plan};
use scrub_common::numeric_values;
use scrub_model::{
    ColumnId, ColumnKind, EncodingAction, IdentityMap, MissingAction, OutlierAction, Plan,
    ScalingAction, ScrubError, StagePlan,
};

fn map_for(df: &DataFrame, kinds: &[ColumnKind]) -> IdentityMap {
    IdentityMap::from_schema(
        df.get_columns()
            .iter()
            .zip(kinds)
            .map(|(c, kind)| (c.name().to_string(), *kind)),
    )
}

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-12, "{a} != {b}");
}

#[test]
fn row_drops_run_before_fill_statistics() {
    let df = DataFrame::new(vec![
        Column::new("a".into(), vec![Some(1.0), Some(2.0), None, Some(4.0)]),
        Column::new("b".into(), vec![Some(10.0), None, Some(30.0), Some(40.0)]),
    ])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric, ColumnKind::Numeric]);

    let plan = StagePlan::Missing {
        plan: Plan::new()
            .push(MissingAction::Mean, vec![ColumnId::new(0)])
            .push(MissingAction::DropRow, vec![ColumnId::new(1)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    // Row 1 (null b) is gone first, so the fill mean is (1 + 4) / 2.
    assert_eq!(out.df.height(), 3);
    assert_eq!(
        numeric_values(out.df.column("a").unwrap()),
        vec![Some(1.0), Some(2.5), Some(4.0)]
    );
}

#[test]
fn drop_col_retires_the_id() {
    let df = DataFrame::new(vec![
        Column::new("a".into(), vec![Some(1.0), None]),
        Column::new("b".into(), vec![Some(1.0), Some(2.0)]),
    ])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric, ColumnKind::Numeric]);

    let plan = StagePlan::Missing {
        plan: Plan::new().push(MissingAction::DropCol, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    assert_eq!(out.df.width(), 1);
    assert_eq!(out.dropped, vec![ColumnId::new(0)]);
    assert!(matches!(
        out.map.resolve(ColumnId::new(0)),
        Err(ScrubError::ColumnNotFound(_))
    ));
}

#[test]
fn mean_fill_casts_numeric_looking_text_and_retypes_it() {
    let df = DataFrame::new(vec![Column::new(
        "n".into(),
        vec![Some("1"), Some("2"), None, Some("4")],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Categorical]);

    let plan = StagePlan::Missing {
        plan: Plan::new().push(MissingAction::Mean, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    let values = numeric_values(out.df.column("n").unwrap());
    approx(values[2].unwrap(), 7.0 / 3.0);
    assert_eq!(
        out.map.resolve(ColumnId::new(0)).unwrap().kind,
        ColumnKind::Numeric
    );
}

#[test]
fn mean_fill_on_uncastable_text_is_a_noop() {
    let df = DataFrame::new(vec![Column::new(
        "s".into(),
        vec![Some("short"), Some("tall"), None],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Categorical]);

    let plan = StagePlan::Missing {
        plan: Plan::new().push(MissingAction::Mean, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    assert_eq!(out.df.column("s").unwrap().null_count(), 1);
    assert_eq!(
        out.map.resolve(ColumnId::new(0)).unwrap().kind,
        ColumnKind::Categorical
    );
}

#[test]
fn mode_fill_replaces_nulls_with_the_most_frequent_value() {
    let df = DataFrame::new(vec![Column::new(
        "city".into(),
        vec![Some("paris"), Some("london"), Some("paris"), None],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Categorical]);

    let plan = StagePlan::Missing {
        plan: Plan::new().push(MissingAction::Mode, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    let column = out.df.column("city").unwrap();
    assert_eq!(column.null_count(), 0);
    assert_eq!(
        scrub_common::rendered_values(column)[3].as_deref(),
        Some("paris")
    );
}

#[test]
fn unknown_id_fails_without_touching_anything() {
    let df = DataFrame::new(vec![Column::new("a".into(), vec![Some(1.0), None])]).unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric]);

    let plan = StagePlan::Missing {
        plan: Plan::new()
            .push(MissingAction::Mean, vec![ColumnId::new(0)])
            .push(MissingAction::DropCol, vec![ColumnId::new(99)]),
    };
    let err = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap_err();

    assert!(matches!(err, ScrubError::ColumnNotFound(id) if id == ColumnId::new(99)));
    // Caller-side state is untouched by construction; the inputs still agree.
    assert!(map.is_bijective_with(df.get_column_names_owned().iter().map(|n| n.as_str())));
}

#[test]
fn remove_row_drops_out_of_fence_rows_but_keeps_nulls() {
    // Q1 = 10, Q3 = 20 over the non-null values, fences [-5, 35].
    let df = DataFrame::new(vec![Column::new(
        "x".into(),
        vec![
            Some(10.0),
            Some(10.0),
            Some(10.0),
            Some(20.0),
            Some(20.0),
            Some(20.0),
            Some(1000.0),
            None,
        ],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric]);

    let plan = StagePlan::Outliers {
        plan: Plan::new().push(OutlierAction::RemoveRow, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    assert_eq!(out.df.height(), 7);
    assert_eq!(out.df.column("x").unwrap().null_count(), 1);
}

#[test]
fn cap_clamps_values_onto_the_fences() {
    // Q1 = 2, Q3 = 4, fences [-1, 7].
    let df = DataFrame::new(vec![Column::new(
        "x".into(),
        vec![1.0, 2.0, 3.0, 4.0, 100.0],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric]);

    let plan = StagePlan::Outliers {
        plan: Plan::new().push(OutlierAction::Cap, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    assert_eq!(
        numeric_values(out.df.column("x").unwrap()),
        vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(7.0)]
    );
}

#[test]
fn label_encoding_codes_sorted_categories_in_place() {
    let df = DataFrame::new(vec![Column::new(
        "size".into(),
        vec![Some("small"), Some("big"), None, Some("small")],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Categorical]);

    let plan = StagePlan::Encoding {
        plan: Plan::new().push(EncodingAction::Label, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    // Sorted categories: big = 0, small = 1. Nulls stay null.
    assert_eq!(
        numeric_values(out.df.column("size").unwrap()),
        vec![Some(1.0), Some(0.0), None, Some(1.0)]
    );
    let entry = out.map.resolve(ColumnId::new(0)).unwrap();
    assert_eq!(entry.kind, ColumnKind::Numeric);
    assert_eq!(entry.name, "size");
}

#[test]
fn one_hot_fans_out_with_fresh_ids_and_lineage() {
    let df = DataFrame::new(vec![
        Column::new("x".into(), vec![1.0, 2.0, 3.0, 4.0, 5.0]),
        Column::new(
            "city".into(),
            vec![
                Some("paris"),
                Some("london"),
                None,
                Some("tokyo"),
                Some("paris"),
            ],
        ),
    ])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric, ColumnKind::Categorical]);

    let plan = StagePlan::Encoding {
        plan: Plan::new().push(EncodingAction::OneHot, vec![ColumnId::new(1)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    // "london" is the dropped baseline; the null row is all zeros.
    assert_eq!(out.df.width(), 3);
    assert_eq!(
        numeric_values(out.df.column("city_paris").unwrap()),
        vec![Some(1.0), Some(0.0), Some(0.0), Some(0.0), Some(1.0)]
    );
    assert_eq!(
        numeric_values(out.df.column("city_tokyo").unwrap()),
        vec![Some(0.0), Some(0.0), Some(0.0), Some(1.0), Some(0.0)]
    );

    assert_eq!(out.dropped, vec![ColumnId::new(1)]);
    assert_eq!(out.added, vec![ColumnId::new(2), ColumnId::new(3)]);
    for id in &out.added {
        assert_eq!(out.map.resolve(*id).unwrap().origin, Some(ColumnId::new(1)));
    }
    assert!(matches!(
        out.map.resolve(ColumnId::new(1)),
        Err(ScrubError::ColumnNotFound(_))
    ));
}

#[test]
fn standard_scaling_uses_population_std() {
    let df = DataFrame::new(vec![Column::new("x".into(), vec![1.0, 2.0, 3.0, 4.0])]).unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric]);

    let plan = StagePlan::Scaling {
        plan: Plan::new().push(ScalingAction::Standard, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    let values = numeric_values(out.df.column("x").unwrap());
    // mean 2.5, population std sqrt(5)/2.
    approx(values[0].unwrap(), -1.5 / (5.0f64.sqrt() / 2.0));
    approx(values[3].unwrap(), 1.5 / (5.0f64.sqrt() / 2.0));
    approx(values.iter().flatten().sum::<f64>(), 0.0);
}

#[test]
fn minmax_scaling_preserves_nulls() {
    let df = DataFrame::new(vec![Column::new(
        "x".into(),
        vec![Some(5.0), None, Some(10.0), Some(20.0)],
    )])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric]);

    let plan = StagePlan::Scaling {
        plan: Plan::new().push(ScalingAction::MinMax, vec![ColumnId::new(0)]),
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    let values = numeric_values(out.df.column("x").unwrap());
    approx(values[0].unwrap(), 0.0);
    assert_eq!(values[1], None);
    approx(values[2].unwrap(), 1.0 / 3.0);
    approx(values[3].unwrap(), 1.0);
}

#[test]
fn zero_spread_column_scales_to_zero() {
    let df = DataFrame::new(vec![Column::new("x".into(), vec![7.0; 4])]).unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric]);

    for action in [ScalingAction::Standard, ScalingAction::MinMax] {
        let plan = StagePlan::Scaling {
            plan: Plan::new().push(action, vec![ColumnId::new(0)]),
        };
        let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();
        assert_eq!(
            numeric_values(out.df.column("x").unwrap()),
            vec![Some(0.0); 4]
        );
    }
}

proptest! {
    /// The identity map and the physical schema stay a bijection after any
    /// successful apply, whatever mix of repairs the plan holds.
    #[test]
    fn identity_stays_bijective_under_random_missing_plans(
        buckets in prop::collection::vec((0u32..3, 0usize..5), 0..8)
    ) {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![Some(1.0), Some(2.0), None, Some(4.0)]),
            Column::new("s".into(), vec![Some("x"), Some("y"), Some("x"), None]),
            Column::new("c".into(), vec![Some(9.0), None, Some(7.0), Some(6.0)]),
        ])
        .unwrap();
        let map = map_for(
            &df,
            &[
                ColumnKind::Numeric,
                ColumnKind::Categorical,
                ColumnKind::Numeric,
            ],
        );
        let actions = [
            MissingAction::Mean,
            MissingAction::Median,
            MissingAction::Mode,
            MissingAction::DropRow,
            MissingAction::DropCol,
        ];

        let mut plan = Plan::new();
        for (col, action) in &buckets {
            plan = plan.push(actions[*action], vec![ColumnId::new(*col)]);
        }
        let out = apply_plan(
            &df,
            &map,
            &StagePlan::Missing { plan },
            &ApplyOptions::default(),
        )
        .unwrap();

        let names = out.df.get_column_names_owned();
        prop_assert!(out.map.is_bijective_with(names.iter().map(|n| n.as_str())));
        for id in &out.dropped {
            prop_assert!(out.map.resolve(*id).is_err());
        }
    }
}

#[test]
fn prune_deduplicates_the_drop_list() {
    let df = DataFrame::new(vec![
        Column::new("a".into(), vec![1.0, 2.0]),
        Column::new("b".into(), vec![3.0, 4.0]),
    ])
    .unwrap();
    let map = map_for(&df, &[ColumnKind::Numeric, ColumnKind::Numeric]);

    let plan = StagePlan::Prune {
        drop: vec![ColumnId::new(1), ColumnId::new(1)],
    };
    let out = apply_plan(&df, &map, &plan, &ApplyOptions::default()).unwrap();

    assert_eq!(out.df.width(), 1);
    assert_eq!(out.dropped, vec![ColumnId::new(1)]);
    assert_eq!(out.map.len(), 1);
}
