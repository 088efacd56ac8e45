//! Scenario tests for the diff engine.

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    use crate::config::{Config, TypeGroup};
    use crate::diff::{diff, diff_tree, ChangeRecord, DeepDiff, DiffReport, ReportType, Warning};
    use crate::value::{TypeTag, Value};

    fn ints(items: &[i64]) -> Value {
        Value::list(items.iter().map(|i| Value::from(*i)))
    }

    fn ignore_order() -> Config {
        Config::builder().ignore_order(true).build().unwrap()
    }

    fn self_referencing(name: &str) -> Value {
        let value = Value::map(vec![(Value::text("name"), Value::text(name))]);
        if let Value::Mapping(node) = &value {
            node.borrow_mut().insert(Value::text("me"), value.clone());
        }
        value
    }

    fn kinds(report: &DiffReport) -> Vec<(ReportType, String)> {
        report
            .iter()
            .map(|(t, path, _)| (t, path.to_string()))
            .collect()
    }

    #[test]
    fn test_identical_values_have_empty_diff() {
        let value = Value::map(vec![
            (Value::text("a"), ints(&[1, 2])),
            (Value::text("b"), Value::set(vec![Value::text("x")])),
        ]);
        assert!(diff(&value, &value, &Config::default()).is_empty());

        let copy = Value::map(vec![
            (Value::text("a"), ints(&[1, 2])),
            (Value::text("b"), Value::set(vec![Value::text("x")])),
        ]);
        assert!(diff(&value, &copy, &Config::default()).is_empty());
    }

    #[test]
    fn test_key_order_irrelevant() {
        let a = Value::map(vec![("a", 1), ("b", 2)]);
        let b = Value::map(vec![("b", 2), ("a", 1)]);
        assert!(diff(&a, &b, &Config::default()).is_empty());
    }

    #[test]
    fn test_dictionary_items_added_and_removed() {
        let a = Value::map(vec![("a", 1), ("b", 2)]);
        let b = Value::map(vec![("b", 2), ("c", 3)]);
        let report = diff(&a, &b, &Config::default());
        assert_eq!(
            kinds(&report),
            vec![
                (ReportType::DictionaryItemAdded, "root['c']".to_string()),
                (ReportType::DictionaryItemRemoved, "root['a']".to_string()),
            ]
        );
        assert_eq!(
            report.get(ReportType::DictionaryItemAdded, "root['c']"),
            Some(&ChangeRecord::Item { value: Value::from(3) })
        );
    }

    #[test]
    fn test_order_sensitive_sequences() {
        let report = diff(&ints(&[1, 2, 3]), &ints(&[3, 2, 1]), &Config::default());
        assert_eq!(
            kinds(&report),
            vec![
                (ReportType::ValuesChanged, "root[0]".to_string()),
                (ReportType::ValuesChanged, "root[2]".to_string()),
            ]
        );
        assert_eq!(
            report.get(ReportType::ValuesChanged, "root[0]"),
            Some(&ChangeRecord::ValueChange {
                old_value: Value::from(1),
                new_value: Value::from(3),
                diff: None,
            })
        );
    }

    #[test]
    fn test_order_insensitive_sequences() {
        assert!(diff(&ints(&[1, 2, 3]), &ints(&[3, 2, 1]), &ignore_order()).is_empty());
        assert!(diff(&ints(&[1, 1, 2]), &ints(&[2, 1]), &ignore_order()).is_empty());

        let report = diff(&ints(&[1, 2, 3]), &ints(&[4, 2, 1]), &ignore_order());
        assert_eq!(
            kinds(&report),
            vec![
                (ReportType::IterableItemAdded, "root[0]".to_string()),
                (ReportType::IterableItemRemoved, "root[2]".to_string()),
            ]
        );
    }

    #[test]
    fn test_sequence_length_change() {
        let report = diff(&ints(&[1, 2, 3]), &ints(&[1]), &Config::default());
        assert_eq!(
            kinds(&report),
            vec![
                (ReportType::IterableItemRemoved, "root[1]".to_string()),
                (ReportType::IterableItemRemoved, "root[2]".to_string()),
            ]
        );
        assert_eq!(
            report.get(ReportType::IterableItemRemoved, "root[2]"),
            Some(&ChangeRecord::Item { value: Value::from(3) })
        );
    }

    #[test]
    fn test_repetition_change() {
        let config = Config::builder()
            .ignore_order(true)
            .report_repetition(true)
            .build()
            .unwrap();
        let report = diff(&ints(&[1, 1, 2]), &ints(&[1, 2]), &config);

        assert_eq!(
            kinds(&report),
            vec![(ReportType::RepetitionChange, "root[0]".to_string())]
        );
        assert_eq!(
            report.get(ReportType::RepetitionChange, "root[0]"),
            Some(&ChangeRecord::Repetition {
                value: Value::from(1),
                old_repeat: 2,
                new_repeat: 1,
                old_indexes: vec![0, 1],
                new_indexes: vec![0],
            })
        );
    }

    #[test]
    fn test_repetition_reports_every_added_index() {
        let config = Config::builder()
            .ignore_order(true)
            .report_repetition(true)
            .build()
            .unwrap();
        let report = diff(&ints(&[1]), &ints(&[1, 2, 2]), &config);
        assert_eq!(
            report.paths(ReportType::IterableItemAdded),
            vec!["root[1]", "root[2]"]
        );

        let report = diff(&ints(&[1]), &ints(&[1, 2, 2]), &ignore_order());
        assert_eq!(report.paths(ReportType::IterableItemAdded), vec!["root[1]"]);
    }

    #[test]
    fn test_self_reference_terminates() {
        let a = self_referencing("a");
        let b = self_referencing("b");
        let report = diff(&a, &b, &Config::default());
        assert_eq!(
            kinds(&report),
            vec![(ReportType::ValuesChanged, "root['name']".to_string())]
        );
        assert!(diff(&a, &a, &Config::default()).is_empty());

        let plain = Value::map(vec![
            (Value::text("name"), Value::text("a")),
            (Value::text("me"), Value::map(vec![("name", "a")])),
        ]);
        let report = diff(&a, &plain, &Config::default());
        assert!(report.is_empty());
    }

    #[test]
    fn test_significant_digits() {
        let config = Config::builder().significant_digits(2).build().unwrap();
        assert!(diff(&Value::from(3.141), &Value::from(3.144), &config).is_empty());
        let report = diff(&Value::from(3.141), &Value::from(3.149), &config);
        assert_eq!(kinds(&report), vec![(ReportType::ValuesChanged, "root".to_string())]);
    }

    #[test]
    fn test_custom_number_formatter() {
        let config = Config::builder()
            .significant_digits(5)
            .ignore_order(true)
            .number_to_string(|n, _, _| format!("{:.0}", n.as_f64()))
            .build()
            .unwrap();
        assert!(diff(&Value::from(2.6), &Value::from(3.4), &config).is_empty());

        let a = Value::list(vec![2.6.into(), 10.2.into()]);
        let b = Value::list(vec![10.4.into(), 3.1.into()]);
        assert!(diff(&a, &b, &config).is_empty());

        let plain = Config::builder().significant_digits(5).build().unwrap();
        assert!(!diff(&Value::from(2.6), &Value::from(3.4), &plain).is_empty());
    }

    #[test]
    fn test_report_repetition_in_positional_mode() {
        let config = Config::builder().report_repetition(true).build().unwrap();
        let report = diff(&ints(&[1, 1, 2]), &ints(&[1, 2, 2]), &config);
        assert_eq!(kinds(&report), vec![(ReportType::ValuesChanged, "root[1]".to_string())]);
    }

    #[test]
    fn test_math_epsilon() {
        let config = Config::builder().math_epsilon(0.01).build().unwrap();
        assert!(diff(&Value::from(1.0), &Value::from(1.005), &config).is_empty());
        assert!(!diff(&Value::from(1.0), &Value::from(1.02), &config).is_empty());
    }

    #[test]
    fn test_excluded_path() {
        let config = Config::builder().exclude_path("root['secret']").build().unwrap();
        let a = Value::map(vec![("secret", 1), ("x", 2)]);
        let b = Value::map(vec![("secret", 99), ("x", 3)]);
        let report = diff(&a, &b, &config);
        assert_eq!(kinds(&report), vec![(ReportType::ValuesChanged, "root['x']".to_string())]);
    }

    #[test]
    fn test_excluded_regex_path_and_type() {
        let config = Config::builder()
            .exclude_regex_path(r"\['tmp_\w+'\]")
            .exclude_type("float")
            .build()
            .unwrap();
        let a = Value::map(vec![
            (Value::text("tmp_a"), Value::from(1)),
            (Value::text("ratio"), Value::from(0.5)),
            (Value::text("n"), Value::from(1)),
        ]);
        let b = Value::map(vec![
            (Value::text("tmp_b"), Value::from(2)),
            (Value::text("ratio"), Value::from(0.25)),
            (Value::text("n"), Value::from(2)),
        ]);
        let report = diff(&a, &b, &config);
        assert_eq!(kinds(&report), vec![(ReportType::ValuesChanged, "root['n']".to_string())]);
    }

    #[test]
    fn test_type_changes() {
        let a = Value::map(vec![("a", Value::from(1))]);
        let b = Value::map(vec![("a", Value::text("1"))]);
        let report = diff(&a, &b, &Config::default());
        assert_eq!(
            report.get(ReportType::TypeChanges, "root['a']"),
            Some(&ChangeRecord::TypeChange {
                old_type: TypeTag::INT,
                new_type: TypeTag::STR,
                old_value: Value::from(1),
                new_value: Value::text("1"),
            })
        );

        let report = diff(&Value::from(true), &Value::from(1), &Config::default());
        assert_eq!(kinds(&report), vec![(ReportType::TypeChanges, "root".to_string())]);
    }

    #[test]
    fn test_numeric_type_changes_ignored() {
        let strict = diff(&Value::from(1), &Value::from(1.0), &Config::default());
        assert_eq!(kinds(&strict), vec![(ReportType::TypeChanges, "root".to_string())]);

        let config = Config::builder()
            .ignore_numeric_type_changes(true)
            .build()
            .unwrap();
        assert!(diff(&Value::from(1), &Value::from(1.0), &config).is_empty());
        assert!(diff(&ints(&[1, 2]), &Value::list(vec![1.0.into(), 2.0.into()]), &config).is_empty());
        assert!(!diff(&Value::from(1), &Value::from(1.5), &config).is_empty());
    }

    #[test]
    fn test_type_groups() {
        let config = Config::builder()
            .ignore_type_in_group(TypeGroup::of([TypeTag::LIST, TypeTag::TUPLE]))
            .build()
            .unwrap();
        let list = ints(&[1, 2]);
        let tuple = Value::tuple(vec![1.into(), 2.into()]);
        assert!(diff(&list, &tuple, &config).is_empty());

        let config = Config::builder()
            .ignore_type_in_group(TypeGroup::of([TypeTag::LIST, TypeTag::SET]))
            .build()
            .unwrap();
        let set = Value::set(vec![2.into(), 1.into()]);
        assert!(diff(&list, &set, &config).is_empty());
        let other = Value::set(vec![3.into(), 1.into()]);
        let report = diff(&list, &other, &config);
        assert_eq!(kinds(&report), vec![(ReportType::ValuesChanged, "root".to_string())]);
    }

    #[test]
    fn test_string_folding() {
        let config = Config::builder().ignore_string_case(true).build().unwrap();
        assert!(diff(&Value::text("Hello"), &Value::text("hello"), &config).is_empty());

        let config = Config::builder()
            .ignore_string_type_changes(true)
            .build()
            .unwrap();
        assert!(diff(&Value::text("abc"), &Value::bytes("abc"), &config).is_empty());
        assert!(!diff(&Value::text("abc"), &Value::bytes("abd"), &config).is_empty());
    }

    #[test]
    fn test_multiline_text_carries_line_diff() {
        let report = diff(&Value::text("a\nb"), &Value::text("a\nc"), &Config::default());
        match report.get(ReportType::ValuesChanged, "root") {
            Some(ChangeRecord::ValueChange { diff: Some(lines), .. }) => {
                assert!(lines.contains("\n-b"));
                assert!(lines.contains("\n+c"));
            }
            other => panic!("unexpected record: {:?}", other),
        }
    }

    #[test]
    fn test_nan_inequality() {
        let nan = Value::from(f64::NAN);
        let report = diff(&nan, &Value::from(f64::NAN), &Config::default());
        assert_eq!(kinds(&report), vec![(ReportType::ValuesChanged, "root".to_string())]);

        let config = Config::builder().ignore_nan_inequality(true).build().unwrap();
        assert!(diff(&nan, &Value::from(f64::NAN), &config).is_empty());
    }

    #[test]
    fn test_records() {
        let a = Value::record("Point", vec![("x", 1), ("y", 2), ("__id", 7)]);
        let b = Value::record("Point", vec![("x", 5), ("z", 3), ("__id", 8)]);
        let report = diff(&a, &b, &Config::default());
        assert_eq!(
            kinds(&report),
            vec![
                (ReportType::AttributeAdded, "root.z".to_string()),
                (ReportType::AttributeRemoved, "root.y".to_string()),
                (ReportType::ValuesChanged, "root.x".to_string()),
            ]
        );
    }

    #[test]
    fn test_named_tuples_compare_by_field() {
        let a = Value::named_tuple("Pair", vec![("left", 1), ("right", 2)]);
        let b = Value::named_tuple("Pair", vec![("left", 1), ("right", 3)]);
        let report = diff(&a, &b, &Config::default());
        assert_eq!(report.paths(ReportType::ValuesChanged), vec!["root.right"]);
    }

    #[test]
    fn test_private_keys_ignored() {
        let a = Value::map(vec![("__cache", 1), ("a", 1)]);
        let b = Value::map(vec![("__cache", 2), ("a", 1)]);
        assert!(diff(&a, &b, &Config::default()).is_empty());

        let config = Config::builder()
            .ignore_private_variables(false)
            .build()
            .unwrap();
        assert_eq!(
            diff(&a, &b, &config).paths(ReportType::ValuesChanged),
            vec!["root['__cache']"]
        );
    }

    #[test]
    fn test_sets() {
        let a = Value::set(vec![1.into(), 2.into(), 3.into()]);
        let b = Value::set(vec![2.into(), 3.into(), 4.into()]);
        let report = diff(&a, &b, &Config::default());
        assert_eq!(
            kinds(&report),
            vec![
                (ReportType::SetItemAdded, "root[4]".to_string()),
                (ReportType::SetItemRemoved, "root[1]".to_string()),
            ]
        );

        let frozen = Value::frozenset(vec![1.into(), 2.into(), 3.into()]);
        let report = diff(&a, &frozen, &Config::default());
        assert_eq!(kinds(&report), vec![(ReportType::TypeChanges, "root".to_string())]);
    }

    #[test]
    fn test_opaque_values_unprocessed() {
        let a = Value::list(vec![Value::opaque("Socket", "fd=3")]);
        let b = Value::list(vec![Value::opaque("Socket", "fd=3")]);
        let report = diff(&a, &b, &Config::default());

        assert_eq!(kinds(&report), vec![(ReportType::Unprocessed, "root[0]".to_string())]);
        assert_eq!(
            report.diagnostics().warnings(),
            &[Warning::Unprocessed {
                path: "root[0]".to_string(),
                type_tag: TypeTag::new("Socket"),
            }]
        );

        let shared = Value::opaque("Socket", "fd=3");
        let a = Value::list(vec![shared.clone()]);
        let b = Value::list(vec![shared]);
        assert!(diff(&a, &b, &Config::default()).is_empty());
    }

    #[test]
    fn test_key_collision_warning() {
        let config = Config::builder().ignore_string_case(true).build().unwrap();
        let a = Value::map(vec![("A", 1), ("a", 1)]);
        let b = Value::map(vec![("a", 1)]);
        let report = diff(&a, &b, &config);

        assert!(report.is_empty());
        assert_eq!(
            report.diagnostics().warnings(),
            &[Warning::KeyCollision {
                path: "root".to_string(),
                key: "str:a".to_string(),
            }]
        );
    }

    #[test]
    fn test_tree_report_keeps_levels() {
        let a = Value::map(vec![("a", Value::map(vec![("b", 1)]))]);
        let b = Value::map(vec![("a", Value::map(vec![("b", 2)]))]);
        let tree = diff_tree(&a, &b, &Config::default());

        let changes = tree.get(ReportType::ValuesChanged);
        assert_eq!(changes.len(), 1);
        let level = &changes[0].level;
        assert_eq!(level.path(), "root['a']['b']");
        assert_eq!(level.left(), Some(&Value::from(1)));
        assert_eq!(level.right(), Some(&Value::from(2)));
        assert_eq!(level.report_type(), Some(ReportType::ValuesChanged));
        assert_eq!(level.parent().map(|p| p.path()), Some("root['a']"));
        assert_eq!(level.depth(), 2);
    }

    #[test]
    fn test_cache_reuse_across_comparisons() {
        let config = ignore_order();
        let baseline = Value::list(vec![Value::map(vec![("a", 1)]), 2.into()]);

        let mut engine = DeepDiff::new(&config);
        let first = engine.compare(&baseline, &ints(&[2]));
        assert_eq!(first.len(), 1);
        let cache = engine.into_cache();
        assert!(!cache.is_empty());

        let mut engine = DeepDiff::new(&config).with_cache(cache);
        let second = engine.compare(&baseline, &Value::list(vec![2.into(), Value::map(vec![("a", 1)])]));
        assert!(second.is_empty());
    }

    #[test]
    fn test_engine_forgets_dropped_inputs() {
        let config = ignore_order();
        let mut engine = DeepDiff::new(&config);
        for i in 0..50 {
            let a = Value::list(vec![Value::map(vec![("a", i)])]);
            let b = Value::list(vec![Value::map(vec![("a", i + 1)])]);
            assert!(!engine.compare(&a, &b).is_empty());
        }

        let a = Value::list(vec![Value::map(vec![("a", 7)])]);
        let b = Value::list(vec![Value::map(vec![("a", 7)])]);
        assert!(engine.compare(&a, &b).is_empty());
        let c = Value::list(vec![Value::map(vec![("a", 8)])]);
        assert!(!engine.compare(&a, &c).is_empty());
    }

    #[test]
    fn test_set_members_sharing_a_path() {
        let left = Value::set(vec![]);
        if let Value::Set(node) = &left {
            let mut members = node.borrow_mut();
            members.items.push(Value::opaque("Socket", "fd=3"));
            members.items.push(Value::opaque("Socket", "fd=3"));
        }
        let report = diff(&left, &Value::set(vec![]), &Config::default());

        assert_eq!(report.paths(ReportType::SetItemRemoved).len(), 1);
        assert!(report.diagnostics().warnings().iter().any(|w| matches!(
            w,
            Warning::PathCollision {
                report_type: ReportType::SetItemRemoved,
                ..
            }
        )));
    }

    proptest! {
        #[test]
        fn prop_added_and_removed_are_symmetric(
            left in proptest::collection::btree_map("[a-e]", 0i64..4, 0..5),
            right in proptest::collection::btree_map("[a-e]", 0i64..4, 0..5),
        ) {
            let config = Config::default();
            let a = Value::map(left);
            let b = Value::map(right);
            let forward = diff(&a, &b, &config);
            let backward = diff(&b, &a, &config);

            prop_assert_eq!(
                forward.paths(ReportType::DictionaryItemAdded),
                backward.paths(ReportType::DictionaryItemRemoved)
            );
            prop_assert_eq!(
                forward.paths(ReportType::DictionaryItemRemoved),
                backward.paths(ReportType::DictionaryItemAdded)
            );
            prop_assert_eq!(
                forward.paths(ReportType::ValuesChanged),
                backward.paths(ReportType::ValuesChanged)
            );
        }

        #[test]
        fn prop_self_diff_is_empty(items in proptest::collection::vec(any::<i64>(), 0..12)) {
            let value = ints(&items);
            let copy = ints(&items);
            prop_assert!(diff(&value, &copy, &Config::default()).is_empty());
            prop_assert!(diff(&value, &copy, &ignore_order()).is_empty());
        }
    }
}
