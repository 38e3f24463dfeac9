use proptest::prelude::*;
use routeloom::pattern::PathPattern;
use routeloom::record::Record;
use std::collections::BTreeMap;

fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}"
}

fn record() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(field_name(), any::<i64>(), 0..12)
        .prop_map(|map| Record::from_pairs(map).unwrap())
}

fn keys(record: &Record) -> Vec<String> {
    record.keys().map(|k| k.as_str().to_string()).collect()
}

proptest! {
    #[test]
    fn union_is_idempotent(a in record()) {
        prop_assert_eq!(a.union(&a), a.clone());
    }

    #[test]
    fn union_shape_is_commutative(a in record(), b in record()) {
        prop_assert_eq!(a.union(&b).schema(), b.union(&a).schema());
    }

    #[test]
    fn union_newer_value_wins(a in record(), b in record()) {
        let merged = a.union(&b);
        for (name, value) in merged.iter() {
            let expected = b.get(name.as_str()).or_else(|| a.get(name.as_str()));
            prop_assert_eq!(Some(value), expected);
        }
        prop_assert_eq!(merged.len(), a.len() + b.subtract(&a).len());
    }

    #[test]
    fn union_keys_are_sorted_and_unique(a in record(), b in record()) {
        let names = keys(&a.union(&b));
        let mut sorted = names.clone();
        sorted.sort();
        sorted.dedup();
        prop_assert_eq!(names, sorted);
    }

    #[test]
    fn intersection_and_difference_partition_keys(a in record(), b in record()) {
        let shared = a.intersection(&b);
        let exclusive = a.difference(&b);
        let mut all: Vec<String> = keys(&shared);
        all.extend(keys(&exclusive));
        all.sort();

        let mut expected: Vec<String> = keys(&a.union(&b));
        expected.sort();
        prop_assert_eq!(all, expected);
        prop_assert!(keys(&shared).iter().all(|k| a.contains(k) && b.contains(k)));
    }

    #[test]
    fn subtract_removes_other_keys(a in record(), b in record()) {
        let rest = a.subtract(&b);
        prop_assert!(rest.keys().all(|k| !b.contains(k.as_str())));
        prop_assert_eq!(rest.union(&a.intersection(&b)), a.clone());
    }

    #[test]
    fn pattern_captures_every_param(
        segments in prop::collection::btree_map(field_name(), "[A-Za-z0-9._~-]{1,12}", 1..6)
    ) {
        let segments: BTreeMap<String, String> = segments;
        let source: String = segments.keys().map(|name| format!("/seg/:{name}")).collect();
        let path: String = segments.values().map(|value| format!("/seg/{value}")).collect();

        let pattern = PathPattern::compile(&source).unwrap();
        let m = pattern.match_prefix(&format!("{path}/rest")).unwrap();

        prop_assert_eq!(m.consumed, path.len());
        prop_assert_eq!(m.captures.len(), segments.len());
        for (name, value) in &segments {
            prop_assert_eq!(m.captures.get_str(name), Some(value.as_str()));
        }
    }
}
