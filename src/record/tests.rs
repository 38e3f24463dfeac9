use super::*;
use serde::Deserialize;
use serde_json::json;

fn rec(pairs: &[(&'static str, serde_json::Value)]) -> Record {
    Record::from_pairs(pairs.iter().cloned()).unwrap()
}

#[test]
fn test_from_pairs_sorts_keys() {
    let r = rec(&[("b", json!(2)), ("a", json!(1))]);
    let keys: Vec<&str> = r.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["a", "b"]);
}

#[test]
fn test_from_pairs_rejects_duplicates() {
    let err = Record::from_pairs([("id", "1"), ("id", "2")]).unwrap_err();
    assert!(matches!(err, RecordError::DuplicateField { ref name } if name == "id"));
}

#[test]
fn test_union_new_wins_and_keeps_extras() {
    let old = rec(&[("id", json!("1")), ("org", json!("acme"))]);
    let new = rec(&[("id", json!("42")), ("team", json!("core"))]);
    let merged = old.union(&new);
    assert_eq!(merged.get_str("id"), Some("42"));
    assert_eq!(merged.get_str("org"), Some("acme"));
    assert_eq!(merged.get_str("team"), Some("core"));
    assert_eq!(merged.len(), 3);
}

#[test]
fn test_schema_of_record() {
    let r = rec(&[("age", json!(7)), ("name", json!("rex")), ("w", json!(1.5))]);
    let s = r.schema();
    assert_eq!(s.kind_of("age"), Some(FieldKind::Integer));
    assert_eq!(s.kind_of("name"), Some(FieldKind::String));
    assert_eq!(s.kind_of("w"), Some(FieldKind::Number));
}

#[test]
fn test_convert_lenient_moves_extras_and_defaults_missing() {
    let target = Schema::new([("age", FieldKind::Integer), ("name", FieldKind::String)]).unwrap();
    let source = rec(&[("age", json!("12")), ("nickname", json!("bo"))]);

    let conv = source.convert(&target, ConversionPolicy::Lenient).unwrap();

    assert_eq!(conv.record.get_i64("age"), Some(12));
    assert_eq!(conv.record.get_str("name"), Some(""));
    assert_eq!(conv.missing, vec![crate::fixed_str::FieldName::from("name")]);
    assert_eq!(conv.extras.get("nickname"), Some(&json!("bo")));
    assert_eq!(conv.record.schema().len(), 2);
}

#[test]
fn test_convert_strict_reports_missing() {
    let target = Schema::strings(["id", "slug"]).unwrap();
    let source = rec(&[("id", json!("1"))]);
    let err = source.convert(&target, ConversionPolicy::Strict).unwrap_err();
    match err {
        RecordError::MissingFields { fields } => {
            assert_eq!(fields.len(), 1);
            assert_eq!(fields[0], "slug");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_convert_strict_reports_mistyped() {
    let target = Schema::new([("age", FieldKind::Integer)]).unwrap();
    let source = rec(&[("age", json!("old"))]);
    let err = source.convert(&target, ConversionPolicy::Strict).unwrap_err();
    assert!(matches!(err, RecordError::Mistyped { expected: FieldKind::Integer, .. }));
}

#[test]
fn test_deserialize_typed_view() {
    #[derive(Deserialize)]
    struct Params {
        #[serde(rename = "userId")]
        user_id: String,
    }
    let r = rec(&[("userId", json!("42"))]);
    let p: Params = r.deserialize().unwrap();
    assert_eq!(p.user_id, "42");
}

#[test]
fn test_from_json_requires_object() {
    assert!(Record::from_json(json!({"a": 1})).is_ok());
    let err = Record::from_json(json!([1, 2])).unwrap_err();
    assert!(matches!(err, RecordError::NotAnObject { found: "array" }));
}

#[test]
fn test_with_replaces_value() {
    let r = rec(&[("a", json!(1))]).with("a", 2).with("b", 3);
    assert_eq!(r.get("a"), Some(&json!(2)));
    assert_eq!(r.get("b"), Some(&json!(3)));
}

#[test]
fn test_schema_kind_conflicts() {
    let a = Schema::new([("age", FieldKind::Integer), ("x", FieldKind::Any)]).unwrap();
    let b = Schema::new([("age", FieldKind::String), ("x", FieldKind::Boolean)]).unwrap();
    let conflicts = a.kind_conflicts(&b);
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0], "age");
}

#[test]
fn test_schema_display() {
    let s = Schema::new([("b", FieldKind::Boolean), ("a", FieldKind::String)]).unwrap();
    assert_eq!(s.to_string(), "{a: string, b: boolean}");
}
