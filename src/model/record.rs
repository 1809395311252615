use serde_json::Value;

/// One synthesized document: field name -> value, in schema-builder insertion
/// order. Distortion passes change values only, never the key set or order.
pub type Record = serde_json::Map<String, Value>;

/// Whether a value counts as empty for garbage selection: null, `false`, zero,
/// empty strings and empty collections.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Integer-valued numbers. Booleans and floats are not integers here.
pub fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_values() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!([]), json!({})] {
            assert!(is_blank(&v), "{v} should be blank");
        }
        for v in [json!(true), json!(3), json!("x"), json!(["a"]), json!({"k": 1})] {
            assert!(!is_blank(&v), "{v} should not be blank");
        }
    }

    #[test]
    fn integers_exclude_bools_and_floats() {
        assert!(is_integer(&json!(41)));
        assert!(is_integer(&json!(-3)));
        assert!(!is_integer(&json!(41.0)));
        assert!(!is_integer(&json!(true)));
        assert!(!is_integer(&json!("41")));
    }

    #[test]
    fn record_keeps_insertion_order() {
        let mut record = Record::new();
        record.insert("zeta".into(), json!(1));
        record.insert("alpha".into(), json!(2));
        record.insert("doc_type".into(), json!("lab"));
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "doc_type"]);
    }
}
