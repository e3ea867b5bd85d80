//! Flattens a parsed tree into its minimal, JSON-like shape.
//!
//! A pure transformation: class metadata (`extends`, class-descriptor
//! values) is stripped, and a record reduced to a lone `value` key, or
//! carrying both `value` and `@`, is replaced by the value itself.

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::{Record, Value};

/// Flattens a sequence of top-level content values.
pub fn json_friendly_array(values: Vec<Value>) -> Vec<Value> {
    let mut seen = Vec::new();
    values
        .into_iter()
        .map(|value| friendly(value, &mut seen))
        .collect()
}

/// Flattens a single value.
pub fn json_friendly(value: Value) -> Value {
    friendly(value, &mut Vec::new())
}

fn friendly(value: Value, seen: &mut Vec<*const RefCell<Record>>) -> Value {
    match value {
        Value::Object(record) => {
            let ptr = Rc::as_ptr(&record);
            // An object can reference itself through the handle table; a
            // record reached while already being flattened becomes null.
            if seen.contains(&ptr) {
                return Value::Null;
            }
            seen.push(ptr);
            let entries: Vec<(String, Value)> = record
                .borrow()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let mut out = Record::new();
            for (key, value) in entries {
                if key == "extends" {
                    continue;
                }
                if matches!(value, Value::ClassDesc(_)) {
                    continue;
                }
                out.insert(key, friendly(value, seen));
            }
            seen.pop();
            if let Some(value) = out.get("value") {
                if out.contains_key("@") || out.len() == 1 {
                    return value.clone();
                }
            }
            Value::record(out)
        }
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| friendly(item, seen))
                .collect(),
        ),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ClassDesc;

    fn class_desc() -> Value {
        Value::ClassDesc(Rc::new(RefCell::new(ClassDesc {
            name: "SomeClass".into(),
            serial_version_uid: "1234567887654321".into(),
            ..Default::default()
        })))
    }

    #[test]
    fn drops_extends_and_class_values() {
        let mut rec = Record::new();
        rec.insert("class", class_desc());
        rec.insert("extends", Value::record(Record::new()));
        rec.insert("foo", Value::Int(123));
        let out = json_friendly(Value::record(rec));
        let mut expected = Record::new();
        expected.insert("foo", Value::Int(123));
        assert_eq!(out, Value::record(expected));
    }

    #[test]
    fn promotes_lone_value_key() {
        let mut rec = Record::new();
        rec.insert("class", class_desc());
        rec.insert("value", Value::Int(7));
        assert_eq!(json_friendly(Value::record(rec)), Value::Int(7));
    }

    #[test]
    fn promotes_value_next_to_annotations() {
        let mut rec = Record::new();
        rec.insert("size", Value::Int(1));
        rec.insert("@", Value::Array(vec![Value::Bytes(vec![0, 0, 0, 1])]));
        rec.insert("value", Value::Array(vec![Value::Str("foo".into())]));
        assert_eq!(
            json_friendly(Value::record(rec)),
            Value::Array(vec![Value::Str("foo".into())])
        );
    }

    #[test]
    fn keeps_value_among_other_fields() {
        let mut rec = Record::new();
        rec.insert("value", Value::Int(7));
        rec.insert("other", Value::Int(8));
        let out = json_friendly(Value::record(rec.clone()));
        assert_eq!(out, Value::record(rec));
    }

    #[test]
    fn arrays_flatten_element_wise() {
        let mut boxed = Record::new();
        boxed.insert("class", class_desc());
        boxed.insert("value", Value::Int(1));
        let out = json_friendly(Value::Array(vec![
            Value::record(boxed),
            Value::Str("x".into()),
        ]));
        assert_eq!(
            out,
            Value::Array(vec![Value::Int(1), Value::Str("x".into())])
        );
    }

    #[test]
    fn self_referential_record_terminates() {
        let rec = Record::new().shared();
        rec.borrow_mut().insert("me", Value::Object(rec.clone()));
        let out = json_friendly(Value::Object(rec));
        let mut expected = Record::new();
        expected.insert("me", Value::Null);
        assert_eq!(out, Value::record(expected));
    }

    #[test]
    fn flatten_is_pure() {
        let mut rec = Record::new();
        rec.insert("class", class_desc());
        rec.insert("value", Value::Str("ONE".into()));
        let input = Value::record(rec);
        let first = json_friendly(input.clone());
        let second = json_friendly(input);
        assert_eq!(first, second);
    }
}
