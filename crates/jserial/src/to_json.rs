//! Conversion from the parsed [`Value`] tree to [`serde_json::Value`].
//!
//! Byte sequences become `data:application/octet-stream;base64,` strings so
//! the output survives a plain-JSON round trip; class descriptors render as
//! their `name@serialVersionUID` signature.

use std::cell::RefCell;
use std::rc::Rc;

use base64::prelude::*;
use serde_json::{Map, Value as Json};

use crate::value::{Record, Value};

const DATA_URI_PREFIX: &str = "data:application/octet-stream;base64,";

/// Converts a parsed value to JSON.
pub fn to_json(value: &Value) -> Json {
    convert(value, &mut Vec::new())
}

fn convert(value: &Value, seen: &mut Vec<*const RefCell<Record>>) -> Json {
    match value {
        Value::Null | Value::EndBlock => Json::Null,
        Value::Bool(b) => Json::from(*b),
        Value::Byte(n) => Json::from(*n),
        Value::Short(n) => Json::from(*n),
        Value::Int(n) => Json::from(*n),
        Value::Long(n) => Json::from(*n),
        Value::Float(f) => Json::from(*f),
        Value::Double(d) => Json::from(*d),
        Value::Char(c) => Json::String(c.to_string()),
        Value::Str(s) => Json::String(s.clone()),
        Value::Bytes(bytes) => {
            Json::String(format!("{DATA_URI_PREFIX}{}", BASE64_STANDARD.encode(bytes)))
        }
        Value::Array(items) => Json::Array(items.iter().map(|v| convert(v, seen)).collect()),
        Value::Object(record) => {
            let ptr = Rc::as_ptr(record);
            if seen.contains(&ptr) {
                return Json::Null;
            }
            seen.push(ptr);
            let mut map = Map::new();
            for (key, value) in record.borrow().iter() {
                map.insert(key.clone(), convert(value, seen));
            }
            seen.pop();
            Json::Object(map)
        }
        Value::ClassDesc(cls) => Json::String(cls.borrow().signature()),
        Value::Date(millis) => Json::from(*millis),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars() {
        assert_eq!(to_json(&Value::Null), json!(null));
        assert_eq!(to_json(&Value::Bool(true)), json!(true));
        assert_eq!(to_json(&Value::Byte(-21)), json!(-21));
        assert_eq!(to_json(&Value::Short(-456)), json!(-456));
        assert_eq!(to_json(&Value::Int(-123)), json!(-123));
        assert_eq!(to_json(&Value::Long(-789)), json!(-789));
        assert_eq!(to_json(&Value::Double(12.34)), json!(12.34));
        assert_eq!(to_json(&Value::Char('ሴ')), json!("ሴ"));
        assert_eq!(to_json(&Value::Date(403_879_620_000i64)), json!(403_879_620_000i64));
    }

    #[test]
    fn float_widens_losslessly() {
        assert_eq!(to_json(&Value::Float(76.5)), json!(76.5));
    }

    #[test]
    fn bytes_become_data_uri() {
        let out = to_json(&Value::Bytes(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(out, json!("data:application/octet-stream;base64,3q2+7w=="));
    }

    #[test]
    fn records_become_objects() {
        let mut rec = Record::new();
        rec.insert("foo", Value::Int(1));
        rec.insert("bar", Value::Array(vec![Value::Str("x".into())]));
        assert_eq!(
            to_json(&Value::record(rec)),
            json!({"foo": 1, "bar": ["x"]})
        );
    }

    #[test]
    fn cyclic_record_renders_null_at_the_knot() {
        let rec = Record::new().shared();
        rec.borrow_mut().insert("me", Value::Object(rec.clone()));
        assert_eq!(to_json(&Value::Object(rec)), json!({"me": null}));
    }
}
