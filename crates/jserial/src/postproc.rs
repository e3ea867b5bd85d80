//! Post-processors: reshape the custom-serialization payload of well-known
//! container classes into a first-class `value` field.
//!
//! Keyed by exact `className@serialVersionUID`; the serialVersionUID values
//! are protocol constants of the JDK classes. A class with no registered
//! post-processor keeps its raw `@` annotation sequence.

use crate::error::ParseError;
use crate::value::{ObjectRef, Record, Value};

/// Reshapes the record the class-data reader built, given the raw
/// annotation sequence. Mutates the record in place.
pub type PostProc = fn(&ObjectRef, &[Value]) -> Result<(), ParseError>;

/// The registry: built once, immutable, process-wide.
pub const KNOWN_POST_PROCS: &[(&str, PostProc)] = &[
    ("java.util.ArrayList@7881d21d99c7619d", list_post_proc),
    ("java.util.ArrayDeque@207cda2e240da08b", list_post_proc),
    ("java.util.Hashtable@13bb0f25214ae4b8", map_post_proc),
    ("java.util.HashMap@0507dac1c31660d1", map_post_proc),
    ("java.util.EnumMap@065d7df7be907ca1", enum_map_post_proc),
    ("java.util.HashSet@ba44859596b8b734", hash_set_post_proc),
    ("java.util.Date@686a81014b597419", date_post_proc),
];

/// Looks up the post-processor for a `className@serialVersionUID` signature.
pub fn lookup(signature: &str) -> Option<PostProc> {
    KNOWN_POST_PROCS
        .iter()
        .find(|(sig, _)| *sig == signature)
        .map(|&(_, post_proc)| post_proc)
}

fn shape(message: impl Into<String>) -> ParseError {
    ParseError::UnexpectedShape(message.into())
}

/// Reads the container size as a big-endian i32 at `offset` within the
/// first annotation element, which must be a block-data payload.
fn post_proc_size(data: &[Value], offset: usize) -> Result<i32, ParseError> {
    let Some(first) = data.first() else {
        return Err(shape("invalid data: at least one element required"));
    };
    let Value::Bytes(bytes) = first else {
        return Err(shape("unexpected data at position 0"));
    };
    if bytes.len() < offset + 4 {
        return Err(shape(format!(
            "incorrect data at position 0: wanted at least {} bytes, got {}",
            offset + 4,
            bytes.len()
        )));
    }
    Ok(i32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ]))
}

fn element_count_error(want: i32, data: &[Value]) -> ParseError {
    shape(format!(
        "incorrect number of elements: want {} got {}",
        want,
        data.len() - 1
    ))
}

/// ArrayList / ArrayDeque: a 4-byte size prefix, then the elements.
///
/// The effective element slice is `data[1..size]`; the final payload
/// element never reaches the synthesized list. Consumers depend on this
/// exact slicing.
fn list_post_proc(fields: &ObjectRef, data: &[Value]) -> Result<(), ParseError> {
    let size = post_proc_size(data, 0)?;
    if data.len() as i64 != i64::from(size) + 1 {
        return Err(element_count_error(size, data));
    }
    let value = if size > 1 {
        Value::Array(data[1..size as usize].to_vec())
    } else {
        Value::Array(Vec::new())
    };
    fields.borrow_mut().insert("value", value);
    Ok(())
}

/// HashMap / Hashtable: the first annotation carries bucket capacity
/// (ignored) then size; entries alternate key, value. Non-string keys are
/// dropped.
fn map_post_proc(fields: &ObjectRef, data: &[Value]) -> Result<(), ParseError> {
    let size = post_proc_size(data, 4)?;
    if i64::from(size) * 2 + 1 > data.len() as i64 {
        return Err(element_count_error(size, data));
    }
    let mut map = Record::new();
    for i in 0..size.max(0) as usize {
        let key = &data[2 * i + 1];
        let value = &data[2 * i + 2];
        if let Value::Str(key) = key {
            map.insert(key.clone(), value.clone());
        }
    }
    fields.borrow_mut().insert("value", Value::record(map));
    Ok(())
}

/// EnumMap: size, then alternating enum-constant record and value; the
/// constant name becomes the map key.
fn enum_map_post_proc(fields: &ObjectRef, data: &[Value]) -> Result<(), ParseError> {
    let size = post_proc_size(data, 0)?;
    if i64::from(size) * 2 + 1 > data.len() as i64 {
        return Err(element_count_error(size, data));
    }
    let mut map = Record::new();
    for i in 0..size.max(0) as usize {
        let key = &data[2 * i + 1];
        let value = &data[2 * i + 2];
        if let Value::Object(record) = key {
            if let Some(Value::Str(name)) = record.borrow().get("value") {
                map.insert(name.clone(), value.clone());
            }
        }
    }
    fields.borrow_mut().insert("value", Value::record(map));
    Ok(())
}

/// HashSet: capacity and load factor (ignored) then size; members follow.
/// String members map to `true`; the member slice is `data[1..size]`, the
/// same slicing as the list reshape.
fn hash_set_post_proc(fields: &ObjectRef, data: &[Value]) -> Result<(), ParseError> {
    let size = post_proc_size(data, 8)?;
    if data.len() as i64 != i64::from(size) + 1 {
        return Err(element_count_error(size, data));
    }
    let mut set = Record::new();
    if size > 1 {
        for member in &data[1..size as usize] {
            if let Value::Str(name) = member {
                set.insert(name.clone(), Value::Bool(true));
            }
        }
    }
    fields.borrow_mut().insert("value", Value::record(set));
    Ok(())
}

/// Date: the first annotation is 8 bytes of big-endian epoch milliseconds.
fn date_post_proc(fields: &ObjectRef, data: &[Value]) -> Result<(), ParseError> {
    let Some(first) = data.first() else {
        return Err(shape("invalid data: at least one element required"));
    };
    let Value::Bytes(bytes) = first else {
        return Err(shape("unexpected data at position 0"));
    };
    if bytes.len() < 8 {
        return Err(shape(format!(
            "incorrect data at position 0: wanted 8 bytes, got {}",
            bytes.len()
        )));
    }
    let millis = i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ]);
    fields.borrow_mut().insert("value", Value::Date(millis));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size_prefix(size: i32) -> Value {
        Value::Bytes(size.to_be_bytes().to_vec())
    }

    #[test]
    fn lookup_known_and_unknown_signatures() {
        assert!(lookup("java.util.HashMap@0507dac1c31660d1").is_some());
        assert!(lookup("java.util.HashMap@0000000000000000").is_none());
        assert!(lookup("com.example.Custom@1234567887654321").is_none());
    }

    #[test]
    fn list_keeps_elements_before_the_size_index() {
        let fields = Record::new().shared();
        let data = vec![
            size_prefix(2),
            Value::Str("foo".into()),
            Value::Int(123),
        ];
        list_post_proc(&fields, &data).unwrap();
        assert_eq!(
            fields.borrow().get("value"),
            Some(&Value::Array(vec![Value::Str("foo".into())]))
        );
    }

    #[test]
    fn list_size_one_is_empty() {
        let fields = Record::new().shared();
        let data = vec![size_prefix(1), Value::Str("only".into())];
        list_post_proc(&fields, &data).unwrap();
        assert_eq!(
            fields.borrow().get("value"),
            Some(&Value::Array(Vec::new()))
        );
    }

    #[test]
    fn list_element_count_mismatch() {
        let fields = Record::new().shared();
        let data = vec![size_prefix(3), Value::Str("foo".into())];
        let err = list_post_proc(&fields, &data).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedShape(_)));
    }

    #[test]
    fn size_prefix_must_be_bytes() {
        let fields = Record::new().shared();
        let data = vec![Value::Str("not bytes".into())];
        let err = list_post_proc(&fields, &data).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedShape(_)));
    }

    #[test]
    fn map_drops_non_string_keys() {
        let fields = Record::new().shared();
        let mut prefix = vec![0u8; 4];
        prefix.extend_from_slice(&2i32.to_be_bytes());
        let data = vec![
            Value::Bytes(prefix),
            Value::Str("bar".into()),
            Value::Str("baz".into()),
            Value::Int(7),
            Value::Str("dropped".into()),
        ];
        map_post_proc(&fields, &data).unwrap();
        let fields = fields.borrow();
        let Some(Value::Object(map)) = fields.get("value") else {
            panic!("expected map value");
        };
        let map = map.borrow();
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("bar"), Some(&Value::Str("baz".into())));
    }

    #[test]
    fn enum_map_keys_come_from_constant_records() {
        let fields = Record::new().shared();
        let mut constant = Record::new();
        constant.insert("value", Value::Str("ONE".into()));
        let data = vec![
            size_prefix(1),
            Value::record(constant),
            Value::Int(123),
        ];
        enum_map_post_proc(&fields, &data).unwrap();
        let fields = fields.borrow();
        let Some(Value::Object(map)) = fields.get("value") else {
            panic!("expected map value");
        };
        assert_eq!(map.borrow().get("ONE"), Some(&Value::Int(123)));
    }

    #[test]
    fn hash_set_members_map_to_true() {
        let fields = Record::new().shared();
        let mut prefix = vec![0u8; 8];
        prefix.extend_from_slice(&2i32.to_be_bytes());
        let data = vec![
            Value::Bytes(prefix),
            Value::Str("foo".into()),
            Value::Int(99),
        ];
        hash_set_post_proc(&fields, &data).unwrap();
        let fields = fields.borrow();
        let Some(Value::Object(set)) = fields.get("value") else {
            panic!("expected set value");
        };
        let set = set.borrow();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("foo"), Some(&Value::Bool(true)));
    }

    #[test]
    fn date_reads_big_endian_millis() {
        let fields = Record::new().shared();
        let data = vec![Value::Bytes(403_879_620_000i64.to_be_bytes().to_vec())];
        date_post_proc(&fields, &data).unwrap();
        assert_eq!(
            fields.borrow().get("value"),
            Some(&Value::Date(403_879_620_000))
        );
    }

    #[test]
    fn date_payload_too_short() {
        let fields = Record::new().shared();
        let data = vec![Value::Bytes(vec![0; 4])];
        let err = date_post_proc(&fields, &data).unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedShape(_)));
    }
}
