//! The language-neutral value tree produced by the parser.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

/// A keyed record shared through the handle table.
///
/// Objects must be visible by wire id while their own fields are still being
/// read (the stream may back-reference them), so records live behind a
/// reference-counted cell: the handle-table entry and the parse result are
/// the same storage.
pub type ObjectRef = Rc<RefCell<Record>>;

/// A class descriptor shared through the handle table.
///
/// Registered before its flags, fields, and super are read, for the same
/// reason as [`ObjectRef`].
pub type ClassDescRef = Rc<RefCell<ClassDesc>>;

/// One decoded content value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Java `byte`.
    Byte(i8),
    /// Java `short`.
    Short(i16),
    /// Java `int`.
    Int(i32),
    /// Java `long`.
    Long(i64),
    /// Java `float`.
    Float(f32),
    /// Java `double`.
    Double(f64),
    /// Java `char`; an unpaired surrogate code unit decodes to U+FFFD.
    Char(char),
    Str(String),
    /// Raw block-data payload.
    Bytes(Vec<u8>),
    /// Array elements in stream order.
    Array(Vec<Value>),
    /// Object, enum constant, or post-processor-synthesized map/set record.
    Object(ObjectRef),
    ClassDesc(ClassDescRef),
    /// Absolute time as milliseconds since the Unix epoch.
    Date(i64),
    /// The end-of-annotations sentinel. A returnable content value, but
    /// never registered as a handle.
    EndBlock,
}

impl Value {
    /// Wraps a record as a shared object value.
    pub fn record(record: Record) -> Value {
        Value::Object(record.shared())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_end_block(&self) -> bool {
        matches!(self, Value::EndBlock)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(rec) => Some(rec),
            _ => None,
        }
    }

    /// Looks up `key` on an object value; `None` for everything else.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Value::Object(rec) => rec.borrow().get(key).cloned(),
            _ => None,
        }
    }
}

/// An insertion-ordered mapping from field name to [`Value`].
///
/// Equality is order-insensitive; the protocol assigns no meaning to field
/// order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites a field.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Moves the record behind a shared handle.
    pub fn shared(self) -> ObjectRef {
        Rc::new(RefCell::new(self))
    }
}

/// A serialized class descriptor.
///
/// The `super_class` link forms a finite chain; the stream presents supers
/// in order and each new descriptor becomes a fresh handle, so cycles cannot
/// be constructed, but the inheritance walk still guards against a
/// pathological chain resolved through references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassDesc {
    pub name: String,
    /// 8-byte class-identity hash as 16 lowercase hex characters.
    pub serial_version_uid: String,
    pub flags: u8,
    /// Declared fields in declaration order.
    pub fields: Vec<Field>,
    /// Raw class annotations.
    pub annotations: Vec<Value>,
    pub super_class: Option<ClassDescRef>,
    /// Derived from the SC_ENUM flag bit.
    pub is_enum: bool,
}

impl ClassDesc {
    /// The post-processor registry key, `name@serialVersionUID`.
    pub fn signature(&self) -> String {
        format!("{}@{}", self.name, self.serial_version_uid)
    }
}

/// A single declared class member.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// One of `B C D F I J S Z L [`.
    pub type_code: char,
    pub name: String,
    /// Element class name, present only for `L` and `[` fields.
    pub class_name: Option<String>,
}
