//! Decoder for the Java Object Serialization Stream Protocol, version 5
//! (STREAM_MAGIC `0xACED`).
//!
//! Spec: <https://docs.oracle.com/javase/8/docs/platform/serialization/spec/protocol.html>
//!
//! Given a byte stream produced by Java's standard object-output stream,
//! the parser yields a language-neutral [`Value`] tree: primitives,
//! strings, arrays, and name-to-value records for objects. Well-known JDK
//! containers (ArrayList, HashMap, HashSet, EnumMap, Date, ...) are
//! reshaped into first-class container values; every other
//! custom-serialized class surfaces its raw annotation payload under `@`.
//!
//! Encoding is out of scope, and so are `TC_RESET`, `TC_EXCEPTION`, and
//! `TC_PROXYCLASSDESC`: those tags are recognized but surface an error.
//!
//! # Example
//!
//! ```
//! use jserial::{parse_buffer_minimal, Value};
//!
//! // Header, then the string "hi".
//! let stream: &[u8] = &[0xac, 0xed, 0x00, 0x05, 0x74, 0x00, 0x02, b'h', b'i'];
//! let values = parse_buffer_minimal(stream).unwrap();
//! assert_eq!(values, vec![Value::Str("hi".into())]);
//! ```

mod class_data;
mod error;
mod fuzz;
mod handles;
mod json_friendly;
mod parser;
mod to_json;
mod value;

pub mod constants;
pub mod postproc;

pub use jserial_buffers::ReadError;

pub use error::ParseError;
pub use fuzz::fuzz;
pub use json_friendly::{json_friendly, json_friendly_array};
pub use parser::{parse_buffer, parse_buffer_minimal, parse_single, SerializedObjectParser};
pub use to_json::to_json;
pub use value::{ClassDesc, ClassDescRef, Field, ObjectRef, Record, Value};
