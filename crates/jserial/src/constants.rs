//! Wire-format constants.
//!
//! See the Java Object Serialization Stream Protocol, version 5:
//! <https://docs.oracle.com/javase/8/docs/platform/serialization/spec/protocol.html>

/// STREAM_MAGIC: the two bytes every stream opens with.
pub const STREAM_MAGIC: u16 = 0xaced;

/// STREAM_VERSION: the only protocol version this decoder accepts.
pub const PROTOCOL_VERSION: u16 = 5;

/// Base of the type-code range; tag bytes are `TC_BASE + index`.
pub const TC_BASE: u8 = 0x70;

/// baseWireHandle: wire-level handle ids start here.
pub const BASE_WIRE_HANDLE: i32 = 0x7e_0000;

/// The fifteen type tags, indexed by `tag - TC_BASE` (0x70..0x7e).
pub const TYPE_NAMES: [&str; 15] = [
    "Null",
    "Reference",
    "ClassDesc",
    "Object",
    "String",
    "Array",
    "Class",
    "BlockData",
    "EndBlockData",
    "Reset",
    "BlockDataLong",
    "Exception",
    "LongString",
    "ProxyClassDesc",
    "Enum",
];

/// Tags accepted where a class descriptor is expected (the super position
/// and the descriptor of objects, arrays, enums).
pub const ALLOWED_CLASS_DESC_NAMES: [&str; 4] =
    ["ClassDesc", "ProxyClassDesc", "Null", "Reference"];

// ClassDesc flag bits.
pub const SC_WRITE_METHOD: u8 = 0x01;
pub const SC_SERIALIZABLE: u8 = 0x02;
pub const SC_EXTERNALIZABLE: u8 = 0x04;
pub const SC_BLOCK_DATA: u8 = 0x08;
pub const SC_ENUM: u8 = 0x10;

/// Serialization-variant nibble of the flags byte.
pub const CLASS_FLAGS_MASK: u8 = 0x0f;

/// Fully-qualified class names are at least this long (`"[I"` is minimal).
pub const MIN_CLASS_NAME_LENGTH: usize = 2;

/// serialVersionUID is a fixed 8-byte hash.
pub const SERIAL_VERSION_UID_LENGTH: usize = 8;
