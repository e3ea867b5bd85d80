//! Stream parser: header checks, tag dispatch, and the simple type parsers.
//!
//! Class descriptors, objects, and enums live in [`crate::class_data`].

use std::io::Read;

use jserial_buffers::StreamReader;

use crate::constants::{PROTOCOL_VERSION, STREAM_MAGIC, TC_BASE, TYPE_NAMES};
use crate::error::{ParseError, ResultExt};
use crate::handles::HandleTable;
use crate::json_friendly::json_friendly_array;
use crate::value::{Record, Value};

/// Parses every content value of a complete in-memory stream.
///
/// The block-size ceiling is the buffer length: a length prefix cannot ask
/// for more than the input holds.
pub fn parse_buffer(buf: &[u8]) -> Result<Vec<Value>, ParseError> {
    SerializedObjectParser::with_max_data_block_size(buf, buf.len()).parse()
}

/// Like [`parse_buffer`], flattened for JSON-like consumption.
pub fn parse_buffer_minimal(buf: &[u8]) -> Result<Vec<Value>, ParseError> {
    parse_buffer(buf).map(json_friendly_array)
}

/// Parses a single content value from an unbuffered source.
pub fn parse_single<R: Read>(rd: R) -> Result<Value, ParseError> {
    let mut parser = SerializedObjectParser::from_reader(StreamReader::unbuffered(rd));
    parser.magic()?;
    parser.version()?;
    parser.content(None)
}

/// Reads serialized Java objects from a byte source.
///
/// A parser owns its reader and handle table; run parallel parses by
/// constructing disjoint parsers.
///
/// # Example
///
/// ```
/// use jserial::SerializedObjectParser;
///
/// // An empty but valid stream: magic, version, no content.
/// let stream: &[u8] = &[0xac, 0xed, 0x00, 0x05];
/// let values = SerializedObjectParser::new(stream).parse().unwrap();
/// assert!(values.is_empty());
/// ```
pub struct SerializedObjectParser<R> {
    pub(crate) reader: StreamReader<R>,
    pub(crate) handles: HandleTable,
}

impl<R: Read> SerializedObjectParser<R> {
    /// Creates a parser with the default 1024-byte block-size ceiling.
    pub fn new(rd: R) -> Self {
        Self::from_reader(StreamReader::new(rd))
    }

    /// Creates a parser with a custom ceiling on length-prefixed reads.
    pub fn with_max_data_block_size(rd: R, max_data_block_size: usize) -> Self {
        Self::from_reader(StreamReader::with_max_data_block_size(
            rd,
            max_data_block_size,
        ))
    }

    fn from_reader(reader: StreamReader<R>) -> Self {
        Self {
            reader,
            handles: HandleTable::new(),
        }
    }

    /// Parses content values until the stream is exhausted.
    pub fn parse(&mut self) -> Result<Vec<Value>, ParseError> {
        self.magic()?;
        self.version()?;
        let mut content = Vec::new();
        while !self.reader.at_end() {
            content.push(self.content(None)?);
        }
        Ok(content)
    }

    /// Like [`SerializedObjectParser::parse`], flattened for JSON-like
    /// consumption.
    pub fn parse_minimal(&mut self) -> Result<Vec<Value>, ParseError> {
        self.parse().map(json_friendly_array)
    }

    pub(crate) fn magic(&mut self) -> Result<(), ParseError> {
        let magic = self.reader.u16()?;
        if magic != STREAM_MAGIC {
            return Err(ParseError::BadMagic);
        }
        Ok(())
    }

    pub(crate) fn version(&mut self) -> Result<(), ParseError> {
        let version = self.reader.u16()?;
        if version != PROTOCOL_VERSION {
            return Err(ParseError::BadVersion(version));
        }
        Ok(())
    }

    /// Reads the next content value, dispatching on its tag byte.
    ///
    /// `allowed` restricts which tags are legal in the current context. An
    /// unknown tag byte is unread on buffered sources so a caller may probe
    /// without losing it.
    pub(crate) fn content(&mut self, allowed: Option<&[&str]>) -> Result<Value, ParseError> {
        let tag = self.reader.u8()?;
        let Some(&name) = TYPE_NAMES.get(tag.wrapping_sub(TC_BASE) as usize) else {
            if self.reader.is_buffered() {
                self.reader.unread(tag);
            }
            return Err(ParseError::UnknownTag(tag));
        };
        if let Some(allowed) = allowed {
            if !allowed.contains(&name) {
                return Err(ParseError::TagNotAllowedHere(name));
            }
        }
        match name {
            "Null" => Ok(Value::Null),
            "Reference" => self.parse_reference(),
            "ClassDesc" => self.parse_class_desc(),
            "Object" => self.parse_object(),
            "String" => self.parse_string(),
            "Array" => self.parse_array(),
            "Class" => self.parse_class(),
            "BlockData" => self.parse_block_data(),
            "EndBlockData" => Ok(Value::EndBlock),
            "BlockDataLong" => self.parse_block_data_long(),
            "LongString" => self.parse_long_string(),
            "Enum" => self.parse_enum(),
            // Reset, Exception, ProxyClassDesc have no parser by design.
            _ => Err(ParseError::Unsupported(name)),
        }
    }

    /// Reads a 16-bit-length-prefixed UTF-8 string.
    pub(crate) fn utf(&mut self) -> Result<String, ParseError> {
        let length = self
            .reader
            .u16()
            .context("error reading utf: unable to read segment length")?;
        self.reader
            .utf8(length as usize)
            .context("error reading utf: unable to read segment")
    }

    /// Reads a 64-bit-length-prefixed UTF-8 string.
    ///
    /// The upper 32 bits of the length must be zero; the protocol inherits
    /// Java's 32-bit allocation ceiling.
    fn utf_long(&mut self) -> Result<String, ParseError> {
        let high = self
            .reader
            .u32()
            .context("error reading utf long: unable to read first segment length")?;
        if high != 0 {
            return Err(ParseError::StringTooLong);
        }
        let length = self
            .reader
            .u32()
            .context("error reading utf long: unable to read second segment length")?;
        self.reader
            .utf8(length as usize)
            .context("error reading utf long: unable to read segment")
    }

    fn parse_string(&mut self) -> Result<Value, ParseError> {
        let s = self.utf().context("error parsing string")?;
        Ok(self.handles.register(Value::Str(s)))
    }

    fn parse_long_string(&mut self) -> Result<Value, ParseError> {
        let s = self.utf_long().context("error parsing long string")?;
        Ok(self.handles.register(Value::Str(s)))
    }

    fn parse_block_data(&mut self) -> Result<Value, ParseError> {
        let size = self.reader.u8().context("error parsing block data size")?;
        let data = self.reader.bytes(size as usize)?;
        Ok(Value::Bytes(data))
    }

    fn parse_block_data_long(&mut self) -> Result<Value, ParseError> {
        let size = self
            .reader
            .u32()
            .context("error parsing block data long size")?;
        // The reader refuses sizes over the ceiling before allocating.
        let data = self.reader.bytes(size as usize)?;
        Ok(Value::Bytes(data))
    }

    fn parse_reference(&mut self) -> Result<Value, ParseError> {
        let wire_id = self
            .reader
            .i32()
            .context("error reading reference index")?;
        Ok(self.handles.lookup(wire_id).unwrap_or(Value::Null))
    }

    fn parse_class(&mut self) -> Result<Value, ParseError> {
        let cls = self.class_desc().context("error parsing class")?;
        let value = match cls {
            Some(cls) => Value::ClassDesc(cls),
            None => Value::Null,
        };
        Ok(self.handles.register(value))
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        let cls = self.class_desc().context("error parsing array class")?;
        let mut record = Record::new();
        record.insert(
            "class",
            match &cls {
                Some(cls) => Value::ClassDesc(cls.clone()),
                None => Value::Null,
            },
        );
        let record = record.shared();
        // The handle entry is the {class, length} record; references to an
        // array resolve to it, not to the element sequence.
        self.handles.register(Value::Object(record.clone()));
        let size = self.reader.i32().context("error reading array size")?;
        record.borrow_mut().insert("length", Value::Int(size));
        let Some(cls) = cls else {
            return Ok(Value::Null);
        };
        // Element type is the second character of the class name ("[I" -> I).
        let type_code = cls.borrow().name.as_bytes()[1] as char;
        if !matches!(
            type_code,
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 'L' | '['
        ) {
            return Err(ParseError::UnknownFieldType(type_code));
        }
        let mut array = Vec::new();
        for _ in 0..size.max(0) {
            let element = self
                .read_primitive(type_code)
                .context("error reading primitive array member")?;
            array.push(element);
        }
        Ok(Value::Array(array))
    }

    /// Reads one value of the given primitive or reference type.
    pub(crate) fn read_primitive(&mut self, type_code: char) -> Result<Value, ParseError> {
        match type_code {
            'B' => self
                .reader
                .i8()
                .map(Value::Byte)
                .context("error reading byte primitive"),
            'C' => self
                .reader
                .u16()
                .map(|code| {
                    Value::Char(char::from_u32(code.into()).unwrap_or(char::REPLACEMENT_CHARACTER))
                })
                .context("error reading char primitive"),
            'D' => self
                .reader
                .f64()
                .map(Value::Double)
                .context("error reading double primitive"),
            'F' => self
                .reader
                .f32()
                .map(Value::Float)
                .context("error reading float primitive"),
            'I' => self
                .reader
                .i32()
                .map(Value::Int)
                .context("error reading int primitive"),
            'J' => self
                .reader
                .i64()
                .map(Value::Long)
                .context("error reading long primitive"),
            'S' => self
                .reader
                .i16()
                .map(Value::Short)
                .context("error reading short primitive"),
            'Z' => self
                .reader
                .i8()
                .map(|b| Value::Bool(b != 0))
                .context("error reading boolean primitive"),
            'L' => self.content(None).context("error reading object primitive"),
            '[' => self.content(None).context("error reading array primitive"),
            _ => Err(ParseError::UnknownFieldType(type_code)),
        }
    }
}
