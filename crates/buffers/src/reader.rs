//! Bounded big-endian reader over a sequential byte source.

use std::io::{self, Read};

use crate::ReadError;

/// Default ceiling for length-prefixed reads.
pub const DEFAULT_MAX_DATA_BLOCK_SIZE: usize = 1024;

/// A big-endian reader over any [`Read`] source.
///
/// All reads are fallible: a source that yields fewer bytes than requested
/// produces [`ReadError::UnexpectedEnd`], and any sized read larger than the
/// configured `max_data_block_size` fails with [`ReadError::BlockTooLarge`]
/// before allocating. The protocol allows attacker-controlled 32-bit length
/// prefixes, so the ceiling is checked first.
///
/// # Example
///
/// ```
/// use jserial_buffers::StreamReader;
///
/// let data: &[u8] = &[0x01, 0x02, 0x03, 0x04];
/// let mut reader = StreamReader::new(data);
///
/// assert_eq!(reader.u8().unwrap(), 0x01);
/// assert_eq!(reader.u16().unwrap(), 0x0203);
/// ```
pub struct StreamReader<R> {
    rd: R,
    max_data_block_size: usize,
    /// Single unread byte, replayed before the underlying source.
    pushback: Option<u8>,
    buffered: bool,
}

impl<R: Read> StreamReader<R> {
    /// Creates a buffered reader with the default block-size ceiling.
    pub fn new(rd: R) -> Self {
        Self::with_max_data_block_size(rd, DEFAULT_MAX_DATA_BLOCK_SIZE)
    }

    /// Creates a buffered reader with a custom block-size ceiling.
    pub fn with_max_data_block_size(rd: R, max_data_block_size: usize) -> Self {
        Self {
            rd,
            max_data_block_size,
            pushback: None,
            buffered: true,
        }
    }

    /// Creates an unbuffered reader: [`StreamReader::unread`] is refused, so
    /// a probed byte stays consumed.
    pub fn unbuffered(rd: R) -> Self {
        Self {
            rd,
            max_data_block_size: DEFAULT_MAX_DATA_BLOCK_SIZE,
            pushback: None,
            buffered: false,
        }
    }

    /// The ceiling applied to sized reads.
    pub fn max_data_block_size(&self) -> usize {
        self.max_data_block_size
    }

    /// Whether this reader supports unreading a probed byte.
    pub fn is_buffered(&self) -> bool {
        self.buffered
    }

    /// Pushes one byte back so the next read returns it again.
    ///
    /// Refused (the byte stays consumed) on unbuffered readers. At most one
    /// byte can be pending.
    pub fn unread(&mut self, byte: u8) {
        if self.buffered && self.pushback.is_none() {
            self.pushback = Some(byte);
        }
    }

    /// Returns `true` once the source is exhausted.
    ///
    /// Probes by reading a single byte, which is kept in the pushback slot,
    /// so the probe never loses data.
    pub fn at_end(&mut self) -> bool {
        if self.pushback.is_some() {
            return false;
        }
        let mut byte = [0u8; 1];
        loop {
            match self.rd.read(&mut byte) {
                Ok(0) => return true,
                Ok(_) => {
                    self.pushback = Some(byte[0]);
                    return false;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => return true,
            }
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        let mut start = 0;
        if !buf.is_empty() {
            if let Some(byte) = self.pushback.take() {
                buf[0] = byte;
                start = 1;
            }
        }
        self.rd.read_exact(&mut buf[start..]).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                ReadError::UnexpectedEnd
            } else {
                ReadError::Io(e)
            }
        })
    }

    /// Reads an unsigned 8-bit integer.
    pub fn u8(&mut self) -> Result<u8, ReadError> {
        let mut b = [0u8; 1];
        self.fill(&mut b)?;
        Ok(b[0])
    }

    /// Reads a signed 8-bit integer.
    pub fn i8(&mut self) -> Result<i8, ReadError> {
        Ok(self.u8()? as i8)
    }

    /// Reads an unsigned 16-bit integer (big-endian).
    pub fn u16(&mut self) -> Result<u16, ReadError> {
        let mut b = [0u8; 2];
        self.fill(&mut b)?;
        Ok(u16::from_be_bytes(b))
    }

    /// Reads a signed 16-bit integer (big-endian).
    pub fn i16(&mut self) -> Result<i16, ReadError> {
        let mut b = [0u8; 2];
        self.fill(&mut b)?;
        Ok(i16::from_be_bytes(b))
    }

    /// Reads an unsigned 32-bit integer (big-endian).
    pub fn u32(&mut self) -> Result<u32, ReadError> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    /// Reads a signed 32-bit integer (big-endian).
    pub fn i32(&mut self) -> Result<i32, ReadError> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(i32::from_be_bytes(b))
    }

    /// Reads a signed 64-bit integer (big-endian).
    pub fn i64(&mut self) -> Result<i64, ReadError> {
        let mut b = [0u8; 8];
        self.fill(&mut b)?;
        Ok(i64::from_be_bytes(b))
    }

    /// Reads a 32-bit float (big-endian).
    pub fn f32(&mut self) -> Result<f32, ReadError> {
        let mut b = [0u8; 4];
        self.fill(&mut b)?;
        Ok(f32::from_be_bytes(b))
    }

    /// Reads a 64-bit float (big-endian).
    pub fn f64(&mut self) -> Result<f64, ReadError> {
        let mut b = [0u8; 8];
        self.fill(&mut b)?;
        Ok(f64::from_be_bytes(b))
    }

    /// Reads `size` raw bytes into a new vector, ceiling-checked.
    pub fn bytes(&mut self, size: usize) -> Result<Vec<u8>, ReadError> {
        if size > self.max_data_block_size {
            return Err(ReadError::BlockTooLarge {
                size,
                max: self.max_data_block_size,
            });
        }
        let mut data = vec![0u8; size];
        self.fill(&mut data)?;
        Ok(data)
    }

    /// Reads `size` bytes as a UTF-8 string, replacing malformed sequences.
    pub fn utf8(&mut self, size: usize) -> Result<String, ReadError> {
        let data = self.bytes(size)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Reads `size` bytes and renders them as lowercase hex.
    pub fn hex(&mut self, size: usize) -> Result<String, ReadError> {
        let data = self.bytes(size)?;
        let mut s = String::with_capacity(size * 2);
        for byte in data {
            s.push_str(&format!("{byte:02x}"));
        }
        Ok(s)
    }
}
