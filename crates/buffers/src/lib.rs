//! Bounded binary reading for the jserial decoder.
//!
//! - [`StreamReader`] - Fallible big-endian reads over any [`std::io::Read`]
//!   source, with a configurable ceiling on length-prefixed allocations.
//! - [`ReadError`] - What a read can fail with.
//!
//! # Example
//!
//! ```
//! use jserial_buffers::StreamReader;
//!
//! let data: &[u8] = &[0xac, 0xed, 0x00, 0x05];
//! let mut reader = StreamReader::new(data);
//! assert_eq!(reader.u16().unwrap(), 0xaced);
//! assert_eq!(reader.u16().unwrap(), 0x0005);
//! assert!(reader.at_end());
//! ```

mod error;
mod reader;

pub use error::ReadError;
pub use reader::{StreamReader, DEFAULT_MAX_DATA_BLOCK_SIZE};
