//! Reader error type.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("data block of {size} bytes exceeds the configured maximum of {max}")]
    BlockTooLarge { size: usize, max: usize },
    #[error("read error: {0}")]
    Io(#[from] io::Error),
}
