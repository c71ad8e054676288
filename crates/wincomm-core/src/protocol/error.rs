//! Dispatcher errors

use thiserror::Error;

use super::IoctlCode;

/// Errors reported across the control-block dispatch boundary
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("{code} is not supported by the serial driver")]
    Unsupported {
        /// Rejected request
        code: IoctlCode,
    },

    #[error("{code}: input block too small: expected {expected} bytes, got {actual}")]
    InputTooSmall {
        /// Request being sent
        code: IoctlCode,
        /// Block size the request needs
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    #[error("{code}: short reply: expected {expected} bytes, got {actual}")]
    ShortReply {
        /// Request being answered
        code: IoctlCode,
        /// Block size the request returns
        expected: usize,
        /// Bytes the driver wrote
        actual: usize,
    },

    #[error("Block too short: expected {expected} bytes, got {actual}")]
    ShortBlock {
        /// Encoded block size
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
