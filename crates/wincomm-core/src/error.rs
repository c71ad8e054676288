//! Error types and the last-error convention

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use thiserror::Error;

use crate::protocol::{DispatchError, IoctlCode};

/// Win32 error codes reported through [`last_error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum ErrorCode {
    /// `ERROR_SUCCESS`
    Success = 0,
    /// `ERROR_FILE_NOT_FOUND`
    FileNotFound = 2,
    /// `ERROR_INVALID_HANDLE`
    InvalidHandle = 6,
    /// `ERROR_OUTOFMEMORY`
    OutOfMemory = 14,
    /// `ERROR_SHARING_VIOLATION`
    SharingViolation = 32,
    /// `ERROR_NOT_SUPPORTED`
    NotSupported = 50,
    /// `ERROR_INVALID_PARAMETER`
    InvalidParameter = 87,
    /// `ERROR_INSUFFICIENT_BUFFER`
    InsufficientBuffer = 122,
    /// `ERROR_IO_DEVICE`
    IoDevice = 1117,
    /// `ERROR_BAD_DEVICE`
    BadDevice = 1200,
}

impl ErrorCode {
    /// Numeric Win32 value
    pub fn value(&self) -> u32 {
        *self as u32
    }
}

/// Step of the configuration write that failed
///
/// Steps run in declaration order and are not rolled back: when a step
/// fails, every earlier step has already been applied to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyStep {
    /// `IOCTL_SERIAL_SET_BAUD_RATE`
    BaudRate,
    /// Read-modify-write of `SERIAL_CHARS`
    Chars,
    /// `IOCTL_SERIAL_SET_LINE_CONTROL`
    LineControl,
    /// `IOCTL_SERIAL_SET_HANDFLOW`
    Handflow,
    /// `ICANON`/`INPCK` update through tcsetattr
    Termios,
}

impl fmt::Display for ApplyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ApplyStep::BaudRate => "baud rate",
            ApplyStep::Chars => "serial chars",
            ApplyStep::LineControl => "line control",
            ApplyStep::Handflow => "handflow",
            ApplyStep::Termios => "termios",
        };
        f.write_str(name)
    }
}

/// Errors returned by comm operations
#[derive(Error, Debug)]
pub enum CommError {
    #[error("Invalid handle")]
    InvalidHandle,

    #[error("Invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("Unsupported feature: {0}")]
    Unsupported(&'static str),

    #[error("Sharing violation: comm devices must be opened with a share mode of 0")]
    SharingViolation,

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Bad device: {0}")]
    BadDevice(String),

    #[error("Insufficient buffer: {required} characters required, {available} available")]
    InsufficientBuffer {
        /// Characters needed, terminators included
        required: usize,
        /// Characters the caller offered
        available: usize,
    },

    #[error("Device I/O error: {0}")]
    DeviceIo(#[from] std::io::Error),

    #[error("{code} failed: {source}")]
    Dispatch {
        /// Request that failed
        code: IoctlCode,
        /// Dispatcher failure
        #[source]
        source: DispatchError,
    },

    #[error("Setting the {step} failed: {source}")]
    Step {
        /// Step that failed
        step: ApplyStep,
        /// Failure of that step
        #[source]
        source: Box<CommError>,
    },
}

impl CommError {
    /// The Win32 error code this error is reported as
    pub fn code(&self) -> ErrorCode {
        match self {
            CommError::InvalidHandle => ErrorCode::InvalidHandle,
            CommError::InvalidParameter(_) => ErrorCode::InvalidParameter,
            CommError::Unsupported(_) => ErrorCode::NotSupported,
            CommError::SharingViolation => ErrorCode::SharingViolation,
            CommError::FileNotFound(_) => ErrorCode::FileNotFound,
            CommError::BadDevice(_) => ErrorCode::BadDevice,
            CommError::InsufficientBuffer { .. } => ErrorCode::InsufficientBuffer,
            CommError::DeviceIo(_) | CommError::Dispatch { .. } => ErrorCode::IoDevice,
            CommError::Step { source, .. } => source.code(),
        }
    }

    /// For configuration writes, the step that failed
    pub fn failed_step(&self) -> Option<ApplyStep> {
        match self {
            CommError::Step { step, .. } => Some(*step),
            _ => None,
        }
    }

    pub(crate) fn at(self, step: ApplyStep) -> Self {
        CommError::Step {
            step,
            source: Box::new(self),
        }
    }
}

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::Success) };
}

/// Record the calling thread's last error
pub fn set_last_error(code: ErrorCode) {
    LAST_ERROR.with(|last| last.set(code));
}

/// The calling thread's last error
pub fn last_error() -> ErrorCode {
    LAST_ERROR.with(|last| last.get())
}
