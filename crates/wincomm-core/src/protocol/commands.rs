//! Serial control codes
//!
//! The subset of `IOCTL_SERIAL_*` requests issued by the translator. The
//! numeric values are the Windows device I/O control codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Control codes understood by a [`ControlDispatcher`](super::ControlDispatcher)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum IoctlCode {
    /// `IOCTL_SERIAL_SET_BAUD_RATE`
    SetBaudRate = 0x001B_0004,
    /// `IOCTL_SERIAL_GET_BAUD_RATE`
    GetBaudRate = 0x001B_0050,
    /// `IOCTL_SERIAL_SET_LINE_CONTROL`
    SetLineControl = 0x001B_000C,
    /// `IOCTL_SERIAL_GET_LINE_CONTROL`
    GetLineControl = 0x001B_0054,
    /// `IOCTL_SERIAL_SET_TIMEOUTS`
    SetTimeouts = 0x001B_001C,
    /// `IOCTL_SERIAL_GET_TIMEOUTS`
    GetTimeouts = 0x001B_0020,
    /// `IOCTL_SERIAL_SET_CHARS`
    SetChars = 0x001B_005C,
    /// `IOCTL_SERIAL_GET_CHARS`
    GetChars = 0x001B_0058,
    /// `IOCTL_SERIAL_SET_HANDFLOW`
    SetHandflow = 0x001B_0064,
    /// `IOCTL_SERIAL_GET_HANDFLOW`
    GetHandflow = 0x001B_0060,
    /// `IOCTL_SERIAL_GET_PROPERTIES`
    GetProperties = 0x001B_0074,
}

impl IoctlCode {
    /// All codes, in declaration order
    pub const ALL: [IoctlCode; 11] = [
        IoctlCode::SetBaudRate,
        IoctlCode::GetBaudRate,
        IoctlCode::SetLineControl,
        IoctlCode::GetLineControl,
        IoctlCode::SetTimeouts,
        IoctlCode::GetTimeouts,
        IoctlCode::SetChars,
        IoctlCode::GetChars,
        IoctlCode::SetHandflow,
        IoctlCode::GetHandflow,
        IoctlCode::GetProperties,
    ];

    /// Numeric control code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Look up a code by its numeric value
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Symbolic Windows name
    pub fn name(&self) -> &'static str {
        match self {
            IoctlCode::SetBaudRate => "IOCTL_SERIAL_SET_BAUD_RATE",
            IoctlCode::GetBaudRate => "IOCTL_SERIAL_GET_BAUD_RATE",
            IoctlCode::SetLineControl => "IOCTL_SERIAL_SET_LINE_CONTROL",
            IoctlCode::GetLineControl => "IOCTL_SERIAL_GET_LINE_CONTROL",
            IoctlCode::SetTimeouts => "IOCTL_SERIAL_SET_TIMEOUTS",
            IoctlCode::GetTimeouts => "IOCTL_SERIAL_GET_TIMEOUTS",
            IoctlCode::SetChars => "IOCTL_SERIAL_SET_CHARS",
            IoctlCode::GetChars => "IOCTL_SERIAL_GET_CHARS",
            IoctlCode::SetHandflow => "IOCTL_SERIAL_SET_HANDFLOW",
            IoctlCode::GetHandflow => "IOCTL_SERIAL_GET_HANDFLOW",
            IoctlCode::GetProperties => "IOCTL_SERIAL_GET_PROPERTIES",
        }
    }

    /// Whether the request carries an input block to the driver
    pub fn is_set(&self) -> bool {
        matches!(
            self,
            IoctlCode::SetBaudRate
                | IoctlCode::SetLineControl
                | IoctlCode::SetTimeouts
                | IoctlCode::SetChars
                | IoctlCode::SetHandflow
        )
    }
}

impl fmt::Display for IoctlCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_code_values() {
        assert_eq!(IoctlCode::SetBaudRate.code(), 1769476);
        assert_eq!(IoctlCode::GetHandflow.code(), 1769568);
        assert_eq!(IoctlCode::GetProperties.code(), 1769588);
    }

    #[test]
    fn test_from_code() {
        for code in IoctlCode::ALL {
            assert_eq!(IoctlCode::from_code(code.code()), Some(code));
        }
        assert_eq!(IoctlCode::from_code(0), None);
    }

    #[test]
    fn test_direction() {
        assert!(IoctlCode::SetChars.is_set());
        assert!(!IoctlCode::GetChars.is_set());
        assert!(!IoctlCode::GetProperties.is_set());
    }
}
