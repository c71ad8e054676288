//! Control block layouts
//!
//! Fixed-size value objects exchanged with the dispatcher. Every block is
//! encoded little-endian with the field order and size of its Windows
//! counterpart:
//!
//! | Block                 | Size | Layout                                             |
//! |-----------------------|------|----------------------------------------------------|
//! | `SERIAL_BAUD_RATE`    | 4    | baud (u32)                                         |
//! | `SERIAL_LINE_CONTROL` | 3    | stop bits, parity, word length (u8 each)           |
//! | `SERIAL_CHARS`        | 6    | eof, error, break, event, xon, xoff (u8 each)      |
//! | `SERIAL_HANDFLOW`     | 16   | control handshake, flow replace (u32), limits (i32)|
//! | `SERIAL_TIMEOUTS`     | 20   | five u32                                           |
//! | `COMMPROP`            | 64   | see [`CommProp`]                                   |

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use super::DispatchError;

// SERIAL_HANDFLOW.ControlHandShake
/// DTR mode bits
pub const SERIAL_DTR_MASK: u32 = 0x03;
/// DTR asserted
pub const SERIAL_DTR_CONTROL: u32 = 0x01;
/// DTR input handshaking
pub const SERIAL_DTR_HANDSHAKE: u32 = 0x02;
/// CTS output flow control
pub const SERIAL_CTS_HANDSHAKE: u32 = 0x08;
/// DSR output flow control
pub const SERIAL_DSR_HANDSHAKE: u32 = 0x10;
/// DCD output flow control
pub const SERIAL_DCD_HANDSHAKE: u32 = 0x20;
/// Ignore input while DSR is low
pub const SERIAL_DSR_SENSITIVITY: u32 = 0x40;
/// Abort reads and writes on error
pub const SERIAL_ERROR_ABORT: u32 = 0x8000_0000;

// SERIAL_HANDFLOW.FlowReplace
/// XON/XOFF output flow control
pub const SERIAL_AUTO_TRANSMIT: u32 = 0x01;
/// XON/XOFF input flow control
pub const SERIAL_AUTO_RECEIVE: u32 = 0x02;
/// Replace parity errors with the error char
pub const SERIAL_ERROR_CHAR: u32 = 0x04;
/// Discard received NUL bytes
pub const SERIAL_NULL_STRIPPING: u32 = 0x08;
/// Replace breaks with the break char
pub const SERIAL_BREAK_CHAR: u32 = 0x10;
/// RTS mode bits
pub const SERIAL_RTS_MASK: u32 = 0xC0;
/// RTS asserted
pub const SERIAL_RTS_CONTROL: u32 = 0x40;
/// RTS input handshaking
pub const SERIAL_RTS_HANDSHAKE: u32 = 0x80;
/// RTS raised while transmitting
pub const SERIAL_TRANSMIT_TOGGLE: u32 = 0xC0;
/// Keep transmitting after sending XOFF
pub const SERIAL_XOFF_CONTINUE: u32 = 0x8000_0000;

/// A fixed-layout block that can cross the dispatch boundary
pub trait ControlBlock: Sized + Copy {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Encode into `buf`, which is at least [`Self::SIZE`] bytes long
    fn encode(&self, buf: &mut [u8]);

    /// Decode from `buf`, which is at least [`Self::SIZE`] bytes long
    fn decode(buf: &[u8]) -> Self;

    /// Encode into a new buffer
    fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; Self::SIZE];
        self.encode(&mut bytes);
        bytes
    }

    /// Decode, checking the buffer length first
    fn from_bytes(data: &[u8]) -> Result<Self, DispatchError> {
        if data.len() < Self::SIZE {
            return Err(DispatchError::ShortBlock {
                expected: Self::SIZE,
                actual: data.len(),
            });
        }
        Ok(Self::decode(data))
    }
}

/// `SERIAL_BAUD_RATE`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialBaudRate {
    /// Bits per second
    pub baud_rate: u32,
}

impl ControlBlock for SerialBaudRate {
    const SIZE: usize = 4;

    fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.baud_rate);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            baud_rate: LittleEndian::read_u32(&buf[0..4]),
        }
    }
}

/// `SERIAL_LINE_CONTROL`
///
/// Values use the same enumerations as the `DCB` (`NOPARITY`, `ONESTOPBIT`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialLineControl {
    /// `ONESTOPBIT`, `ONE5STOPBITS` or `TWOSTOPBITS`
    pub stop_bits: u8,
    /// `NOPARITY` .. `SPACEPARITY`
    pub parity: u8,
    /// Data bits
    pub word_length: u8,
}

impl ControlBlock for SerialLineControl {
    const SIZE: usize = 3;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.stop_bits;
        buf[1] = self.parity;
        buf[2] = self.word_length;
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            stop_bits: buf[0],
            parity: buf[1],
            word_length: buf[2],
        }
    }
}

/// `SERIAL_CHARS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialChars {
    /// End-of-input character
    pub eof_char: u8,
    /// Parity error substitute
    pub error_char: u8,
    /// Not carried by the `DCB`; preserved across writes
    pub break_char: u8,
    /// Event character
    pub event_char: u8,
    /// XON character
    pub xon_char: u8,
    /// XOFF character
    pub xoff_char: u8,
}

impl ControlBlock for SerialChars {
    const SIZE: usize = 6;

    fn encode(&self, buf: &mut [u8]) {
        buf[0] = self.eof_char;
        buf[1] = self.error_char;
        buf[2] = self.break_char;
        buf[3] = self.event_char;
        buf[4] = self.xon_char;
        buf[5] = self.xoff_char;
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            eof_char: buf[0],
            error_char: buf[1],
            break_char: buf[2],
            event_char: buf[3],
            xon_char: buf[4],
            xoff_char: buf[5],
        }
    }
}

/// `SERIAL_HANDFLOW`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialHandflow {
    /// `SERIAL_DTR_*`, `SERIAL_*_HANDSHAKE`, `SERIAL_DSR_SENSITIVITY`, `SERIAL_ERROR_ABORT`
    pub control_handshake: u32,
    /// `SERIAL_AUTO_*`, `SERIAL_ERROR_CHAR`, `SERIAL_NULL_STRIPPING`, `SERIAL_RTS_*`, `SERIAL_XOFF_CONTINUE`
    pub flow_replace: u32,
    /// Input buffer fill below which XON is sent
    pub xon_limit: i32,
    /// Free input space below which XOFF is sent
    pub xoff_limit: i32,
}

impl ControlBlock for SerialHandflow {
    const SIZE: usize = 16;

    fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.control_handshake);
        LittleEndian::write_u32(&mut buf[4..8], self.flow_replace);
        LittleEndian::write_i32(&mut buf[8..12], self.xon_limit);
        LittleEndian::write_i32(&mut buf[12..16], self.xoff_limit);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            control_handshake: LittleEndian::read_u32(&buf[0..4]),
            flow_replace: LittleEndian::read_u32(&buf[4..8]),
            xon_limit: LittleEndian::read_i32(&buf[8..12]),
            xoff_limit: LittleEndian::read_i32(&buf[12..16]),
        }
    }
}

/// `SERIAL_TIMEOUTS`, identical in layout to `COMMTIMEOUTS`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialTimeouts {
    /// Maximum gap between two received bytes, in ms
    pub read_interval_timeout: u32,
    /// Per-byte read timeout, in ms
    pub read_total_timeout_multiplier: u32,
    /// Fixed read timeout, in ms
    pub read_total_timeout_constant: u32,
    /// Per-byte write timeout, in ms
    pub write_total_timeout_multiplier: u32,
    /// Fixed write timeout, in ms
    pub write_total_timeout_constant: u32,
}

/// The Win32 `COMMTIMEOUTS` structure is passed through unchanged
pub type CommTimeouts = SerialTimeouts;

impl ControlBlock for SerialTimeouts {
    const SIZE: usize = 20;

    fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u32(&mut buf[0..4], self.read_interval_timeout);
        LittleEndian::write_u32(&mut buf[4..8], self.read_total_timeout_multiplier);
        LittleEndian::write_u32(&mut buf[8..12], self.read_total_timeout_constant);
        LittleEndian::write_u32(&mut buf[12..16], self.write_total_timeout_multiplier);
        LittleEndian::write_u32(&mut buf[16..20], self.write_total_timeout_constant);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            read_interval_timeout: LittleEndian::read_u32(&buf[0..4]),
            read_total_timeout_multiplier: LittleEndian::read_u32(&buf[4..8]),
            read_total_timeout_constant: LittleEndian::read_u32(&buf[8..12]),
            write_total_timeout_multiplier: LittleEndian::read_u32(&buf[12..16]),
            write_total_timeout_constant: LittleEndian::read_u32(&buf[16..20]),
        }
    }
}

/// `COMMPROP`
///
/// 62 bytes of fields followed by two bytes of trailing padding:
/// packet length and version (u16 each), service mask, reserved, max tx/rx
/// queue, max baud, provider subtype, provider capabilities, settable params
/// and settable baud (u32 each), settable data and settable stop/parity (u16
/// each), current tx/rx queue and two provider-specific words (u32 each),
/// provider char (u16).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommProp {
    /// Size of the structure in bytes
    pub packet_length: u16,
    /// Structure version
    pub packet_version: u16,
    /// `SP_SERIALCOMM` for serial providers
    pub service_mask: u32,
    /// Reserved
    pub reserved1: u32,
    /// Largest output buffer, 0 if unlimited
    pub max_tx_queue: u32,
    /// Largest input buffer, 0 if unlimited
    pub max_rx_queue: u32,
    /// Highest settable baud rate (`BAUD_*` bit)
    pub max_baud: u32,
    /// Provider type (`PST_*`)
    pub prov_sub_type: u32,
    /// Supported features (`PCF_*`)
    pub prov_capabilities: u32,
    /// Settable parameters (`SP_*`)
    pub settable_params: u32,
    /// Settable baud rates (`BAUD_*`)
    pub settable_baud: u32,
    /// Settable data bits (`DATABITS_*`)
    pub settable_data: u16,
    /// Settable stop bits and parity
    pub settable_stop_parity: u16,
    /// Current output buffer size
    pub current_tx_queue: u32,
    /// Current input buffer size
    pub current_rx_queue: u32,
    /// Provider-specific data
    pub prov_spec1: u32,
    /// Provider-specific data
    pub prov_spec2: u32,
    /// Provider-specific data
    pub prov_char: u16,
}

impl ControlBlock for CommProp {
    const SIZE: usize = 64;

    fn encode(&self, buf: &mut [u8]) {
        LittleEndian::write_u16(&mut buf[0..2], self.packet_length);
        LittleEndian::write_u16(&mut buf[2..4], self.packet_version);
        LittleEndian::write_u32(&mut buf[4..8], self.service_mask);
        LittleEndian::write_u32(&mut buf[8..12], self.reserved1);
        LittleEndian::write_u32(&mut buf[12..16], self.max_tx_queue);
        LittleEndian::write_u32(&mut buf[16..20], self.max_rx_queue);
        LittleEndian::write_u32(&mut buf[20..24], self.max_baud);
        LittleEndian::write_u32(&mut buf[24..28], self.prov_sub_type);
        LittleEndian::write_u32(&mut buf[28..32], self.prov_capabilities);
        LittleEndian::write_u32(&mut buf[32..36], self.settable_params);
        LittleEndian::write_u32(&mut buf[36..40], self.settable_baud);
        LittleEndian::write_u16(&mut buf[40..42], self.settable_data);
        LittleEndian::write_u16(&mut buf[42..44], self.settable_stop_parity);
        LittleEndian::write_u32(&mut buf[44..48], self.current_tx_queue);
        LittleEndian::write_u32(&mut buf[48..52], self.current_rx_queue);
        LittleEndian::write_u32(&mut buf[52..56], self.prov_spec1);
        LittleEndian::write_u32(&mut buf[56..60], self.prov_spec2);
        LittleEndian::write_u16(&mut buf[60..62], self.prov_char);
        buf[62..64].fill(0);
    }

    fn decode(buf: &[u8]) -> Self {
        Self {
            packet_length: LittleEndian::read_u16(&buf[0..2]),
            packet_version: LittleEndian::read_u16(&buf[2..4]),
            service_mask: LittleEndian::read_u32(&buf[4..8]),
            reserved1: LittleEndian::read_u32(&buf[8..12]),
            max_tx_queue: LittleEndian::read_u32(&buf[12..16]),
            max_rx_queue: LittleEndian::read_u32(&buf[16..20]),
            max_baud: LittleEndian::read_u32(&buf[20..24]),
            prov_sub_type: LittleEndian::read_u32(&buf[24..28]),
            prov_capabilities: LittleEndian::read_u32(&buf[28..32]),
            settable_params: LittleEndian::read_u32(&buf[32..36]),
            settable_baud: LittleEndian::read_u32(&buf[36..40]),
            settable_data: LittleEndian::read_u16(&buf[40..42]),
            settable_stop_parity: LittleEndian::read_u16(&buf[42..44]),
            current_tx_queue: LittleEndian::read_u32(&buf[44..48]),
            current_rx_queue: LittleEndian::read_u32(&buf[48..52]),
            prov_spec1: LittleEndian::read_u32(&buf[52..56]),
            prov_spec2: LittleEndian::read_u32(&buf[56..60]),
            prov_char: LittleEndian::read_u16(&buf[60..62]),
        }
    }
}
