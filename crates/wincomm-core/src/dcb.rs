//! Device Control Block
//!
//! The Win32 `DCB` as a typed value, plus its 28-byte wire layout for callers
//! that persist or exchange raw structures.

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use crate::error::CommError;

/// No parity bit
pub const NOPARITY: u8 = 0;
/// Odd parity
pub const ODDPARITY: u8 = 1;
/// Even parity
pub const EVENPARITY: u8 = 2;
/// Parity bit always set
pub const MARKPARITY: u8 = 3;
/// Parity bit always clear
pub const SPACEPARITY: u8 = 4;

/// One stop bit
pub const ONESTOPBIT: u8 = 0;
/// One and a half stop bits
pub const ONE5STOPBITS: u8 = 1;
/// Two stop bits
pub const TWOSTOPBITS: u8 = 2;

/// `fDtrControl`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DtrControl {
    /// `DTR_CONTROL_DISABLE`
    #[default]
    Disable,
    /// `DTR_CONTROL_ENABLE`
    Enable,
    /// `DTR_CONTROL_HANDSHAKE`
    Handshake,
}

impl DtrControl {
    /// Two-bit field value
    pub fn to_raw(self) -> u32 {
        match self {
            DtrControl::Disable => 0,
            DtrControl::Enable => 1,
            DtrControl::Handshake => 2,
        }
    }

    /// Parse the two-bit field; 3 has no meaning
    pub fn from_raw(raw: u32) -> Result<Self, CommError> {
        match raw {
            0 => Ok(DtrControl::Disable),
            1 => Ok(DtrControl::Enable),
            2 => Ok(DtrControl::Handshake),
            _ => Err(CommError::Unsupported("unrecognized fDtrControl value")),
        }
    }
}

/// `fRtsControl`
///
/// `Toggle` can be expressed by callers but never applied: the driver has no
/// way to represent it, so writes reject it and reads never produce it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RtsControl {
    /// `RTS_CONTROL_DISABLE`
    #[default]
    Disable,
    /// `RTS_CONTROL_ENABLE`
    Enable,
    /// `RTS_CONTROL_HANDSHAKE`
    Handshake,
    /// `RTS_CONTROL_TOGGLE`
    Toggle,
}

impl RtsControl {
    /// Two-bit field value
    pub fn to_raw(self) -> u32 {
        match self {
            RtsControl::Disable => 0,
            RtsControl::Enable => 1,
            RtsControl::Handshake => 2,
            RtsControl::Toggle => 3,
        }
    }

    /// Parse the two-bit field
    pub fn from_raw(raw: u32) -> Self {
        match raw & 0x3 {
            0 => RtsControl::Disable,
            1 => RtsControl::Enable,
            2 => RtsControl::Handshake,
            _ => RtsControl::Toggle,
        }
    }
}

/// Win32 `DCB`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dcb {
    /// Declared structure length; must be at least [`Dcb::SIZE`]
    pub dcb_length: u32,
    /// Bits per second
    pub baud_rate: u32,
    /// `fBinary`
    pub binary: bool,
    /// `fParity`: input parity checking
    pub parity_check: bool,
    /// `fOutxCtsFlow`
    pub outx_cts_flow: bool,
    /// `fOutxDsrFlow`
    pub outx_dsr_flow: bool,
    /// `fDtrControl`
    pub dtr_control: DtrControl,
    /// `fDsrSensitivity`
    pub dsr_sensitivity: bool,
    /// `fTXContinueOnXoff`
    pub tx_continue_on_xoff: bool,
    /// `fOutX`
    pub out_x: bool,
    /// `fInX`
    pub in_x: bool,
    /// `fErrorChar`: replace bytes with parity errors by `error_char`
    pub error_char_enabled: bool,
    /// `fNull`
    pub null_stripping: bool,
    /// `fRtsControl`
    pub rts_control: RtsControl,
    /// `fAbortOnError`
    pub abort_on_error: bool,
    /// Input buffer fill below which XON is sent
    pub xon_limit: u16,
    /// Free input space below which XOFF is sent
    pub xoff_limit: u16,
    /// Data bits, 4-8
    pub byte_size: u8,
    /// `NOPARITY` .. `SPACEPARITY`
    pub parity: u8,
    /// `ONESTOPBIT`, `ONE5STOPBITS` or `TWOSTOPBITS`
    pub stop_bits: u8,
    /// XON character
    pub xon_char: u8,
    /// XOFF character
    pub xoff_char: u8,
    /// Substitute for bytes received with a parity error
    pub error_char: u8,
    /// End-of-input character
    pub eof_char: u8,
    /// Character that signals an event
    pub evt_char: u8,
}

impl Dcb {
    /// Canonical `sizeof(DCB)`
    pub const SIZE: usize = 28;

    /// An all-zero block carrying only a declared length
    pub fn zeroed(dcb_length: u32) -> Self {
        Self {
            dcb_length,
            baud_rate: 0,
            binary: false,
            parity_check: false,
            outx_cts_flow: false,
            outx_dsr_flow: false,
            dtr_control: DtrControl::Disable,
            dsr_sensitivity: false,
            tx_continue_on_xoff: false,
            out_x: false,
            in_x: false,
            error_char_enabled: false,
            null_stripping: false,
            rts_control: RtsControl::Disable,
            abort_on_error: false,
            xon_limit: 0,
            xoff_limit: 0,
            byte_size: 0,
            parity: NOPARITY,
            stop_bits: ONESTOPBIT,
            xon_char: 0,
            xoff_char: 0,
            error_char: 0,
            eof_char: 0,
            evt_char: 0,
        }
    }

    /// Whether the declared length covers the whole structure
    pub fn has_valid_length(&self) -> bool {
        self.dcb_length as usize >= Self::SIZE
    }

    /// Packed `fBinary` .. `fAbortOnError` bitfield
    pub fn flags(&self) -> u32 {
        let mut flags = 0u32;
        let bits = [
            (self.binary, 0),
            (self.parity_check, 1),
            (self.outx_cts_flow, 2),
            (self.outx_dsr_flow, 3),
            (self.dsr_sensitivity, 6),
            (self.tx_continue_on_xoff, 7),
            (self.out_x, 8),
            (self.in_x, 9),
            (self.error_char_enabled, 10),
            (self.null_stripping, 11),
            (self.abort_on_error, 14),
        ];
        for (set, bit) in bits {
            if set {
                flags |= 1 << bit;
            }
        }
        flags | self.dtr_control.to_raw() << 4 | self.rts_control.to_raw() << 12
    }

    /// Encode the Win32 layout; reserved words are written as zero
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        LittleEndian::write_u32(&mut buf[0..4], self.dcb_length);
        LittleEndian::write_u32(&mut buf[4..8], self.baud_rate);
        LittleEndian::write_u32(&mut buf[8..12], self.flags());
        // 12..14 wReserved
        LittleEndian::write_u16(&mut buf[14..16], self.xon_limit);
        LittleEndian::write_u16(&mut buf[16..18], self.xoff_limit);
        buf[18] = self.byte_size;
        buf[19] = self.parity;
        buf[20] = self.stop_bits;
        buf[21] = self.xon_char;
        buf[22] = self.xoff_char;
        buf[23] = self.error_char;
        buf[24] = self.eof_char;
        buf[25] = self.evt_char;
        // 26..28 wReserved1
        buf
    }

    /// Decode the Win32 layout
    ///
    /// The declared length is checked before any other field is looked at.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CommError> {
        if data.len() < 4 {
            return Err(CommError::InvalidParameter("DCB buffer too small"));
        }
        let dcb_length = LittleEndian::read_u32(&data[0..4]);
        if (dcb_length as usize) < Self::SIZE || data.len() < Self::SIZE {
            return Err(CommError::InvalidParameter("DCBlength smaller than sizeof(DCB)"));
        }

        let flags = LittleEndian::read_u32(&data[8..12]);
        let bit = |n: u32| flags & (1 << n) != 0;

        Ok(Self {
            dcb_length,
            baud_rate: LittleEndian::read_u32(&data[4..8]),
            binary: bit(0),
            parity_check: bit(1),
            outx_cts_flow: bit(2),
            outx_dsr_flow: bit(3),
            dtr_control: DtrControl::from_raw((flags >> 4) & 0x3)?,
            dsr_sensitivity: bit(6),
            tx_continue_on_xoff: bit(7),
            out_x: bit(8),
            in_x: bit(9),
            error_char_enabled: bit(10),
            null_stripping: bit(11),
            rts_control: RtsControl::from_raw((flags >> 12) & 0x3),
            abort_on_error: bit(14),
            xon_limit: LittleEndian::read_u16(&data[14..16]),
            xoff_limit: LittleEndian::read_u16(&data[16..18]),
            byte_size: data[18],
            parity: data[19],
            stop_bits: data[20],
            xon_char: data[21],
            xoff_char: data[22],
            error_char: data[23],
            eof_char: data[24],
            evt_char: data[25],
        })
    }
}

impl Default for Dcb {
    /// Binary mode, 8 data bits, no parity, one stop bit, no flow control
    fn default() -> Self {
        Self {
            binary: true,
            byte_size: 8,
            ..Self::zeroed(Self::SIZE as u32)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flag_bit_positions() {
        let dcb = Dcb {
            binary: true,
            dtr_control: DtrControl::Handshake,
            rts_control: RtsControl::Toggle,
            abort_on_error: true,
            ..Dcb::zeroed(Dcb::SIZE as u32)
        };
        assert_eq!(dcb.flags(), 0x1 | 0x20 | 0x3000 | 0x4000);
    }

    #[test]
    fn test_layout_round_trip() {
        let dcb = Dcb {
            baud_rate: 57600,
            parity_check: true,
            outx_cts_flow: true,
            in_x: true,
            rts_control: RtsControl::Handshake,
            xon_limit: 512,
            xoff_limit: 128,
            byte_size: 7,
            parity: EVENPARITY,
            stop_bits: TWOSTOPBITS,
            xon_char: 0x11,
            xoff_char: 0x13,
            ..Dcb::default()
        };
        let bytes = dcb.to_bytes();

        assert_eq!(&bytes[0..4], &[28, 0, 0, 0]);
        assert_eq!(bytes[18], 7);
        assert_eq!(Dcb::from_bytes(&bytes).unwrap(), dcb);
    }

    #[test]
    fn test_undersized_declared_length_rejected() {
        let mut bytes = Dcb::default().to_bytes();
        bytes[0] = 27;
        assert!(matches!(
            Dcb::from_bytes(&bytes),
            Err(CommError::InvalidParameter(_))
        ));
        assert!(matches!(
            Dcb::from_bytes(&bytes[..3]),
            Err(CommError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_unrecognized_dtr_rejected() {
        let mut bytes = Dcb::default().to_bytes();
        bytes[8] |= 0x30;
        assert!(matches!(
            Dcb::from_bytes(&bytes),
            Err(CommError::Unsupported(_))
        ));
    }

    #[test]
    fn test_default_is_8n1() {
        let dcb = Dcb::default();
        assert!(dcb.has_valid_length());
        assert!(dcb.binary);
        assert_eq!(dcb.byte_size, 8);
        assert_eq!(dcb.parity, NOPARITY);
        assert_eq!(dcb.stop_bits, ONESTOPBIT);
    }
}
