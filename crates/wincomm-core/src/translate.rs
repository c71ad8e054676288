//! Control-Block Translator
//!
//! Pure mappings between the `DCB` and the pieces it is split into on the
//! POSIX side: `ICANON`/`INPCK` in termios, and the handflow, line control
//! and serial chars blocks. Nothing here touches a device.

use rustix::termios::{InputModes, LocalModes};
use tracing::warn;

use crate::dcb::{Dcb, DtrControl, RtsControl};
use crate::error::CommError;
use crate::protocol::blocks::*;
use crate::termios::Termios;

/// `fBinary` and `fParity` from termios
pub fn mode_flags_to_dcb(termios: &Termios, dcb: &mut Dcb) {
    dcb.binary = !termios.local_modes.contains(LocalModes::ICANON);
    if !dcb.binary {
        warn!("Unexpected nonbinary mode, consider to unset the ICANON flag");
    }
    dcb.parity_check = termios.input_modes.contains(InputModes::INPCK);
}

/// Set or clear exactly `ICANON` and `INPCK`, leaving every other flag as is
pub fn apply_mode_flags(dcb: &Dcb, termios: &mut Termios) {
    if !dcb.binary {
        warn!("Unexpected nonbinary mode, consider to unset the ICANON flag");
    }
    termios.local_modes.set(LocalModes::ICANON, !dcb.binary);
    termios.input_modes.set(InputModes::INPCK, dcb.parity_check);
}

/// DTR handshake wins over plain enable; neither bit means disable
pub fn dtr_from_handshake(control_handshake: u32) -> DtrControl {
    if control_handshake & SERIAL_DTR_HANDSHAKE != 0 {
        DtrControl::Handshake
    } else if control_handshake & SERIAL_DTR_CONTROL != 0 {
        DtrControl::Enable
    } else {
        DtrControl::Disable
    }
}

/// RTS handshake wins over plain enable; `Toggle` is never produced
pub fn rts_from_flow_replace(flow_replace: u32) -> RtsControl {
    if flow_replace & SERIAL_RTS_HANDSHAKE != 0 {
        RtsControl::Handshake
    } else if flow_replace & SERIAL_RTS_CONTROL != 0 {
        RtsControl::Enable
    } else {
        RtsControl::Disable
    }
}

/// `ControlHandShake` bits for a DTR mode
pub fn dtr_to_handshake(dtr: DtrControl) -> u32 {
    match dtr {
        DtrControl::Handshake => SERIAL_DTR_HANDSHAKE,
        DtrControl::Enable => SERIAL_DTR_CONTROL,
        DtrControl::Disable => 0,
    }
}

/// `FlowReplace` bits for an RTS mode
pub fn rts_to_flow_replace(rts: RtsControl) -> Result<u32, CommError> {
    match rts {
        RtsControl::Toggle => {
            warn!("Unsupported RTS_CONTROL_TOGGLE feature");
            Err(CommError::Unsupported("RTS_CONTROL_TOGGLE"))
        }
        RtsControl::Handshake => Ok(SERIAL_RTS_HANDSHAKE),
        RtsControl::Enable => Ok(SERIAL_RTS_CONTROL),
        RtsControl::Disable => Ok(0),
    }
}

/// Decompose a handflow block into the `DCB` flow-control fields
pub fn handflow_to_dcb(handflow: &SerialHandflow, dcb: &mut Dcb) {
    let control = handflow.control_handshake;
    let replace = handflow.flow_replace;

    dcb.outx_cts_flow = control & SERIAL_CTS_HANDSHAKE != 0;
    dcb.outx_dsr_flow = control & SERIAL_DSR_HANDSHAKE != 0;
    dcb.dtr_control = dtr_from_handshake(control);
    dcb.dsr_sensitivity = control & SERIAL_DSR_SENSITIVITY != 0;
    dcb.abort_on_error = control & SERIAL_ERROR_ABORT != 0;

    dcb.tx_continue_on_xoff = replace & SERIAL_XOFF_CONTINUE != 0;
    dcb.out_x = replace & SERIAL_AUTO_TRANSMIT != 0;
    dcb.in_x = replace & SERIAL_AUTO_RECEIVE != 0;
    dcb.error_char_enabled = replace & SERIAL_ERROR_CHAR != 0;
    dcb.null_stripping = replace & SERIAL_NULL_STRIPPING != 0;
    dcb.rts_control = rts_from_flow_replace(replace);

    dcb.xon_limit = clamp_limit(handflow.xon_limit);
    dcb.xoff_limit = clamp_limit(handflow.xoff_limit);
}

/// Build a handflow block from zero out of the `DCB` flow-control fields
pub fn handflow_from_dcb(dcb: &Dcb) -> Result<SerialHandflow, CommError> {
    let mut control = dtr_to_handshake(dcb.dtr_control);
    let mut replace = rts_to_flow_replace(dcb.rts_control)?;

    if dcb.outx_cts_flow {
        control |= SERIAL_CTS_HANDSHAKE;
    }
    if dcb.outx_dsr_flow {
        control |= SERIAL_DSR_HANDSHAKE;
    }
    if dcb.dsr_sensitivity {
        control |= SERIAL_DSR_SENSITIVITY;
    }
    if dcb.abort_on_error {
        control |= SERIAL_ERROR_ABORT;
    }

    if dcb.tx_continue_on_xoff {
        replace |= SERIAL_XOFF_CONTINUE;
    }
    if dcb.out_x {
        replace |= SERIAL_AUTO_TRANSMIT;
    }
    if dcb.in_x {
        replace |= SERIAL_AUTO_RECEIVE;
    }
    if dcb.error_char_enabled {
        replace |= SERIAL_ERROR_CHAR;
    }
    if dcb.null_stripping {
        replace |= SERIAL_NULL_STRIPPING;
    }

    Ok(SerialHandflow {
        control_handshake: control,
        flow_replace: replace,
        xon_limit: i32::from(dcb.xon_limit),
        xoff_limit: i32::from(dcb.xoff_limit),
    })
}

/// Limits outside the `u16` range of the `DCB` saturate
fn clamp_limit(limit: i32) -> u16 {
    limit.clamp(0, i32::from(u16::MAX)) as u16
}

/// Byte size, parity and stop bits share their enumerations with the block
pub fn line_control_to_dcb(line: &SerialLineControl, dcb: &mut Dcb) {
    dcb.byte_size = line.word_length;
    dcb.parity = line.parity;
    dcb.stop_bits = line.stop_bits;
}

/// Line control block for a `DCB`
pub fn line_control_from_dcb(dcb: &Dcb) -> SerialLineControl {
    SerialLineControl {
        stop_bits: dcb.stop_bits,
        parity: dcb.parity,
        word_length: dcb.byte_size,
    }
}

/// The five control characters
pub fn chars_to_dcb(chars: &SerialChars, dcb: &mut Dcb) {
    dcb.xon_char = chars.xon_char;
    dcb.xoff_char = chars.xoff_char;
    dcb.error_char = chars.error_char;
    dcb.eof_char = chars.eof_char;
    dcb.evt_char = chars.event_char;
}

/// Overwrite the five `DCB` characters in `current`, keeping the break char
pub fn merge_chars(dcb: &Dcb, current: SerialChars) -> SerialChars {
    SerialChars {
        xon_char: dcb.xon_char,
        xoff_char: dcb.xoff_char,
        error_char: dcb.error_char,
        eof_char: dcb.eof_char,
        event_char: dcb.evt_char,
        ..current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::termios::pty_attrs;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dtr_handshake_has_priority() {
        assert_eq!(
            dtr_from_handshake(SERIAL_DTR_HANDSHAKE | SERIAL_DTR_CONTROL),
            DtrControl::Handshake
        );
        assert_eq!(dtr_from_handshake(SERIAL_DTR_CONTROL), DtrControl::Enable);
        assert_eq!(dtr_from_handshake(SERIAL_CTS_HANDSHAKE), DtrControl::Disable);
    }

    #[test]
    fn test_rts_toggle_pattern_reads_as_handshake() {
        assert_eq!(
            rts_from_flow_replace(SERIAL_TRANSMIT_TOGGLE),
            RtsControl::Handshake
        );
        assert_eq!(rts_from_flow_replace(SERIAL_RTS_CONTROL), RtsControl::Enable);
        assert_eq!(rts_from_flow_replace(0), RtsControl::Disable);
    }

    #[test]
    fn test_dtr_round_trip() {
        for dtr in [DtrControl::Disable, DtrControl::Enable, DtrControl::Handshake] {
            let dcb = Dcb {
                dtr_control: dtr,
                ..Dcb::default()
            };
            let handflow = handflow_from_dcb(&dcb).unwrap();
            assert_eq!(handflow.control_handshake & !SERIAL_DTR_MASK, 0);

            let mut read = Dcb::default();
            handflow_to_dcb(&handflow, &mut read);
            assert_eq!(read.dtr_control, dtr);
        }
    }

    #[test]
    fn test_rts_round_trip() {
        for rts in [RtsControl::Disable, RtsControl::Enable, RtsControl::Handshake] {
            let dcb = Dcb {
                rts_control: rts,
                ..Dcb::default()
            };
            let handflow = handflow_from_dcb(&dcb).unwrap();

            let mut read = Dcb::default();
            handflow_to_dcb(&handflow, &mut read);
            assert_eq!(read.rts_control, rts);
        }
    }

    #[test]
    fn test_rts_toggle_rejected() {
        let dcb = Dcb {
            rts_control: RtsControl::Toggle,
            ..Dcb::default()
        };
        assert!(matches!(
            handflow_from_dcb(&dcb),
            Err(CommError::Unsupported("RTS_CONTROL_TOGGLE"))
        ));
    }

    #[test]
    fn test_flow_flags_are_independent_bits() {
        let cases: [(fn(&mut Dcb), u32, u32); 9] = [
            (|d| d.outx_cts_flow = true, SERIAL_CTS_HANDSHAKE, 0),
            (|d| d.outx_dsr_flow = true, SERIAL_DSR_HANDSHAKE, 0),
            (|d| d.dsr_sensitivity = true, SERIAL_DSR_SENSITIVITY, 0),
            (|d| d.abort_on_error = true, SERIAL_ERROR_ABORT, 0),
            (|d| d.tx_continue_on_xoff = true, 0, SERIAL_XOFF_CONTINUE),
            (|d| d.out_x = true, 0, SERIAL_AUTO_TRANSMIT),
            (|d| d.in_x = true, 0, SERIAL_AUTO_RECEIVE),
            (|d| d.error_char_enabled = true, 0, SERIAL_ERROR_CHAR),
            (|d| d.null_stripping = true, 0, SERIAL_NULL_STRIPPING),
        ];

        for (set, control, replace) in cases {
            let mut dcb = Dcb::default();
            set(&mut dcb);
            let handflow = handflow_from_dcb(&dcb).unwrap();
            assert_eq!(handflow.control_handshake, control);
            assert_eq!(handflow.flow_replace, replace);

            let mut read = Dcb::default();
            handflow_to_dcb(&handflow, &mut read);
            assert_eq!(read, dcb);
        }
    }

    #[test]
    fn test_limits() {
        let dcb = Dcb {
            xon_limit: 2048,
            xoff_limit: 512,
            ..Dcb::default()
        };
        let handflow = handflow_from_dcb(&dcb).unwrap();
        assert_eq!((handflow.xon_limit, handflow.xoff_limit), (2048, 512));

        let mut read = Dcb::default();
        handflow_to_dcb(
            &SerialHandflow {
                xon_limit: -5,
                xoff_limit: 100_000,
                ..handflow
            },
            &mut read,
        );
        assert_eq!((read.xon_limit, read.xoff_limit), (0, u16::MAX));
    }

    #[test]
    fn test_mode_flags_preserve_other_bits() {
        let mut termios = pty_attrs();
        termios.local_modes = LocalModes::ICANON | LocalModes::ECHO;
        termios.input_modes = InputModes::IXON;

        let dcb = Dcb {
            binary: true,
            parity_check: true,
            ..Dcb::default()
        };
        apply_mode_flags(&dcb, &mut termios);
        assert_eq!(termios.local_modes, LocalModes::ECHO);
        assert_eq!(termios.input_modes, InputModes::IXON | InputModes::INPCK);

        let mut read = Dcb::zeroed(Dcb::SIZE as u32);
        mode_flags_to_dcb(&termios, &mut read);
        assert!(read.binary);
        assert!(read.parity_check);

        let dcb = Dcb {
            binary: false,
            parity_check: false,
            ..Dcb::default()
        };
        apply_mode_flags(&dcb, &mut termios);
        assert_eq!(termios.local_modes, LocalModes::ICANON | LocalModes::ECHO);
        assert_eq!(termios.input_modes, InputModes::IXON);
    }

    #[test]
    fn test_chars_keep_break_char() {
        let current = SerialChars {
            break_char: 0x7F,
            ..Default::default()
        };
        let dcb = Dcb {
            xon_char: 0x11,
            xoff_char: 0x13,
            error_char: b'?',
            eof_char: 0x1A,
            evt_char: b'\n',
            ..Dcb::default()
        };

        let merged = merge_chars(&dcb, current);
        assert_eq!(merged.break_char, 0x7F);

        let mut read = Dcb::default();
        chars_to_dcb(&merged, &mut read);
        assert_eq!(read, dcb);
    }

    #[test]
    fn test_line_control_verbatim() {
        let dcb = Dcb {
            byte_size: 5,
            parity: crate::dcb::MARKPARITY,
            stop_bits: crate::dcb::ONE5STOPBITS,
            ..Dcb::default()
        };
        let line = line_control_from_dcb(&dcb);
        assert_eq!(
            line,
            SerialLineControl {
                stop_bits: 1,
                parity: 3,
                word_length: 5
            }
        );

        let mut read = Dcb::default();
        line_control_to_dcb(&line, &mut read);
        assert_eq!(read, dcb);
    }
}
