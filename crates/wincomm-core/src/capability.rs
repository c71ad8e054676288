//! Capability stubs
//!
//! Comm functions with no termios counterpart. They accept any open device
//! and succeed without touching it, so callers probing these features keep
//! working.

use tracing::trace;

use crate::device::CommDevice;
use crate::error::CommError;

impl CommDevice {
    /// `SetCommBreak`
    pub fn set_break(&mut self) -> Result<(), CommError> {
        trace!(device = %self.name(), "SetCommBreak ignored");
        Ok(())
    }

    /// `ClearCommBreak`
    pub fn clear_break(&mut self) -> Result<(), CommError> {
        trace!(device = %self.name(), "ClearCommBreak ignored");
        Ok(())
    }

    /// `ClearCommError`; always reports no pending error
    pub fn clear_error(&mut self) -> Result<u32, CommError> {
        Ok(0)
    }

    /// `PurgeComm`
    pub fn purge(&mut self, flags: u32) -> Result<(), CommError> {
        trace!(device = %self.name(), flags, "PurgeComm ignored");
        Ok(())
    }

    /// `SetupComm`
    pub fn setup(&mut self, in_queue: u32, out_queue: u32) -> Result<(), CommError> {
        trace!(device = %self.name(), in_queue, out_queue, "SetupComm ignored");
        Ok(())
    }

    /// `EscapeCommFunction`
    pub fn escape_function(&mut self, function: u32) -> Result<(), CommError> {
        trace!(device = %self.name(), function, "EscapeCommFunction ignored");
        Ok(())
    }

    /// `TransmitCommChar`
    pub fn transmit_char(&mut self, ch: u8) -> Result<(), CommError> {
        trace!(device = %self.name(), ch, "TransmitCommChar ignored");
        Ok(())
    }

    /// `WaitCommEvent`; returns immediately with an empty event mask
    pub fn wait_event(&mut self) -> Result<u32, CommError> {
        Ok(0)
    }

    /// `GetCommMask`; the mask is always empty
    pub fn get_mask(&self) -> Result<u32, CommError> {
        Ok(0)
    }

    /// `SetCommMask`
    pub fn set_mask(&mut self, mask: u32) -> Result<(), CommError> {
        trace!(device = %self.name(), mask, "SetCommMask ignored");
        Ok(())
    }

    /// `GetCommModemStatus`; no modem line is reported as asserted
    pub fn get_modem_status(&self) -> Result<u32, CommError> {
        Ok(0)
    }

    /// `GetCommConfig`
    pub fn get_config(&self) -> Result<(), CommError> {
        Ok(())
    }

    /// `SetCommConfig`
    pub fn set_config(&mut self, _config: &[u8]) -> Result<(), CommError> {
        trace!(device = %self.name(), "SetCommConfig ignored");
        Ok(())
    }
}
