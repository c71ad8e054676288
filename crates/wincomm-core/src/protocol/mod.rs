//! Control-Block Dispatch
//!
//! The translator exchanges fixed-size `SERIAL_*` blocks with the serial
//! driver through a [`ControlDispatcher`]. The dispatcher itself lives
//! outside this crate; it receives the device descriptor, the negotiated
//! driver dialect and the encoded block.

pub mod blocks;
pub mod commands;
mod error;

pub use blocks::{
    CommProp, CommTimeouts, ControlBlock, SerialBaudRate, SerialChars, SerialHandflow,
    SerialLineControl, SerialTimeouts,
};
pub use commands::IoctlCode;
pub use error::DispatchError;

use serde::{Deserialize, Serialize};
use std::os::fd::BorrowedFd;

/// Remote serial driver dialect a handle was opened for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SerialDriverId {
    /// Not negotiated
    #[default]
    Unknown,
    /// serial.sys
    SerialSys,
    /// SerCx.sys
    SerCxSys,
    /// SerCx2.sys
    SerCx2Sys,
}

/// The device a request is addressed to
#[derive(Debug, Clone, Copy)]
pub struct DeviceRef<'a> {
    /// Open descriptor of the device
    pub fd: BorrowedFd<'a>,
    /// Dialect negotiated when the handle was created
    pub driver: SerialDriverId,
}

/// Marshals control blocks to and from the underlying driver
///
/// `input` is empty for queries and `output` is empty for commands. On
/// success the number of bytes written to `output` is returned.
pub trait ControlDispatcher: Send + Sync {
    /// Issue one request
    fn dispatch(
        &self,
        device: DeviceRef<'_>,
        code: IoctlCode,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, DispatchError>;
}

/// Issue a query and decode the returned block
pub fn query_block<B: ControlBlock>(
    dispatcher: &dyn ControlDispatcher,
    device: DeviceRef<'_>,
    code: IoctlCode,
) -> Result<B, DispatchError> {
    let mut output = vec![0u8; B::SIZE];
    let returned = dispatcher.dispatch(device, code, &[], &mut output)?;
    if returned < B::SIZE {
        return Err(DispatchError::ShortReply {
            code,
            expected: B::SIZE,
            actual: returned,
        });
    }
    Ok(B::decode(&output))
}

/// Encode a block and issue it as a command
pub fn send_block<B: ControlBlock>(
    dispatcher: &dyn ControlDispatcher,
    device: DeviceRef<'_>,
    code: IoctlCode,
    block: &B,
) -> Result<(), DispatchError> {
    let input = block.to_bytes();
    dispatcher.dispatch(device, code, &input, &mut [])?;
    Ok(())
}
