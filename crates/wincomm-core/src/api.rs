//! Win32-style surface
//!
//! Mirrors the Windows comm functions: every call returns `false` (or a
//! sentinel) on failure and records the reason, readable with
//! [`last_error`](crate::error::last_error). Device names are resolved
//! through the process-wide [`DeviceRegistry`].

use std::sync::Arc;
use tracing::debug;

use crate::dcb::Dcb;
use crate::device::{CommDevice, CreateOptions};
use crate::error::{set_last_error, CommError, ErrorCode};
use crate::handle::{HandleId, HandleTable};
use crate::protocol::{CommProp, CommTimeouts, ControlDispatcher};
use crate::registry::DeviceRegistry;

fn report<T>(result: Result<T, CommError>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(code = ?err.code(), "Comm call failed: {}", err);
            set_last_error(err.code());
            None
        }
    }
}

fn store<T>(out: Option<&mut T>, value: T) -> Result<(), CommError> {
    let out = out.ok_or(CommError::InvalidParameter("null output pointer"))?;
    *out = value;
    Ok(())
}

/// `DefineCommDevice`
pub fn define_comm_device(device_name: &str, target_path: &str) -> bool {
    report(DeviceRegistry::global().define(device_name, target_path)).is_some()
}

/// `QueryCommDevice`
///
/// Returns the number of characters the double-NUL terminated path needs,
/// or 0 on failure. The last error is reset to success first.
pub fn query_comm_device(device_name: &str, target_path: &mut String, max_chars: usize) -> usize {
    set_last_error(ErrorCode::Success);
    match report(DeviceRegistry::global().query(device_name, max_chars)) {
        Some(path) => {
            let count = path.len() + 2;
            *target_path = path;
            count
        }
        None => 0,
    }
}

/// `IsCommDevice`
pub fn is_comm_device(device_name: &str) -> bool {
    DeviceRegistry::global().is_comm_device(device_name)
}

/// `CommCreateFile`; returns [`HandleId::INVALID`] on failure
pub fn comm_create_file(
    table: &mut HandleTable,
    device_name: &str,
    options: &CreateOptions,
    dispatcher: Arc<dyn ControlDispatcher>,
) -> HandleId {
    let created = CommDevice::create(device_name, options, DeviceRegistry::global(), dispatcher);
    match report(created) {
        Some(device) => table.insert(Box::new(device)),
        None => HandleId::INVALID,
    }
}

/// `CloseHandle`
pub fn close_handle(table: &mut HandleTable, handle: HandleId) -> bool {
    report(table.close(handle)).is_some()
}

/// `GetCommState`
pub fn get_comm_state(table: &HandleTable, handle: HandleId, dcb: Option<&mut Dcb>) -> bool {
    let result = table.comm(handle).and_then(|device| {
        let dcb = dcb.ok_or(CommError::InvalidParameter("null DCB"))?;
        device.get_state(dcb)
    });
    report(result).is_some()
}

/// `SetCommState`
pub fn set_comm_state(table: &mut HandleTable, handle: HandleId, dcb: Option<&Dcb>) -> bool {
    let result = table.comm_mut(handle).and_then(|device| {
        let dcb = dcb.ok_or(CommError::InvalidParameter("null DCB"))?;
        device.set_state(dcb)
    });
    report(result).is_some()
}

/// `GetCommTimeouts`
pub fn get_comm_timeouts(
    table: &HandleTable,
    handle: HandleId,
    timeouts: Option<&mut CommTimeouts>,
) -> bool {
    let result = table
        .comm(handle)
        .and_then(|device| device.get_timeouts())
        .and_then(|value| store(timeouts, value));
    report(result).is_some()
}

/// `SetCommTimeouts`
pub fn set_comm_timeouts(
    table: &mut HandleTable,
    handle: HandleId,
    timeouts: Option<&CommTimeouts>,
) -> bool {
    let result = table.comm_mut(handle).and_then(|device| {
        let timeouts = timeouts.ok_or(CommError::InvalidParameter("null COMMTIMEOUTS"))?;
        device.set_timeouts(timeouts)
    });
    report(result).is_some()
}

/// `GetCommProperties`
pub fn get_comm_properties(
    table: &HandleTable,
    handle: HandleId,
    prop: Option<&mut CommProp>,
) -> bool {
    let result = table
        .comm(handle)
        .and_then(|device| device.get_properties())
        .and_then(|value| store(prop, value));
    report(result).is_some()
}

/// `GetCommMask`
pub fn get_comm_mask(table: &HandleTable, handle: HandleId, evt_mask: Option<&mut u32>) -> bool {
    let result = table
        .comm(handle)
        .and_then(|device| device.get_mask())
        .and_then(|value| store(evt_mask, value));
    report(result).is_some()
}

/// `SetCommMask`
pub fn set_comm_mask(table: &mut HandleTable, handle: HandleId, evt_mask: u32) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.set_mask(evt_mask))).is_some()
}

/// `GetCommModemStatus`
pub fn get_comm_modem_status(
    table: &HandleTable,
    handle: HandleId,
    modem_stat: Option<&mut u32>,
) -> bool {
    let result = table
        .comm(handle)
        .and_then(|device| device.get_modem_status())
        .and_then(|value| store(modem_stat, value));
    report(result).is_some()
}

/// `GetCommConfig`
pub fn get_comm_config(table: &HandleTable, handle: HandleId) -> bool {
    report(table.comm(handle).and_then(|d| d.get_config())).is_some()
}

/// `SetCommConfig`
pub fn set_comm_config(table: &mut HandleTable, handle: HandleId, config: &[u8]) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.set_config(config))).is_some()
}

/// `SetCommBreak`
pub fn set_comm_break(table: &mut HandleTable, handle: HandleId) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.set_break())).is_some()
}

/// `ClearCommBreak`
pub fn clear_comm_break(table: &mut HandleTable, handle: HandleId) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.clear_break())).is_some()
}

/// `ClearCommError`; `errors` may be omitted
pub fn clear_comm_error(table: &mut HandleTable, handle: HandleId, errors: Option<&mut u32>) -> bool {
    let result = table.comm_mut(handle).and_then(|d| d.clear_error());
    match report(result) {
        Some(value) => {
            if let Some(errors) = errors {
                *errors = value;
            }
            true
        }
        None => false,
    }
}

/// `PurgeComm`
pub fn purge_comm(table: &mut HandleTable, handle: HandleId, flags: u32) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.purge(flags))).is_some()
}

/// `SetupComm`
pub fn setup_comm(table: &mut HandleTable, handle: HandleId, in_queue: u32, out_queue: u32) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.setup(in_queue, out_queue))).is_some()
}

/// `EscapeCommFunction`
pub fn escape_comm_function(table: &mut HandleTable, handle: HandleId, function: u32) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.escape_function(function))).is_some()
}

/// `TransmitCommChar`
pub fn transmit_comm_char(table: &mut HandleTable, handle: HandleId, ch: u8) -> bool {
    report(table.comm_mut(handle).and_then(|d| d.transmit_char(ch))).is_some()
}

/// `WaitCommEvent`
pub fn wait_comm_event(table: &mut HandleTable, handle: HandleId, evt_mask: Option<&mut u32>) -> bool {
    let result = table
        .comm_mut(handle)
        .and_then(|device| device.wait_event())
        .and_then(|value| store(evt_mask, value));
    report(result).is_some()
}
