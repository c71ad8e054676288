//! # wincomm Core Library
//!
//! Emulation of the Windows serial communication API on a POSIX host.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - A registry mapping logical device names (`COM1`, `\\.\ttyS4`, ...) to device paths
//! - Creation of comm handles that own a descriptor set to a raw baseline
//! - Translation between the Win32 `DCB` and termios plus the `SERIAL_*` control blocks
//! - Timeouts and properties pass-through to a control-block dispatcher
//! - Call-compatible stubs for features without a POSIX counterpart
//! - A Win32-style surface reporting failures through a last-error code
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wincomm_core::prelude::*;
//!
//! let registry = DeviceRegistry::new();
//! registry.define("COM5", "/dev/ttyS4")?;
//!
//! let mut device = CommDevice::create("COM5", &CreateOptions::default(), &registry, dispatcher)?;
//!
//! let mut dcb = Dcb::default();
//! device.get_state(&mut dcb)?;
//! dcb.baud_rate = 115200;
//! device.set_state(&dcb)?;
//! ```

pub mod api;
pub mod capability;
pub mod dcb;
pub mod device;
pub mod error;
pub mod handle;
pub mod protocol;
pub mod registry;
pub mod termios;
pub mod translate;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::dcb::{Dcb, DtrControl, RtsControl};
    pub use crate::device::{CommDevice, CreateOptions};
    pub use crate::error::{ApplyStep, CommError, ErrorCode};
    pub use crate::handle::{HandleId, HandleKind, HandleObject, HandleTable};
    pub use crate::protocol::{
        CommProp, CommTimeouts, ControlBlock, ControlDispatcher, DeviceRef, DispatchError,
        IoctlCode, SerialDriverId,
    };
    pub use crate::registry::{DeviceRegistry, RegistryConfig};
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
