//! Comm device handles
//!
//! Handle lifecycle (creation, raw baseline, close) and the configuration
//! read and write paths built on the translator.

use serde::{Deserialize, Serialize};
use rustix::fs::{Mode, OFlags};
use std::fs::{self, File};
use std::os::fd::{AsFd, BorrowedFd};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::dcb::Dcb;
use crate::error::{ApplyStep, CommError};
use crate::handle::HandleId;
use crate::protocol::{
    self, CommProp, CommTimeouts, ControlBlock, ControlDispatcher, DeviceRef, IoctlCode,
    SerialBaudRate, SerialChars, SerialDriverId, SerialHandflow, SerialLineControl,
};
use crate::registry::DeviceRegistry;
use crate::termios;
use crate::translate;

/// `GENERIC_READ` access right
pub const GENERIC_READ: u32 = 0x8000_0000;
/// `GENERIC_WRITE` access right
pub const GENERIC_WRITE: u32 = 0x4000_0000;
/// The only creation disposition a comm device accepts
pub const OPEN_EXISTING: u32 = 3;

/// Parameters of a `CreateFile` request for a comm device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOptions {
    /// Expected to be `GENERIC_READ | GENERIC_WRITE`; anything else is logged
    pub desired_access: u32,
    /// Must be 0, comm devices are never shared
    pub share_mode: u32,
    /// Security attributes were supplied; logged and ignored
    pub security_attributes: bool,
    /// Must be `OPEN_EXISTING`
    pub creation_disposition: u32,
    /// Expected to be 0; anything else is logged
    pub flags_and_attributes: u32,
    /// Template files are not supported
    pub template_file: Option<HandleId>,
    /// Serial driver dialect the dispatcher should speak for this handle
    pub driver: SerialDriverId,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            desired_access: GENERIC_READ | GENERIC_WRITE,
            share_mode: 0,
            security_attributes: false,
            creation_disposition: OPEN_EXISTING,
            flags_and_attributes: 0,
            template_file: None,
            driver: SerialDriverId::Unknown,
        }
    }
}

/// An open comm device
///
/// Owns the descriptor, which is closed exactly once when the device is
/// dropped. Configuration calls are not synchronized; the `&mut self`
/// receivers leave serialization to the owner.
pub struct CommDevice {
    file: File,
    name: String,
    path: PathBuf,
    driver: SerialDriverId,
    dispatcher: Arc<dyn ControlDispatcher>,
}

impl std::fmt::Debug for CommDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommDevice")
            .field("file", &self.file)
            .field("name", &self.name)
            .field("path", &self.path)
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl CommDevice {
    /// Resolve `name` through `registry`, open the device and put it into
    /// the raw baseline
    ///
    /// Nothing is returned unless every step succeeded; on failure the
    /// descriptor, if it was opened, is closed.
    pub fn create(
        name: &str,
        options: &CreateOptions,
        registry: &DeviceRegistry,
        dispatcher: Arc<dyn ControlDispatcher>,
    ) -> Result<Self, CommError> {
        if options.desired_access != GENERIC_READ | GENERIC_WRITE {
            warn!(
                "Unexpected access to the device: {:#x}",
                options.desired_access
            );
        }

        if options.share_mode != 0 {
            return Err(CommError::SharingViolation);
        }

        if options.security_attributes {
            warn!("Unexpected security attributes");
        }

        if options.creation_disposition != OPEN_EXISTING {
            return Err(CommError::FileNotFound(name.to_string()));
        }

        let path = registry.resolve(name)?;

        let metadata = fs::metadata(&path).map_err(|e| {
            warn!("Device not found {}: {}", path.display(), e);
            CommError::FileNotFound(path.display().to_string())
        })?;

        if !metadata.file_type().is_char_device() {
            warn!("Bad device {}", path.display());
            return Err(CommError::BadDevice(path.display().to_string()));
        }

        if options.flags_and_attributes != 0 {
            warn!(
                "Unexpected flags and attributes: {:#x}",
                options.flags_and_attributes
            );
        }

        if options.template_file.is_some() {
            return Err(CommError::Unsupported("template files"));
        }

        // Non-blocking so the open cannot hang on a modem line that is not
        // asserted yet
        let fd = rustix::fs::open(
            &path,
            OFlags::RDWR | OFlags::NOCTTY | OFlags::NONBLOCK | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| {
            warn!("Failed to open device {}: {}", path.display(), e);
            CommError::BadDevice(path.display().to_string())
        })?;
        let file = File::from(fd);

        termios::clear_nonblocking(file.as_fd()).map_err(|e| {
            warn!(
                "Failed to open device {}, could not restore the O_NONBLOCK flag: {}",
                path.display(),
                e
            );
            CommError::BadDevice(path.display().to_string())
        })?;

        let mut attrs = termios::get_attr(file.as_fd())?;
        termios::apply_raw_baseline(&mut attrs);
        termios::set_attr_now(file.as_fd(), &attrs)?;

        debug!(device = name, path = %path.display(), driver = ?options.driver, "Opened comm device");

        Ok(Self {
            file,
            name: name.to_string(),
            path,
            driver: options.driver,
            dispatcher,
        })
    }

    /// Logical name the device was created with
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved device path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Driver dialect negotiated at creation
    pub fn driver(&self) -> SerialDriverId {
        self.driver
    }

    /// Close the device, releasing its descriptor
    pub fn close(self) {
        debug!(device = %self.name, "Closing comm device");
    }

    fn device_ref(&self) -> DeviceRef<'_> {
        DeviceRef {
            fd: self.file.as_fd(),
            driver: self.driver,
        }
    }

    fn query<B: ControlBlock>(&self, code: IoctlCode) -> Result<B, CommError> {
        protocol::query_block(self.dispatcher.as_ref(), self.device_ref(), code).map_err(
            |source| {
                warn!(device = %self.name, "{} failed: {}", code, source);
                CommError::Dispatch { code, source }
            },
        )
    }

    fn command<B: ControlBlock>(&self, code: IoctlCode, block: &B) -> Result<(), CommError> {
        protocol::send_block(self.dispatcher.as_ref(), self.device_ref(), code, block).map_err(
            |source| {
                warn!(device = %self.name, "{} failed: {}", code, source);
                CommError::Dispatch { code, source }
            },
        )
    }

    /// Read the current configuration into `dcb` (`GetCommState`)
    ///
    /// The block is assembled in a scratch copy carrying the caller's
    /// declared length; `dcb` is only overwritten once every query
    /// succeeded.
    pub fn get_state(&self, dcb: &mut Dcb) -> Result<(), CommError> {
        if !dcb.has_valid_length() {
            return Err(CommError::InvalidParameter(
                "DCBlength smaller than sizeof(DCB)",
            ));
        }

        let current = termios::get_attr(self.file.as_fd())?;
        let mut local = Dcb::zeroed(dcb.dcb_length);

        let baud: SerialBaudRate = self.query(IoctlCode::GetBaudRate)?;
        local.baud_rate = baud.baud_rate;

        translate::mode_flags_to_dcb(&current, &mut local);

        let handflow: SerialHandflow = self.query(IoctlCode::GetHandflow)?;
        translate::handflow_to_dcb(&handflow, &mut local);

        let line: SerialLineControl = self.query(IoctlCode::GetLineControl)?;
        translate::line_control_to_dcb(&line, &mut local);

        let chars: SerialChars = self.query(IoctlCode::GetChars)?;
        translate::chars_to_dcb(&chars, &mut local);

        *dcb = local;
        Ok(())
    }

    /// Apply `dcb` to the device (`SetCommState`)
    ///
    /// Not atomic. Baud rate, serial chars, line control, handflow and the
    /// termios flags are applied in that order and the first failure is
    /// returned as [`CommError::Step`] without undoing the earlier steps.
    /// An unsupported DTR/RTS mode fails the handflow step, after baud rate,
    /// chars and line control were already applied.
    pub fn set_state(&mut self, dcb: &Dcb) -> Result<(), CommError> {
        if !dcb.has_valid_length() {
            return Err(CommError::InvalidParameter(
                "DCBlength smaller than sizeof(DCB)",
            ));
        }

        let baud = SerialBaudRate {
            baud_rate: dcb.baud_rate,
        };
        self.command(IoctlCode::SetBaudRate, &baud)
            .map_err(|e| e.at(ApplyStep::BaudRate))?;

        // The DCB does not carry the break char, keep the driver's
        let chars: SerialChars = self
            .query(IoctlCode::GetChars)
            .map_err(|e| e.at(ApplyStep::Chars))?;
        self.command(IoctlCode::SetChars, &translate::merge_chars(dcb, chars))
            .map_err(|e| e.at(ApplyStep::Chars))?;

        let line = translate::line_control_from_dcb(dcb);
        self.command(IoctlCode::SetLineControl, &line)
            .map_err(|e| e.at(ApplyStep::LineControl))?;

        let handflow =
            translate::handflow_from_dcb(dcb).map_err(|e| e.at(ApplyStep::Handflow))?;
        self.command(IoctlCode::SetHandflow, &handflow)
            .map_err(|e| e.at(ApplyStep::Handflow))?;

        let fd = self.file.as_fd();
        let mut attrs =
            termios::get_attr(fd).map_err(|e| CommError::from(e).at(ApplyStep::Termios))?;
        translate::apply_mode_flags(dcb, &mut attrs);
        termios::set_attr_now(fd, &attrs).map_err(|e| CommError::from(e).at(ApplyStep::Termios))?;

        Ok(())
    }

    /// `GetCommTimeouts`
    pub fn get_timeouts(&self) -> Result<CommTimeouts, CommError> {
        self.query(IoctlCode::GetTimeouts)
    }

    /// `SetCommTimeouts`
    pub fn set_timeouts(&mut self, timeouts: &CommTimeouts) -> Result<(), CommError> {
        self.command(IoctlCode::SetTimeouts, timeouts)
    }

    /// `GetCommProperties`
    pub fn get_properties(&self) -> Result<CommProp, CommError> {
        self.query(IoctlCode::GetProperties)
    }
}

impl AsFd for CommDevice {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.file.as_fd()
    }
}
