//! Shared fixtures: pseudo-terminals standing in for serial lines and a
//! recording in-memory dispatcher.

#![allow(dead_code)]

use std::collections::HashMap;
use std::os::fd::OwnedFd;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use rustix::pty::{grantpt, openpt, ptsname, unlockpt, OpenptFlags};

use wincomm_core::protocol::{
    CommProp, ControlBlock, ControlDispatcher, DeviceRef, DispatchError, IoctlCode,
    SerialBaudRate, SerialChars, SerialDriverId, SerialLineControl,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A pseudo-terminal pair; the slave path is what gets registered
pub struct Pty {
    _master: OwnedFd,
    pub path: PathBuf,
}

impl Pty {
    pub fn open() -> Self {
        let master = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY | OpenptFlags::CLOEXEC)
            .expect("failed to open a pseudo-terminal");
        grantpt(&master).unwrap();
        unlockpt(&master).unwrap();
        let name = ptsname(&master, Vec::new()).unwrap();
        Self {
            _master: master,
            path: PathBuf::from(name.into_string().unwrap()),
        }
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap()
    }
}

fn slot(code: IoctlCode) -> &'static str {
    match code {
        IoctlCode::SetBaudRate | IoctlCode::GetBaudRate => "baud",
        IoctlCode::SetLineControl | IoctlCode::GetLineControl => "line",
        IoctlCode::SetTimeouts | IoctlCode::GetTimeouts => "timeouts",
        IoctlCode::SetChars | IoctlCode::GetChars => "chars",
        IoctlCode::SetHandflow | IoctlCode::GetHandflow => "handflow",
        IoctlCode::GetProperties => "properties",
    }
}

#[derive(Default)]
struct MockState {
    blocks: HashMap<&'static str, Vec<u8>>,
    calls: Vec<IoctlCode>,
    drivers: Vec<SerialDriverId>,
    fail_on: Option<IoctlCode>,
}

/// Stores every set block and replays it on the matching get
pub struct MockDispatcher {
    state: Mutex<MockState>,
}

pub const BREAK_CHAR: u8 = 0x7F;
pub const MAX_BAUD: u32 = 0x1000_0000;

impl MockDispatcher {
    /// 9600 baud, 8N1, no flow control, a driver-owned break char
    pub fn new() -> Arc<Self> {
        let mock = Self {
            state: Mutex::new(MockState::default()),
        };
        mock.preset(
            IoctlCode::GetBaudRate,
            &SerialBaudRate { baud_rate: 9600 },
        );
        mock.preset(
            IoctlCode::GetLineControl,
            &SerialLineControl {
                stop_bits: 0,
                parity: 0,
                word_length: 8,
            },
        );
        mock.preset(
            IoctlCode::GetChars,
            &SerialChars {
                break_char: BREAK_CHAR,
                xon_char: 0x11,
                xoff_char: 0x13,
                ..Default::default()
            },
        );
        mock.preset(IoctlCode::GetHandflow, &wincomm_core::protocol::SerialHandflow::default());
        mock.preset(
            IoctlCode::GetTimeouts,
            &wincomm_core::protocol::SerialTimeouts::default(),
        );
        mock.preset(
            IoctlCode::GetProperties,
            &CommProp {
                packet_length: CommProp::SIZE as u16,
                packet_version: 2,
                max_baud: MAX_BAUD,
                ..Default::default()
            },
        );
        Arc::new(mock)
    }

    pub fn preset<B: ControlBlock>(&self, code: IoctlCode, block: &B) {
        let mut state = self.state.lock().unwrap();
        state.blocks.insert(slot(code), block.to_bytes());
    }

    /// The block currently held for `code`
    pub fn block<B: ControlBlock>(&self, code: IoctlCode) -> B {
        let state = self.state.lock().unwrap();
        B::from_bytes(&state.blocks[slot(code)]).unwrap()
    }

    pub fn fail_on(&self, code: Option<IoctlCode>) {
        self.state.lock().unwrap().fail_on = code;
    }

    pub fn calls(&self) -> Vec<IoctlCode> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn drivers(&self) -> Vec<SerialDriverId> {
        self.state.lock().unwrap().drivers.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state.lock().unwrap();
        state.calls.clear();
        state.drivers.clear();
    }
}

impl ControlDispatcher for MockDispatcher {
    fn dispatch(
        &self,
        device: DeviceRef<'_>,
        code: IoctlCode,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, DispatchError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(code);
        state.drivers.push(device.driver);

        if state.fail_on == Some(code) {
            return Err(DispatchError::Driver(format!("injected failure on {code}")));
        }

        if code.is_set() {
            state.blocks.insert(slot(code), input.to_vec());
            return Ok(0);
        }

        let data = state.blocks.get(slot(code)).cloned().unwrap_or_default();
        let n = data.len().min(output.len());
        output[..n].copy_from_slice(&data[..n]);
        Ok(n)
    }
}
