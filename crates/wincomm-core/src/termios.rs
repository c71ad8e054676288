//! termios access
//!
//! Wrappers over tcgetattr/tcsetattr/fcntl returning `io::Result`, and the
//! raw baseline every handle starts from.

use std::io;
use std::os::fd::BorrowedFd;

use rustix::fs::{fcntl_getfl, fcntl_setfl, OFlags};
use rustix::termios::{
    tcgetattr, tcsetattr, ControlModes, InputModes, LocalModes, OptionalActions, OutputModes,
};

pub use rustix::termios::Termios;

/// Read the current terminal attributes
pub fn get_attr(fd: BorrowedFd<'_>) -> io::Result<Termios> {
    Ok(tcgetattr(fd)?)
}

/// Apply terminal attributes with `TCSANOW` and read them back
///
/// Buffers are neither drained nor flushed and pending I/O is not
/// interrupted. tcsetattr succeeds when any one of the requested changes
/// was made, so a mode word that did not stick is reported as an error.
pub fn set_attr_now(fd: BorrowedFd<'_>, requested: &Termios) -> io::Result<()> {
    tcsetattr(fd, OptionalActions::Now, requested)?;

    let applied = tcgetattr(fd)?;
    if !same_modes(requested, &applied) {
        return Err(io::Error::other(format!(
            "terminal attributes not applied: requested {:?}, got {:?}",
            requested, applied
        )));
    }
    Ok(())
}

/// Input, output, control and local mode words are equal
pub(crate) fn same_modes(a: &Termios, b: &Termios) -> bool {
    a.input_modes == b.input_modes
        && a.output_modes == b.output_modes
        && a.control_modes == b.control_modes
        && a.local_modes == b.local_modes
}

/// Clear `O_NONBLOCK` so later reads and writes block normally
pub fn clear_nonblocking(fd: BorrowedFd<'_>) -> io::Result<()> {
    let flags = fcntl_getfl(fd)?;
    fcntl_setfl(fd, flags - OFlags::NONBLOCK)?;
    Ok(())
}

/// Whether `O_NONBLOCK` is set on the descriptor
pub fn is_nonblocking(fd: BorrowedFd<'_>) -> io::Result<bool> {
    Ok(fcntl_getfl(fd)?.contains(OFlags::NONBLOCK))
}

/// Turn the attributes into the raw baseline used by every new handle
///
/// Input post-processing is disabled (IGNBRK and IXON belong to the handflow
/// block and are left alone), output post-processing and all local modes are
/// cleared, and the line is marked local with the receiver enabled. Character
/// size and parity belong to the line control block and are not touched.
pub fn apply_raw_baseline(termios: &mut Termios) {
    termios.input_modes -= InputModes::BRKINT
        | InputModes::PARMRK
        | InputModes::ISTRIP
        | InputModes::INLCR
        | InputModes::IGNCR
        | InputModes::ICRNL;
    termios.output_modes = OutputModes::empty();
    termios.local_modes = LocalModes::empty();
    termios.control_modes |= ControlModes::CLOCAL | ControlModes::CREAD;
}

/// Attributes of a fresh pseudo-terminal slave
#[cfg(test)]
pub(crate) fn pty_attrs() -> Termios {
    let pty = test_pty::TestPty::open();
    get_attr(pty.slave()).unwrap()
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::os::fd::AsFd;

    #[test]
    fn test_raw_baseline() {
        let mut termios = pty_attrs();
        termios.input_modes = InputModes::BRKINT
            | InputModes::ICRNL
            | InputModes::IXON
            | InputModes::IGNBRK
            | InputModes::INPCK;
        termios.output_modes = OutputModes::OPOST | OutputModes::ONLCR;
        termios.local_modes =
            LocalModes::ECHO | LocalModes::ICANON | LocalModes::ISIG | LocalModes::IEXTEN;
        termios.control_modes = ControlModes::CS7 | ControlModes::PARENB;

        apply_raw_baseline(&mut termios);

        assert_eq!(
            termios.input_modes,
            InputModes::IXON | InputModes::IGNBRK | InputModes::INPCK
        );
        assert_eq!(termios.output_modes, OutputModes::empty());
        assert_eq!(termios.local_modes, LocalModes::empty());
        assert_eq!(
            termios.control_modes,
            ControlModes::CS7 | ControlModes::PARENB | ControlModes::CLOCAL | ControlModes::CREAD
        );
    }

    #[test]
    fn test_get_attr_on_regular_file_fails() {
        let file = tempfile::tempfile().unwrap();
        let err = get_attr(file.as_fd()).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(rustix::io::Errno::NOTTY.raw_os_error()));
    }

    #[test]
    fn test_set_attr_now_reads_back() {
        let pty = test_pty::TestPty::open();
        let mut attrs = get_attr(pty.slave()).unwrap();
        apply_raw_baseline(&mut attrs);

        set_attr_now(pty.slave(), &attrs).unwrap();
        assert!(same_modes(&attrs, &get_attr(pty.slave()).unwrap()));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_set_attr_now_reports_ignored_modes() {
        // The Linux pty driver forces CS8 and clears PARENB on every apply
        let pty = test_pty::TestPty::open();
        let mut attrs = get_attr(pty.slave()).unwrap();
        attrs.control_modes |= ControlModes::PARENB;

        let err = set_attr_now(pty.slave(), &attrs).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn test_same_modes_compares_every_word() {
        let a = pty_attrs();
        assert!(same_modes(&a, &a.clone()));

        let mut b = a.clone();
        b.local_modes.toggle(LocalModes::ECHO);
        assert!(!same_modes(&a, &b));

        let mut c = a.clone();
        c.input_modes.toggle(InputModes::INPCK);
        assert!(!same_modes(&a, &c));
    }

    #[test]
    fn test_clear_nonblocking() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let fd = rustix::fs::open(tmp.path(), OFlags::RDWR | OFlags::NONBLOCK, rustix::fs::Mode::empty())
            .unwrap();

        assert!(is_nonblocking(fd.as_fd()).unwrap());
        clear_nonblocking(fd.as_fd()).unwrap();
        assert!(!is_nonblocking(fd.as_fd()).unwrap());
    }
}
