//! Linux virtual-console backend — `KDGETLED` / `KDSETLED` on a tty.

use std::fs::File;
use std::path::{Path, PathBuf};

use super::{BackendError, LedBackend, Result, Transition};
use crate::state::LedMask;

/// Console opened when no tty is given.
pub const DEFAULT_TTY: &str = "/dev/tty1";

/// Queryable mask backend bound to one console device.
#[derive(Debug)]
pub struct ConsoleBackend {
    tty: File,
    path: PathBuf,
}

impl ConsoleBackend {
    /// Open the console device read-only. The ioctls only need a descriptor.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !cfg!(target_os = "linux") {
            return Err(BackendError::Unsupported(
                "console LEDs require the Linux KDSETLED ioctl".into(),
            ));
        }
        let tty = File::open(path)
            .map_err(|e| BackendError::OpenFailed(format!("{}: {e}", path.display())))?;
        log::debug!("opened console {}", path.display());
        Ok(Self {
            tty,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LedBackend for ConsoleBackend {
    fn name(&self) -> &'static str {
        "console"
    }

    fn can_query(&self) -> bool {
        true
    }

    fn query(&self) -> Result<LedMask> {
        sys::get_leds(&self.tty).map_err(|e| BackendError::QueryFailed(format!("KDGETLED: {e}")))
    }

    fn apply(&self, transition: &Transition) -> Result<()> {
        sys::set_leds(&self.tty, transition.to)
            .map_err(|e| BackendError::ApplyFailed(format!("KDSETLED: {e}")))
    }
}

#[cfg(target_os = "linux")]
mod sys {
    use std::fs::File;
    use std::io;
    use std::os::fd::AsRawFd;

    use crate::state::LedMask;

    // <linux/kd.h>
    const KDGETLED: u32 = 0x4B31;
    const KDSETLED: u32 = 0x4B32;

    pub fn get_leds(tty: &File) -> io::Result<LedMask> {
        let mut leds: libc::c_char = 0;
        // SAFETY: KDGETLED writes a single char through the pointer, which
        // refers to a live local for the duration of the call.
        let r = unsafe {
            libc::ioctl(
                tty.as_raw_fd(),
                KDGETLED as _,
                &mut leds as *mut libc::c_char,
            )
        };
        if r < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(LedMask::new(leds as u8))
    }

    pub fn set_leds(tty: &File, mask: LedMask) -> io::Result<()> {
        // SAFETY: KDSETLED takes the mask by value; no memory is shared.
        let r = unsafe {
            libc::ioctl(
                tty.as_raw_fd(),
                KDSETLED as _,
                libc::c_ulong::from(mask.bits()),
            )
        };
        if r < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod sys {
    use std::fs::File;
    use std::io;

    use crate::state::LedMask;

    fn unsupported() -> io::Error {
        io::Error::new(io::ErrorKind::Unsupported, "not a Linux console")
    }

    pub fn get_leds(_tty: &File) -> io::Result<LedMask> {
        Err(unsupported())
    }

    pub fn set_leds(_tty: &File, _mask: LedMask) -> io::Result<()> {
        Err(unsupported())
    }
}

#[cfg(all(test, target_os = "linux"))]
mod tests {
    use super::*;
    use crate::command::{Led, LedCommand, Polarity};

    #[test]
    fn open_missing_device_fails() {
        let err = ConsoleBackend::open("/nonexistent/tty-for-ledctl").unwrap_err();
        assert!(matches!(err, BackendError::OpenFailed(_)));
        assert!(err.to_string().contains("/nonexistent/tty-for-ledctl"));
    }

    #[test]
    fn regular_file_is_not_a_console() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let backend = ConsoleBackend::open(file.path()).unwrap();
        assert_eq!(backend.path(), file.path());
        let err = backend.query().unwrap_err();
        assert!(matches!(err, BackendError::QueryFailed(_)));
        assert!(err.to_string().contains("KDGETLED"));
    }

    #[test]
    fn apply_on_regular_file_fails() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let backend = ConsoleBackend::open(file.path()).unwrap();
        let t = Transition {
            command: LedCommand::new(Polarity::On, Led::Caps),
            from: LedMask::EMPTY,
            to: LedMask::new(0x04),
        };
        assert!(matches!(
            backend.apply(&t),
            Err(BackendError::ApplyFailed(_))
        ));
    }
}
