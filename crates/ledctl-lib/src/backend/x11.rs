//! X11 backend — core-protocol `XChangeKeyboardControl` through libX11.

use std::ffi::CString;
use std::ptr::NonNull;

use libc::{c_char, c_int, c_ulong};

use super::keyboard::KeyboardRequest;
use super::{BackendError, LedBackend, Result, Transition};

#[repr(C)]
struct Display {
    _private: [u8; 0],
}

/// `XKeyboardControl` from `<X11/Xlib.h>`.
#[repr(C)]
#[derive(Default)]
struct XKeyboardControl {
    key_click_percent: c_int,
    bell_percent: c_int,
    bell_pitch: c_int,
    bell_duration: c_int,
    led: c_int,
    led_mode: c_int,
    key: c_int,
    auto_repeat_mode: c_int,
}

#[link(name = "X11")]
unsafe extern "C" {
    fn XOpenDisplay(name: *const c_char) -> *mut Display;
    fn XCloseDisplay(display: *mut Display) -> c_int;
    fn XChangeKeyboardControl(
        display: *mut Display,
        value_mask: c_ulong,
        values: *mut XKeyboardControl,
    ) -> c_int;
    fn XFlush(display: *mut Display) -> c_int;
}

/// Write-only per-indicator backend bound to one X display.
///
/// The display connection is not shared; it is used only by the thread that
/// owns the backend.
pub struct X11Backend {
    display: NonNull<Display>,
}

impl X11Backend {
    /// Connect to `display`, or to `$DISPLAY` when `None`.
    pub fn open(display: Option<&str>) -> Result<Self> {
        let c_name = display
            .map(CString::new)
            .transpose()
            .map_err(|e| BackendError::OpenFailed(format!("display name: {e}")))?;
        let name_ptr = c_name.as_ref().map_or(std::ptr::null(), |n| n.as_ptr());
        // SAFETY: `name_ptr` is null or a NUL-terminated string alive for the call.
        let raw = unsafe { XOpenDisplay(name_ptr) };
        let label = display
            .map(str::to_string)
            .or_else(|| std::env::var("DISPLAY").ok())
            .unwrap_or_default();
        let display = NonNull::new(raw).ok_or_else(|| {
            BackendError::OpenFailed(format!("XOpenDisplay: cannot open display {label:?}"))
        })?;
        log::debug!("connected to X display {label:?}");
        Ok(Self { display })
    }
}

impl LedBackend for X11Backend {
    fn name(&self) -> &'static str {
        "x11"
    }

    // Xlib reports protocol errors asynchronously through the error handler,
    // so a sent request cannot be observed failing here.
    fn apply(&self, transition: &Transition) -> Result<()> {
        let request = KeyboardRequest::for_command(transition.command);
        let mut values = XKeyboardControl {
            led_mode: request.mode() as c_int,
            ..Default::default()
        };
        if let KeyboardRequest::Indicator { led, .. } = request {
            values.led = c_int::from(led);
        }
        // SAFETY: `display` is a live connection owned by `self`, and
        // `values` outlives the call; the server reads only masked fields.
        unsafe {
            XChangeKeyboardControl(
                self.display.as_ptr(),
                request.value_mask() as c_ulong,
                &mut values,
            );
            XFlush(self.display.as_ptr());
        }
        log::trace!("x11: {request:?}");
        Ok(())
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        // SAFETY: the connection was opened by `open` and is closed exactly once.
        unsafe {
            XCloseDisplay(self.display.as_ptr());
        }
    }
}
