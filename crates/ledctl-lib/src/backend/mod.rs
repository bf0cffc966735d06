//! LED backends — trait + console (KDSETLED) and X11 implementations.

use std::fmt;

use crate::command::LedCommand;
use crate::state::LedMask;

mod console;
mod keyboard;
#[cfg(feature = "x11")]
mod x11;

pub use console::{ConsoleBackend, DEFAULT_TTY};
pub use keyboard::{KeyboardRequest, LedMode};
#[cfg(feature = "x11")]
pub use x11::X11Backend;

// ── Error type ──

/// Backend errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// names the primitive or resource (e.g. `"KDGETLED"`, `"/dev/tty1"`) and
/// *details* describes what went wrong.
#[derive(Debug)]
pub enum BackendError {
    /// The device or display could not be opened.
    OpenFailed(String),
    /// Reading the current indicator mask failed.
    QueryFailed(String),
    /// Writing an indicator change failed.
    ApplyFailed(String),
    /// The backend has no query primitive (carries the backend name).
    QueryUnsupported(&'static str),
    /// The backend is not available in this build or on this platform.
    Unsupported(String),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::OpenFailed(e) => write!(f, "Can't open LED backend: {e}"),
            BackendError::QueryFailed(e) => write!(f, "Can't get active LEDs: {e}"),
            BackendError::ApplyFailed(e) => write!(f, "Can't set LEDs: {e}"),
            BackendError::QueryUnsupported(name) => {
                write!(f, "The {name} backend cannot read LED state")
            }
            BackendError::Unsupported(e) => write!(f, "Unsupported backend: {e}"),
        }
    }
}

impl std::error::Error for BackendError {}

pub type Result<T> = std::result::Result<T, BackendError>;

// ── Trait ──

/// Effective change for one command: the command and the mask before and after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub command: LedCommand,
    pub from: LedMask,
    pub to: LedMask,
}

/// Platform primitive that lights keyboard indicators.
///
/// Mask backends write `transition.to`; per-indicator backends act on
/// `transition.command` alone. Either way `apply` must leave the indicators
/// unchanged when it returns an error.
pub trait LedBackend {
    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Whether [`query`](Self::query) can read the real indicator state.
    fn can_query(&self) -> bool {
        false
    }

    /// Read the current indicator mask.
    /// Default: not supported by this backend.
    fn query(&self) -> Result<LedMask> {
        Err(BackendError::QueryUnsupported(self.name()))
    }

    fn apply(&self, transition: &Transition) -> Result<()>;
}

impl<T: LedBackend + ?Sized> LedBackend for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn can_query(&self) -> bool {
        (**self).can_query()
    }

    fn query(&self) -> Result<LedMask> {
        (**self).query()
    }

    fn apply(&self, transition: &Transition) -> Result<()> {
        (**self).apply(transition)
    }
}

impl<T: LedBackend + ?Sized> LedBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn can_query(&self) -> bool {
        (**self).can_query()
    }

    fn query(&self) -> Result<LedMask> {
        (**self).query()
    }

    fn apply(&self, transition: &Transition) -> Result<()> {
        (**self).apply(transition)
    }
}

// ── Mock backends for testing ──

/// In-memory mock backends for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};

    /// In-memory queryable mask backend. `device` holds the "hardware" mask;
    /// every successful `apply` writes `transition.to` into it.
    pub struct MockConsole {
        pub device: Cell<LedMask>,
        /// Recorded mask writes, in order.
        pub writes: RefCell<Vec<LedMask>>,
        /// If true, `query` returns an error.
        pub fail_query: Cell<bool>,
        /// 1-based `apply` call numbers that return an error.
        pub fail_applies: RefCell<Vec<usize>>,
        apply_calls: Cell<usize>,
    }

    impl MockConsole {
        pub fn new(initial: u8) -> Self {
            MockConsole {
                device: Cell::new(LedMask::new(initial)),
                writes: RefCell::new(Vec::new()),
                fail_query: Cell::new(false),
                fail_applies: RefCell::new(Vec::new()),
                apply_calls: Cell::new(0),
            }
        }

        /// Make the `n`-th `apply` call (1-based) fail.
        pub fn fail_apply(&self, n: usize) {
            self.fail_applies.borrow_mut().push(n);
        }

        pub fn apply_calls(&self) -> usize {
            self.apply_calls.get()
        }
    }

    impl LedBackend for MockConsole {
        fn name(&self) -> &'static str {
            "mock-console"
        }

        fn can_query(&self) -> bool {
            true
        }

        fn query(&self) -> Result<LedMask> {
            if self.fail_query.get() {
                return Err(BackendError::QueryFailed(
                    "mock: query failure injected".into(),
                ));
            }
            Ok(self.device.get())
        }

        fn apply(&self, transition: &Transition) -> Result<()> {
            let n = self.apply_calls.get() + 1;
            self.apply_calls.set(n);
            if self.fail_applies.borrow().contains(&n) {
                return Err(BackendError::ApplyFailed(format!(
                    "mock: apply failure injected on call {n}"
                )));
            }
            self.device.set(transition.to);
            self.writes.borrow_mut().push(transition.to);
            Ok(())
        }
    }

    /// Write-only per-indicator backend. Records the request each command
    /// maps to, like the X11 backend would send.
    pub struct MockKeyboard {
        pub requests: RefCell<Vec<KeyboardRequest>>,
        /// If true, every `apply` returns an error.
        pub fail_apply: Cell<bool>,
    }

    impl Default for MockKeyboard {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockKeyboard {
        pub fn new() -> Self {
            MockKeyboard {
                requests: RefCell::new(Vec::new()),
                fail_apply: Cell::new(false),
            }
        }
    }

    impl LedBackend for MockKeyboard {
        fn name(&self) -> &'static str {
            "mock-keyboard"
        }

        fn apply(&self, transition: &Transition) -> Result<()> {
            if self.fail_apply.get() {
                return Err(BackendError::ApplyFailed(
                    "mock: apply failure injected".into(),
                ));
            }
            self.requests
                .borrow_mut()
                .push(KeyboardRequest::for_command(transition.command));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;
    use crate::command::{Led, Polarity};

    fn transition(to: u8) -> Transition {
        Transition {
            command: LedCommand::new(Polarity::On, Led::Caps),
            from: LedMask::EMPTY,
            to: LedMask::new(to),
        }
    }

    #[test]
    fn default_query_is_unsupported() {
        let kbd = MockKeyboard::new();
        assert!(!kbd.can_query());
        let err = kbd.query().unwrap_err();
        assert!(matches!(err, BackendError::QueryUnsupported("mock-keyboard")));
        assert_eq!(err.to_string(), "The mock-keyboard backend cannot read LED state");
    }

    #[test]
    fn reference_forwards_to_backend() {
        let dev = MockConsole::new(0x01);
        let by_ref: &dyn LedBackend = &dev;
        assert!(by_ref.can_query());
        assert_eq!(by_ref.query().unwrap(), LedMask::new(0x01));
        by_ref.apply(&transition(0x04)).unwrap();
        assert_eq!(dev.device.get(), LedMask::new(0x04));
    }

    #[test]
    fn boxed_backend_forwards() {
        let boxed: Box<dyn LedBackend> = Box::new(MockConsole::new(0x02));
        assert_eq!(boxed.name(), "mock-console");
        assert_eq!(boxed.query().unwrap(), LedMask::new(0x02));
    }

    #[test]
    fn mock_console_injected_failure_leaves_device_unchanged() {
        let dev = MockConsole::new(0x01);
        dev.fail_apply(1);
        assert!(dev.apply(&transition(0x05)).is_err());
        assert_eq!(dev.device.get(), LedMask::new(0x01));
        assert!(dev.writes.borrow().is_empty());
        dev.apply(&transition(0x05)).unwrap();
        assert_eq!(dev.apply_calls(), 2);
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            BackendError::ApplyFailed("KDSETLED: Bad file descriptor".into()).to_string(),
            "Can't set LEDs: KDSETLED: Bad file descriptor"
        );
        assert_eq!(
            BackendError::QueryFailed("KDGETLED: x".into()).to_string(),
            "Can't get active LEDs: KDGETLED: x"
        );
    }
}
