//! Per-indicator keyboard-control requests (X11 core `ChangeKeyboardControl`).
//!
//! A write-only backend cannot set a whole mask. A single indicator is changed
//! with an `LED` + `LED_MODE` request, while `all` is a `LED_MODE`-only
//! request that the server applies to every indicator.

use crate::command::{Led, LedCommand, Polarity};

/// `KBLed` bit of the `XChangeKeyboardControl` value mask.
pub const KB_LED: u64 = 1 << 4;
/// `KBLedMode` bit of the `XChangeKeyboardControl` value mask.
pub const KB_LED_MODE: u64 = 1 << 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedMode {
    Off = 0,
    On = 1,
}

impl From<Polarity> for LedMode {
    fn from(p: Polarity) -> Self {
        match p {
            Polarity::On => LedMode::On,
            Polarity::Off => LedMode::Off,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardRequest {
    /// Set the mode of every indicator at once.
    AllIndicators { mode: LedMode },
    /// Set the mode of one indicator, leaving the others untouched.
    Indicator { led: u8, mode: LedMode },
}

impl KeyboardRequest {
    pub fn for_command(command: LedCommand) -> Self {
        let mode = LedMode::from(command.polarity);
        match x11_led_number(command.target) {
            Some(led) => KeyboardRequest::Indicator { led, mode },
            None => KeyboardRequest::AllIndicators { mode },
        }
    }

    /// Value mask selecting which `XKeyboardControl` fields the server reads.
    pub fn value_mask(&self) -> u64 {
        match self {
            KeyboardRequest::AllIndicators { .. } => KB_LED_MODE,
            KeyboardRequest::Indicator { .. } => KB_LED | KB_LED_MODE,
        }
    }

    pub fn mode(&self) -> LedMode {
        match *self {
            KeyboardRequest::AllIndicators { mode } | KeyboardRequest::Indicator { mode, .. } => {
                mode
            }
        }
    }
}

/// Core-protocol LED number (1-based), or `None` for `All`.
fn x11_led_number(led: Led) -> Option<u8> {
    match led {
        Led::Caps => Some(1),
        Led::Num => Some(2),
        Led::Scroll => Some(3),
        Led::All => None,
    }
}
