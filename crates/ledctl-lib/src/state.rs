//! Indicator mask and the serializer's view of the current LED state.

use std::fmt;

use serde::Serialize;

use crate::backend::{BackendError, LedBackend};
use crate::command::Led;

/// Bit-per-indicator LED state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LedMask(u8);

impl LedMask {
    pub const EMPTY: LedMask = LedMask(0);
    pub const ALL: LedMask = LedMask(0xFF);

    pub const fn new(bits: u8) -> Self {
        LedMask(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Whether `led` is lit. For `All`, every indicator must be lit.
    pub fn is_lit(self, led: Led) -> bool {
        let bits = match led {
            Led::All => Led::INDICATORS.iter().fold(0, |acc, l| acc | l.bits()),
            other => other.bits(),
        };
        self.0 & bits == bits
    }

    /// Names of the lit physical indicators.
    pub fn lit(self) -> Vec<Led> {
        Led::INDICATORS
            .into_iter()
            .filter(|&led| self.is_lit(led))
            .collect()
    }
}

impl fmt::Display for LedMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

/// Last committed LED state.
///
/// Authoritative when seeded from a backend query; otherwise it starts empty
/// and only reflects the commands applied since startup.
#[derive(Debug, Clone)]
pub struct StateTracker {
    mask: LedMask,
    authoritative: bool,
}

impl StateTracker {
    /// Seed from the backend. A failed query is fatal for the session:
    /// without it there is no baseline to apply commands against.
    pub fn initialize(backend: &impl LedBackend) -> Result<Self, BackendError> {
        if backend.can_query() {
            let mask = backend.query()?;
            log::debug!("{}: initial LED state {mask}", backend.name());
            Ok(Self {
                mask,
                authoritative: true,
            })
        } else {
            log::debug!("{}: write-only backend, assuming all LEDs off", backend.name());
            Ok(Self::with_mask(LedMask::EMPTY))
        }
    }

    /// Tracker with an assumed starting state.
    pub fn with_mask(mask: LedMask) -> Self {
        Self {
            mask,
            authoritative: false,
        }
    }

    pub fn current(&self) -> LedMask {
        self.mask
    }

    pub fn commit(&mut self, mask: LedMask) {
        self.mask = mask;
    }

    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }
}
