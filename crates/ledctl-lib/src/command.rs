//! LED command parsing — `[+-](scroll|num|caps|all)` tokens.

use std::fmt;
use std::str::FromStr;

use crate::state::LedMask;

/// Console LED bits from `<linux/kd.h>`.
pub const LED_SCR: u8 = 0x01;
pub const LED_NUM: u8 = 0x02;
pub const LED_CAP: u8 = 0x04;

/// A keyboard indicator, or `All` for every indicator at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Led {
    Scroll,
    Num,
    Caps,
    All,
}

impl Led {
    /// Every name accepted by the parser, in the order shown in help text.
    pub const NAMES: [&'static str; 4] = ["scroll", "num", "caps", "all"];

    /// The three physical indicators (excludes the `All` alias).
    pub const INDICATORS: [Led; 3] = [Led::Scroll, Led::Num, Led::Caps];

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scroll" => Some(Led::Scroll),
            "num" => Some(Led::Num),
            "caps" => Some(Led::Caps),
            "all" => Some(Led::All),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Led::Scroll => "scroll",
            Led::Num => "num",
            Led::Caps => "caps",
            Led::All => "all",
        }
    }

    /// Mask bits for mask-based backends. `All` sets every bit.
    pub fn bits(self) -> u8 {
        match self {
            Led::Scroll => LED_SCR,
            Led::Num => LED_NUM,
            Led::Caps => LED_CAP,
            Led::All => 0xFF,
        }
    }
}

impl fmt::Display for Led {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    On,
    Off,
}

impl Polarity {
    fn sign(self) -> char {
        match self {
            Polarity::On => '+',
            Polarity::Off => '-',
        }
    }
}

/// One parsed LED command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedCommand {
    pub polarity: Polarity,
    pub target: Led,
}

impl LedCommand {
    pub fn new(polarity: Polarity, target: Led) -> Self {
        Self { polarity, target }
    }

    /// Mask after applying this command to `mask`.
    pub fn apply_to(self, mask: LedMask) -> LedMask {
        let bits = self.target.bits();
        match self.polarity {
            Polarity::On => LedMask::new(mask.bits() | bits),
            Polarity::Off => LedMask::new(mask.bits() & !bits),
        }
    }
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.polarity.sign(), self.target)
    }
}

impl FromStr for LedCommand {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_command(s)
    }
}

/// Rejection reasons for a single command token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Token has fewer than two characters.
    TooShort(String),
    /// Token does not start with `+` or `-`.
    BadPolarity(String),
    /// Name after the sign is not a known LED (carries the name only).
    UnknownLed(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooShort(t) => write!(f, "invalid command: {t:?}"),
            ParseError::BadPolarity(t) => {
                write!(f, "command does not have prefix '-' or '+': {t}")
            }
            ParseError::UnknownLed(name) => write!(
                f,
                "unknown LED name: {name} (expected one of: {})",
                Led::NAMES.join(", ")
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one `[+-]<name>` token.
pub fn parse_command(token: &str) -> Result<LedCommand, ParseError> {
    let mut chars = token.chars();
    let (Some(sign), Some(_)) = (chars.next(), chars.clone().next()) else {
        return Err(ParseError::TooShort(token.to_string()));
    };
    let polarity = match sign {
        '+' => Polarity::On,
        '-' => Polarity::Off,
        _ => return Err(ParseError::BadPolarity(token.to_string())),
    };
    let name = chars.as_str();
    let target = Led::from_name(name).ok_or_else(|| ParseError::UnknownLed(name.to_string()))?;
    Ok(LedCommand { polarity, target })
}
