//! Addressing modes and their bit encodings.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Raised when text names no addressing mode, or when a mode cannot be
/// encoded for the requested instruction shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressingModeError {
    #[error("unrecognized addressing mode: {0}")]
    Unrecognized(String),

    #[error("invalid addressing mode for A type: {0}")]
    NotAType(AddressingMode),
}

/// The eight Pep/10 addressing modes.
///
/// Discriminants are one-hot so a family's permitted-mode set can be kept
/// as a single byte mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressingMode {
    /// Immediate.
    I = 1 << 0,
    /// Direct.
    D = 1 << 1,
    /// Indirect.
    N = 1 << 2,
    /// Stack-relative.
    S = 1 << 3,
    /// Stack-relative deferred.
    Sf = 1 << 4,
    /// Indexed.
    X = 1 << 5,
    /// Stack-indexed.
    Sx = 1 << 6,
    /// Stack-deferred indexed.
    Sfx = 1 << 7,
}

impl AddressingMode {
    /// All modes, in AAA-encoding order.
    pub const ALL: [AddressingMode; 8] = [
        AddressingMode::I,
        AddressingMode::D,
        AddressingMode::N,
        AddressingMode::S,
        AddressingMode::Sf,
        AddressingMode::X,
        AddressingMode::Sx,
        AddressingMode::Sfx,
    ];

    /// One-hot mask bit for this mode.
    pub fn mask(self) -> u8 {
        self as u8
    }

    /// Three-bit AAA field value (0..=7).
    pub fn as_aaa(self) -> u8 {
        (self as u8).trailing_zeros() as u8
    }

    /// Single-bit A field value. Only I and X encode as A.
    pub fn as_a(self) -> Result<u8, AddressingModeError> {
        match self {
            AddressingMode::I => Ok(0),
            AddressingMode::X => Ok(1),
            other => Err(AddressingModeError::NotAType(other)),
        }
    }
}

impl FromStr for AddressingMode {
    type Err = AddressingModeError;

    /// Parses an addressing-mode name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "I" => Ok(AddressingMode::I),
            "D" => Ok(AddressingMode::D),
            "N" => Ok(AddressingMode::N),
            "S" => Ok(AddressingMode::S),
            "SF" => Ok(AddressingMode::Sf),
            "X" => Ok(AddressingMode::X),
            "SX" => Ok(AddressingMode::Sx),
            "SFX" => Ok(AddressingMode::Sfx),
            _ => Err(AddressingModeError::Unrecognized(s.to_string())),
        }
    }
}

impl fmt::Display for AddressingMode {
    /// Renders the mode the way listings print it: lowercase.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AddressingMode::I => "i",
            AddressingMode::D => "d",
            AddressingMode::N => "n",
            AddressingMode::S => "s",
            AddressingMode::Sf => "sf",
            AddressingMode::X => "x",
            AddressingMode::Sx => "sx",
            AddressingMode::Sfx => "sfx",
        };
        write!(f, "{}", name)
    }
}
