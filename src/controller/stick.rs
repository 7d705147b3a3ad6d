//! Analog stick state
//!
//! Axes are 12-bit (0..=4095) with the neutral position at 2048, matching the
//! report encoding of the emulated controller.

use thiserror::Error;

/// Minimum axis value
pub const STICK_MIN: u16 = 0;
/// Maximum axis value (12-bit)
pub const STICK_MAX: u16 = 4095;
/// Neutral axis value
pub const STICK_CENTER: u16 = 2048;

/// Stick identifier
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Parse a console token (`l`, `left`, `r`, `right`)
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "l" | "left" => Some(Side::Left),
            "r" | "right" => Some(Side::Right),
            _ => None,
        }
    }

    /// Short token used in command syntax
    pub fn token(&self) -> &'static str {
        match self {
            Side::Left => "l",
            Side::Right => "r",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// A single stick mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickMotion {
    Center,
    Up,
    Down,
    Left,
    Right,
    /// Set the horizontal axis to an explicit value
    Horizontal(u16),
    /// Set the vertical axis to an explicit value
    Vertical(u16),
}

/// Error parsing stick direction/value tokens from the console or a config chain
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StickParseError {
    #[error("missing value for direction \"{0}\"")]
    MissingValue(String),
    #[error("unexpected stick value \"{0}\"")]
    BadValue(String),
    #[error("unexpected direction \"{0}\"")]
    BadDirection(String),
}

impl StickMotion {
    /// Parse a `direction [value]` token pair.
    ///
    /// `h`/`horizontal` and `v`/`vertical` require a numeric value; the named
    /// directions ignore any trailing value.
    pub fn from_tokens(direction: &str, value: Option<&str>) -> Result<Self, StickParseError> {
        match direction {
            "center" => Ok(StickMotion::Center),
            "up" => Ok(StickMotion::Up),
            "down" => Ok(StickMotion::Down),
            "left" => Ok(StickMotion::Left),
            "right" => Ok(StickMotion::Right),
            "h" | "horizontal" => Ok(StickMotion::Horizontal(Self::parse_value(
                direction, value,
            )?)),
            "v" | "vertical" => Ok(StickMotion::Vertical(Self::parse_value(direction, value)?)),
            other => Err(StickParseError::BadDirection(other.to_string())),
        }
    }

    fn parse_value(direction: &str, value: Option<&str>) -> Result<u16, StickParseError> {
        let raw = value.ok_or_else(|| StickParseError::MissingValue(direction.to_string()))?;
        raw.parse::<u16>()
            .map_err(|_| StickParseError::BadValue(raw.to_string()))
    }

    /// Tokens of this motion in command syntax (`center`, `h 3200`, ...)
    pub fn tokens(&self) -> Vec<String> {
        match self {
            StickMotion::Center => vec!["center".into()],
            StickMotion::Up => vec!["up".into()],
            StickMotion::Down => vec!["down".into()],
            StickMotion::Left => vec!["left".into()],
            StickMotion::Right => vec!["right".into()],
            StickMotion::Horizontal(v) => vec!["h".into(), v.to_string()],
            StickMotion::Vertical(v) => vec!["v".into(), v.to_string()],
        }
    }
}

/// Axis value out of the 12-bit range
#[derive(Debug, Error, PartialEq, Eq)]
#[error("stick value {0} is out of range ({STICK_MIN}..={STICK_MAX})")]
pub struct StickRangeError(pub u16);

/// One analog stick, both axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickState {
    h: u16,
    v: u16,
}

impl Default for StickState {
    fn default() -> Self {
        Self {
            h: STICK_CENTER,
            v: STICK_CENTER,
        }
    }
}

impl StickState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_h(&self) -> u16 {
        self.h
    }

    pub fn get_v(&self) -> u16 {
        self.v
    }

    pub fn set_h(&mut self, value: u16) -> Result<(), StickRangeError> {
        if value > STICK_MAX {
            return Err(StickRangeError(value));
        }
        self.h = value;
        Ok(())
    }

    pub fn set_v(&mut self, value: u16) -> Result<(), StickRangeError> {
        if value > STICK_MAX {
            return Err(StickRangeError(value));
        }
        self.v = value;
        Ok(())
    }

    pub fn set_center(&mut self) {
        self.h = STICK_CENTER;
        self.v = STICK_CENTER;
    }

    pub fn set_up(&mut self) {
        self.v = STICK_MAX;
    }

    pub fn set_down(&mut self) {
        self.v = STICK_MIN;
    }

    pub fn set_left(&mut self) {
        self.h = STICK_MIN;
    }

    pub fn set_right(&mut self) {
        self.h = STICK_MAX;
    }

    /// Apply a parsed motion
    pub fn apply(&mut self, motion: StickMotion) -> Result<(), StickRangeError> {
        match motion {
            StickMotion::Center => self.set_center(),
            StickMotion::Up => self.set_up(),
            StickMotion::Down => self.set_down(),
            StickMotion::Left => self.set_left(),
            StickMotion::Right => self.set_right(),
            StickMotion::Horizontal(v) => self.set_h(v)?,
            StickMotion::Vertical(v) => self.set_v(v)?,
        }
        Ok(())
    }

    /// Pack both axes into the 3-byte wire layout (little-endian 12-bit pair)
    pub fn to_bytes(&self) -> [u8; 3] {
        [
            (self.h & 0xFF) as u8,
            ((self.h >> 8) as u8) | (((self.v & 0xF) as u8) << 4),
            (self.v >> 4) as u8,
        ]
    }
}
