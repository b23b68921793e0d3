//! Colour value object for todo lists.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DomainError;

/// A colour from the supported palette, identified by its hex code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct Colour {
    code: &'static str,
    name: &'static str,
}

impl Colour {
    pub const WHITE: Colour = Colour::palette("#FFFFFF", "White");
    pub const RED: Colour = Colour::palette("#FF5733", "Red");
    pub const ORANGE: Colour = Colour::palette("#FFC300", "Orange");
    pub const YELLOW: Colour = Colour::palette("#FFFF66", "Yellow");
    pub const GREEN: Colour = Colour::palette("#CCFF99", "Green");
    pub const BLUE: Colour = Colour::palette("#6666FF", "Blue");
    pub const PURPLE: Colour = Colour::palette("#9966CC", "Purple");
    pub const GREY: Colour = Colour::palette("#999999", "Grey");

    const SUPPORTED: [Colour; 8] = [
        Self::WHITE,
        Self::RED,
        Self::ORANGE,
        Self::YELLOW,
        Self::GREEN,
        Self::BLUE,
        Self::PURPLE,
        Self::GREY,
    ];

    const fn palette(code: &'static str, name: &'static str) -> Self {
        Self { code, name }
    }

    /// Resolves a colour from its hex code (case-insensitive).
    pub fn from_code(code: &str) -> Result<Self, DomainError> {
        Self::SUPPORTED
            .into_iter()
            .find(|colour| colour.code.eq_ignore_ascii_case(code.trim()))
            .ok_or_else(|| DomainError::UnsupportedColour(code.to_string()))
    }

    /// Returns every supported colour.
    pub fn supported() -> &'static [Colour] {
        &Self::SUPPORTED
    }

    /// Returns the hex code, e.g. `#FFFFFF`.
    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Returns the human-readable name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Default for Colour {
    fn default() -> Self {
        Self::WHITE
    }
}

impl std::fmt::Display for Colour {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code)
    }
}

impl TryFrom<String> for Colour {
    type Error = DomainError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        Self::from_code(&code)
    }
}

impl TryFrom<&str> for Colour {
    type Error = DomainError;

    fn try_from(code: &str) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl<'de> Deserialize<'de> for Colour {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Self::from_code(&code).map_err(serde::de::Error::custom)
    }
}

impl From<Colour> for String {
    fn from(colour: Colour) -> Self {
        colour.code.to_string()
    }
}
