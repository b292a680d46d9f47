//! Display colors.
//!
//! A [`Palette`] is an ordered, non-empty list of `#RRGGBB` colors. Cluster
//! `k` always gets `palette[k % len]`, so palettes shorter than the cluster
//! count are reused cyclically.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::AttributionError;

/// Eight saturated colors that read well on a dark background.
pub const DEFAULT_PALETTE: [&str; 8] = [
    "#FF1744", "#00E5FF", "#FFEA00", "#00E676", "#D500F9", "#FF6D00", "#2979FF", "#FF4081",
];

/// A `#RRGGBB` color string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    pub fn parse(value: &str) -> Result<Self, AttributionError> {
        let valid = value.len() == 7
            && value.starts_with('#')
            && value[1..].chars().all(|c| c.is_ascii_hexdigit());
        if valid {
            Ok(Self(value.to_string()))
        } else {
            Err(AttributionError::InvalidColor(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Color {
    type Error = AttributionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Color::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new<S: AsRef<str>>(colors: &[S]) -> Result<Self, AttributionError> {
        if colors.is_empty() {
            return Err(AttributionError::EmptyPalette);
        }
        let colors = colors
            .iter()
            .map(|c| Color::parse(c.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { colors })
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Color for cluster `k`, cycling when `k >= len`.
    pub fn color_for_cluster(&self, k: usize) -> &Color {
        &self.colors[k % self.colors.len()]
    }

    /// Uniform draw from the palette.
    pub fn sample(&self, rng: &mut fastrand::Rng) -> &Color {
        &self.colors[rng.usize(..self.colors.len())]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: DEFAULT_PALETTE
                .iter()
                .map(|c| Color(c.to_string()))
                .collect(),
        }
    }
}

impl TryFrom<Vec<String>> for Palette {
    type Error = AttributionError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Palette::new(&value)
    }
}

impl From<Palette> for Vec<String> {
    fn from(palette: Palette) -> Self {
        palette.colors.into_iter().map(String::from).collect()
    }
}
