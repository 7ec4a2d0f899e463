//! Domino palette and nearest-colour classification.

use domino_types::{DominoError, MosaicConfig, PaletteColor, Rgb};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered, non-empty set of uniquely named domino colours.
///
/// A label is the index of a colour in declaration order; every cell of a
/// [`DominoGrid`][crate::DominoGrid] holds one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<PaletteColor>", into = "Vec<PaletteColor>")]
pub struct Palette {
    colors: Vec<PaletteColor>,
}

impl Palette {
    /// Validate and wrap `colors`.
    ///
    /// # Errors
    ///
    /// [`DominoError::InvalidPalette`] when `colors` is empty or two entries
    /// share a name.
    pub fn new(colors: Vec<PaletteColor>) -> Result<Self, DominoError> {
        if colors.is_empty() {
            return Err(DominoError::InvalidPalette(
                "palette must contain at least one colour".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for c in &colors {
            if !seen.insert(c.name.as_str()) {
                return Err(DominoError::InvalidPalette(format!(
                    "duplicate colour name '{}'",
                    c.name
                )));
            }
        }
        Ok(Self { colors })
    }

    /// Label whose reference colour is closest to `rgb` in Euclidean RGB
    /// distance. Ties go to the earlier entry.
    pub fn nearest(&self, rgb: &Rgb) -> usize {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for (label, c) in self.colors.iter().enumerate() {
            let d = c.rgb.distance_squared(rgb);
            if d < best_dist {
                best = label;
                best_dist = d;
            }
        }
        best
    }

    /// Number of colours.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour for `label`.
    pub fn color(&self, label: usize) -> Option<&PaletteColor> {
        self.colors.get(label)
    }

    /// Colour name for `label`.
    pub fn name(&self, label: usize) -> Option<&str> {
        self.colors.get(label).map(|c| c.name.as_str())
    }

    /// Label of the colour called `name`.
    pub fn label_of(&self, name: &str) -> Option<usize> {
        self.colors.iter().position(|c| c.name == name)
    }

    /// Colours in label order.
    pub fn iter(&self) -> impl Iterator<Item = &PaletteColor> {
        self.colors.iter()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: MosaicConfig::default().palette,
        }
    }
}

impl TryFrom<Vec<PaletteColor>> for Palette {
    type Error = DominoError;

    fn try_from(colors: Vec<PaletteColor>) -> Result<Self, Self::Error> {
        Self::new(colors)
    }
}

impl From<Palette> for Vec<PaletteColor> {
    fn from(p: Palette) -> Self {
        p.colors
    }
}
