//! User-supplied soil preferences
//!
//! The texture label feeds the classifier (as a small integer code) and is
//! the fallback soil type when inference fails. The color label selects a
//! note in the recommendation text.

use serde::{Deserialize, Serialize};

/// Texture code used for labels that are not in the table
pub const DEFAULT_TEXTURE_CODE: u8 = 3;

/// Texture labels offered to users when picking a texture by feel
pub const TEXTURE_OPTIONS: [&str; 4] = ["Gritty", "medium grit", "fine", "Smooth-powdery"];

/// Color labels with a recommendation note
pub const COLOR_OPTIONS: [&str; 6] = ["Brown", "Black", "Red", "Yellow", "White", "Grey"];

/// Soil texture and color as chosen by the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    pub texture: String,
    pub color: String,
}

impl UserPreference {
    pub fn new(texture: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            texture: texture.into(),
            color: color.into(),
        }
    }

    /// Classifier feature code for the current texture label
    pub fn texture_code(&self) -> u8 {
        texture_code(&self.texture)
    }
}

impl Default for UserPreference {
    fn default() -> Self {
        Self::new("Loamy", "Brown")
    }
}

/// Map a texture label to its classifier feature code
///
/// Accepts both soil-class names and the by-feel descriptors; anything else
/// gets the Loamy code.
pub fn texture_code(label: &str) -> u8 {
    match label {
        "Sandy" | "Gritty" => 1,
        "Clayey" | "fine" => 2,
        "Loamy" | "medium grit" | "Unknown" => 3,
        "Silty" | "Smooth-powdery" => 4,
        _ => DEFAULT_TEXTURE_CODE,
    }
}
