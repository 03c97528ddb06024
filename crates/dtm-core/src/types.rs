//! Core value types shared by the import and export pipelines.

use std::fmt;

/// Identifier of a variable in the host store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct VariableId(pub String);

impl VariableId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VariableId {
    fn from(s: &str) -> Self {
        VariableId(s.to_string())
    }
}

impl From<String> for VariableId {
    fn from(s: String) -> Self {
        VariableId(s)
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a variable collection in the host store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CollectionId(pub String);

impl CollectionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CollectionId {
    fn from(s: &str) -> Self {
        CollectionId(s.to_string())
    }
}

impl From<String> for CollectionId {
    fn from(s: String) -> Self {
        CollectionId(s)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a mode (value slot) within a collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ModeId(pub String);

impl ModeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModeId {
    fn from(s: &str) -> Self {
        ModeId(s.to_string())
    }
}

impl From<String> for ModeId {
    fn from(s: String) -> Self {
        ModeId(s)
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A color value with every channel in the 0..1 range.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Create from 8-bit RGB values.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
            a: 1.0,
        }
    }

    /// Create from channels that may be on either the 0..1 or the 0..255 scale.
    ///
    /// If any of r, g, b exceeds 1 all three are treated as 0..255 and rescaled.
    /// Alpha is always taken as 0..1.
    pub fn from_components(r: f64, g: f64, b: f64, a: f64) -> Self {
        if r > 1.0 || g > 1.0 || b > 1.0 {
            Self::rgba(r / 255.0, g / 255.0, b / 255.0, a)
        } else {
            Self::rgba(r, g, b, a)
        }
    }

    /// Convert to 8-bit RGBA, rounding each channel to the nearest byte.
    pub fn to_rgba8(&self) -> (u8, u8, u8, u8) {
        (
            channel_to_u8(self.r),
            channel_to_u8(self.g),
            channel_to_u8(self.b),
            channel_to_u8(self.a),
        )
    }

    /// Lowercase hex string: `#rrggbb` when opaque, `#rrggbbaa` otherwise.
    pub fn to_hex(&self) -> String {
        let (r, g, b, a) = self.to_rgba8();
        if self.a == 1.0 {
            format!("#{:02x}{:02x}{:02x}", r, g, b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
        }
    }

    /// Channel-wise comparison within `tolerance`.
    pub fn approx_eq(&self, other: &Color, tolerance: f64) -> bool {
        (self.r - other.r).abs() <= tolerance
            && (self.g - other.g).abs() <= tolerance
            && (self.b - other.b).abs() <= tolerance
            && (self.a - other.a).abs() <= tolerance
    }

    // Common colors
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

fn channel_to_u8(value: f64) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Semantic type declared by a token document (`$type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TokenType {
    Color,
    Number,
    Dimension,
}

impl TokenType {
    /// Parse a declared `$type`. Unknown kinds return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "color" => Some(TokenType::Color),
            "number" => Some(TokenType::Number),
            "dimension" => Some(TokenType::Dimension),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Color => "color",
            TokenType::Number => "number",
            TokenType::Dimension => "dimension",
        }
    }

    /// The store-side type a token of this kind is materialized as.
    pub fn variable_type(&self) -> VariableType {
        match self {
            TokenType::Color => VariableType::Color,
            TokenType::Number | TokenType::Dimension => VariableType::Float,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved type of a variable in the host store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum VariableType {
    Color,
    Float,
    String,
    Boolean,
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariableType::Color => "COLOR",
            VariableType::Float => "FLOAT",
            VariableType::String => "STRING",
            VariableType::Boolean => "BOOLEAN",
        };
        f.write_str(name)
    }
}

/// A value held by a variable for one mode.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VariableValue {
    Color(Color),
    Float(f64),
    String(String),
    Boolean(bool),
    /// Reference to another variable.
    Alias(VariableId),
}

impl VariableValue {
    pub fn as_color(&self) -> Option<Color> {
        match self {
            VariableValue::Color(c) => Some(*c),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            VariableValue::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_alias(&self) -> Option<&VariableId> {
        match self {
            VariableValue::Alias(id) => Some(id),
            _ => None,
        }
    }
}
