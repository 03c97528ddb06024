//! Color codec: textual and object color notations to normalized RGBA and back.
//!
//! Accepted notations:
//! - `{ "components": [r, g, b], "alpha": a }` (or `value` instead of `components`),
//!   channels on either the 0..1 or 0..255 scale
//! - `{ "hex": "#rrggbb" }`
//! - `rgb(r, g, b)` / `rgba(r, g, b, a)` with 0..255 integer channels
//! - `hsl(h, s%, l%)` / `hsla(h, s%, l%, a)` with the hue in degrees
//! - `#rgb` / `#rrggbb`
//! - `{r: 0.2, g: 0.4, b: 0.6, opacity: 1}`

use crate::dimension::json_number;
use crate::lexer::{comma, function_call, hex_digits, percentage, small_integer, unsigned_decimal, ws};
use dtm_core::{Color, ColorError};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::char,
    combinator::{all_consuming, map, map_opt, opt, verify},
    sequence::{delimited, preceded, tuple},
    IResult,
};
use serde::Serialize;
use serde_json::{json, Value};

/// Parse a `$value` of a color token.
pub fn parse_color(value: &Value) -> Result<Color, ColorError> {
    match value {
        Value::Object(map) => {
            let components = map
                .get("components")
                .or_else(|| map.get("value"))
                .and_then(Value::as_array)
                .filter(|c| c.len() >= 3)
                .and_then(|c| c.iter().take(3).map(Value::as_f64).collect::<Option<Vec<f64>>>());

            if let Some(c) = components {
                let alpha = map.get("alpha").and_then(Value::as_f64).unwrap_or(1.0);
                return checked_color(c[0], c[1], c[2], alpha)
                    .ok_or_else(|| invalid(value.to_string()));
            }

            match map.get("hex").and_then(Value::as_str) {
                Some(hex) => parse_color_str(hex),
                None => Err(invalid(value.to_string())),
            }
        }
        Value::String(s) => parse_color_str(s),
        other => Err(invalid(other.to_string())),
    }
}

/// Parse a textual color notation.
pub fn parse_color_str(input: &str) -> Result<Color, ColorError> {
    let trimmed = input.trim();
    all_consuming(alt((rgba, rgb, hsla, hsl, hex_color, float_object)))(trimmed)
        .map(|(_, color)| color)
        .map_err(|_| invalid(input.to_string()))
}

fn invalid(value: String) -> ColorError {
    ColorError::InvalidColorFormat { value }
}

/// Normalize channels given on either scale. `None` unless every channel
/// lands in 0..1 and alpha is already in 0..1.
fn checked_color(r: f64, g: f64, b: f64, alpha: f64) -> Option<Color> {
    if [r, g, b].iter().any(|c| !c.is_finite() || *c < 0.0) || !(0.0..=1.0).contains(&alpha) {
        return None;
    }
    let color = Color::from_components(r, g, b, alpha);
    [color.r, color.g, color.b]
        .iter()
        .all(|c| *c <= 1.0)
        .then_some(color)
}

fn byte_channel(input: &str) -> IResult<&str, f64> {
    map(verify(small_integer, |v: &u32| *v <= 255), |v| v as f64 / 255.0)(input)
}

fn alpha(input: &str) -> IResult<&str, f64> {
    verify(unsigned_decimal, |a: &f64| *a <= 1.0)(input)
}

fn rgb(input: &str) -> IResult<&str, Color> {
    map(
        function_call(
            "rgb",
            tuple((
                ws(byte_channel),
                preceded(comma, ws(byte_channel)),
                preceded(comma, ws(byte_channel)),
            )),
        ),
        |(r, g, b)| Color::rgb(r, g, b),
    )(input)
}

fn rgba(input: &str) -> IResult<&str, Color> {
    map(
        function_call(
            "rgba",
            tuple((
                ws(byte_channel),
                preceded(comma, ws(byte_channel)),
                preceded(comma, ws(byte_channel)),
                preceded(comma, ws(alpha)),
            )),
        ),
        |(r, g, b, a)| Color::rgba(r, g, b, a),
    )(input)
}

fn hsl(input: &str) -> IResult<&str, Color> {
    map(
        function_call(
            "hsl",
            tuple((
                ws(small_integer),
                preceded(comma, ws(percentage)),
                preceded(comma, ws(percentage)),
            )),
        ),
        |(h, s, l)| hsl_to_rgb(h as f64, s, l, 1.0),
    )(input)
}

fn hsla(input: &str) -> IResult<&str, Color> {
    map(
        function_call(
            "hsla",
            tuple((
                ws(small_integer),
                preceded(comma, ws(percentage)),
                preceded(comma, ws(percentage)),
                preceded(comma, ws(alpha)),
            )),
        ),
        |(h, s, l, a)| hsl_to_rgb(h as f64, s, l, a),
    )(input)
}

fn hex_color(input: &str) -> IResult<&str, Color> {
    map(verify(hex_digits, |d: &str| d.len() == 3 || d.len() == 6), expand_hex)(input)
}

fn expand_hex(digits: &str) -> Color {
    let value = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
    if digits.len() == 3 {
        let doubled: Vec<u8> = digits
            .chars()
            .map(|c| value(&format!("{c}{c}")))
            .collect();
        Color::from_rgb8(doubled[0], doubled[1], doubled[2])
    } else {
        Color::from_rgb8(value(&digits[0..2]), value(&digits[2..4]), value(&digits[4..6]))
    }
}

/// A `key: number` field, the key optionally quoted.
fn field<'a>(key: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, f64> {
    preceded(
        tuple((
            ws(alt((tag(key), delimited(char('"'), tag(key), char('"'))))),
            char(':'),
        )),
        ws(unsigned_decimal),
    )
}

fn float_object(input: &str) -> IResult<&str, Color> {
    map_opt(
        delimited(
            char('{'),
            tuple((
                field("r"),
                preceded(char(','), field("g")),
                preceded(char(','), field("b")),
                opt(preceded(char(','), field("opacity"))),
            )),
            char('}'),
        ),
        |(r, g, b, opacity)| checked_color(r, g, b, opacity.unwrap_or(1.0)),
    )(input)
}

/// Convert HSL (hue in degrees, saturation and lightness as 0..1) to RGB.
pub fn hsl_to_rgb(hue_degrees: f64, saturation: f64, lightness: f64, alpha: f64) -> Color {
    if saturation == 0.0 {
        return Color::rgba(lightness, lightness, lightness, alpha);
    }

    let h = (hue_degrees / 360.0).rem_euclid(1.0);
    let q = if lightness < 0.5 {
        lightness * (1.0 + saturation)
    } else {
        lightness + saturation - lightness * saturation
    };
    let p = 2.0 * lightness - q;

    Color::rgba(
        hue_to_channel(p, q, h + 1.0 / 3.0),
        hue_to_channel(p, q, h),
        hue_to_channel(p, q, h - 1.0 / 3.0),
        alpha,
    )
}

fn hue_to_channel(p: f64, q: f64, t: f64) -> f64 {
    let t = if t < 0.0 {
        t + 1.0
    } else if t > 1.0 {
        t - 1.0
    } else {
        t
    };

    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

/// Canonical export form of a color.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorExport {
    pub color_space: &'static str,
    pub components: [f64; 3],
    pub alpha: f64,
    pub hex: String,
}

impl ColorExport {
    /// JSON form, whole-number components written as integers.
    pub fn to_value(&self) -> Value {
        json!({
            "colorSpace": self.color_space,
            "components": self.components.iter().map(|c| json_number(*c)).collect::<Vec<_>>(),
            "alpha": json_number(self.alpha),
            "hex": self.hex,
        })
    }
}

/// Produce the canonical export form of a normalized color.
pub fn export_color(color: &Color) -> ColorExport {
    ColorExport {
        color_space: "srgb",
        components: [round6(color.r), round6(color.g), round6(color.b)],
        alpha: round6(color.a),
        hex: color.to_hex(),
    }
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
