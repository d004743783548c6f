//! # Display Module
//!
//! Terminal colors for rendered segments. Colors are named in configuration
//! (`green`, `bright_red`, `gray`, …) and applied with owo-colors when the
//! `colors` feature is on. `NO_COLOR` turns all coloring off.

use std::env;
use std::str::FromStr;

#[cfg(feature = "colors")]
use owo_colors::{AnsiColors, OwoColorize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Gray,
    BrightRed,
    BrightGreen,
    BrightYellow,
    BrightBlue,
    BrightMagenta,
    BrightCyan,
    BrightWhite,
}

impl FromStr for Color {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let color = match normalized.as_str() {
            "black" => Color::Black,
            "red" => Color::Red,
            "green" => Color::Green,
            "yellow" => Color::Yellow,
            "blue" => Color::Blue,
            "magenta" | "purple" => Color::Magenta,
            "cyan" => Color::Cyan,
            "white" => Color::White,
            "gray" | "grey" | "bright_black" => Color::Gray,
            "bright_red" => Color::BrightRed,
            "bright_green" => Color::BrightGreen,
            "bright_yellow" => Color::BrightYellow,
            "bright_blue" => Color::BrightBlue,
            "bright_magenta" => Color::BrightMagenta,
            "bright_cyan" => Color::BrightCyan,
            "bright_white" => Color::BrightWhite,
            _ => return Err(()),
        };
        Ok(color)
    }
}

#[cfg(feature = "colors")]
impl From<Color> for AnsiColors {
    fn from(value: Color) -> Self {
        match value {
            Color::Black => AnsiColors::Black,
            Color::Red => AnsiColors::Red,
            Color::Green => AnsiColors::Green,
            Color::Yellow => AnsiColors::Yellow,
            Color::Blue => AnsiColors::Blue,
            Color::Magenta => AnsiColors::Magenta,
            Color::Cyan => AnsiColors::Cyan,
            Color::White => AnsiColors::White,
            Color::Gray => AnsiColors::BrightBlack,
            Color::BrightRed => AnsiColors::BrightRed,
            Color::BrightGreen => AnsiColors::BrightGreen,
            Color::BrightYellow => AnsiColors::BrightYellow,
            Color::BrightBlue => AnsiColors::BrightBlue,
            Color::BrightMagenta => AnsiColors::BrightMagenta,
            Color::BrightCyan => AnsiColors::BrightCyan,
            Color::BrightWhite => AnsiColors::BrightWhite,
        }
    }
}

pub fn colors_enabled() -> bool {
    cfg!(feature = "colors") && env::var_os("NO_COLOR").is_none_or(|v| v.is_empty())
}

/// Paint `text` with the named color. Unknown names and empty text pass through untouched.
pub fn paint(text: &str, color: &str) -> String {
    match Color::from_str(color) {
        Ok(color) if !text.is_empty() && colors_enabled() => paint_with(text, color),
        _ => text.to_string(),
    }
}

#[cfg(feature = "colors")]
fn paint_with(text: &str, color: Color) -> String {
    text.color(AnsiColors::from(color)).to_string()
}

#[cfg(not(feature = "colors"))]
fn paint_with(text: &str, _color: Color) -> String {
    text.to_string()
}

/// Pick the color for a percentage against warning/critical thresholds.
///
/// `inclusive` selects `>=` comparisons instead of `>`.
pub fn threshold_color<'a>(
    value: f64,
    warning: f64,
    critical: f64,
    inclusive: bool,
    colors: (&'a str, &'a str, &'a str),
) -> &'a str {
    let over = |limit: f64| {
        if inclusive {
            value >= limit
        } else {
            value > limit
        }
    };
    let (normal, warn, crit) = colors;
    if over(critical) {
        crit
    } else if over(warning) {
        warn
    } else {
        normal
    }
}
