//! Shared value types used across multiple modules.
//!
//! Layouts, sizes and positions are parsed once from configuration and then
//! rendered into command strings, so both directions live here.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A rectangle representing window geometry as reported by the window manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

/// Container layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Layout {
    /// Children arranged left-to-right
    SplitH,
    /// Children arranged top-to-bottom
    SplitV,
    /// Children shown as tabs
    Tabbed,
    /// Children shown as a stack of title bars
    Stacking,
}

/// Error returned when a layout name is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid layout '{0}' (expected splith/h/horizontal, splitv/v/vertical, tabbed/tab/t or stacking/stack/s)")]
pub struct InvalidLayout(pub String);

impl Layout {
    /// The name the window manager uses for this layout
    pub fn as_str(self) -> &'static str {
        match self {
            Layout::SplitH => "splith",
            Layout::SplitV => "splitv",
            Layout::Tabbed => "tabbed",
            Layout::Stacking => "stacking",
        }
    }

    /// Split orientation used to create a container for this layout.
    ///
    /// Tabbed containers are created from a horizontal split and stacking
    /// containers from a vertical one, matching the dimension they resize by.
    pub fn split_orientation(self) -> SplitOrientation {
        match self {
            Layout::SplitH | Layout::Tabbed => SplitOrientation::Horizontal,
            Layout::SplitV | Layout::Stacking => SplitOrientation::Vertical,
        }
    }

    /// Whether a follow-up `layout` command is needed after the split
    pub fn needs_layout_command(self) -> bool {
        matches!(self, Layout::Tabbed | Layout::Stacking)
    }

    /// Dimension to resize a child of a container with this layout
    pub fn resize_dimension(self) -> Dimension {
        match self {
            Layout::SplitH | Layout::Tabbed => Dimension::Width,
            Layout::SplitV | Layout::Stacking => Dimension::Height,
        }
    }
}

impl FromStr for Layout {
    type Err = InvalidLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "splith" | "horizontal" | "h" => Ok(Layout::SplitH),
            "splitv" | "vertical" | "v" => Ok(Layout::SplitV),
            "tabbed" | "tab" | "t" => Ok(Layout::Tabbed),
            "stacking" | "stacked" | "stack" | "s" => Ok(Layout::Stacking),
            _ => Err(InvalidLayout(s.to_string())),
        }
    }
}

impl TryFrom<String> for Layout {
    type Error = InvalidLayout;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Layout> for String {
    fn from(layout: Layout) -> Self {
        layout.as_str().to_string()
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orientation argument of a `split` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitOrientation {
    Horizontal,
    Vertical,
}

impl fmt::Display for SplitOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitOrientation::Horizontal => f.write_str("horizontal"),
            SplitOrientation::Vertical => f.write_str("vertical"),
        }
    }
}

/// Which dimension a `resize set` command changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Width,
    Height,
    /// Width and height together, used for floating windows
    Both,
}

impl Dimension {
    /// Resolve the resize dimension for a node from its parent's layout.
    ///
    /// The flag is `false` when the layout is unknown and the caller should
    /// record a warning about the width fallback.
    pub fn for_parent(parent: Option<Layout>) -> (Dimension, bool) {
        match parent {
            Some(layout) => (layout.resize_dimension(), true),
            None => (Dimension::Width, false),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dimension::Width => f.write_str("width"),
            Dimension::Height => f.write_str("height"),
            Dimension::Both => f.write_str("width+height"),
        }
    }
}

/// Unit of a container size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeUnit {
    /// Percentage points of the parent
    Ppt,
    /// Pixels
    Px,
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnit::Ppt => f.write_str("ppt"),
            SizeUnit::Px => f.write_str("px"),
        }
    }
}

static SIZE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(ppt|px)?$").expect("size pattern is a valid regex")
});

/// A validated container size, safe to embed in a command string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawSize", into = "String")]
pub struct Size {
    pub value: u32,
    pub unit: SizeUnit,
}

/// Error returned for a size that does not match the size pattern
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid size '{0}': must be a positive number, optionally followed by 'ppt' or 'px' (e.g. '50', '50ppt', '800px')")]
pub struct InvalidSize(pub String);

impl Size {
    pub fn ppt(value: u32) -> Self {
        Self { value, unit: SizeUnit::Ppt }
    }

    pub fn px(value: u32) -> Self {
        Self { value, unit: SizeUnit::Px }
    }
}

impl FromStr for Size {
    type Err = InvalidSize;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let caps = SIZE_PATTERN
            .captures(trimmed)
            .ok_or_else(|| InvalidSize(s.to_string()))?;
        let value: u32 = caps[1].parse().map_err(|_| InvalidSize(s.to_string()))?;
        if value == 0 {
            return Err(InvalidSize(s.to_string()));
        }
        let unit = match caps.get(2).map(|m| m.as_str()) {
            Some("px") => SizeUnit::Px,
            _ => SizeUnit::Ppt,
        };
        Ok(Size { value, unit })
    }
}

/// Sizes may be written as bare integers or strings in config files
#[derive(Deserialize)]
#[serde(untagged)]
enum RawSize {
    Int(u64),
    Str(String),
}

impl TryFrom<RawSize> for Size {
    type Error = InvalidSize;

    fn try_from(raw: RawSize) -> Result<Self, Self::Error> {
        match raw {
            RawSize::Int(n) => n.to_string().parse(),
            RawSize::Str(s) => s.parse(),
        }
    }
}

impl From<Size> for String {
    fn from(size: Size) -> Self {
        size.to_string()
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit)
    }
}

/// Placement of a floating window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    Center,
    Cursor,
    Top,
    Bottom,
    Left,
    Right,
    /// Explicit coordinates, each `<n>` or `<n>px`/`<n>ppt`
    At(String, String),
}

/// Error returned for an unrecognised position
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid position '{0}' (expected center, top, bottom, left, right, cursor or '<x> <y>')")]
pub struct InvalidPosition(pub String);

static COORD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?\d+(px|ppt)?$").expect("coordinate pattern is a valid regex")
});

impl FromStr for Position {
    type Err = InvalidPosition;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "center" | "middle" => return Ok(Position::Center),
            "cursor" | "pointer" | "mouse" => return Ok(Position::Cursor),
            "top" => return Ok(Position::Top),
            "bottom" => return Ok(Position::Bottom),
            "left" => return Ok(Position::Left),
            "right" => return Ok(Position::Right),
            _ => {}
        }

        let parts: Vec<&str> = lower.split_whitespace().collect();
        match parts.as_slice() {
            [x, y] if COORD_PATTERN.is_match(x) && COORD_PATTERN.is_match(y) => {
                Ok(Position::At(x.to_string(), y.to_string()))
            }
            _ => Err(InvalidPosition(s.to_string())),
        }
    }
}

impl TryFrom<String> for Position {
    type Error = InvalidPosition;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Position> for String {
    fn from(position: Position) -> Self {
        match position {
            Position::Center => "center".to_string(),
            Position::Cursor => "cursor".to_string(),
            Position::Top => "top".to_string(),
            Position::Bottom => "bottom".to_string(),
            Position::Left => "left".to_string(),
            Position::Right => "right".to_string(),
            Position::At(x, y) => format!("{} {}", x, y),
        }
    }
}

impl Position {
    /// Arguments for `move position`
    pub fn command_args(&self) -> String {
        match self {
            Position::Center => "center".to_string(),
            Position::Cursor => "cursor".to_string(),
            Position::Top => "0 0".to_string(),
            Position::Bottom => "0 999999".to_string(),
            Position::Left => "0 center".to_string(),
            Position::Right => "999999 center".to_string(),
            Position::At(x, y) => format!("{} {}", x, y),
        }
    }
}
