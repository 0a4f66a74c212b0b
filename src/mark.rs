//! Stable identities ("marks") for workspaces, containers and applications.
//!
//! A mark is derived only from the workspace name and the node's structural
//! position, so running the same configuration twice yields the same marks
//! and the second run can find what the first one created.
//!
//! Marks are restricted to `[A-Za-z0-9_-]`. Workspace names are escaped so
//! that any byte outside `[A-Za-z0-9]` becomes `-xx` (lowercase hex). `_`
//! only ever appears as a separator, which keeps parsing unambiguous and
//! keeps distinct workspace names from colliding.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every mark this tool creates
pub const MARK_PREFIX: &str = "flem";

/// Structural position of a node within its workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkPath {
    /// The workspace itself
    Workspace,
    /// A container, by depth-first container index
    Container { index: usize },
    /// An application, by parent container index and 1-based sibling index
    App { container: usize, index: usize },
}

/// An engine-assigned identity attached to one window or container
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mark(String);

/// A mark split back into its parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedMark {
    pub workspace: String,
    pub path: MarkPath,
}

impl Mark {
    /// Derive the mark for a node. Pure: equal inputs give equal marks.
    pub fn derive(workspace: &str, path: MarkPath) -> Self {
        let ws = format!("{}_w{}", MARK_PREFIX, escape(workspace));
        let id = match path {
            MarkPath::Workspace => ws,
            MarkPath::Container { index } => format!("{}_c{}", ws, index),
            MarkPath::App { container, index } => format!("{}_c{}_a{}", ws, container, index),
        };
        Mark(id)
    }

    pub fn container(workspace: &str, index: usize) -> Self {
        Self::derive(workspace, MarkPath::Container { index })
    }

    pub fn app(workspace: &str, container: usize, index: usize) -> Self {
        Self::derive(workspace, MarkPath::App { container, index })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover workspace name and position from a mark string.
    ///
    /// Returns `None` for marks this tool did not create.
    pub fn parse(s: &str) -> Option<ParsedMark> {
        let rest = s.strip_prefix(MARK_PREFIX)?.strip_prefix("_w")?;
        let mut parts = rest.split('_');
        let workspace = unescape(parts.next()?)?;

        let container = match parts.next() {
            None => {
                return Some(ParsedMark { workspace, path: MarkPath::Workspace });
            }
            Some(part) => parse_index(part, 'c')?,
        };

        let path = match parts.next() {
            None => MarkPath::Container { index: container },
            Some(part) => MarkPath::App { container, index: parse_index(part, 'a')? },
        };

        if parts.next().is_some() {
            return None;
        }

        Some(ParsedMark { workspace, path })
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Mark {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn parse_index(part: &str, tag: char) -> Option<usize> {
    let digits = part.strip_prefix(tag)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn escape(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        if byte.is_ascii_alphanumeric() {
            out.push(byte as char);
        } else {
            out.push_str(&format!("-{:02x}", byte));
        }
    }
    out
}

fn unescape(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'-' {
            let hex = s.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else if bytes[i].is_ascii_alphanumeric() {
            out.push(bytes[i]);
            i += 1;
        } else {
            return None;
        }
    }
    String::from_utf8(out).ok()
}
