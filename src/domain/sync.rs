//! Coordinates exchanged by the position mapper.
//!
//! Both sides are opaque to this service: they index into the engine's
//! coordinate table for the project's last build, which this core never
//! constructs or caches.

use serde::{Deserialize, Serialize};

/// A position in a source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// A position on a rendered output page. `h` and `v` are horizontal and
/// vertical offsets on the page, in the engine's output units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputLocation {
    pub page: u32,
    pub h: f64,
    pub v: f64,
}
