//! Text helpers (escape scanning, width, slicing/wrapping, truncation).
//!
//! Everything here is pure string-in/string-out so the view layer can use it
//! without depending on the renderer.

pub mod ansi;
pub mod slice;
pub mod utils;
pub mod width;
