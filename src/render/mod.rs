//! Rendering pipeline: the 2D text buffer model and the screen diff renderer.

pub mod buffer;
pub mod renderer;

pub use buffer::{Alignment, TextBuffer};
pub use renderer::{RenderStats, ScreenRenderer};
