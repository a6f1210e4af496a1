//! Core types: escape-sequence codec, text measurement, environment and
//! observable state.

pub mod environment;
pub mod input;
pub mod observable;
pub mod output;
pub mod sequence;
pub mod style;
pub mod terminal;
pub mod text;
