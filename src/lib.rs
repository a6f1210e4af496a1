//! Declarative terminal UI engine.
//!
//! Invariant: single output gate. Only `core::output::OutputGate::flush(..)` writes to the
//! terminal.
//!
//! # Public API Overview
//! - Describe UI as an [`Element`] tree built from [`Text`], stacks ([`VStack`], [`HStack`],
//!   [`ZStack`]), frames and modifiers ([`ElementExt`]).
//! - Implement [`Primitive`] for leaves that draw themselves and [`Composite`] for
//!   components that declare further content.
//! - Drive it with a [`Runtime`] over any [`Terminal`]; [`ProcessTerminal`] is the real one.
//! - Interact through [`FocusHandler`], key handlers, status items and lifecycle modifiers.
//! - Share state with background work through [`Observable`] cells and a [`RuntimeHandle`].

#![allow(
    clippy::derivable_impls,
    clippy::needless_range_loop,
    clippy::new_without_default,
    clippy::too_many_arguments,
    clippy::type_complexity
)]

pub mod config;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;
pub mod view;

/// Error type and result alias.
pub use crate::error::{Result, TuiError};

/// Environment-driven configuration.
pub use crate::config::{EnvConfig, RuntimeOptions};

/// Component model, layout containers and modifiers.
pub use crate::view::{
    Composite, Dimension, Element, ElementExt, FrameSpec, HStack, Primitive, RenderContext,
    Scope, Spacer, Stack, Text, TextOverflow, VStack, ViewPath, ZStack,
};
pub use crate::view::interaction::FocusState;

/// Text buffers and alignment.
pub use crate::render::{Alignment, TextBuffer};

/// Styling, palettes and the per-frame environment.
pub use crate::core::environment::{
    Appearance, ColorRole, DefaultPalette, Environment, Palette, ThemeSet,
};
pub use crate::core::style::{Attributes, Color, Style};

/// Observable state cells.
pub use crate::core::observable::{Observable, SubscriptionId};

/// Keyboard input decoding and bindings.
pub use crate::core::input::{parse_key, Key, KeyBinding, KeyDecoder, KeyEvent};

/// Terminal interfaces and process-backed implementation.
pub use crate::core::output::{OutputGate, TerminalCmd};
pub use crate::core::terminal::Terminal;
pub use crate::platform::ProcessTerminal;

/// Runtime, focus, dispatch and lifecycle types.
pub use crate::runtime::{
    CancellationToken, DefaultAction, DispatchOutcome, FocusHandler, FocusId, LifecycleToken,
    Runtime, RuntimeHandle, StatusItem, TaskContext,
};

/// ANSI-aware wrapping helper.
pub use crate::core::text::slice::wrap_text_with_ansi;
/// ANSI-aware truncation helper.
pub use crate::core::text::utils::truncate_to_width;
/// Visible width helper that ignores ANSI control sequences.
pub use crate::core::text::width::visible_width;
/// Escape-code stripping helper.
pub use crate::core::text::ansi::strip_ansi;
