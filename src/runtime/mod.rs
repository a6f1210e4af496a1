//! Runtime orchestration: per-pass registries, input dispatch and the render loop.

pub mod dispatch;
pub mod focus;
pub mod lifecycle;
pub mod registries;
pub mod state;
pub mod task;
pub mod tui;

pub use dispatch::{DefaultAction, DispatchOutcome, KeyHandler, StatusItem};
pub use focus::{FocusHandler, FocusId};
pub use lifecycle::LifecycleToken;
pub use registries::{PassSummary, Registries};
pub use task::{CancellationToken, TaskContext, TaskHandle};
pub use tui::{Runtime, RuntimeHandle};
