//! Per-pass registries owned by the runtime and threaded through resolution.

use crate::core::input::KeyEvent;
use crate::runtime::dispatch::{dispatch_key, DispatchOutcome, KeyHandlerRegistry, StatusBar};
use crate::runtime::focus::FocusRegistry;
use crate::runtime::lifecycle::{LifecycleToken, LifecycleTracker};
use crate::runtime::state::StateStore;

/// What ending a pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub disappeared: Vec<LifecycleToken>,
    pub focus_lost: bool,
    pub state_collected: usize,
}

#[derive(Debug, Default)]
pub struct Registries {
    pub focus: FocusRegistry,
    pub lifecycle: LifecycleTracker,
    pub key_handlers: KeyHandlerRegistry,
    pub status: StatusBar,
    pub state: StateStore,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&mut self) {
        self.focus.begin_pass();
        self.lifecycle.begin_pass();
        self.key_handlers.begin_pass();
        self.status.begin_pass();
        self.state.begin_pass();
    }

    pub fn end_pass(&mut self) -> PassSummary {
        PassSummary {
            disappeared: self.lifecycle.end_pass(),
            focus_lost: self.focus.end_pass(),
            state_collected: self.state.end_pass(),
        }
    }

    pub fn dispatch(&mut self, event: &KeyEvent, defaults: bool) -> DispatchOutcome {
        dispatch_key(
            event,
            &self.status,
            &self.key_handlers,
            &mut self.focus,
            defaults,
        )
    }
}
