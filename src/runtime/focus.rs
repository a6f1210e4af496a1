//! Per-pass focus registry with tab-order navigation.
//!
//! The registration order is rebuilt every render pass. Handler instances
//! outlive passes: they are keyed by [`FocusId`] and dropped only when a pass
//! ends without their id registering again.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::input::KeyEvent;

/// Key handler for a focusable element.
pub trait FocusHandler {
    /// Returns `true` when the event was consumed.
    fn handle(&mut self, event: &KeyEvent) -> bool;

    /// Called once when focus moves elsewhere or the element stops rendering.
    fn focus_lost(&mut self) {}

    /// Text inputs see events before navigation and the default shortcuts.
    fn is_text_input(&self) -> bool {
        false
    }
}

pub type FocusHandle = Rc<RefCell<Box<dyn FocusHandler>>>;

#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FocusId(Arc<str>);

impl FocusId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(Arc::from(id.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FocusId({:?})", self.as_str())
    }
}

impl fmt::Display for FocusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FocusId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FocusId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Default)]
struct Section {
    name: Option<Arc<str>>,
    ids: Vec<FocusId>,
}

#[derive(Default)]
pub struct FocusRegistry {
    handlers: HashMap<FocusId, FocusHandle>,
    sections: Vec<Section>,
    registered: HashSet<FocusId>,
    focused: Option<FocusId>,
}

impl FocusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget last pass's order. Handlers and the focused id are kept.
    pub fn begin_pass(&mut self) {
        self.sections.clear();
        self.registered.clear();
    }

    /// Register `id` in `section` for this pass.
    ///
    /// `factory` runs only the first time the id is seen. Duplicate
    /// registrations within one pass keep the first position. Returns the
    /// persistent handler and whether it currently holds focus.
    pub fn register<F>(&mut self, id: FocusId, section: Option<&str>, factory: F) -> (FocusHandle, bool)
    where
        F: FnOnce() -> Box<dyn FocusHandler>,
    {
        let handle = Rc::clone(
            self.handlers
                .entry(id.clone())
                .or_insert_with(|| Rc::new(RefCell::new(factory()))),
        );
        if self.registered.insert(id.clone()) {
            let index = match self
                .sections
                .iter()
                .position(|existing| existing.name.as_deref() == section)
            {
                Some(index) => index,
                None => {
                    self.sections.push(Section {
                        name: section.map(Arc::from),
                        ids: Vec::new(),
                    });
                    self.sections.len() - 1
                }
            };
            self.sections[index].ids.push(id.clone());
        }
        let focused = self.focused.as_ref() == Some(&id);
        (handle, focused)
    }

    /// Drop handlers that did not register this pass.
    ///
    /// Returns `true` when the focused element vanished (its `focus_lost`
    /// has fired and nothing is focused any more).
    pub fn end_pass(&mut self) -> bool {
        let mut lost = false;
        if let Some(id) = self.focused.clone() {
            if !self.registered.contains(&id) {
                self.notify_lost(&id);
                self.focused = None;
                lost = true;
            }
        }
        let registered = &self.registered;
        self.handlers.retain(|id, _| registered.contains(id));
        lost
    }

    /// Ids in navigation order: sections by first appearance, then registration order.
    pub fn order(&self) -> Vec<FocusId> {
        self.sections
            .iter()
            .flat_map(|section| section.ids.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    pub fn focused(&self) -> Option<&FocusId> {
        self.focused.as_ref()
    }

    pub fn is_focused(&self, id: &FocusId) -> bool {
        self.focused.as_ref() == Some(id)
    }

    pub fn focused_handler(&self) -> Option<FocusHandle> {
        self.focused
            .as_ref()
            .and_then(|id| self.handlers.get(id))
            .map(Rc::clone)
    }

    /// Focus a registered id. Unknown ids leave focus unchanged.
    pub fn focus(&mut self, id: &FocusId) -> bool {
        if !self.registered.contains(id) {
            return false;
        }
        if self.focused.as_ref() == Some(id) {
            return true;
        }
        if let Some(previous) = self.focused.take() {
            self.notify_lost(&previous);
        }
        self.focused = Some(id.clone());
        true
    }

    pub fn clear_focus(&mut self) {
        if let Some(previous) = self.focused.take() {
            self.notify_lost(&previous);
        }
    }

    pub fn focus_next(&mut self) -> Option<FocusId> {
        self.step(true)
    }

    pub fn focus_prev(&mut self) -> Option<FocusId> {
        self.step(false)
    }

    /// Focus the first element of the named section.
    pub fn focus_section(&mut self, name: &str) -> Option<FocusId> {
        let first = self
            .sections
            .iter()
            .find(|section| section.name.as_deref() == Some(name))
            .and_then(|section| section.ids.first())
            .cloned()?;
        self.focus(&first);
        Some(first)
    }

    fn step(&mut self, forward: bool) -> Option<FocusId> {
        let order = self.order();
        if order.is_empty() {
            return None;
        }
        let current = self
            .focused
            .as_ref()
            .and_then(|focused| order.iter().position(|id| id == focused));
        let count = order.len();
        let next = match (current, forward) {
            (Some(index), true) => (index + 1) % count,
            (Some(index), false) => (index + count - 1) % count,
            (None, true) => 0,
            (None, false) => count - 1,
        };
        let id = order[next].clone();
        self.focus(&id);
        Some(id)
    }

    fn notify_lost(&self, id: &FocusId) {
        if let Some(handle) = self.handlers.get(id) {
            // A handler that is mid-dispatch already knows it is losing focus.
            if let Ok(mut handler) = handle.try_borrow_mut() {
                handler.focus_lost();
            }
        }
    }
}

impl fmt::Debug for FocusRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FocusRegistry")
            .field("order", &self.order())
            .field("focused", &self.focused)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}
