//! Modifiers that register with the pass registries: focus, keys, status
//! items and lifecycle callbacks.

use std::rc::Rc;
use std::sync::Arc;

use crate::core::input::KeyEvent;
use crate::render::buffer::TextBuffer;
use crate::runtime::dispatch::{KeyHandler, StatusItem};
use crate::runtime::focus::{FocusHandler, FocusId};
use crate::runtime::lifecycle::LifecycleCallback;
use crate::runtime::task::TaskFn;
use crate::view::resolve::Scope;
use crate::view::{Element, Primitive};

/// Environment value visible below a [`Focusable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusState {
    pub id: FocusId,
    pub focused: bool,
}

type HandlerFactory = Rc<dyn Fn() -> Box<dyn FocusHandler>>;

pub struct Focusable {
    child: Element,
    id: Option<FocusId>,
    factory: HandlerFactory,
}

impl Focusable {
    pub fn new<F, H>(child: impl Into<Element>, id: Option<FocusId>, factory: F) -> Self
    where
        F: Fn() -> H + 'static,
        H: FocusHandler + 'static,
    {
        Self {
            child: child.into(),
            id,
            factory: Rc::new(move || Box::new(factory()) as Box<dyn FocusHandler>),
        }
    }
}

impl Primitive for Focusable {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let factory = Rc::clone(&self.factory);
        let registration = scope.register_focus(self.id.clone(), move || factory());
        let env = scope.env().with_value(FocusState {
            id: registration.id,
            focused: registration.focused,
        });
        let ctx = scope.context().with_env(env);
        scope.resolve_child_in(0, &self.child, ctx)
    }
}

/// Names the focus section its descendants register into.
pub struct FocusSection {
    child: Element,
    name: Arc<str>,
}

impl FocusSection {
    pub fn new(child: impl Into<Element>, name: &str) -> Self {
        Self {
            child: child.into(),
            name: Arc::from(name),
        }
    }
}

impl Primitive for FocusSection {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let name = Arc::clone(&self.name);
        scope.in_section(&name, |scope| scope.resolve_child(0, &self.child))
    }
}

pub struct OnKey {
    child: Element,
    handler: KeyHandler,
}

impl OnKey {
    pub fn new(child: impl Into<Element>, handler: impl Fn(&KeyEvent) -> bool + 'static) -> Self {
        Self {
            child: child.into(),
            handler: Rc::new(handler),
        }
    }
}

impl Primitive for OnKey {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        scope.register_key_handler(Rc::clone(&self.handler));
        scope.resolve_child(0, &self.child)
    }
}

pub struct StatusEntry {
    child: Element,
    item: StatusItem,
}

impl StatusEntry {
    pub fn new(child: impl Into<Element>, item: StatusItem) -> Self {
        Self {
            child: child.into(),
            item,
        }
    }
}

impl Primitive for StatusEntry {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        scope.register_status_item(self.item.clone());
        scope.resolve_child(0, &self.child)
    }
}

/// Gives descendants an explicit identity key. Their lifecycle tokens derive
/// from the key and the path below it, so inserting or removing siblings ahead
/// of the subtree does not make it disappear and reappear.
pub struct Keyed {
    child: Element,
    key: Arc<str>,
}

impl Keyed {
    pub fn new(child: impl Into<Element>, key: &str) -> Self {
        Self {
            child: child.into(),
            key: Arc::from(key),
        }
    }
}

impl Primitive for Keyed {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let key = Arc::clone(&self.key);
        scope.with_key(&key, |scope| scope.resolve_child(0, &self.child))
    }
}

pub struct OnAppear {
    child: Element,
    callback: LifecycleCallback,
}

impl OnAppear {
    pub fn new(child: impl Into<Element>, callback: impl Fn() + 'static) -> Self {
        Self {
            child: child.into(),
            callback: Rc::new(callback),
        }
    }
}

impl Primitive for OnAppear {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let (_, appeared) = scope.visit_lifecycle();
        if appeared {
            scope
                .registries()
                .lifecycle
                .queue_appear(Rc::clone(&self.callback));
        }
        scope.resolve_child(0, &self.child)
    }
}

pub struct OnDisappear {
    child: Element,
    callback: LifecycleCallback,
}

impl OnDisappear {
    pub fn new(child: impl Into<Element>, callback: impl Fn() + 'static) -> Self {
        Self {
            child: child.into(),
            callback: Rc::new(callback),
        }
    }
}

impl Primitive for OnDisappear {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let (token, _) = scope.visit_lifecycle();
        scope
            .registries()
            .lifecycle
            .set_on_disappear(token, Rc::clone(&self.callback));
        scope.resolve_child(0, &self.child)
    }
}

pub struct Task {
    child: Element,
    task: TaskFn,
}

impl Task {
    pub fn new(child: impl Into<Element>, task: TaskFn) -> Self {
        Self {
            child: child.into(),
            task,
        }
    }
}

impl Primitive for Task {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let (token, appeared) = scope.visit_lifecycle();
        if appeared {
            scope
                .registries()
                .lifecycle
                .queue_task(token, Arc::clone(&self.task));
        }
        scope.resolve_child(0, &self.child)
    }
}
