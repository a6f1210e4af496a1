//! Wrappers that change how a single child is sized, painted or configured.

use std::rc::Rc;
use std::sync::Arc;

use crate::core::environment::{ColorRole, Environment};
use crate::core::input::{KeyBinding, KeyEvent};
use crate::core::style::{Color, Style};
use crate::render::buffer::{Alignment, TextBuffer};
use crate::runtime::dispatch::StatusItem;
use crate::runtime::focus::{FocusHandler, FocusId};
use crate::runtime::task::TaskContext;
use crate::view::interaction::{FocusSection, Focusable, Keyed, OnAppear, OnDisappear, OnKey, StatusEntry, Task};
use crate::view::layout::{Frame, FrameSpec};
use crate::view::resolve::Scope;
use crate::view::{Element, Primitive};

/// Blank cells around the child, per edge.
pub struct Padding {
    child: Element,
    top: usize,
    right: usize,
    bottom: usize,
    left: usize,
}

impl Padding {
    pub fn new(child: impl Into<Element>, top: usize, right: usize, bottom: usize, left: usize) -> Self {
        Self {
            child: child.into(),
            top,
            right,
            bottom,
            left,
        }
    }
}

impl Primitive for Padding {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let inner = scope.context().with_size(
            scope.width().saturating_sub(self.left + self.right),
            scope.height().saturating_sub(self.top + self.bottom),
        );
        let content = scope.resolve_child_in(0, &self.child, inner);
        let content_width = content.width();
        let width = self.left + content_width + self.right;
        let left = " ".repeat(self.left);

        let mut lines = vec![" ".repeat(width); self.top];
        lines.extend(
            content
                .pad_to_width(content_width + self.right, Alignment::Leading)
                .into_lines()
                .into_iter()
                .map(|line| format!("{left}{line}")),
        );
        lines.extend(vec![" ".repeat(width); self.bottom]);
        TextBuffer::from(lines)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Color(Color),
    Role(ColorRole),
}

/// Background that survives resets inside the child's content.
pub struct Background {
    child: Element,
    fill: Fill,
}

impl Background {
    pub fn new(child: impl Into<Element>, fill: Fill) -> Self {
        Self {
            child: child.into(),
            fill,
        }
    }
}

impl Primitive for Background {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let color = match self.fill {
            Fill::Color(color) => color,
            Fill::Role(role) => scope.env().color(role),
        };
        scope
            .resolve_child(0, &self.child)
            .with_background(Style::new().bg(color))
    }
}

pub struct Styled {
    child: Element,
    style: Style,
}

impl Styled {
    pub fn new(child: impl Into<Element>, style: Style) -> Self {
        Self {
            child: child.into(),
            style,
        }
    }
}

impl Primitive for Styled {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let style = self.style;
        scope
            .resolve_child(0, &self.child)
            .map_lines(|line| style.paint(&line))
    }
}

pub struct Dimmed {
    child: Element,
}

impl Dimmed {
    pub fn new(child: impl Into<Element>) -> Self {
        Self { child: child.into() }
    }
}

impl Primitive for Dimmed {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        scope.resolve_child(0, &self.child).dimmed()
    }
}

/// A layer drawn over the content, optionally dimming what lies beneath.
pub struct Overlay {
    content: Element,
    layer: Element,
    dim_base: bool,
    horizontal: Alignment,
    vertical: Alignment,
}

impl Overlay {
    pub fn new(content: impl Into<Element>, layer: impl Into<Element>) -> Self {
        Self {
            content: content.into(),
            layer: layer.into(),
            dim_base: false,
            horizontal: Alignment::Center,
            vertical: Alignment::Center,
        }
    }

    pub fn dim_base(mut self, dim: bool) -> Self {
        self.dim_base = dim;
        self
    }

    pub fn align(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }
}

impl Primitive for Overlay {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let mut base = scope.resolve_child(0, &self.content);
        let layer = scope.resolve_child(1, &self.layer);
        if self.dim_base {
            base = base.dimmed();
        }
        let (x, _) = self.horizontal.split(base.width().saturating_sub(layer.width()));
        let (y, _) = self.vertical.split(base.height().saturating_sub(layer.height()));
        base.composite_at(&layer, x, y)
    }
}

impl From<Overlay> for Element {
    fn from(overlay: Overlay) -> Self {
        Element::primitive(overlay)
    }
}

type EnvTransform = Rc<dyn Fn(&Environment) -> Environment>;

/// Resolves the child with a derived environment.
pub struct Environmental {
    child: Element,
    transform: EnvTransform,
}

impl Environmental {
    pub fn new(child: impl Into<Element>, transform: impl Fn(&Environment) -> Environment + 'static) -> Self {
        Self {
            child: child.into(),
            transform: Rc::new(transform),
        }
    }
}

impl Primitive for Environmental {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let env = (self.transform)(scope.env());
        let ctx = scope.context().with_env(env);
        scope.resolve_child_in(0, &self.child, ctx)
    }
}

/// Chainable modifiers on anything that converts into an [`Element`].
pub trait ElementExt: Into<Element> + Sized {
    fn frame(self, spec: FrameSpec) -> Element {
        Element::primitive(Frame::new(self, spec))
    }

    fn padding(self, cells: usize) -> Element {
        Element::primitive(Padding::new(self, cells, cells, cells, cells))
    }

    fn padding_edges(self, top: usize, right: usize, bottom: usize, left: usize) -> Element {
        Element::primitive(Padding::new(self, top, right, bottom, left))
    }

    fn background(self, color: Color) -> Element {
        Element::primitive(Background::new(self, Fill::Color(color)))
    }

    fn background_role(self, role: ColorRole) -> Element {
        Element::primitive(Background::new(self, Fill::Role(role)))
    }

    fn style(self, style: Style) -> Element {
        Element::primitive(Styled::new(self, style))
    }

    fn dimmed(self) -> Element {
        Element::primitive(Dimmed::new(self))
    }

    fn overlay(self, layer: impl Into<Element>, dim_base: bool) -> Element {
        Overlay::new(self, layer).dim_base(dim_base).into()
    }

    fn environment(self, transform: impl Fn(&Environment) -> Environment + 'static) -> Element {
        Element::primitive(Environmental::new(self, transform))
    }

    /// Make the child focusable; `factory` builds the handler on first registration.
    fn focusable<F, H>(self, factory: F) -> Element
    where
        F: Fn() -> H + 'static,
        H: FocusHandler + 'static,
    {
        Element::primitive(Focusable::new(self, None, factory))
    }

    fn focusable_id<F, H>(self, id: impl Into<FocusId>, factory: F) -> Element
    where
        F: Fn() -> H + 'static,
        H: FocusHandler + 'static,
    {
        Element::primitive(Focusable::new(self, Some(id.into()), factory))
    }

    fn focus_section(self, name: &str) -> Element {
        Element::primitive(FocusSection::new(self, name))
    }

    fn on_key(self, handler: impl Fn(&KeyEvent) -> bool + 'static) -> Element {
        Element::primitive(OnKey::new(self, handler))
    }

    fn status_item(self, item: StatusItem) -> Element {
        Element::primitive(StatusEntry::new(self, item))
    }

    /// Informational status item: shown, never consumes.
    fn status_hint(self, binding: KeyBinding, label: &str) -> Element {
        self.status_item(StatusItem::info(binding, label))
    }

    fn on_appear(self, callback: impl Fn() + 'static) -> Element {
        Element::primitive(OnAppear::new(self, callback))
    }

    fn on_disappear(self, callback: impl Fn() + 'static) -> Element {
        Element::primitive(OnDisappear::new(self, callback))
    }

    /// Background work started on appear and cancelled on disappear.
    fn task(self, task: impl Fn(TaskContext) + Send + Sync + 'static) -> Element {
        Element::primitive(Task::new(self, Arc::new(task)))
    }

    /// Salt lifecycle identity below this point with `key`.
    fn id(self, key: &str) -> Element {
        Element::primitive(Keyed::new(self, key))
    }
}

impl<T: Into<Element>> ElementExt for T {}
