//! Element resolution: primitive first, then composite, else empty.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::core::environment::Environment;
use crate::render::buffer::TextBuffer;
use crate::runtime::dispatch::{KeyHandler, StatusItem};
use crate::runtime::focus::{FocusHandle, FocusHandler, FocusId};
use crate::runtime::lifecycle::LifecycleToken;
use crate::runtime::registries::Registries;
use crate::view::{Element, ViewPath};

/// Per-frame size and environment. Nested contexts are derived copies.
#[derive(Debug, Clone, Default)]
pub struct RenderContext {
    width: usize,
    height: usize,
    env: Environment,
}

impl RenderContext {
    pub fn new(width: usize, height: usize, env: Environment) -> Self {
        Self { width, height, env }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn with_size(&self, width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            env: self.env.clone(),
        }
    }

    pub fn with_env(&self, env: Environment) -> Self {
        Self {
            width: self.width,
            height: self.height,
            env,
        }
    }
}

/// A focus registration made while rendering.
pub struct FocusRegistration {
    pub id: FocusId,
    pub handle: FocusHandle,
    pub focused: bool,
}

/// Resolution cursor: the current context and path plus the pass registries.
pub struct Scope<'a> {
    ctx: RenderContext,
    path: Vec<u32>,
    section: Option<Arc<str>>,
    /// Innermost identity key and the path depth it was set at.
    key: Option<(Arc<str>, usize)>,
    registries: &'a mut Registries,
}

impl<'a> Scope<'a> {
    pub fn new(registries: &'a mut Registries, ctx: RenderContext) -> Self {
        Self {
            ctx,
            path: Vec::new(),
            section: None,
            key: None,
            registries,
        }
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    pub fn width(&self) -> usize {
        self.ctx.width
    }

    pub fn height(&self) -> usize {
        self.ctx.height
    }

    pub fn env(&self) -> &Environment {
        &self.ctx.env
    }

    pub fn path(&self) -> ViewPath {
        ViewPath::from_indices(&self.path)
    }

    pub fn registries(&mut self) -> &mut Registries {
        self.registries
    }

    /// Resolve `element` at the current path.
    pub fn resolve(&mut self, element: &Element) -> TextBuffer {
        match element {
            Element::Primitive(primitive) => primitive.render(self),
            Element::Composite(composite) => {
                let body = composite.body(self);
                self.resolve_child(0, &body)
            }
            Element::Spacer(_) => {
                tracing::trace!(path = %self.path(), "spacer outside a stack resolved empty");
                TextBuffer::new()
            }
            Element::Empty => {
                tracing::trace!(path = %self.path(), "empty element resolved empty");
                TextBuffer::new()
            }
        }
    }

    /// Resolve `element` one path level deeper, as child `index`.
    pub fn resolve_child(&mut self, index: usize, element: &Element) -> TextBuffer {
        self.descend(index, None, |scope| scope.resolve(element))
    }

    /// Like [`Scope::resolve_child`] with a derived context.
    pub fn resolve_child_in(&mut self, index: usize, element: &Element, ctx: RenderContext) -> TextBuffer {
        self.descend(index, Some(ctx), |scope| scope.resolve(element))
    }

    fn descend<R>(
        &mut self,
        index: usize,
        ctx: Option<RenderContext>,
        f: impl FnOnce(&mut Self) -> R,
    ) -> R {
        self.path.push(index as u32);
        let saved = ctx.map(|ctx| std::mem::replace(&mut self.ctx, ctx));
        let result = f(self);
        if let Some(saved) = saved {
            self.ctx = saved;
        }
        self.path.pop();
        result
    }

    /// Run `f` with descendants registering focus into section `name`.
    pub fn in_section<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.section.replace(Arc::from(name));
        let result = f(self);
        self.section = saved;
        result
    }

    /// Run `f` with descendants' lifecycle tokens anchored at `key` instead of
    /// the root: only the path below this point takes part in their identity.
    pub fn with_key<R>(&mut self, key: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        let saved = self.key.replace((Arc::from(key), self.path.len()));
        let result = f(self);
        self.key = saved;
        result
    }

    pub fn section(&self) -> Option<&str> {
        self.section.as_deref()
    }

    /// Per-path state of type `T`, created by `init` on first use.
    pub fn state<T: 'static>(&mut self, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
        self.registries.state.get_or_insert(&self.path, init)
    }

    pub fn lifecycle_token(&self) -> LifecycleToken {
        match &self.key {
            Some((key, depth)) => LifecycleToken::new(&self.path[*depth..], Some(key.as_ref())),
            None => LifecycleToken::new(&self.path, None),
        }
    }

    /// Mark this position as present; returns its token and whether it just appeared.
    pub fn visit_lifecycle(&mut self) -> (LifecycleToken, bool) {
        let token = self.lifecycle_token();
        (token, self.registries.lifecycle.visit(token))
    }

    /// Register a focusable element. Without an explicit id, one is derived from the path.
    pub fn register_focus<F>(&mut self, id: Option<FocusId>, factory: F) -> FocusRegistration
    where
        F: FnOnce() -> Box<dyn FocusHandler>,
    {
        let id = id.unwrap_or_else(|| FocusId::new(format!("path:{}", self.path())));
        let section = self.section.clone();
        let (handle, focused) = self
            .registries
            .focus
            .register(id.clone(), section.as_deref(), factory);
        FocusRegistration {
            id,
            handle,
            focused,
        }
    }

    pub fn register_key_handler(&mut self, handler: KeyHandler) {
        self.registries.key_handlers.register(handler);
    }

    pub fn register_status_item(&mut self, item: StatusItem) {
        self.registries.status.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderContext, Scope};
    use crate::core::environment::Environment;
    use crate::render::buffer::TextBuffer;
    use crate::runtime::registries::Registries;
    use crate::view::{Composite, Element, Primitive, Spacer};

    struct PathEcho;

    impl Primitive for PathEcho {
        fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
            TextBuffer::from_text(&format!("{}@{}", scope.path(), scope.width()))
        }
    }

    struct Wrapper;

    impl Composite for Wrapper {
        fn body(&self, _scope: &mut Scope<'_>) -> Element {
            Element::primitive(PathEcho)
        }
    }

    /// Primitive that also declares content; the content must be ignored.
    struct Both;

    impl Primitive for Both {
        fn render(&self, _scope: &mut Scope<'_>) -> TextBuffer {
            TextBuffer::from_text("primitive")
        }
    }

    impl Composite for Both {
        fn body(&self, _scope: &mut Scope<'_>) -> Element {
            Element::from("composite")
        }
    }

    fn resolve(element: &Element) -> Vec<String> {
        let mut registries = Registries::new();
        let mut scope = Scope::new(&mut registries, RenderContext::new(12, 4, Environment::default()));
        scope.resolve(element).into_lines()
    }

    #[test]
    fn composite_body_resolves_one_level_deeper() {
        assert_eq!(resolve(&Element::composite(Wrapper)), vec!["0@12"]);
        assert_eq!(resolve(&Element::primitive(PathEcho)), vec!["root@12"]);
    }

    #[test]
    fn primitive_wins_over_declared_content() {
        assert_eq!(resolve(&Element::primitive(Both)), vec!["primitive"]);
    }

    #[test]
    fn empty_and_stray_spacer_resolve_empty() {
        assert!(resolve(&Element::Empty).is_empty());
        assert!(resolve(&Element::from(Spacer::min(3))).is_empty());
    }

    #[test]
    fn child_context_is_restored_after_descend() {
        let mut registries = Registries::new();
        let base = RenderContext::new(20, 5, Environment::default());
        let mut scope = Scope::new(&mut registries, base.clone());
        let echo = Element::primitive(PathEcho);
        let child = scope.resolve_child_in(2, &echo, base.with_size(7, 1));
        assert_eq!(child.into_lines(), vec!["2@7"]);
        assert_eq!(scope.width(), 20);
        assert_eq!(scope.path().depth(), 0);
    }

    #[test]
    fn resolution_is_deterministic() {
        let element = Element::composite(Wrapper);
        assert_eq!(resolve(&element), resolve(&element));
    }
}
