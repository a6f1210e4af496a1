//! Priority-ordered key routing.
//!
//! Layers, first match wins:
//! 1. status bar items that carry an action
//! 2. key handlers registered during the current pass
//! 3. the focused element when it is a text input
//! 4. Tab / Shift+Tab focus navigation
//! 5. the focused element's handler
//! 6. default global shortcuts

use std::fmt;
use std::rc::Rc;

use crate::core::environment::{ColorRole, Environment};
use crate::core::input::{Key, KeyBinding, KeyEvent};
use crate::core::style::Style;
use crate::core::text::utils::truncate_to_width;
use crate::runtime::focus::FocusRegistry;

pub type KeyHandler = Rc<dyn Fn(&KeyEvent) -> bool>;

/// Key handlers registered by `.on_key(..)` during the current pass.
#[derive(Default)]
pub struct KeyHandlerRegistry {
    handlers: Vec<KeyHandler>,
}

impl KeyHandlerRegistry {
    pub fn begin_pass(&mut self) {
        self.handlers.clear();
    }

    pub fn register(&mut self, handler: KeyHandler) {
        self.handlers.push(handler);
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    fn dispatch(&self, event: &KeyEvent) -> bool {
        self.handlers.iter().any(|handler| handler(event))
    }
}

impl fmt::Debug for KeyHandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyHandlerRegistry")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// A binding shown in the status bar. Items without an action are informational.
#[derive(Clone)]
pub struct StatusItem {
    binding: KeyBinding,
    label: String,
    action: Option<Rc<dyn Fn()>>,
}

impl StatusItem {
    pub fn info(binding: KeyBinding, label: impl Into<String>) -> Self {
        Self {
            binding,
            label: label.into(),
            action: None,
        }
    }

    pub fn action(binding: KeyBinding, label: impl Into<String>, action: impl Fn() + 'static) -> Self {
        Self {
            binding,
            label: label.into(),
            action: Some(Rc::new(action)),
        }
    }

    pub fn binding(&self) -> KeyBinding {
        self.binding
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

impl fmt::Debug for StatusItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusItem")
            .field("binding", &self.binding.to_string())
            .field("label", &self.label)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Status/command bar items collected during the current pass.
#[derive(Debug, Default)]
pub struct StatusBar {
    items: Vec<StatusItem>,
}

impl StatusBar {
    pub fn begin_pass(&mut self) {
        self.items.clear();
    }

    pub fn push(&mut self, item: StatusItem) {
        self.items.push(item);
    }

    pub fn items(&self) -> &[StatusItem] {
        &self.items
    }

    fn dispatch(&self, event: &KeyEvent) -> bool {
        let Some(item) = self
            .items
            .iter()
            .find(|item| item.action.is_some() && item.binding.matches(event))
        else {
            return false;
        };
        if let Some(action) = item.action.as_ref() {
            action();
        }
        true
    }

    /// One line: bindings in the accent colour, labels muted, truncated to `width`.
    pub fn render_line(&self, width: usize, env: &Environment) -> String {
        let key_style = Style::new().fg(env.color(ColorRole::Accent)).bold();
        let label_style = Style::new().fg(env.color(ColorRole::Muted));
        let line = self
            .items
            .iter()
            .map(|item| {
                format!(
                    "{} {}",
                    key_style.paint(&item.binding.to_string()),
                    label_style.paint(&item.label)
                )
            })
            .collect::<Vec<_>>()
            .join("  ");
        truncate_to_width(&line, width, "…", false)
    }
}

/// Global shortcuts handled when nothing else consumed the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultAction {
    Quit,
    CycleTheme,
    ToggleAppearance,
}

impl DefaultAction {
    pub fn for_event(event: &KeyEvent) -> Option<Self> {
        let plain = !event.ctrl && !event.alt;
        match event.key {
            Key::Char('c') if event.ctrl && !event.alt => Some(DefaultAction::Quit),
            Key::Char('q') if plain => Some(DefaultAction::Quit),
            Key::Char('t') if plain => Some(DefaultAction::CycleTheme),
            Key::Char('a') if plain => Some(DefaultAction::ToggleAppearance),
            _ => None,
        }
    }

    /// Informational status items describing the shortcuts.
    pub fn status_items() -> Vec<StatusItem> {
        [("q", "quit"), ("t", "theme"), ("a", "appearance")]
            .into_iter()
            .filter_map(|(id, label)| KeyBinding::parse(id).map(|binding| StatusItem::info(binding, label)))
            .collect()
    }
}

/// Which layer consumed a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    StatusItem,
    KeyHandler,
    TextInput,
    Navigation,
    Focused,
    Default(DefaultAction),
    Quit,
    Ignored,
}

impl DispatchOutcome {
    pub fn consumed(self) -> bool {
        self != DispatchOutcome::Ignored
    }
}

/// Route `event` through the layers. Default shortcuts only fire when `defaults` is set.
pub fn dispatch_key(
    event: &KeyEvent,
    status: &StatusBar,
    key_handlers: &KeyHandlerRegistry,
    focus: &mut FocusRegistry,
    defaults: bool,
) -> DispatchOutcome {
    if status.dispatch(event) {
        return DispatchOutcome::StatusItem;
    }
    if key_handlers.dispatch(event) {
        return DispatchOutcome::KeyHandler;
    }

    let is_navigation = event.is_tab();
    let mut offered_focused = false;
    if let Some(handle) = focus.focused_handler() {
        let bypass = is_navigation || event.key == Key::Escape;
        let is_text_input = handle.try_borrow().is_ok_and(|handler| handler.is_text_input());
        if is_text_input && !bypass {
            offered_focused = true;
            let handled = handle
                .try_borrow_mut()
                .is_ok_and(|mut handler| handler.handle(event));
            // Text inputs own plain typing; unhandled ctrl chords fall through.
            if handled || !event.ctrl {
                return DispatchOutcome::TextInput;
            }
        }
    }

    if is_navigation {
        let moved = if event.shift {
            focus.focus_prev()
        } else {
            focus.focus_next()
        };
        if moved.is_some() {
            return DispatchOutcome::Navigation;
        }
    }

    if !offered_focused {
        if let Some(handle) = focus.focused_handler() {
            let handled = handle
                .try_borrow_mut()
                .is_ok_and(|mut handler| handler.handle(event));
            if handled {
                return DispatchOutcome::Focused;
            }
        }
    }

    if defaults {
        match DefaultAction::for_event(event) {
            Some(DefaultAction::Quit) => return DispatchOutcome::Quit,
            Some(action) => return DispatchOutcome::Default(action),
            None => {}
        }
    }
    DispatchOutcome::Ignored
}

#[cfg(test)]
mod tests {
    use super::{
        dispatch_key, DefaultAction, DispatchOutcome, KeyHandlerRegistry, StatusBar, StatusItem,
    };
    use crate::core::environment::Environment;
    use crate::core::input::{Key, KeyBinding, KeyEvent};
    use crate::core::text::ansi::strip_ansi;
    use crate::runtime::focus::{FocusHandler, FocusId, FocusRegistry};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    struct Field {
        text_input: bool,
        typed: Rc<RefCell<String>>,
    }

    impl FocusHandler for Field {
        fn handle(&mut self, event: &KeyEvent) -> bool {
            match event.key {
                Key::Char(ch) if !event.ctrl => {
                    self.typed.borrow_mut().push(ch);
                    true
                }
                _ => false,
            }
        }

        fn is_text_input(&self) -> bool {
            self.text_input
        }
    }

    struct Harness {
        status: StatusBar,
        keys: KeyHandlerRegistry,
        focus: FocusRegistry,
        typed: Rc<RefCell<String>>,
    }

    impl Harness {
        fn new(text_input: bool) -> Self {
            let typed = Rc::new(RefCell::new(String::new()));
            let mut focus = FocusRegistry::new();
            focus.begin_pass();
            for name in ["first", "second"] {
                let typed = Rc::clone(&typed);
                focus.register(FocusId::new(name), None, move || {
                    Box::new(Field { text_input, typed })
                });
            }
            Self {
                status: StatusBar::default(),
                keys: KeyHandlerRegistry::default(),
                focus,
                typed,
            }
        }

        fn send(&mut self, event: KeyEvent) -> DispatchOutcome {
            dispatch_key(&event, &self.status, &self.keys, &mut self.focus, true)
        }
    }

    #[test]
    fn unfocused_keys_reach_defaults() {
        let mut harness = Harness::new(false);
        assert_eq!(harness.send(KeyEvent::char('q')), DispatchOutcome::Quit);
        assert_eq!(
            harness.send(KeyEvent::char('c').with_ctrl()),
            DispatchOutcome::Quit
        );
        assert_eq!(
            harness.send(KeyEvent::char('t')),
            DispatchOutcome::Default(DefaultAction::CycleTheme)
        );
        assert_eq!(harness.send(KeyEvent::char('z')), DispatchOutcome::Ignored);
    }

    #[test]
    fn defaults_can_be_disabled() {
        let mut harness = Harness::new(false);
        let event = KeyEvent::char('q');
        let outcome = dispatch_key(&event, &harness.status, &harness.keys, &mut harness.focus, false);
        assert_eq!(outcome, DispatchOutcome::Ignored);
    }

    #[test]
    fn status_item_with_action_wins_and_info_items_never_consume() {
        let mut harness = Harness::new(false);
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        let binding = KeyBinding::parse("q").expect("binding");
        harness.status.push(StatusItem::info(binding, "quit"));
        assert_eq!(harness.send(KeyEvent::char('q')), DispatchOutcome::Quit);

        harness
            .status
            .push(StatusItem::action(binding, "save", move || counter.set(counter.get() + 1)));
        assert_eq!(harness.send(KeyEvent::char('q')), DispatchOutcome::StatusItem);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn key_handlers_run_in_registration_order() {
        let mut harness = Harness::new(false);
        let log = Rc::new(RefCell::new(Vec::new()));
        for (name, consume) in [("a", false), ("b", true), ("c", true)] {
            let log = Rc::clone(&log);
            harness.keys.register(Rc::new(move |_: &KeyEvent| {
                log.borrow_mut().push(name);
                consume
            }));
        }
        assert_eq!(harness.send(KeyEvent::char('x')), DispatchOutcome::KeyHandler);
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn text_input_swallows_typing_but_not_navigation() {
        let mut harness = Harness::new(true);
        assert_eq!(harness.send(KeyEvent::new(Key::Tab)), DispatchOutcome::Navigation);

        assert_eq!(harness.send(KeyEvent::char('q')), DispatchOutcome::TextInput);
        assert_eq!(*harness.typed.borrow(), "q");

        assert_eq!(
            harness.send(KeyEvent::char('c').with_ctrl()),
            DispatchOutcome::Quit
        );
        assert_eq!(harness.send(KeyEvent::new(Key::Tab)), DispatchOutcome::Navigation);
        assert_eq!(
            harness.focus.focused().map(FocusId::as_str),
            Some("second")
        );
        assert_eq!(
            harness.send(KeyEvent::new(Key::Tab).with_shift()),
            DispatchOutcome::Navigation
        );
        assert_eq!(harness.focus.focused().map(FocusId::as_str), Some("first"));
    }

    #[test]
    fn focused_handler_runs_after_navigation_layer() {
        let mut harness = Harness::new(false);
        harness.send(KeyEvent::new(Key::Tab));
        assert_eq!(harness.send(KeyEvent::char('x')), DispatchOutcome::Focused);
        assert_eq!(*harness.typed.borrow(), "x");
        assert_eq!(harness.send(KeyEvent::new(Key::Escape)), DispatchOutcome::Ignored);
    }

    #[test]
    fn status_line_lists_items() {
        let mut status = StatusBar::default();
        for item in DefaultAction::status_items() {
            status.push(item);
        }
        let line = status.render_line(80, &Environment::default());
        assert_eq!(strip_ansi(&line), "q quit  t theme  a appearance");
        assert!(crate::core::text::width::visible_width(&status.render_line(8, &Environment::default())) <= 8);
    }
}
