//! Focusable counter and a name field.
//!
//! Tab moves between the two, Enter / `+` / `-` drive the counter while it is
//! focused, and the name field takes typing. `q` quits outside the field.
//! Run with `STRATA_TUI_LOG=/tmp/strata.log` to see the render-pass events.

use std::time::Duration;

use strata_tui::logging;
use strata_tui::{
    ColorRole, Composite, Element, ElementExt, EnvConfig, FocusHandler, FocusState, Key, KeyBinding,
    KeyEvent, Observable, Runtime, RuntimeOptions, Scope, Spacer, StatusItem, Text, VStack,
};

struct CounterKeys(Observable<i64>);

impl FocusHandler for CounterKeys {
    fn handle(&mut self, event: &KeyEvent) -> bool {
        match event.key {
            Key::Enter | Key::Char('+') => self.0.update(|value| *value += 1),
            Key::Char('-') => self.0.update(|value| *value -= 1),
            _ => return false,
        }
        true
    }
}

struct NameField(Observable<String>);

impl FocusHandler for NameField {
    fn handle(&mut self, event: &KeyEvent) -> bool {
        match event.key {
            Key::Char(ch) if !event.ctrl && !event.alt => self.0.update(|name| name.push(ch)),
            Key::Backspace => {
                self.0.update(|name| {
                    name.pop();
                });
            }
            _ => return false,
        }
        true
    }

    fn is_text_input(&self) -> bool {
        true
    }
}

/// A row prefixed with a focus marker read from the environment.
struct Marked(String);

impl Composite for Marked {
    fn body(&self, scope: &mut Scope<'_>) -> Element {
        let focused = scope
            .env()
            .value::<FocusState>()
            .is_some_and(|state| state.focused);
        if focused {
            Text::new(format!("> {}", self.0)).bold().into()
        } else {
            Text::new(format!("  {}", self.0)).into()
        }
    }
}

fn main() -> strata_tui::Result<()> {
    let config = EnvConfig::from_env();
    logging::init(&config)?;

    let count = Observable::new(0i64);
    let name = Observable::new(String::new());
    let uptime = Observable::new(0u64);

    let view = {
        let (count, name, uptime) = (count.clone(), name.clone(), uptime.clone());
        move || -> Element {
            let reset = count.clone();
            let ticker = uptime.clone();
            let greeting = match name.get() {
                name if name.is_empty() => String::from("Hello, stranger"),
                name => format!("Hello, {name}"),
            };
            let reset_binding = KeyBinding::parse("ctrl+r").unwrap_or_else(|| {
                KeyBinding::from_event(KeyEvent::char('r').with_ctrl())
            });

            VStack::new()
                .spacing(1)
                .child(Text::new("strata_tui counter").bold().color_role(ColorRole::Accent))
                .child(
                    Element::composite(Marked(format!("count: {}", count.get())))
                        .focusable_id("counter", {
                            let count = count.clone();
                            move || CounterKeys(count.clone())
                        }),
                )
                .child(
                    Element::composite(Marked(format!("name: {}_", name.get())))
                        .focusable_id("name", {
                            let name = name.clone();
                            move || NameField(name.clone())
                        }),
                )
                .child(Text::new(greeting).color_role(ColorRole::Muted))
                .child(Spacer::new())
                .child(
                    Text::new(format!("up {}s", uptime.get()))
                        .dim()
                        .task(move |ctx| {
                            while ctx.sleep(Duration::from_secs(1)) {
                                ticker.update(|seconds| *seconds += 1);
                            }
                        }),
                )
                .padding(1)
                .status_item(StatusItem::action(reset_binding, "reset", move || reset.set(0)))
                .status_hint(KeyBinding::from_event(KeyEvent::new(Key::Tab)), "next")
        }
    };

    let mut runtime = Runtime::open(RuntimeOptions::from_config(&config), view)?;
    runtime.observe(&count);
    runtime.observe(&name);
    runtime.observe(&uptime);
    runtime.run()
}
