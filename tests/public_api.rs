#![allow(unused_imports)]

use strata_tui::{
    parse_key, strip_ansi, truncate_to_width, visible_width, wrap_text_with_ansi, Alignment,
    Appearance, Attributes, CancellationToken, Color, ColorRole, Composite, DefaultAction,
    DefaultPalette, Dimension, DispatchOutcome, Element, ElementExt, EnvConfig, Environment,
    FocusHandler, FocusId, FocusState, FrameSpec, HStack, Key, KeyBinding, KeyDecoder, KeyEvent,
    LifecycleToken, Observable, OutputGate, Palette, Primitive, ProcessTerminal, RenderContext,
    Result, Runtime, RuntimeHandle, RuntimeOptions, Scope, Spacer, Stack, StatusItem, Style,
    SubscriptionId, TaskContext, Terminal, TerminalCmd, Text, TextBuffer, TextOverflow, ThemeSet,
    TuiError, VStack, ViewPath, ZStack,
};

#[test]
fn public_api_exports_compile() {}

#[test]
fn builder_chain_reads_declaratively() {
    let show_footer = true;
    let rows = ["one", "two"];
    let element: Element = VStack::new()
        .spacing(1)
        .child(Text::new("Title").bold())
        .children(rows)
        .child_if(show_footer, || Text::new("footer").color_role(ColorRole::Muted))
        .into();
    assert!(matches!(element, Element::Primitive(_)));
}
