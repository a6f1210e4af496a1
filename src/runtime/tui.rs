//! Render loop and terminal session.
//!
//! The runtime owns the registries, the screen renderer and the terminal.
//! Other threads reach it only through [`RuntimeHandle`], which queues work
//! in a mutex + condvar guarded wake state that the loop drains between
//! passes.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::config::RuntimeOptions;
use crate::core::environment::{ColorRole, Environment};
use crate::core::input::{decode_all, KeyDecoder, KeyEvent};
use crate::core::observable::{Observable, SubscriptionId};
use crate::core::output::{OutputGate, TerminalCmd};
use crate::core::terminal::Terminal;
use crate::error::{Result, TuiError};
use crate::platform::signals::{SignalFlags, SignalGuard};
use crate::render::renderer::{RenderStats, ScreenRenderer};
use crate::runtime::dispatch::{DefaultAction, DispatchOutcome};
use crate::runtime::focus::FocusId;
use crate::runtime::registries::Registries;
use crate::runtime::task::Waker;
use crate::view::resolve::{RenderContext, Scope};
use crate::view::Element;

const STOP_DRAIN_MAX_MS: u64 = 1000;
const STOP_DRAIN_IDLE_MS: u64 = 50;

#[derive(Default)]
struct RuntimeWakeState {
    pending_inputs: Vec<String>,
    pending_focus: Vec<FocusId>,
    render_requested: bool,
    quit_requested: bool,
}

impl RuntimeWakeState {
    fn has_work(&self) -> bool {
        self.render_requested
            || self.quit_requested
            || !self.pending_inputs.is_empty()
            || !self.pending_focus.is_empty()
    }
}

#[derive(Default)]
struct RuntimeWake {
    state: Mutex<RuntimeWakeState>,
    cvar: Condvar,
}

impl RuntimeWake {
    fn lock(&self) -> MutexGuard<'_, RuntimeWakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until work is queued or `timeout` passes. Returns whether work is queued.
    fn wait_for_event(&self, timeout: Duration) -> bool {
        let state = self.lock();
        let (state, _) = self
            .cvar
            .wait_timeout_while(state, timeout, |state| !state.has_work())
            .unwrap_or_else(PoisonError::into_inner);
        state.has_work()
    }

    fn enqueue_input(&self, data: String) {
        self.lock().pending_inputs.push(data);
        self.cvar.notify_one();
    }

    fn request_render(&self) {
        self.lock().render_requested = true;
        self.cvar.notify_one();
    }

    fn request_quit(&self) {
        self.lock().quit_requested = true;
        self.cvar.notify_all();
    }

    fn request_focus(&self, id: FocusId) {
        self.lock().pending_focus.push(id);
        self.cvar.notify_one();
    }

    fn drain_inputs(&self) -> Vec<String> {
        std::mem::take(&mut self.lock().pending_inputs)
    }

    fn drain_focus_requests(&self) -> Vec<FocusId> {
        std::mem::take(&mut self.lock().pending_focus)
    }

    fn take_render_requested(&self) -> bool {
        std::mem::take(&mut self.lock().render_requested)
    }

    fn take_quit_requested(&self) -> bool {
        std::mem::take(&mut self.lock().quit_requested)
    }

    fn reset_for_start(&self) {
        *self.lock() = RuntimeWakeState::default();
    }
}

/// Cross-thread access to a running [`Runtime`]. Cheap to clone.
#[derive(Clone)]
pub struct RuntimeHandle {
    wake: Arc<RuntimeWake>,
}

impl RuntimeHandle {
    pub fn request_render(&self) {
        self.wake.request_render();
    }

    pub fn quit(&self) {
        self.wake.request_quit();
    }

    /// Focus `id` before the next pass. Ids not registered in the last pass are ignored.
    pub fn request_focus(&self, id: impl Into<FocusId>) {
        self.wake.request_focus(id.into());
    }

    /// Render-request callback for background tasks.
    pub fn waker(&self) -> Waker {
        let wake = Arc::clone(&self.wake);
        Arc::new(move || wake.request_render())
    }
}

pub struct Runtime<T: Terminal> {
    terminal: T,
    options: RuntimeOptions,
    view: Box<dyn FnMut() -> Element>,
    registries: Registries,
    renderer: ScreenRenderer,
    output: OutputGate,
    decoder: KeyDecoder,
    wake: Arc<RuntimeWake>,
    env: Environment,
    signals: SignalFlags,
    signal_guard: Option<SignalGuard>,
    stopped: bool,
    quit: bool,
    frames: u64,
}

#[cfg(unix)]
impl Runtime<crate::platform::ProcessTerminal> {
    /// Runtime on the process's own terminal. Fails when stdin or stdout is not a tty.
    pub fn open(options: RuntimeOptions, view: impl FnMut() -> Element + 'static) -> Result<Self> {
        let terminal = crate::platform::ProcessTerminal::open()?
            .with_escape_timeout(options.escape_timeout_ms);
        Ok(Self::new(terminal, options, view))
    }
}

impl<T: Terminal> Runtime<T> {
    pub fn new(terminal: T, options: RuntimeOptions, view: impl FnMut() -> Element + 'static) -> Self {
        let decoder = KeyDecoder::new(options.escape_timeout_ms);
        Self {
            terminal,
            options,
            view: Box::new(view),
            registries: Registries::new(),
            renderer: ScreenRenderer::new(),
            output: OutputGate::new(),
            decoder,
            wake: Arc::new(RuntimeWake::default()),
            env: Environment::default(),
            signals: SignalFlags::new(),
            signal_guard: None,
            stopped: true,
            quit: false,
            frames: 0,
        }
    }

    pub fn with_environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn options(&self) -> &RuntimeOptions {
        &self.options
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle {
            wake: Arc::clone(&self.wake),
        }
    }

    /// Flags the loop polls; signal handlers set them once the runtime starts.
    pub fn signals(&self) -> &SignalFlags {
        &self.signals
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    /// Request a render whenever `cell` changes.
    pub fn observe<V>(&self, cell: &Observable<V>) -> SubscriptionId {
        let wake = Arc::clone(&self.wake);
        cell.subscribe(move || wake.request_render())
    }

    pub fn start(&mut self) -> Result<()> {
        if !self.stopped {
            return Err(TuiError::AlreadyRunning);
        }
        self.output.clear();
        self.wake.reset_for_start();
        self.quit = false;

        // Mark running early so Drop restores the terminal if anything below panics.
        self.stopped = false;

        if self.options.handle_signals {
            match self.signals.register() {
                Ok(guard) => self.signal_guard = Some(guard),
                Err(err) => {
                    self.stopped = true;
                    return Err(err);
                }
            }
        }

        let wake_input = Arc::clone(&self.wake);
        if let Err(err) = self
            .terminal
            .start(Box::new(move |data| wake_input.enqueue_input(data)))
        {
            self.stopped = true;
            self.signal_guard = None;
            return Err(err.into());
        }

        if self.options.alt_screen {
            self.output.push(TerminalCmd::EnterAltScreen);
        }
        self.output.push(TerminalCmd::HideCursor);
        self.renderer.invalidate();
        self.flush_output()?;
        self.wake.request_render();
        tracing::debug!(alt_screen = self.options.alt_screen, "runtime started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.stopped {
            return Ok(());
        }
        self.registries.lifecycle.cancel_all();

        self.output.push(TerminalCmd::ShowCursor);
        if self.options.alt_screen {
            self.output.push(TerminalCmd::LeaveAltScreen);
        }
        let flushed = self.flush_output();
        if let Err(err) = &flushed {
            tracing::warn!(error = %err, "failed to write terminal restore sequence");
        }
        self.terminal
            .drain_input(STOP_DRAIN_MAX_MS, STOP_DRAIN_IDLE_MS);
        let restored = self.terminal.stop();
        if let Err(err) = &restored {
            tracing::warn!(error = %err, "failed to restore terminal mode");
        }
        self.stopped = true;
        self.signal_guard = None;
        tracing::debug!(frames = self.frames, "runtime stopped");
        flushed?;
        restored?;
        Ok(())
    }

    /// Start, loop until quit or a shutdown signal, then stop.
    pub fn run(&mut self) -> Result<()> {
        self.start()?;
        let result = self.run_loop();
        let stopped = self.stop();
        result.and(stopped)
    }

    fn run_loop(&mut self) -> Result<()> {
        let poll = Duration::from_millis(self.options.poll_interval_ms.max(1));
        loop {
            if self.signals.shutdown_requested() {
                tracing::debug!("shutdown signal received");
                return Ok(());
            }
            self.run_once()?;
            if self.quit {
                return Ok(());
            }
            self.wake.wait_for_event(poll);
        }
    }

    /// Apply queued work: quit, a pending resize, input, focus requests, then a
    /// render if one is pending. Returns whether a frame was rendered.
    pub fn run_once(&mut self) -> Result<bool> {
        if self.wake.take_quit_requested() {
            self.quit = true;
            return Ok(false);
        }

        if self.signals.take_resize() {
            tracing::debug!("terminal resized");
            self.renderer.invalidate();
            self.wake.request_render();
        }

        let inputs = self.wake.drain_inputs();
        for event in decode_all(inputs) {
            self.dispatch_key(&event);
            if self.quit {
                return Ok(false);
            }
        }

        for id in self.wake.drain_focus_requests() {
            if self.registries.focus.focus(&id) {
                self.wake.request_render();
            } else {
                tracing::trace!(id = %id, "focus request for unregistered id ignored");
            }
        }

        if self.wake.take_render_requested() {
            self.render_frame()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Render one frame now, regardless of pending requests.
    pub fn render_once(&mut self) -> Result<RenderStats> {
        self.wake.take_render_requested();
        self.render_frame()
    }

    /// Decode a raw input chunk and dispatch every complete key in it.
    /// An incomplete escape tail stays buffered until [`Runtime::flush_input`].
    pub fn dispatch_bytes(&mut self, bytes: &[u8]) -> Vec<DispatchOutcome> {
        let events = self.decoder.feed(bytes);
        events.iter().map(|event| self.dispatch_key(event)).collect()
    }

    /// Decode and dispatch any buffered escape tail.
    pub fn flush_input(&mut self) -> Vec<DispatchOutcome> {
        let events = self.decoder.flush();
        events.iter().map(|event| self.dispatch_key(event)).collect()
    }

    pub fn dispatch_key(&mut self, event: &KeyEvent) -> DispatchOutcome {
        let outcome = self
            .registries
            .dispatch(event, self.options.default_shortcuts);
        match outcome {
            DispatchOutcome::Quit => {
                self.quit = true;
                self.wake.request_quit();
            }
            DispatchOutcome::Default(DefaultAction::CycleTheme) => {
                let next = (self.env.theme_index() + 1) % self.env.themes().len().max(1);
                self.env = self.env.with_theme_index(next);
            }
            DispatchOutcome::Default(DefaultAction::ToggleAppearance) => {
                self.env = self.env.with_appearance(self.env.appearance().toggled());
            }
            _ => {}
        }
        tracing::trace!(event = %event, outcome = ?outcome, "key dispatched");
        if outcome.consumed() {
            self.wake.request_render();
        }
        outcome
    }

    fn size(&self) -> (usize, usize) {
        let (columns, rows) = self
            .terminal
            .size()
            .filter(|(columns, rows)| *columns > 0 && *rows > 0)
            .unwrap_or(self.options.fallback_size);
        (usize::from(columns), usize::from(rows))
    }

    fn render_frame(&mut self) -> Result<RenderStats> {
        let started = Instant::now();
        let (width, height) = self.size();
        let status_rows = usize::from(self.options.status_bar && height > 1);
        let content_height = height - status_rows;

        self.registries.begin_pass();
        let root = (self.view)();
        let ctx = RenderContext::new(width, content_height, self.env.clone());
        let buffer = Scope::new(&mut self.registries, ctx).resolve(&root);
        if self.options.default_shortcuts {
            for item in DefaultAction::status_items() {
                self.registries.status.push(item);
            }
        }
        let summary = self.registries.end_pass();
        if summary.focus_lost {
            tracing::debug!("focused element left the tree");
        }

        let mut lines = buffer.clip(width, content_height).into_lines();
        lines.resize(content_height, String::new());
        if status_rows > 0 {
            lines.push(self.registries.status.render_line(width, &self.env));
        }

        self.renderer
            .set_background(Some(self.env.color(ColorRole::Background)));
        let (cmds, stats) = self.renderer.render(&lines, width, height);
        self.output.extend(cmds);
        self.flush_output()?;

        let waker = self.handle().waker();
        let callbacks = self.registries.lifecycle.run_pending(Some(&waker));
        self.frames += 1;
        tracing::debug!(
            frame = self.frames,
            width,
            height,
            rows_written = stats.rows_written,
            full_redraw = stats.full_redraw,
            disappeared = summary.disappeared.len(),
            state_collected = summary.state_collected,
            callbacks,
            elapsed_us = started.elapsed().as_micros() as u64,
            "render pass"
        );
        Ok(stats)
    }

    fn flush_output(&mut self) -> std::io::Result<()> {
        self.output.flush(&mut self.terminal)
    }
}

impl<T: Terminal> Drop for Runtime<T> {
    fn drop(&mut self) {
        if self.stopped {
            return;
        }

        // Never panic in Drop, especially during unwind.
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = self.stop();
        }));
    }
}
