//! Terminal driver seam.

/// Minimal terminal interface used by the runtime.
///
/// Implementations own raw-mode setup and the input reader; the runtime owns
/// everything that gets drawn.
pub trait Terminal {
    /// Enter raw mode and start delivering complete input sequences to `on_input`.
    fn start(&mut self, on_input: Box<dyn FnMut(String) + Send>) -> std::io::Result<()>;

    /// Stop input delivery and restore the original terminal mode.
    fn stop(&mut self) -> std::io::Result<()>;

    /// Discard input that is still arriving before the terminal is handed back.
    fn drain_input(&mut self, _max_ms: u64, _idle_ms: u64) {}

    /// Write already-encoded output.
    fn write(&mut self, data: &str) -> std::io::Result<()>;

    /// `(columns, rows)`, or `None` when the size cannot be queried.
    fn size(&self) -> Option<(u16, u16)>;
}
