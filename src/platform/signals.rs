//! Flag-only signal handling.
//!
//! Handlers never run code beyond an atomic store; the render loop polls the
//! flags between waits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{Result, TuiError};

/// Resize and shutdown flags fed by SIGWINCH, SIGINT and SIGTERM.
#[derive(Debug, Clone, Default)]
pub struct SignalFlags {
    resize: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
}

impl SignalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns and clears the resize flag.
    pub fn take_resize(&self) -> bool {
        self.resize.swap(false, Ordering::SeqCst)
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn mark_resize(&self) {
        self.resize.store(true, Ordering::SeqCst);
    }

    pub fn mark_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Install handlers that set these flags. They are removed when the guard drops.
    #[cfg(unix)]
    pub fn register(&self) -> Result<SignalGuard> {
        use signal_hook::consts::{SIGINT, SIGTERM, SIGWINCH};

        let mut guard = SignalGuard { ids: Vec::new() };
        for (signal, flag) in [
            (SIGWINCH, &self.resize),
            (SIGINT, &self.shutdown),
            (SIGTERM, &self.shutdown),
        ] {
            let id = signal_hook::flag::register(signal, Arc::clone(flag))
                .map_err(|source| TuiError::Signal { signal, source })?;
            guard.ids.push(id);
        }
        tracing::debug!(count = guard.ids.len(), "signal flags registered");
        Ok(guard)
    }

    #[cfg(not(unix))]
    pub fn register(&self) -> Result<SignalGuard> {
        Ok(SignalGuard {})
    }
}

/// Unregisters the flag handlers on drop.
#[derive(Debug)]
pub struct SignalGuard {
    #[cfg(unix)]
    ids: Vec<signal_hook::SigId>,
}

#[cfg(unix)]
impl Drop for SignalGuard {
    fn drop(&mut self) {
        for id in self.ids.drain(..) {
            signal_hook::low_level::unregister(id);
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::SignalFlags;
    use std::sync::{Mutex, OnceLock};
    use std::time::{Duration, Instant};

    fn signal_test_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn wait_for(mut check: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_millis(500);
        while Instant::now() < deadline {
            if check() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn sigwinch_sets_resize_flag_once() {
        let _lock = signal_test_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let flags = SignalFlags::new();
        let _guard = flags.register().expect("register signals");

        unsafe {
            libc::raise(libc::SIGWINCH);
        }
        assert!(wait_for(|| flags.take_resize()));
        assert!(!flags.take_resize());
        assert!(!flags.shutdown_requested());
    }

    #[test]
    fn sigterm_sets_shutdown_flag() {
        let _lock = signal_test_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let flags = SignalFlags::new();
        let _guard = flags.register().expect("register signals");

        unsafe {
            libc::raise(libc::SIGTERM);
        }
        assert!(wait_for(|| flags.shutdown_requested()));
    }

    #[test]
    fn sigint_sets_shutdown_flag() {
        let _lock = signal_test_lock()
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let flags = SignalFlags::new();
        let _guard = flags.register().expect("register signals");

        unsafe {
            libc::raise(libc::SIGINT);
        }
        assert!(wait_for(|| flags.shutdown_requested()));
        assert!(!flags.take_resize());
    }

    #[test]
    fn manual_marks_are_visible_to_clones() {
        let flags = SignalFlags::new();
        let observer = flags.clone();
        flags.mark_resize();
        flags.mark_shutdown();
        assert!(observer.take_resize());
        assert!(observer.shutdown_requested());
    }
}
