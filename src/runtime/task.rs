//! Background tasks bound to a lifecycle token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Asks the runtime for another frame. Safe to call from any thread.
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Cooperative cancellation flag shared between a task and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What a running task can see of the runtime.
#[derive(Clone)]
pub struct TaskContext {
    cancel: CancellationToken,
    waker: Option<Waker>,
}

impl TaskContext {
    pub fn new(cancel: CancellationToken, waker: Option<Waker>) -> Self {
        Self { cancel, waker }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn request_render(&self) {
        if let Some(waker) = self.waker.as_ref() {
            waker();
        }
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns `false` if the task was cancelled.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(Duration::from_millis(10)));
        }
    }
}

/// Owner side of a spawned task. Dropping it cancels the task without joining.
#[derive(Debug)]
pub struct TaskHandle {
    cancel: CancellationToken,
    join: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the thread to exit. Returns `false` if it panicked.
    pub fn join(mut self) -> bool {
        match self.join.take() {
            Some(handle) => handle.join().is_ok(),
            None => true,
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub type TaskFn = Arc<dyn Fn(TaskContext) + Send + Sync>;

/// Run `task` on a named thread.
pub fn spawn(name: &str, task: TaskFn, waker: Option<Waker>) -> std::io::Result<TaskHandle> {
    let cancel = CancellationToken::new();
    let context = TaskContext::new(cancel.clone(), waker);
    let join = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || task(context))?;
    Ok(TaskHandle {
        cancel,
        join: Some(join),
    })
}

#[cfg(test)]
mod tests {
    use super::{spawn, CancellationToken, TaskContext, TaskFn};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn cancelled_task_stops_sleeping() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);
        let task: TaskFn = Arc::new(move |ctx: TaskContext| {
            while ctx.sleep(Duration::from_millis(5)) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        let handle = spawn("test-task", task, None).expect("spawn");
        std::thread::sleep(Duration::from_millis(30));
        handle.cancel();
        assert!(handle.is_cancelled());
        assert!(handle.join());
        let seen = ticks.load(Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(ticks.load(Ordering::SeqCst), seen);
    }

    #[test]
    fn request_render_calls_waker() {
        let wakes = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&wakes);
        let task: TaskFn = Arc::new(|ctx: TaskContext| ctx.request_render());
        let handle = spawn(
            "waker-task",
            task,
            Some(Arc::new(move || {
                sink.fetch_add(1, Ordering::SeqCst);
            })),
        )
        .expect("spawn");
        assert!(handle.join());
        assert_eq!(wakes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn token_clones_share_state() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
