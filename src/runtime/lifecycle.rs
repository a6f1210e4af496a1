//! Appear/disappear detection across render passes.
//!
//! A token "appears" on the first pass of each consecutive run of passes that
//! visit it, and "disappears" after the first pass that does not. Callbacks
//! are queued during traversal and run once the pass is complete.

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::runtime::task::{self, TaskFn, TaskHandle, Waker};

/// Opaque per-instance identity: hash of a view path plus an optional key.
///
/// Keyed tokens are built from the path relative to the keyed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LifecycleToken(u64);

impl LifecycleToken {
    pub fn new(path: &[u32], key: Option<&str>) -> Self {
        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        key.hash(&mut hasher);
        Self(hasher.finish())
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

pub type LifecycleCallback = Rc<dyn Fn()>;

enum Pending {
    Appear(LifecycleCallback),
    Disappear(LifecycleCallback),
    Spawn(LifecycleToken, TaskFn),
}

#[derive(Default)]
pub struct LifecycleTracker {
    appeared_last_pass: HashSet<LifecycleToken>,
    seen_this_pass: HashSet<LifecycleToken>,
    on_disappear: HashMap<LifecycleToken, LifecycleCallback>,
    tasks: HashMap<LifecycleToken, Vec<TaskHandle>>,
    pending: Vec<Pending>,
}

impl LifecycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&mut self) {
        self.seen_this_pass.clear();
    }

    /// Mark `token` as present this pass. Returns `true` when it just appeared.
    pub fn visit(&mut self, token: LifecycleToken) -> bool {
        self.seen_this_pass.insert(token);
        self.appeared_last_pass.insert(token)
    }

    /// Finish the pass and return the tokens that disappeared, sorted.
    ///
    /// Their tasks are cancelled now; their disappear callbacks are queued.
    pub fn end_pass(&mut self) -> Vec<LifecycleToken> {
        let disappeared: BTreeSet<LifecycleToken> = self
            .appeared_last_pass
            .difference(&self.seen_this_pass)
            .copied()
            .collect();
        for token in &disappeared {
            if let Some(callback) = self.on_disappear.remove(token) {
                self.pending.push(Pending::Disappear(callback));
            }
            if let Some(handles) = self.tasks.remove(token) {
                for handle in &handles {
                    handle.cancel();
                }
            }
        }
        self.appeared_last_pass = self.seen_this_pass.clone();
        disappeared.into_iter().collect()
    }

    pub fn is_active(&self, token: LifecycleToken) -> bool {
        self.appeared_last_pass.contains(&token)
    }

    pub fn queue_appear(&mut self, callback: LifecycleCallback) {
        self.pending.push(Pending::Appear(callback));
    }

    /// Remember the latest disappear callback for `token`.
    pub fn set_on_disappear(&mut self, token: LifecycleToken, callback: LifecycleCallback) {
        self.on_disappear.insert(token, callback);
    }

    pub fn queue_task(&mut self, token: LifecycleToken, task: TaskFn) {
        self.pending.push(Pending::Spawn(token, task));
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn running_tasks(&self) -> usize {
        self.tasks.values().map(Vec::len).sum()
    }

    /// Run everything queued by the last traversal, in queue order.
    ///
    /// Returns the number of callbacks run and tasks spawned.
    pub fn run_pending(&mut self, waker: Option<&Waker>) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for item in pending {
            match item {
                Pending::Appear(callback) | Pending::Disappear(callback) => callback(),
                Pending::Spawn(token, task) => {
                    if !self.is_active(token) {
                        continue;
                    }
                    let name = format!("strata-tui-task-{:x}", token.raw());
                    match task::spawn(&name, task, waker.cloned()) {
                        Ok(handle) => self.tasks.entry(token).or_default().push(handle),
                        Err(err) => tracing::warn!(error = %err, "failed to spawn task"),
                    }
                }
            }
        }
        count
    }

    /// Cancel every running task. Used when the runtime stops.
    pub fn cancel_all(&mut self) {
        for handle in self.tasks.values().flatten() {
            handle.cancel();
        }
        self.tasks.clear();
    }
}

impl fmt::Debug for LifecycleTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleTracker")
            .field("active", &self.appeared_last_pass.len())
            .field("pending", &self.pending.len())
            .field("tasks", &self.running_tasks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{LifecycleToken, LifecycleTracker};
    use crate::runtime::task::TaskContext;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::time::Duration;

    fn pass(tracker: &mut LifecycleTracker, tokens: &[LifecycleToken]) -> (Vec<bool>, Vec<LifecycleToken>) {
        tracker.begin_pass();
        let appeared = tokens.iter().map(|token| tracker.visit(*token)).collect();
        (appeared, tracker.end_pass())
    }

    #[test]
    fn appear_and_disappear_follow_consecutive_runs() {
        let token = LifecycleToken::new(&[0, 1], None);
        let mut tracker = LifecycleTracker::new();

        assert_eq!(pass(&mut tracker, &[token]), (vec![true], vec![]));
        assert_eq!(pass(&mut tracker, &[token]), (vec![false], vec![]));
        assert_eq!(pass(&mut tracker, &[]), (vec![], vec![token]));
        assert_eq!(pass(&mut tracker, &[token]), (vec![true], vec![]));
    }

    #[test]
    fn tokens_differ_by_path_and_key() {
        let base = LifecycleToken::new(&[0, 1], None);
        assert_eq!(base, LifecycleToken::new(&[0, 1], None));
        assert_ne!(base, LifecycleToken::new(&[0, 2], None));
        assert_ne!(base, LifecycleToken::new(&[0, 1], Some("row-7")));
    }

    #[test]
    fn callbacks_wait_for_run_pending() {
        let token = LifecycleToken::new(&[3], None);
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut tracker = LifecycleTracker::new();

        tracker.begin_pass();
        if tracker.visit(token) {
            let log = Rc::clone(&log);
            tracker.queue_appear(Rc::new(move || log.borrow_mut().push("appear")));
        }
        let log_clone = Rc::clone(&log);
        tracker.set_on_disappear(token, Rc::new(move || log_clone.borrow_mut().push("disappear")));
        tracker.end_pass();
        assert!(log.borrow().is_empty());
        assert_eq!(tracker.run_pending(None), 1);
        assert_eq!(*log.borrow(), vec!["appear"]);

        tracker.begin_pass();
        tracker.end_pass();
        tracker.run_pending(None);
        assert_eq!(*log.borrow(), vec!["appear", "disappear"]);
    }

    #[test]
    fn task_is_cancelled_when_token_disappears() {
        let token = LifecycleToken::new(&[9], None);
        let (tx, rx) = std::sync::mpsc::channel();
        let tx = std::sync::Mutex::new(tx);
        let mut tracker = LifecycleTracker::new();

        tracker.begin_pass();
        assert!(tracker.visit(token));
        tracker.queue_task(
            token,
            Arc::new(move |ctx: TaskContext| {
                while ctx.sleep(Duration::from_millis(5)) {}
                let _ = tx.lock().map(|tx| tx.send("cancelled"));
            }),
        );
        tracker.end_pass();
        tracker.run_pending(None);
        assert_eq!(tracker.running_tasks(), 1);

        tracker.begin_pass();
        tracker.end_pass();
        assert_eq!(tracker.running_tasks(), 0);
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).expect("task exit"),
            "cancelled"
        );
    }

    #[test]
    fn task_for_token_gone_before_run_is_not_spawned() {
        let token = LifecycleToken::new(&[4], None);
        let mut tracker = LifecycleTracker::new();
        tracker.begin_pass();
        tracker.visit(token);
        tracker.queue_task(token, Arc::new(|_: TaskContext| {}));
        tracker.end_pass();
        tracker.begin_pass();
        tracker.end_pass();
        tracker.run_pending(None);
        assert_eq!(tracker.running_tasks(), 0);
    }
}
