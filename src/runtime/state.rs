//! Per-path state that survives across render passes.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct Slot {
    value: Rc<dyn Any>,
    touched: bool,
}

/// State slots keyed by view path and value type.
///
/// A slot lives as long as every pass reads it; a pass that skips it drops it.
#[derive(Default)]
pub struct StateStore {
    slots: HashMap<(Vec<u32>, TypeId), Slot>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_pass(&mut self) {
        for slot in self.slots.values_mut() {
            slot.touched = false;
        }
    }

    /// Drop untouched slots. Returns how many were collected.
    pub fn end_pass(&mut self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| slot.touched);
        before - self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get_or_insert<T, F>(&mut self, path: &[u32], init: F) -> Rc<RefCell<T>>
    where
        T: 'static,
        F: FnOnce() -> T,
    {
        let key = (path.to_vec(), TypeId::of::<T>());
        if let Some(slot) = self.slots.get_mut(&key) {
            if let Ok(value) = Rc::clone(&slot.value).downcast::<RefCell<T>>() {
                slot.touched = true;
                return value;
            }
        }
        let value = Rc::new(RefCell::new(init()));
        self.slots.insert(
            key,
            Slot {
                value: value.clone(),
                touched: true,
            },
        );
        value
    }
}

impl fmt::Debug for StateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("slots", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::StateStore;

    #[test]
    fn state_persists_while_path_is_visited() {
        let mut store = StateStore::new();
        store.begin_pass();
        *store.get_or_insert(&[0, 1], || 0u32).borrow_mut() += 1;
        assert_eq!(store.end_pass(), 0);

        store.begin_pass();
        let counter = store.get_or_insert(&[0, 1], || 0u32);
        *counter.borrow_mut() += 1;
        store.end_pass();
        assert_eq!(*counter.borrow(), 2);
    }

    #[test]
    fn unvisited_state_is_collected() {
        let mut store = StateStore::new();
        store.begin_pass();
        store.get_or_insert(&[2], || String::from("draft"));
        store.end_pass();

        store.begin_pass();
        assert_eq!(store.end_pass(), 1);
        assert!(store.is_empty());

        store.begin_pass();
        assert_eq!(*store.get_or_insert(&[2], String::new).borrow(), "");
    }

    #[test]
    fn same_path_different_types_are_separate() {
        let mut store = StateStore::new();
        store.begin_pass();
        store.get_or_insert(&[1], || 5i64);
        store.get_or_insert(&[1], || true);
        assert_eq!(store.len(), 2);
    }
}
