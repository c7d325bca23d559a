//! Mutable callback slots read by long-lived event listeners.
//!
//! A rendering engine registers its listeners once, but the application
//! logic they should run changes on every update. The listener holds a
//! [`CallbackSlot`] and reads the current callback at call time; the
//! owner overwrites the slot whenever its state changes.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type Callback<A> = Rc<dyn Fn(A)>;

/// A shared, overwritable callback.
pub struct CallbackSlot<A> {
    current: Rc<RefCell<Option<Callback<A>>>>,
}

impl<A> CallbackSlot<A> {
    pub fn new() -> Self {
        Self {
            current: Rc::new(RefCell::new(None)),
        }
    }

    /// Replace the current callback.
    pub fn set(&self, callback: impl Fn(A) + 'static) {
        *self.current.borrow_mut() = Some(Rc::new(callback));
    }

    pub fn clear(&self) {
        self.current.borrow_mut().take();
    }

    pub fn is_set(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Call the current callback. Returns `false` if the slot is empty.
    pub fn invoke(&self, arg: A) -> bool {
        // Clone out first so the callback may overwrite the slot.
        let callback = self.current.borrow().clone();
        match callback {
            Some(callback) => {
                callback(arg);
                true
            }
            None => false,
        }
    }

    /// A listener that always dispatches to the slot's latest callback.
    pub fn listener(&self) -> impl Fn(A) + 'static
    where
        A: 'static,
    {
        let slot = self.clone();
        move |arg| {
            slot.invoke(arg);
        }
    }
}

impl<A> Clone for CallbackSlot<A> {
    fn clone(&self) -> Self {
        Self {
            current: Rc::clone(&self.current),
        }
    }
}

impl<A> Default for CallbackSlot<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for CallbackSlot<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_listener_reads_latest_callback() {
        let slot: CallbackSlot<u32> = CallbackSlot::new();
        let listener = slot.listener();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let log = Rc::clone(&seen);
        slot.set(move |n| log.borrow_mut().push(("first", n)));
        listener(1);

        let log = Rc::clone(&seen);
        slot.set(move |n| log.borrow_mut().push(("second", n)));
        listener(2);

        assert_eq!(*seen.borrow(), vec![("first", 1), ("second", 2)]);
    }

    #[test]
    fn test_empty_slot_is_silent() {
        let slot: CallbackSlot<()> = CallbackSlot::default();
        assert!(!slot.invoke(()));

        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        slot.set(move |_| counter.set(counter.get() + 1));
        assert!(slot.invoke(()));

        slot.clear();
        assert!(!slot.invoke(()));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_callback_may_replace_itself() {
        let slot: CallbackSlot<u8> = CallbackSlot::new();
        let inner = slot.clone();
        slot.set(move |_| inner.set(|_| {}));

        assert!(slot.invoke(0));
        assert!(slot.invoke(0));
    }
}
