//! Ordered callback registry.
//!
//! A [`Signal`] owns a list of callbacks sorted by `(priority, connection
//! order)`. Connecting returns a [`SlotHandle`]; disconnecting looks the slot
//! up directly by handle index and tombstones it, so removal never scans.
//!
//! ```
//! use cobalt_core::signal::Signal;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let mut signal = Signal::<u32>::new();
//!
//! let l = log.clone();
//! signal.connect(10, move |v| l.borrow_mut().push(("late", *v)));
//! let l = log.clone();
//! signal.connect(-5, move |v| l.borrow_mut().push(("early", *v)));
//!
//! signal.emit(&7);
//! assert_eq!(*log.borrow(), vec![("early", 7), ("late", 7)]);
//! ```

use std::fmt;

use crate::handle::{Handle, HandleAllocator};

/// Handle category for signal connections.
pub enum SlotCategory {}

/// Identifies one connection of a [`Signal`].
pub type SlotHandle = Handle<SlotCategory>;

type Callback<A> = Box<dyn FnMut(&A)>;

struct Slot<A> {
    handle: SlotHandle,
    callback: Callback<A>,
}

/// Emission order entry. Carries its own sort key so tombstones stay sorted.
#[derive(Clone, Copy)]
struct OrderKey {
    priority: i32,
    seq: u64,
    handle: SlotHandle,
}

/// An ordered list of callbacks invoked with a shared argument.
pub struct Signal<A> {
    handles: HandleAllocator<SlotCategory>,
    /// Indexed by handle slot index.
    slots: Vec<Option<Slot<A>>>,
    /// Emission order. May contain entries for disconnected handles.
    order: Vec<OrderKey>,
    next_seq: u64,
    tombstones: usize,
}

impl<A> Signal<A> {
    pub fn new() -> Self {
        Self {
            handles: HandleAllocator::new(),
            slots: Vec::new(),
            order: Vec::new(),
            next_seq: 0,
            tombstones: 0,
        }
    }

    /// Registers `callback`. Lower priorities run first; equal priorities run
    /// in connection order.
    pub fn connect(&mut self, priority: i32, callback: impl FnMut(&A) + 'static) -> SlotHandle {
        let handle = self.handles.allocate();
        let idx = handle.index() as usize;
        if self.slots.len() <= idx {
            self.slots.resize_with(idx + 1, || None);
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.slots[idx] = Some(Slot {
            handle,
            callback: Box::new(callback),
        });

        // New connections sort after every existing one with the same priority.
        let pos = self
            .order
            .partition_point(|k| (k.priority, k.seq) <= (priority, seq));
        self.order.insert(
            pos,
            OrderKey {
                priority,
                seq,
                handle,
            },
        );
        handle
    }

    /// Removes a connection. Returns `false` for stale or unknown handles.
    pub fn disconnect(&mut self, handle: SlotHandle) -> bool {
        if !self.handles.release(handle) {
            return false;
        }
        let idx = handle.index() as usize;
        if let Some(slot) = self.slots.get_mut(idx) {
            *slot = None;
        }
        self.tombstones += 1;
        true
    }

    /// Invokes every connected callback in order.
    pub fn emit(&mut self, args: &A) {
        self.compact();
        for key in &self.order {
            match self.slots[key.handle.index() as usize].as_mut() {
                Some(slot) if slot.handle == key.handle => (slot.callback)(args),
                _ => {}
            }
        }
    }

    /// Returns whether `handle` is currently connected.
    pub fn is_connected(&self, handle: SlotHandle) -> bool {
        self.handles.is_live(handle)
    }

    /// Number of connected callbacks.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Disconnects everything.
    pub fn clear(&mut self) {
        for slot in self.slots.drain(..).flatten() {
            self.handles.release(slot.handle);
        }
        self.order.clear();
        self.tombstones = 0;
    }

    fn compact(&mut self) {
        if self.tombstones == 0 {
            return;
        }
        let handles = &self.handles;
        self.order.retain(|k| handles.is_live(k.handle));
        self.tombstones = 0;
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal").field("connections", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, Signal<()>) {
        (Rc::new(RefCell::new(Vec::new())), Signal::new())
    }

    #[test]
    fn ties_run_in_connection_order() {
        let (log, mut signal) = recorder();
        for name in ["a", "b", "c"] {
            let l = log.clone();
            signal.connect(0, move |_| l.borrow_mut().push(name));
        }
        signal.emit(&());
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn disconnect_removes_only_target() {
        let (log, mut signal) = recorder();
        let l = log.clone();
        let a = signal.connect(1, move |_| l.borrow_mut().push("a"));
        let l = log.clone();
        signal.connect(2, move |_| l.borrow_mut().push("b"));

        assert!(signal.disconnect(a));
        assert!(!signal.disconnect(a));
        assert!(!signal.is_connected(a));
        signal.emit(&());
        assert_eq!(*log.borrow(), vec!["b"]);
        assert_eq!(signal.len(), 1);
    }

    #[test]
    fn reused_slot_keeps_new_priority() {
        let (log, mut signal) = recorder();
        let l = log.clone();
        let a = signal.connect(0, move |_| l.borrow_mut().push("a"));
        let l = log.clone();
        signal.connect(5, move |_| l.borrow_mut().push("mid"));
        signal.disconnect(a);

        // Reuses a's slot index but must sort by its own priority.
        let l = log.clone();
        let c = signal.connect(10, move |_| l.borrow_mut().push("c"));
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);

        signal.emit(&());
        assert_eq!(*log.borrow(), vec!["mid", "c"]);
    }

    #[test]
    fn clear_disconnects_everything() {
        let (log, mut signal) = recorder();
        let l = log.clone();
        let h = signal.connect(0, move |_| l.borrow_mut().push("x"));
        signal.clear();
        assert!(signal.is_empty());
        assert!(!signal.is_connected(h));
        signal.emit(&());
        assert!(log.borrow().is_empty());
    }
}
