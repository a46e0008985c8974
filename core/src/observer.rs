//! Ordered listener registry.
//!
//! Listeners live in slots indexed by their `Subscription`, so removal is a
//! single slot write and iteration order is registration order. New listeners
//! always go at the back. Empty slots at either end are released on
//! unsubscribe, so a listener that comes and goes after long-lived ones does
//! not grow the registry. `notify` works on a snapshot of the live listeners,
//! so a callback may subscribe or unsubscribe without tripping the `RefCell`;
//! such changes apply from the next notification on.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<S> = Rc<dyn Fn(&S)>;

struct Registry<S> {
    slots: VecDeque<Option<Callback<S>>>,
    /// Absolute index of `slots[0]`.
    base: usize,
    live: usize,
}

impl<S> Registry<S> {
    fn release(&mut self, slot: usize) {
        let Some(entry) = slot
            .checked_sub(self.base)
            .and_then(|i| self.slots.get_mut(i))
        else {
            return;
        };
        if entry.take().is_some() {
            self.live -= 1;
        }
        while matches!(self.slots.back(), Some(None)) {
            self.slots.pop_back();
        }
        while matches!(self.slots.front(), Some(None)) {
            self.slots.pop_front();
            self.base += 1;
        }
    }
}

pub struct Listeners<S> {
    registry: Rc<RefCell<Registry<S>>>,
}

impl<S> Listeners<S> {
    pub fn new() -> Self {
        Self {
            registry: Rc::new(RefCell::new(Registry {
                slots: VecDeque::new(),
                base: 0,
                live: 0,
            })),
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&S) + 'static) -> Subscription<S> {
        let mut registry = self.registry.borrow_mut();
        registry.slots.push_back(Some(Rc::new(listener)));
        registry.live += 1;
        Subscription {
            registry: Rc::downgrade(&self.registry),
            slot: registry.base + registry.slots.len() - 1,
        }
    }

    /// Call every live listener with `state`, synchronously, in order.
    pub fn notify(&self, state: &S) {
        let snapshot: Vec<Callback<S>> = self
            .registry
            .borrow()
            .slots
            .iter()
            .flatten()
            .cloned()
            .collect();
        for listener in snapshot {
            listener(state);
        }
    }

    pub fn len(&self) -> usize {
        self.registry.borrow().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<S> Default for Listeners<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for Listeners<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners").field("live", &self.len()).finish()
    }
}

/// Handle returned by `Listeners::subscribe`. Dropping it keeps the listener
/// registered; call `unsubscribe` to remove it.
#[must_use = "dropping a Subscription keeps the listener registered forever"]
pub struct Subscription<S> {
    registry: Weak<RefCell<Registry<S>>>,
    slot: usize,
}

impl<S> Subscription<S> {
    pub fn unsubscribe(self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        registry.borrow_mut().release(self.slot);
    }
}

impl<S> fmt::Debug for Subscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("slot", &self.slot).finish()
    }
}
