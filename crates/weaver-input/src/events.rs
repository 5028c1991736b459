//! Ordered, synchronous event delivery from the view to the input core.
//!
//! An [`EventChannel`] is a single-threaded observer list. Listeners run in
//! subscription order, and each subscription is a handle that detaches its
//! listener when dropped.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::gate::KeyEvent;
use crate::mutation::MutationRecord;
use crate::types::SelectionHint;

/// Events the view produces for the input core.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewEvent {
    /// One mutation observer flush.
    Mutations {
        records: Vec<MutationRecord>,
        hint: Option<SelectionHint>,
    },
    Keydown(KeyEvent),
    /// The selection moved in the view and the model selection was synced.
    SelectionChange,
    CompositionStart,
    CompositionEnd,
}

type Listener<E> = Rc<RefCell<dyn FnMut(&E)>>;

struct Listeners<E> {
    next_id: u64,
    entries: Vec<(u64, Listener<E>)>,
}

/// Observer list for events of type `E`.
pub struct EventChannel<E> {
    inner: Rc<RefCell<Listeners<E>>>,
}

impl<E> Clone for EventChannel<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: 'static> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("listeners", &self.inner.borrow().entries.len())
            .finish()
    }
}

impl<E: 'static> EventChannel<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register `listener`. It stays registered while the returned
    /// [`Subscription`] is alive.
    #[must_use = "dropping the subscription removes the listener"]
    pub fn subscribe(&self, listener: impl FnMut(&E) + 'static) -> Subscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        let listener: Listener<E> = Rc::new(RefCell::new(listener));
        inner.entries.push((id, listener));

        let weak: Weak<RefCell<Listeners<E>>> = Rc::downgrade(&self.inner);
        Subscription {
            detach: Some(Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.borrow_mut().entries.retain(|(entry, _)| *entry != id);
                }
            })),
        }
    }

    /// Deliver `event` to every listener, in subscription order. Returns the
    /// number of listeners called.
    ///
    /// Listeners may subscribe or unsubscribe while an event is delivered;
    /// changes apply from the next event on. A listener that emits into the
    /// channel it is running from is skipped for the nested event.
    pub fn emit(&self, event: &E) -> usize {
        let listeners: Vec<Listener<E>> = self
            .inner
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        let mut called = 0;
        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut listener) => {
                    (&mut *listener)(event);
                    called += 1;
                }
                Err(_) => tracing::warn!("skipping listener re-entered by its own event"),
            }
        }
        called
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().entries.len()
    }
}

/// Handle that keeps a listener registered.
#[must_use = "dropping the subscription removes the listener"]
pub struct Subscription {
    detach: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.detach_now();
    }

    fn detach_now(&mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.detach.is_some())
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach_now();
    }
}
