use std::rc::{Rc, Weak};

use indexmap::IndexMap;


/// A notification callback registered with a [`Source`](crate::Source).
///
/// Listeners are compared by identity. Clones of the same `Listener` are the same callback,
/// so registering a clone under a key that already holds it has no effect.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn()>);

impl Listener {
    pub fn new(f: impl Fn() + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback.
    pub fn call(&self) {
        (self.0)()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    pub(crate) fn id(&self) -> ListenerId {
        ListenerId(Rc::as_ptr(&self.0) as *const () as usize)
    }

    pub(crate) fn downgrade(&self) -> WeakListener {
        WeakListener(Rc::downgrade(&self.0))
    }
}

/// Keeps the address of a callback reserved without keeping the callback alive.
pub(crate) struct WeakListener(Weak<dyn Fn()>);

impl WeakListener {
    pub fn id(&self) -> ListenerId {
        ListenerId(Weak::as_ptr(&self.0) as *const () as usize)
    }

    /// Returns `false` once every strong handle is gone.
    pub fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({:#x})", self.id().0)
    }
}

/// Address of the callback. Stable while the callback is alive, and a registered
/// callback is kept alive by the set that holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct ListenerId(usize);

/// Insertion-ordered set of listeners.
#[derive(Default)]
pub(crate) struct ListenerSet(IndexMap<ListenerId, Listener>);

impl ListenerSet {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Returns `false` if the listener was already present.
    pub fn insert(&mut self, listener: Listener) -> bool {
        let id = listener.id();
        if self.0.contains_key(&id) {
            return false;
        }
        self.0.insert(id, listener);
        true
    }

    /// The removed listener is returned so that the caller can drop it after releasing
    /// its borrow of the set.
    pub fn remove(&mut self, id: ListenerId) -> Option<Listener> {
        self.0.shift_remove(&id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn snapshot(&self) -> Vec<Listener> {
        self.0.values().cloned().collect()
    }
}
