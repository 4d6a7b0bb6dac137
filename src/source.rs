use std::rc::Rc;

use crate::{Changes, Listener, Subscription};

/// A value that can be read and observed.
///
/// Implemented by [`Store`](crate::Store) and [`Derived`](crate::Derived).
pub trait Source: 'static {
    type Value;

    /// Registers `listener` to be called after every change of the value.
    ///
    /// The returned [`Subscription`] removes exactly this registration.
    fn synchronize(&self, listener: &Listener) -> Subscription;

    /// Returns the current value.
    fn get_value(&self) -> Self::Value;

    /// Identity of the underlying state. Handles that alias the same state share an id.
    fn source_id(&self) -> SourceId;

    /// Calls `f` after every change of the value.
    fn on_change(&self, f: impl Fn() + 'static) -> Subscription
    where
        Self: Sized,
    {
        self.synchronize(&Listener::new(f))
    }

    fn to_sync_handle(&self) -> SyncHandle
    where
        Self: Clone,
    {
        let this = self.clone();
        SyncHandle::new(self.source_id(), move |l| this.synchronize(l))
    }

    /// Returns a stream that yields the current value, then a new value after each change.
    fn changes(&self) -> Changes<Self>
    where
        Self: Clone,
    {
        Changes::new(self.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(usize);

impl SourceId {
    pub(crate) fn of<T: ?Sized>(rc: &Rc<T>) -> Self {
        Self(Rc::as_ptr(rc) as *const () as usize)
    }
}

/// Type-erased `synchronize` of a source.
#[derive(Clone)]
pub struct SyncHandle {
    id: SourceId,
    synchronize: Rc<dyn Fn(&Listener) -> Subscription>,
}

impl SyncHandle {
    pub fn new(id: SourceId, synchronize: impl Fn(&Listener) -> Subscription + 'static) -> Self {
        Self {
            id,
            synchronize: Rc::new(synchronize),
        }
    }

    pub fn source_id(&self) -> SourceId {
        self.id
    }

    pub fn synchronize(&self, listener: &Listener) -> Subscription {
        (self.synchronize)(listener)
    }
}
impl std::fmt::Debug for SyncHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SyncHandle").field(&self.id).finish()
    }
}
