use std::{cell::RefCell, rc::Rc};

use derive_ex::derive_ex;
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

use crate::{Listener, Source, SourceId, Subscription, SyncHandle};


/// Creates a read-only store computed by `f`.
///
/// See [`Derived`].
pub fn derive<T: 'static>(f: impl Fn(&mut ReadContext) -> T + 'static) -> Derived<T> {
    Derived::new(f)
}

/// Records the sources read by one computation of a [`Derived`].
pub struct ReadContext {
    dependencies: Vec<SyncHandle>,
}

impl ReadContext {
    fn new() -> Self {
        Self {
            dependencies: Vec::new(),
        }
    }

    /// Returns the current value of `source` and records it as a dependency.
    ///
    /// Reading the same source more than once records it once.
    pub fn read<S: Source + Clone>(&mut self, source: &S) -> S::Value {
        let id = source.source_id();
        if self.dependencies.iter().all(|d| d.source_id() != id) {
            self.dependencies.push(source.to_sync_handle());
        }
        source.get_value()
    }

    fn finish(self) -> Vec<SyncHandle> {
        self.dependencies
    }
}

/// Result of [`Derived::get_value_traced`].
#[derive(Debug)]
pub struct Traced<T> {
    pub value: T,
    /// Sources read while computing `value`, in order of first read.
    pub dependencies: Vec<SyncHandle>,
}

/// A read-only store whose value is computed from other sources.
///
/// The value is not cached: each [`get_value`](Source::get_value) runs the compute function
/// again and replaces the dependency set with the sources read by that run.
/// [`synchronize`](Source::synchronize) subscribes through the dependency set as it is at that
/// moment, so the value must be read at least once before subscribing. A derived store that was
/// never read has no dependencies and never notifies.
///
/// A compute function must not read the derived store it belongs to.
#[derive_ex(Clone, bound())]
pub struct Derived<T: 'static>(Rc<DerivedNode<T>>);

struct DerivedNode<T> {
    compute: Box<dyn Fn(&mut ReadContext) -> T>,
    dependencies: RefCell<Option<Vec<SyncHandle>>>,
}

impl<T: 'static> Derived<T> {
    pub fn new(f: impl Fn(&mut ReadContext) -> T + 'static) -> Self {
        Self(Rc::new(DerivedNode {
            compute: Box::new(f),
            dependencies: RefCell::new(None),
        }))
    }

    /// Computes the value and returns it together with the sources it read,
    /// leaving the current dependency set unchanged.
    pub fn get_value_traced(&self) -> Traced<T> {
        let mut cx = ReadContext::new();
        let value = (self.0.compute)(&mut cx);
        Traced {
            value,
            dependencies: cx.finish(),
        }
    }

    /// Number of sources recorded by the last [`get_value`](Source::get_value).
    pub fn dependency_count(&self) -> usize {
        self.0.dependencies.borrow().as_ref().map_or(0, |d| d.len())
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl<T: 'static> Source for Derived<T> {
    type Value = T;

    fn synchronize(&self, listener: &Listener) -> Subscription {
        let Some(dependencies) = self.0.dependencies.borrow().clone() else {
            debug!("derived store synchronized before its first read");
            return Subscription::empty();
        };
        trace!(dependencies = dependencies.len(), "derived synchronize");
        dependencies.iter().map(|d| d.synchronize(listener)).collect()
    }

    fn get_value(&self) -> T {
        let Traced {
            value,
            dependencies,
        } = self.get_value_traced();
        trace!(dependencies = dependencies.len(), "derived dependencies refreshed");
        *self.0.dependencies.borrow_mut() = Some(dependencies);
        value
    }

    fn source_id(&self) -> SourceId {
        SourceId::of(&self.0)
    }
}
impl<T: 'static> std::fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Derived")
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}
impl<T> Serialize for Derived<T>
where
    T: Serialize + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get_value().serialize(serializer)
    }
}
