use std::{fmt::Display, rc::Rc};

use derive_ex::derive_ex;
use serde::{Serialize, Serializer};

use crate::{
    registry::Slot, Listener, Registry, Source, SourceId, StoreError, Subscription, SyncConfig,
};

#[cfg(test)]
mod tests;

/// New value for [`Store::update`].
pub enum Update<T> {
    /// Replaces the value.
    Replace(T),
    /// Computes the value from the previous one.
    Transform(Box<dyn FnOnce(&T) -> T>),
}

impl<T> Update<T> {
    pub fn transform(f: impl FnOnce(&T) -> T + 'static) -> Self {
        Self::Transform(Box::new(f))
    }
}
impl<T> From<T> for Update<T> {
    fn from(value: T) -> Self {
        Self::Replace(value)
    }
}
impl<T: std::fmt::Debug> std::fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::Transform(_) => write!(f, "Transform(..)"),
        }
    }
}

/// Writable handle to one key of a [`Registry`].
///
/// All stores created for the same key share the value and the listeners,
/// regardless of where they were created.
#[derive_ex(Clone, bound())]
pub struct Store<T: 'static>(Rc<Slot<T>>);

impl<T: 'static> Store<T> {
    pub fn key(&self) -> &str {
        self.0.key()
    }

    /// Writes a new value and notifies every listener of the key.
    ///
    /// Listeners are called even if the new value equals the old one.
    /// A transform sees a copy of the previous value, so it may read or write this store.
    pub fn update(&self, update: impl Into<Update<T>>)
    where
        T: Clone,
    {
        match update.into() {
            Update::Replace(value) => self.0.set(value),
            Update::Transform(f) => self.0.modify(f),
        }
    }

    /// Same as `update(Update::Replace(value))`.
    pub fn set(&self, value: T) {
        self.0.set(value)
    }

    /// Same as `update(Update::transform(f))`.
    pub fn update_with(&self, f: impl FnOnce(&T) -> T)
    where
        T: Clone,
    {
        self.0.modify(f)
    }

    /// Returns `true` if both stores refer to the same key of the same registry.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl<T: Clone + 'static> Source for Store<T> {
    type Value = T;

    fn synchronize(&self, listener: &Listener) -> Subscription {
        self.0.subscribe(listener)
    }
    fn get_value(&self) -> T {
        self.0.get()
    }
    fn source_id(&self) -> SourceId {
        SourceId::of(&self.0)
    }
}
impl<T: Clone + std::fmt::Debug + 'static> std::fmt::Debug for Store<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("key", &self.key())
            .field("value", &self.get_value())
            .finish()
    }
}
impl<T> Serialize for Store<T>
where
    T: Clone + Serialize + 'static,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get_value().serialize(serializer)
    }
}

/// Separator between the base key and the parameter key of a [`SyncWithParams`] store.
///
/// Base keys or parameter keys containing it may collide with each other.
pub const KEY_SEPARATOR: &str = "__";

/// Creates stores whose keys are derived from a base key and a parameter.
///
/// Stores created with equal parameter keys share state. Stores created with different
/// parameter keys are independent.
#[derive_ex(Clone, bound(T))]
pub struct SyncWithParams<T: 'static, P: ?Sized + 'static> {
    registry: Registry,
    key: String,
    initial: T,
    key_fn: Rc<dyn Fn(&P) -> String>,
}

impl<T: Clone + 'static, P: ?Sized + 'static> SyncWithParams<T, P> {
    pub fn key_of(&self, param: &P) -> String {
        format!("{}{}{}", self.key, KEY_SEPARATOR, (self.key_fn)(param))
    }

    pub fn try_get(&self, param: &P) -> Result<Store<T>, StoreError> {
        self.registry
            .try_sync(SyncConfig::new(self.key_of(param), self.initial.clone()))
    }

    /// Returns the store for `param`.
    ///
    /// # Panics
    ///
    /// Panics if the composite key already holds a value of another type.
    pub fn get(&self, param: &P) -> Store<T> {
        self.try_get(param).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Registry {
    /// Returns a store for `config.key`, creating the key with `config.initial` if it does not exist.
    ///
    /// If the key already exists, `config.initial` is ignored.
    pub fn try_sync<T: 'static>(&self, config: SyncConfig<T>) -> Result<Store<T>, StoreError> {
        Ok(Store(self.slot(config)?))
    }

    /// Same as [`try_sync`](Self::try_sync), but panics if the key holds a value of another type.
    pub fn sync<T: 'static>(&self, config: SyncConfig<T>) -> Store<T> {
        self.try_sync(config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Returns a factory of stores namespaced by a parameter, keyed by its `Display` output.
    pub fn sync_with_params<T, P>(&self, config: SyncConfig<T>) -> SyncWithParams<T, P>
    where
        T: Clone + 'static,
        P: Display + ?Sized + 'static,
    {
        self.sync_with_params_by(config, |p: &P| p.to_string())
    }

    /// Returns a factory of stores namespaced by a parameter, keyed by `key_fn`.
    ///
    /// Parameters for which `key_fn` returns the same string share a store.
    pub fn sync_with_params_by<T, P>(
        &self,
        config: SyncConfig<T>,
        key_fn: impl Fn(&P) -> String + 'static,
    ) -> SyncWithParams<T, P>
    where
        T: Clone + 'static,
        P: ?Sized + 'static,
    {
        SyncWithParams {
            registry: self.clone(),
            key: config.key,
            initial: config.initial,
            key_fn: Rc::new(key_fn),
        }
    }
}
