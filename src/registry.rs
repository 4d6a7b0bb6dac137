use std::{
    any::{type_name, Any},
    cell::RefCell,
    collections::{hash_map::Entry, HashMap},
    mem::replace,
    rc::{Rc, Weak},
};

use tracing::{debug, trace};

use crate::{
    listener::{Listener, ListenerSet, WeakListener},
    memo::Signature,
    RegistryMode, StoreError, Subscription, SyncConfig,
};


thread_local! {
    static GLOBAL: Registry = Registry::with_mode(RegistryMode::Process);
}

/// Memory shared by every store created from it.
///
/// Holds the value and listener set of each key, and the cache used by
/// [`memoize`](Self::memoize). Entries are created on first use and are never removed,
/// so a registry is meant for a small, fixed set of keys.
///
/// Cloning a `Registry` yields another handle to the same memory.
#[derive(Clone)]
pub struct Registry(Rc<RegistryData>);

struct RegistryData {
    mode: RegistryMode,
    slots: RefCell<HashMap<String, Rc<dyn AnySlot>>>,
    memos: RefCell<HashMap<Signature, MemoEntry>>,
}

pub(crate) struct MemoEntry {
    pub value: Rc<dyn Any>,
    pub type_name: &'static str,
}

impl Registry {
    /// Creates an isolated registry with [`RegistryMode::Request`] lifetime.
    pub fn new() -> Self {
        Self::with_mode(RegistryMode::Request)
    }

    /// Returns the registry shared by the current thread.
    ///
    /// Every call returns a handle to the same memory, so state survives code that
    /// re-creates its stores.
    pub fn global() -> Self {
        GLOBAL.with(|g| g.clone())
    }

    pub fn for_mode(mode: RegistryMode) -> Self {
        match mode {
            RegistryMode::Process => Self::global(),
            RegistryMode::Request => Self::new(),
        }
    }

    /// Selects the registry according to `SIGSYNC_REGISTRY_MODE`.
    pub fn from_env() -> Result<Self, StoreError> {
        Ok(Self::for_mode(RegistryMode::from_env()?))
    }

    fn with_mode(mode: RegistryMode) -> Self {
        debug!(%mode, "registry created");
        Self(Rc::new(RegistryData {
            mode,
            slots: RefCell::new(HashMap::new()),
            memos: RefCell::new(HashMap::new()),
        }))
    }

    pub fn mode(&self) -> RegistryMode {
        self.0.mode
    }

    /// Returns `true` if both handles refer to the same memory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.slots.borrow().contains_key(key)
    }

    /// Number of keys referenced so far.
    pub fn len(&self) -> usize {
        self.0.slots.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of listeners currently registered under `key`.
    pub fn listener_count(&self, key: &str) -> usize {
        self.0
            .slots
            .borrow()
            .get(key)
            .map_or(0, |slot| slot.listener_count())
    }

    /// Number of entries in the memoization cache.
    pub fn memo_len(&self) -> usize {
        self.0.memos.borrow().len()
    }

    /// Returns the slot for `key`, seeding it with `config.initial` on first reference.
    pub(crate) fn slot<T: 'static>(
        &self,
        config: SyncConfig<T>,
    ) -> Result<Rc<Slot<T>>, StoreError> {
        let SyncConfig { key, initial } = config;
        let slot = match self.0.slots.borrow_mut().entry(key) {
            Entry::Occupied(e) => e.get().clone(),
            Entry::Vacant(e) => {
                trace!(key = %e.key(), "slot created");
                let slot = Rc::new(Slot {
                    key: e.key().clone(),
                    value: RefCell::new(initial),
                    listeners: RefCell::new(ListenerSet::new()),
                });
                e.insert(slot.clone());
                return Ok(slot);
            }
        };
        let found = slot.value_type_name();
        let key = slot.slot_key().to_string();
        slot.into_any()
            .downcast::<Slot<T>>()
            .map_err(|_| StoreError::TypeMismatch {
                key,
                expected: type_name::<T>(),
                found,
            })
    }

    pub(crate) fn memo(&self, signature: &Signature) -> Option<(Rc<dyn Any>, &'static str)> {
        self.0
            .memos
            .borrow()
            .get(signature)
            .map(|e| (e.value.clone(), e.type_name))
    }

    /// Inserts `entry` unless `signature` is already cached, and returns the cached entry.
    pub(crate) fn memo_insert(
        &self,
        signature: Signature,
        entry: MemoEntry,
    ) -> (Rc<dyn Any>, &'static str) {
        let mut memos = self.0.memos.borrow_mut();
        let e = memos.entry(signature).or_insert(entry);
        (e.value.clone(), e.type_name)
    }
}
impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}
impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("mode", &self.mode())
            .field("len", &self.len())
            .field("memo_len", &self.memo_len())
            .finish()
    }
}

trait AnySlot: 'static {
    fn slot_key(&self) -> &str;
    fn value_type_name(&self) -> &'static str;
    fn listener_count(&self) -> usize;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

/// Value and listener set of one key.
pub(crate) struct Slot<T: 'static> {
    key: String,
    value: RefCell<T>,
    listeners: RefCell<ListenerSet>,
}
impl<T: 'static> Slot<T> {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.value.borrow().clone()
    }

    pub fn subscribe(self: &Rc<Self>, listener: &Listener) -> Subscription {
        if self.listeners.borrow_mut().insert(listener.clone()) {
            trace!(key = %self.key, "listener added");
        }
        let this = Rc::downgrade(self);
        let listener = listener.downgrade();
        Subscription::from_fn(move || Self::unsubscribe(this, listener))
    }
    fn unsubscribe(this: Weak<Self>, listener: WeakListener) {
        // A dead listener is no longer in any set, and its address stays reserved while
        // `listener` is held, so the id cannot match another callback.
        if !listener.is_alive() {
            return;
        }
        if let Some(this) = this.upgrade() {
            let removed = this.listeners.borrow_mut().remove(listener.id());
            if removed.is_some() {
                trace!(key = %this.key, "listener removed");
            }
        }
    }

    /// Writes `value`, then calls every listener registered at this point.
    ///
    /// No borrow is held while listeners run, so a listener may read or write any store,
    /// including this one. Such a nested write finishes its own notifications before the
    /// remaining listeners of this write are called.
    pub fn set(&self, value: T) {
        let old = replace(&mut *self.value.borrow_mut(), value);
        drop(old);
        let listeners = self.listeners.borrow().snapshot();
        trace!(key = %self.key, listeners = listeners.len(), "notify");
        for l in &listeners {
            l.call();
        }
    }

    /// `f` runs on a copy of the current value, so it may use this store too.
    pub fn modify(&self, f: impl FnOnce(&T) -> T)
    where
        T: Clone,
    {
        let value = f(&self.get());
        self.set(value);
    }
}
impl<T: 'static> AnySlot for Slot<T> {
    fn slot_key(&self) -> &str {
        &self.key
    }
    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }
    fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
