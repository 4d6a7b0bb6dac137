use std::{
    any::{type_name, Any, TypeId},
    fmt::Display,
    rc::Rc,
};

use derive_ex::{derive_ex, Ex};
use tracing::trace;

use crate::{registry::MemoEntry, Registry, StoreError};


/// Cache key of a memoized construction.
///
/// `scope` identifies the constructing function, `key` its arguments.
/// Arguments with equal keys are treated as the same arguments.
#[derive(Clone, Debug, parse_display::Display, Ex)]
#[derive_ex(PartialEq, Eq, Hash)]
#[display("{scope_name}({key})")]
pub struct Signature {
    scope: TypeId,
    #[eq(ignore)]
    scope_name: &'static str,
    key: String,
}

impl Signature {
    /// Creates a signature scoped by the type `F`, usually the type of the constructing function.
    pub fn of<F: ?Sized + 'static>(key: String) -> Self {
        Self {
            scope: TypeId::of::<F>(),
            scope_name: type_name::<F>(),
            key,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Joins the `Display` output of each argument with `_`.
pub fn join_key<I>(args: I) -> String
where
    I: IntoIterator,
    I::Item: Display,
{
    let mut key = String::new();
    for (i, arg) in args.into_iter().enumerate() {
        if i != 0 {
            key.push('_');
        }
        key.push_str(&arg.to_string());
    }
    key
}

/// A constructing function wrapped by [`Registry::memoize`].
///
/// Calls with arguments of equal key return the same instance, constructed by the first call.
#[derive_ex(Clone, bound())]
pub struct Memoize<P: 'static, S: 'static> {
    registry: Registry,
    scope: fn(String) -> Signature,
    key_fn: Rc<dyn Fn(&P) -> String>,
    factory: Rc<dyn Fn(P) -> S>,
}

impl<P: 'static, S: Clone + 'static> Memoize<P, S> {
    pub fn signature(&self, param: &P) -> Signature {
        (self.scope)((self.key_fn)(param))
    }

    pub fn try_get(&self, param: P) -> Result<S, StoreError> {
        let signature = self.signature(&param);
        let factory = &self.factory;
        self.registry.try_memoized(signature, || factory(param))
    }

    /// Returns the cached instance for `param`, constructing it on first use.
    ///
    /// # Panics
    ///
    /// Panics if the signature is cached with a value of another type.
    pub fn get(&self, param: P) -> S {
        self.try_get(param).unwrap_or_else(|e| panic!("{e}"))
    }
}

impl Registry {
    /// Wraps `f` so that calls with arguments of equal `Display` output return the same instance.
    ///
    /// The cache is shared by every wrapper of the same function type in this registry,
    /// and entries are never evicted.
    pub fn memoize<P, S, F>(&self, f: F) -> Memoize<P, S>
    where
        P: Display + 'static,
        S: Clone + 'static,
        F: Fn(P) -> S + 'static,
    {
        self.memoize_by(|p: &P| p.to_string(), f)
    }

    /// Same as [`memoize`](Self::memoize), but arguments are keyed by `key_fn`.
    ///
    /// Arguments for which `key_fn` returns the same string share an instance.
    pub fn memoize_by<P, S, F>(
        &self,
        key_fn: impl Fn(&P) -> String + 'static,
        f: F,
    ) -> Memoize<P, S>
    where
        P: 'static,
        S: Clone + 'static,
        F: Fn(P) -> S + 'static,
    {
        Memoize {
            registry: self.clone(),
            scope: Signature::of::<F>,
            key_fn: Rc::new(key_fn),
            factory: Rc::new(f),
        }
    }

    /// Returns the instance cached for `signature`, calling `f` to construct it on first use.
    ///
    /// `f` may itself create stores or memoized instances. If it caches an instance under the
    /// same `signature`, that instance is kept and returned instead of the result of `f`.
    pub fn try_memoized<S: Clone + 'static>(
        &self,
        signature: Signature,
        f: impl FnOnce() -> S,
    ) -> Result<S, StoreError> {
        let (value, found) = match self.memo(&signature) {
            Some(entry) => {
                trace!(%signature, "memo hit");
                entry
            }
            None => {
                trace!(%signature, "memo miss");
                let entry = MemoEntry {
                    value: Rc::new(f()),
                    type_name: type_name::<S>(),
                };
                self.memo_insert(signature.clone(), entry)
            }
        };
        downcast_memo(&value).ok_or_else(|| StoreError::TypeMismatch {
            key: signature.to_string(),
            expected: type_name::<S>(),
            found,
        })
    }

    /// Same as [`try_memoized`](Self::try_memoized), but panics if `signature` is cached with
    /// a value of another type.
    pub fn memoized<S: Clone + 'static>(&self, signature: Signature, f: impl FnOnce() -> S) -> S {
        self.try_memoized(signature, f)
            .unwrap_or_else(|e| panic!("{e}"))
    }
}

fn downcast_memo<S: Clone + 'static>(value: &Rc<dyn Any>) -> Option<S> {
    value.downcast_ref::<S>().cloned()
}
