use std::{cell::RefCell, mem::take};


/// Handle returned by [`Source::synchronize`](crate::Source::synchronize).
///
/// Calling [`unsubscribe`](Self::unsubscribe) removes the registration it was created for.
/// Subsequent calls do nothing. Dropping the handle unsubscribes as well;
/// use [`detach`](Self::detach) to keep the registration alive.
#[derive(Default)]
#[must_use]
pub struct Subscription(RefCell<RawSubscription>);

impl Subscription {
    pub fn empty() -> Self {
        Self::from_raw(RawSubscription::Empty)
    }
    pub fn from_fn(f: impl FnOnce() + 'static) -> Self {
        Self::from_raw(RawSubscription::Fn(Box::new(f)))
    }

    fn from_raw(raw: RawSubscription) -> Self {
        Self(RefCell::new(raw))
    }

    /// Removes the registration. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        let raw = take(&mut *self.0.borrow_mut());
        raw.run();
    }

    pub fn is_active(&self) -> bool {
        !matches!(*self.0.borrow(), RawSubscription::Empty)
    }

    /// Consumes the handle without unsubscribing.
    pub fn detach(self) {
        *self.0.borrow_mut() = RawSubscription::Empty;
    }
}
impl Drop for Subscription {
    fn drop(&mut self) {
        take(self.0.get_mut()).run();
    }
}
impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("is_active", &self.is_active())
            .finish()
    }
}
/// Combines subscriptions into one that unsubscribes all of them, in order.
impl FromIterator<Subscription> for Subscription {
    fn from_iter<I: IntoIterator<Item = Subscription>>(iter: I) -> Self {
        let subscriptions: Vec<_> = iter.into_iter().collect();
        if subscriptions.is_empty() {
            Self::empty()
        } else {
            Self::from_raw(RawSubscription::Many(subscriptions))
        }
    }
}

#[derive(Default)]
enum RawSubscription {
    #[default]
    Empty,
    Fn(Box<dyn FnOnce() + 'static>),
    Many(Vec<Subscription>),
}
impl RawSubscription {
    fn run(self) {
        match self {
            RawSubscription::Empty => {}
            RawSubscription::Fn(f) => f(),
            RawSubscription::Many(subscriptions) => {
                for s in subscriptions {
                    s.unsubscribe();
                }
            }
        }
    }
}
