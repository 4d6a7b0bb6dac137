use std::{
    cell::RefCell,
    pin::Pin,
    rc::Rc,
    task::{Context, Poll, Waker},
};

use futures::Stream;

use crate::{Listener, Source, Subscription};


/// Stream returned by [`Source::changes`].
///
/// Yields the current value on first poll, then the latest value after each notification.
/// Notifications received between two polls produce a single item.
///
/// After every item the stream subscribes again, so for a [`Derived`](crate::Derived)
/// it follows the dependencies of the most recent computation.
pub struct Changes<S> {
    source: S,
    state: Rc<RefCell<ChangesState>>,
    listener: Listener,
    subscription: Subscription,
}

struct ChangesState {
    is_ready: bool,
    waker: Option<Waker>,
}

impl<S: Source> Changes<S> {
    pub fn new(source: S) -> Self {
        let state = Rc::new(RefCell::new(ChangesState {
            is_ready: true,
            waker: None,
        }));
        let listener = Listener::new({
            let state = state.clone();
            move || {
                let waker = {
                    let mut s = state.borrow_mut();
                    s.is_ready = true;
                    s.waker.take()
                };
                if let Some(waker) = waker {
                    waker.wake();
                }
            }
        });
        Self {
            source,
            state,
            listener,
            subscription: Subscription::empty(),
        }
    }
}

impl<S: Source + Unpin> Stream for Changes<S> {
    type Item = S::Value;
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        {
            let mut s = this.state.borrow_mut();
            if !s.is_ready {
                s.waker = Some(cx.waker().clone());
                return Poll::Pending;
            }
            s.is_ready = false;
        }
        let value = this.source.get_value();
        this.subscription.unsubscribe();
        this.subscription = this.source.synchronize(&this.listener);
        Poll::Ready(Some(value))
    }
}
