//! # sigsync
//!
//! `sigsync` is a registry of shared values that independent consumers can read, observe, and
//! combine into derived values, without a coordinator that owns the subscriptions.
//!
//! - [`Registry`]: the memory holding the value and listener set of each key.
//! - [`Store<T>`]: a writable handle to one key. Stores created for the same key share state.
//! - [`Derived<T>`]: a read-only value computed from other sources, with dependencies
//!   discovered on each read.
//! - [`Memoize`]: wraps a function that constructs sources so that equal arguments return
//!   the same instance.
//!
//! ```
//! use sigsync::{derive, Registry, Source, SyncConfig};
//!
//! let registry = Registry::new();
//! let count = registry.sync(SyncConfig::new("count", 2));
//! let doubled = derive({
//!     let count = count.clone();
//!     move |cx| cx.read(&count) * 2
//! });
//! assert_eq!(doubled.get_value(), 4);
//!
//! let _s = doubled.on_change(|| println!("changed"));
//! count.update_with(|x| x + 1);
//! assert_eq!(doubled.get_value(), 6);
//! ```
//!
//! Everything is single-threaded: `update` writes the value and calls the listeners before it
//! returns.

mod config;
mod derived;
mod error;
mod listener;
mod memo;
mod registry;
mod source;
mod store;
mod stream;
mod subscription;

pub use config::*;
pub use derived::*;
pub use error::*;
pub use listener::Listener;
pub use memo::*;
pub use registry::Registry;
pub use sigsync_macros::memoize;
pub use source::*;
pub use store::*;
pub use stream::*;
pub use subscription::*;
