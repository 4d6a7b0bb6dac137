use proc_macro::TokenStream;
use syn_utils::into_macro_output;

#[macro_use]
mod syn_utils;

mod memoize_impl;

/// Memoizes a function that constructs a source.
///
/// The first argument must be the `&Registry` that holds the cache. The remaining arguments
/// form the cache key: their `Display` output joined with `_`. Calls whose arguments produce
/// the same key return a clone of the instance built by the first call.
///
/// Each annotated function has its own cache scope, so two functions called with the same
/// arguments do not share instances.
///
/// # Examples
///
/// ```ignore
/// #[memoize]
/// fn cart_total(registry: &Registry, user: u32) -> Derived<u32> {
///     let cart = registry.sync_with_params::<Vec<u32>, u32>(SyncConfig::new("cart", vec![])).get(&user);
///     derive(move |cx| cx.read(&cart).iter().sum())
/// }
/// ```
#[proc_macro_attribute]
pub fn memoize(attr: proc_macro::TokenStream, item: proc_macro::TokenStream) -> TokenStream {
    into_macro_output(memoize_impl::memoize(attr.into(), item.into()))
}
