use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse2, parse_quote, GenericParam, ItemFn, Result, ReturnType};

use crate::syn_utils::arg_ident;

pub fn memoize(attr: TokenStream, item: TokenStream) -> Result<TokenStream> {
    if !attr.is_empty() {
        bail!(_, "`#[memoize]` does not take arguments");
    }
    let mut func: ItemFn = parse2(item)?;
    if let Some(asyncness) = &func.sig.asyncness {
        bail!(
            asyncness.span,
            "`#[memoize]` cannot be applied to async functions"
        );
    }
    if let ReturnType::Default = func.sig.output {
        bail!(
            func.sig.ident.span(),
            "`#[memoize]` requires a function that returns a value"
        );
    }
    if func
        .sig
        .generics
        .params
        .iter()
        .any(|p| !matches!(p, GenericParam::Lifetime(_)))
    {
        bail!(
            func.sig.ident.span(),
            "`#[memoize]` cannot be applied to functions with type or const parameters"
        );
    }

    let args = func
        .sig
        .inputs
        .iter()
        .map(|arg| arg_ident(arg, "memoize"))
        .collect::<Result<Vec<_>>>()?;
    let Some((registry, params)) = args.split_first() else {
        bail!(
            func.sig.paren_token.span.join(),
            "`#[memoize]` requires a `&Registry` as the first argument"
        );
    };

    let block = func.block;
    let wrapped_block = quote!({
        struct __MemoizeScope;
        let __memoize_key: ::std::vec::Vec<::std::string::String> =
            ::std::vec![#(::std::string::ToString::to_string(&#params),)*];
        let __memoize_signature =
            ::sigsync::Signature::of::<__MemoizeScope>(::sigsync::join_key(__memoize_key));
        ::sigsync::Registry::memoized(#registry, __memoize_signature, move || #block)
    });
    func.block = Box::new(parse_quote!(#wrapped_block));
    Ok(quote!(#func))
}
