use proc_macro2::{Span, TokenStream};
use syn::{FnArg, Ident, Pat, Result};

macro_rules! bail {
    (_, $($arg:tt)*) => {
        bail!(::proc_macro2::Span::call_site(), $($arg)*)
    };
    ($span:expr, $fmt:literal $(,)?) => {
        return ::std::result::Result::Err(::syn::Error::new($span, ::std::format!($fmt)))
    };
    ($span:expr, $fmt:literal, $($arg:tt)*) => {
        return ::std::result::Result::Err(::syn::Error::new($span, ::std::format!($fmt, $($arg)*)))
    };
}

pub fn into_macro_output(input: Result<TokenStream>) -> proc_macro::TokenStream {
    match input {
        Ok(s) => s,
        Err(e) => e.to_compile_error(),
    }
    .into()
}

/// Returns the name bound by a function argument, rejecting `self` and destructuring patterns.
pub fn arg_ident(arg: &FnArg, attr: &str) -> Result<Ident> {
    match arg {
        FnArg::Receiver(r) => bail!(
            r.self_token.span,
            "`#[{attr}]` cannot be applied to methods"
        ),
        FnArg::Typed(t) => match &*t.pat {
            Pat::Ident(p) if p.subpat.is_none() => Ok(p.ident.clone()),
            _ => bail!(
                Span::call_site(),
                "`#[{attr}]` requires every argument to be a plain identifier"
            ),
        },
    }
}
