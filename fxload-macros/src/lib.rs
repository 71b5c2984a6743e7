use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{Ident, ItemFn};

/// Proc macro to denote a Transaction
///
/// A transaction is a single measured call, usually one request. The function must be `async`
/// and return a `Result<T, E>`; an `Err` is counted as a failed request.
///
/// # Example
/// ```ignore
/// use fxload::prelude::*;
///
/// #[transaction]
/// async fn my_transaction(arg_1: u32, arg_2: &str) -> Result<String, MyError> {
///     ...
/// }
/// ```
#[proc_macro_attribute]
pub fn transaction(attr: TokenStream, item: TokenStream) -> TokenStream {
    transaction_internal(attr, item).into()
}

fn transaction_internal(_attr: TokenStream, item: TokenStream) -> TokenStream2 {
    let input = match syn::parse::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;
    let name = &sig.ident;

    quote! {
        #(#attrs)* #vis #sig {
            ::fxload::transaction::transaction_hook(
                ::fxload::core::generate_labels!(#name),
                async move {
                    #(#stmts)*
                },
            ).await
        }
    }
}

/// Proc macro to denote a Scenario
///
/// A scenario is the body of one VU iteration. The function must be `async`, take no arguments
/// and return nothing; use `fxload::vu::id()` and `fxload::vu::iteration()` to tell VUs and
/// iterations apart.
///
/// See the `Scenario` struct for more information on the methods this macro provides on functions.
///
/// # Example
/// ```ignore
/// use fxload::prelude::*;
///
/// #[scenario]
/// async fn my_scenario() {
/// }
/// ```
#[proc_macro_attribute]
pub fn scenario(attr: TokenStream, item: TokenStream) -> TokenStream {
    scenario_internal(attr, item).into()
}

fn scenario_internal(_attr: TokenStream, item: TokenStream) -> TokenStream2 {
    let input = match syn::parse::<ItemFn>(item) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    if let Some(arg) = input.sig.inputs.first() {
        return syn::Error::new_spanned(arg, "#[scenario] functions cannot take arguments")
            .to_compile_error();
    }

    let ItemFn {
        attrs,
        vis,
        sig,
        block,
    } = input;
    let stmts = &block.stmts;

    let new_name = Ident::new(&format!("__fxload_{}", sig.ident), Span::call_site());
    let mut new_sig = sig.clone();
    new_sig.ident = new_name.clone();

    let mut scen_sig = sig.clone();
    let scen_name = sig.ident.clone();
    scen_sig.asyncness = None;
    scen_sig.output = syn::parse_quote! {
        -> impl ::fxload::scenario::ConfigurableScenario<::fxload::core::RunStatistics>
    };

    quote! {
        #(#attrs)* #vis #scen_sig {
            ::fxload::scenario::Scenario::new(stringify!(#scen_name), #new_name)
        }

        #(#attrs)* #vis #new_sig {
            #(#stmts)*
        }
    }
}
