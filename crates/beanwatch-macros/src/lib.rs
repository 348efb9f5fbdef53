//! Macros for beanwatch observables.

use proc_macro::TokenStream;
use quote::quote;
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{parse_macro_input, Attribute, Error, Expr, ItemStruct, Lit, LitBool, LitStr, Meta, Token};

mod observable;

/// Marks a struct as observable.
///
/// Expands to `#[derive(ObservableImpl)]`; see the facade crate for the
/// field attributes it understands.
#[proc_macro_attribute]
pub fn observable(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return Error::new(
            proc_macro2::Span::call_site(),
            "#[observable] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let input = parse_macro_input!(item as ItemStruct);

    let expanded = quote! {
        #[derive(::beanwatch::ObservableImpl)]
        #input
    };
    expanded.into()
}

#[proc_macro_derive(ObservableImpl, attributes(change_support, not_observable, property))]
pub fn derive_observable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    observable::expand_derive(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn get_attribute<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a Attribute> {
    attrs.iter().find(|attr| attr.path().is_ident(name))
}

/// `key = value` pairs of a list attribute such as `#[property(name = "x")]`.
fn parse_attribute_args(attr: &Attribute) -> Result<Vec<(String, Expr, Meta)>, Error> {
    let meta_list = match &attr.meta {
        Meta::List(meta_list) => meta_list,
        Meta::Path(_) => return Ok(Vec::new()),
        Meta::NameValue(nv) => {
            return Err(Error::new_spanned(nv, "expected a parenthesised argument list"))
        }
    };

    let parser = Punctuated::<Meta, Token![,]>::parse_terminated;
    let nested = parser.parse2(meta_list.tokens.clone())?;

    let mut args = Vec::new();
    for meta in nested {
        match &meta {
            Meta::NameValue(nv) => {
                let key = nv
                    .path
                    .get_ident()
                    .map(|ident| ident.to_string())
                    .ok_or_else(|| Error::new_spanned(&nv.path, "expected an identifier"))?;
                args.push((key, nv.value.clone(), meta.clone()));
            }
            other => return Err(Error::new_spanned(other, "expected `key = value`")),
        }
    }
    Ok(args)
}

fn lit_str(value: &Expr) -> Result<LitStr, Error> {
    if let Expr::Lit(expr_lit) = value {
        if let Lit::Str(lit_str) = &expr_lit.lit {
            return Ok(lit_str.clone());
        }
    }
    Err(Error::new_spanned(value, "expected a string literal"))
}

fn lit_bool(value: &Expr) -> Result<LitBool, Error> {
    if let Expr::Lit(expr_lit) = value {
        if let Lit::Bool(lit_bool) = &expr_lit.lit {
            return Ok(lit_bool.clone());
        }
    }
    Err(Error::new_spanned(value, "expected `true` or `false`"))
}
