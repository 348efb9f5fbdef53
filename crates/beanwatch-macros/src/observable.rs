//! #[observable] derive macro implementation

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Error, Field, Fields, GenericArgument, Ident, PathArguments, Type};

use crate::{get_attribute, has_attribute, lit_bool, lit_str, parse_attribute_args};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Scalar,
    List,
    Map,
}

struct PropertyField<'a> {
    field: &'a Field,
    ident: &'a Ident,
    property: String,
    setter: Ident,
    kind: Kind,
    readable: bool,
    opted_out: bool,
}

pub fn expand_derive(input: DeriveInput) -> Result<TokenStream, Error> {
    let name = &input.ident;
    let vis = &input.vis;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new_spanned(
                    &input,
                    "#[observable] requires named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                &input,
                "#[observable] only works on structs",
            ))
        }
    };

    let support_fields: Vec<_> = fields
        .iter()
        .filter(|f| has_attribute(&f.attrs, "change_support"))
        .collect();
    let support_field = match support_fields.as_slice() {
        [field] => *field,
        [] => {
            return Err(Error::new_spanned(
                &input,
                "#[observable] requires one field marked #[change_support]",
            ))
        }
        [_, extra, ..] => {
            return Err(Error::new_spanned(
                extra,
                "only one field may be marked #[change_support]",
            ))
        }
    };
    let is_support_type =
        last_segment(&support_field.ty).is_some_and(|s| s.ident == "PropertyChangeSupport");
    if !is_support_type {
        return Err(Error::new_spanned(
            &support_field.ty,
            "#[change_support] field must be a PropertyChangeSupport",
        ));
    }
    let support_ident = field_ident(support_field)?;

    let properties = fields
        .iter()
        .filter(|f| !has_attribute(&f.attrs, "change_support"))
        .map(parse_property_field)
        .collect::<Result<Vec<_>, Error>>()?;

    let mut declared = HashSet::new();
    for p in &properties {
        if !declared.insert(p.property.as_str()) {
            return Err(Error::new_spanned(
                p.field,
                format!("property `{}` is declared by more than one field", p.property),
            ));
        }
    }

    let type_name = name.to_string();
    let type_descriptor = if has_attribute(&input.attrs, "not_observable") {
        quote! { ::beanwatch::__internal::TypeDescriptor::observable(#type_name).opted_out() }
    } else {
        quote! { ::beanwatch::__internal::TypeDescriptor::observable(#type_name) }
    };

    let field_descriptors: Vec<_> = properties.iter().map(field_descriptor).collect();
    let field_count = field_descriptors.len();

    let setters: Vec<_> = properties
        .iter()
        .filter(|p| !p.opted_out)
        .map(|p| {
            let ident = p.ident;
            let ty = &p.field.ty;
            let setter = &p.setter;
            let setter_name = setter.to_string();
            let descriptor = field_descriptor(p);
            let doc = format!("Sets `{}`, notifying listeners of `{}` on change.", ident, p.property);
            quote! {
                #[doc = #doc]
                #vis fn #setter(&mut self, value: #ty) -> ::beanwatch::__internal::WriteOutcome {
                    static SITE: ::beanwatch::__internal::WriteSite = ::beanwatch::__internal::WriteSite::new(
                        #type_descriptor,
                        ::beanwatch::__internal::MemberDescriptor::method(#setter_name),
                        #descriptor,
                    );
                    ::beanwatch::__internal::Interceptor::global().write_property(
                        self,
                        &SITE,
                        |this| &mut this.#ident,
                        value,
                    )
                }
            }
        })
        .collect();

    let read_arms: Vec<_> = properties
        .iter()
        .filter(|p| p.readable && !p.opted_out)
        .map(|p| {
            let ident = p.ident;
            let property = &p.property;
            quote! {
                #property => ::core::option::Option::Some(
                    ::beanwatch::__internal::ToPropertyValue::to_property_value(&self.#ident)
                ),
            }
        })
        .collect();

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            #(#setters)*

            /// Descriptors of every property field, opted-out ones included.
            #vis fn property_descriptors() -> &'static [::beanwatch::__internal::FieldDescriptor] {
                static FIELDS: [::beanwatch::__internal::FieldDescriptor; #field_count] = [
                    #(#field_descriptors),*
                ];
                &FIELDS
            }
        }

        impl #impl_generics ::beanwatch::Observable for #name #ty_generics #where_clause {
            fn change_support(&self) -> &::beanwatch::PropertyChangeSupport {
                &self.#support_ident
            }

            fn read_property(
                &self,
                property_name: &str,
            ) -> ::core::option::Option<::beanwatch::PropertyValue> {
                match property_name {
                    #(#read_arms)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    };

    Ok(expanded)
}

fn parse_property_field(field: &Field) -> Result<PropertyField<'_>, Error> {
    let ident = field_ident(field)?;
    let field_name = ident.to_string();
    let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name).to_string();

    let mut property = field_name.clone();
    let mut setter = format_ident!("set_{}", field_name);
    let mut kind = detect_kind(&field.ty);
    let mut readable = true;

    if let Some(attr) = get_attribute(&field.attrs, "property") {
        for (key, value, meta) in parse_attribute_args(attr)? {
            match key.as_str() {
                "name" => {
                    let lit = lit_str(&value)?;
                    if lit.value().is_empty() {
                        return Err(Error::new_spanned(lit, "property name cannot be empty"));
                    }
                    property = lit.value();
                }
                "setter" => {
                    let lit = lit_str(&value)?;
                    setter = lit.parse::<Ident>().map_err(|_| {
                        Error::new_spanned(&lit, "setter must be a valid identifier")
                    })?;
                }
                "collection" => {
                    let lit = lit_str(&value)?;
                    kind = match lit.value().as_str() {
                        "list" => Kind::List,
                        "map" => Kind::Map,
                        "none" => Kind::Scalar,
                        _ => {
                            return Err(Error::new_spanned(
                                lit,
                                "collection must be \"list\", \"map\" or \"none\"",
                            ))
                        }
                    };
                }
                "readable" => readable = lit_bool(&value)?.value(),
                _ => {
                    return Err(Error::new_spanned(
                        meta,
                        format!(
                            "unknown #[property] key `{}`; expected name, setter, collection or readable",
                            key
                        ),
                    ))
                }
            }
        }
    }

    Ok(PropertyField {
        field,
        ident,
        property,
        setter,
        kind,
        readable,
        opted_out: has_attribute(&field.attrs, "not_observable"),
    })
}

fn field_descriptor(p: &PropertyField<'_>) -> TokenStream {
    let field_name = p.ident.to_string();
    let field_name = field_name.strip_prefix("r#").unwrap_or(&field_name);
    let property = &p.property;
    let base = match p.kind {
        Kind::Scalar => quote! { ::beanwatch::__internal::FieldDescriptor::scalar(#field_name) },
        Kind::List => quote! { ::beanwatch::__internal::FieldDescriptor::list(#field_name) },
        Kind::Map => quote! { ::beanwatch::__internal::FieldDescriptor::map(#field_name) },
    };
    let base = quote! { #base.with_property(#property) };
    if p.opted_out {
        quote! { #base.opted_out() }
    } else {
        base
    }
}

fn field_ident(field: &Field) -> Result<&Ident, Error> {
    field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new_spanned(field, "#[observable] requires named fields"))
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) => type_path.path.segments.last(),
        Type::Group(group) => last_segment(&group.elem),
        Type::Paren(paren) => last_segment(&paren.elem),
        _ => None,
    }
}

fn detect_kind(ty: &Type) -> Kind {
    let Some(segment) = last_segment(ty) else {
        return Kind::Scalar;
    };
    match segment.ident.to_string().as_str() {
        "Vec" | "VecDeque" => Kind::List,
        "HashMap" | "BTreeMap" => Kind::Map,
        // Option<Vec<_>> and friends still count as collections.
        "Option" | "Box" => match &segment.arguments {
            PathArguments::AngleBracketed(args) => args
                .args
                .iter()
                .find_map(|arg| match arg {
                    GenericArgument::Type(inner) => Some(detect_kind(inner)),
                    _ => None,
                })
                .unwrap_or(Kind::Scalar),
            _ => Kind::Scalar,
        },
        _ => Kind::Scalar,
    }
}

#[cfg(test)]
#[path = "observable_tests.rs"]
mod tests;
