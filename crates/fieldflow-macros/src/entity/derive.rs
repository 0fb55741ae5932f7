//! Implementation of the `#[derive(Entity)]` macro.
//!
//! This macro generates one `Field` constant per annotated struct field and an
//! implementation of the `Entity` trait listing the column descriptors.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt, spanned::Spanned, Data, DeriveInput, Error, Fields, GenericArgument,
    PathArguments, Result, Type,
};

use super::attrs::parse_field_attrs;

/// Main implementation of the Entity derive macro.
pub fn entity_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let vis = &input.vis;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Entity can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Entity can only be derived for structs",
            ))
        }
    };

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "Entity cannot be derived for generic structs",
        ));
    }

    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut columns: Vec<TokenStream> = Vec::new();
    let mut seen = HashSet::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_field_attrs(&field.attrs)?;

        // Only #[field]-annotated fields become columns
        if !attrs.present || attrs.skip {
            continue;
        }

        let column = attrs
            .rename
            .unwrap_or_else(|| field_name.unraw().to_string());
        if !seen.insert(column.clone()) {
            return Err(Error::new(
                attrs.span,
                format!("duplicate column name '{}'", column),
            ));
        }

        let const_name = format_ident!("{}", to_screaming_snake_case(&field_name.unraw().to_string()));
        let unique = attrs.unique;
        let doc = format!("Field handle for the `{}` column.", column);

        let (value_ty, nullable) = match option_inner(&field.ty) {
            Some(inner) => (inner, true),
            None => (&field.ty, false),
        };

        let constructor = if nullable {
            quote! {
                ::fieldflow::Field::__derived_nullable(
                    #column,
                    {
                        fn get(entity: &#struct_name) -> ::core::option::Option<&#value_ty> {
                            entity.#field_name.as_ref()
                        }
                        get
                    },
                    #unique,
                )
            }
        } else {
            quote! {
                ::fieldflow::Field::__derived(
                    #column,
                    {
                        fn get(entity: &#struct_name) -> &#value_ty {
                            &entity.#field_name
                        }
                        get
                    },
                    #unique,
                )
            }
        };

        field_constants.push(quote! {
            #[doc = #doc]
            #vis const #const_name: ::fieldflow::Field<#struct_name, #value_ty> = #constructor;
        });

        columns.push(quote! {
            ::fieldflow::Column {
                name: #column,
                kind: <#value_ty as ::fieldflow::FieldValue>::KIND,
                nullable: #nullable,
                unique: #unique,
            }
        });
    }

    let expanded = quote! {
        impl #struct_name {
            #(#field_constants)*
        }

        impl ::fieldflow::Entity for #struct_name {
            const COLUMNS: &'static [::fieldflow::Column] = &[
                #(#columns),*
            ];
        }
    };

    Ok(expanded)
}

/// Returns `T` for a field typed `Option<T>`.
fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first() {
        Some(GenericArgument::Type(inner)) if args.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// Convert a string to SCREAMING_SNAKE_CASE.
fn to_screaming_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_was_lower = false;

    for c in s.chars() {
        if c.is_uppercase() {
            if prev_was_lower {
                result.push('_');
            }
            result.push(c);
            prev_was_lower = false;
        } else if c == '_' || c == '-' || c == ' ' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphanumeric();
        }
    }

    result
}
