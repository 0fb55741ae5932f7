//! Attribute parsing for the Entity derive macro.
//!
//! This module provides the parser for the `#[field(...)]` attributes that
//! mark struct fields as columns.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Lit, Meta, Result, Token,
};

/// Field-level attributes from `#[field(...)]`.
#[derive(Debug, Clone)]
pub struct FieldAttr {
    /// The field carries a `#[field]` attribute at all.
    pub present: bool,
    /// The column is a candidate key.
    pub unique: bool,
    /// Exclude the field even though it is annotated.
    pub skip: bool,
    /// Custom column name (default: field name).
    pub rename: Option<String>,
    /// The span for error reporting.
    pub span: Span,
}

impl Default for FieldAttr {
    fn default() -> Self {
        FieldAttr {
            present: false,
            unique: false,
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for FieldAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = FieldAttr {
            present: true,
            span: input.span(),
            ..FieldAttr::default()
        };

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) if p.is_ident("unique") => attr.unique = true,
                Meta::Path(p) if p.is_ident("skip") => attr.skip = true,

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    };
                    let name = s.value();
                    if name.trim().is_empty() {
                        return Err(Error::new(s.span(), "rename must not be empty"));
                    }
                    attr.rename = Some(name);
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        "unknown field attribute. Expected: unique, skip, or rename = \"...\"",
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extract the `#[field]` / `#[field(...)]` attribute from a field's attributes.
pub fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttr> {
    let mut found: Option<FieldAttr> = None;
    for attr in attrs {
        if !attr.path().is_ident("field") {
            continue;
        }
        if found.is_some() {
            return Err(Error::new(attr.span(), "duplicate #[field] attribute"));
        }
        let parsed = match &attr.meta {
            Meta::Path(_) => FieldAttr {
                present: true,
                span: attr.span(),
                ..FieldAttr::default()
            },
            _ => attr.parse_args::<FieldAttr>()?,
        };
        found = Some(parsed);
    }
    Ok(found.unwrap_or_default())
}
