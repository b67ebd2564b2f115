//! Parsing for `#[field(...)]` attributes.

use proc_macro2::Span;
use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Error, Ident, Lit, Meta, Result, Token,
};

const EXPECTED_KINDS: &str = "String, Number, Timestamp, Bool, Related";

/// How a field is exposed through `Fields::field_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// `#[field(String)]`
    String,
    /// `#[field(Number)]`
    Number,
    /// `#[field(Timestamp)]`
    Timestamp,
    /// `#[field(Bool)]`
    Bool,
    /// `#[field(Related)]`: a nested object that paths can descend into.
    Related,
}

impl FieldKind {
    pub fn from_ident(ident: &Ident) -> Result<Self> {
        match ident.to_string().as_str() {
            "String" | "string" => Ok(FieldKind::String),
            "Number" | "number" => Ok(FieldKind::Number),
            "Timestamp" | "timestamp" => Ok(FieldKind::Timestamp),
            "Bool" | "boolean" => Ok(FieldKind::Bool),
            "Related" | "related" => Ok(FieldKind::Related),
            other => Err(Error::new(
                ident.span(),
                format!("unknown field kind: '{other}'. Expected one of: {EXPECTED_KINDS}"),
            )),
        }
    }
}

/// Field-level attributes from `#[field(...)]`.
#[derive(Debug, Clone)]
pub struct FieldAttr {
    pub kind: Option<FieldKind>,
    pub skip: bool,
    /// Query name, when different from the Rust field name.
    pub rename: Option<String>,
    pub span: Span,
}

impl Default for FieldAttr {
    fn default() -> Self {
        FieldAttr {
            kind: None,
            skip: false,
            rename: None,
            span: Span::call_site(),
        }
    }
}

impl Parse for FieldAttr {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        let content: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in content {
            match &meta {
                Meta::Path(p) => {
                    if p.is_ident("skip") {
                        attr.skip = true;
                    } else if let Some(ident) = p.get_ident() {
                        if attr.kind.is_some() {
                            return Err(Error::new(ident.span(), "field kind given twice"));
                        }
                        attr.kind = Some(FieldKind::from_ident(ident)?);
                        attr.span = ident.span();
                    } else {
                        return Err(Error::new(
                            p.span(),
                            format!("expected field kind ({EXPECTED_KINDS}) or skip"),
                        ));
                    }
                }

                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = &nv.value
                    {
                        if s.value().is_empty() {
                            return Err(Error::new(s.span(), "rename must not be empty"));
                        }
                        attr.rename = Some(s.value());
                    } else {
                        return Err(Error::new(
                            nv.value.span(),
                            "rename must be a string literal",
                        ));
                    }
                }

                _ => {
                    return Err(Error::new(
                        meta.span(),
                        format!(
                            "unknown field attribute. Expected: {EXPECTED_KINDS}, skip, or rename = \"...\""
                        ),
                    ));
                }
            }
        }

        Ok(attr)
    }
}

/// Extracts the `#[field(...)]` attribute from a struct field, if any.
pub fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttr> {
    for attr in attrs {
        if attr.path().is_ident("field") {
            return attr.parse_args::<FieldAttr>();
        }
    }
    Ok(FieldAttr::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_field(tokens: &str) -> Result<FieldAttr> {
        syn::parse_str::<FieldAttr>(tokens)
    }

    #[test]
    fn test_field_kinds() {
        assert_eq!(parse_field("String").unwrap().kind, Some(FieldKind::String));
        assert_eq!(parse_field("number").unwrap().kind, Some(FieldKind::Number));
        assert_eq!(
            parse_field("Timestamp").unwrap().kind,
            Some(FieldKind::Timestamp)
        );
        assert_eq!(parse_field("boolean").unwrap().kind, Some(FieldKind::Bool));
        assert_eq!(parse_field("Related").unwrap().kind, Some(FieldKind::Related));
    }

    #[test]
    fn test_field_skip() {
        let attr = parse_field("skip").unwrap();
        assert!(attr.skip);
        assert_eq!(attr.kind, None);
    }

    #[test]
    fn test_field_rename() {
        let attr = parse_field(r#"String, rename = "title""#).unwrap();
        assert_eq!(attr.kind, Some(FieldKind::String));
        assert_eq!(attr.rename.as_deref(), Some("title"));
    }

    #[test]
    fn test_field_empty_rename() {
        assert!(parse_field(r#"String, rename = """#).is_err());
    }

    #[test]
    fn test_field_kind_twice() {
        assert!(parse_field("String, Number").is_err());
    }

    #[test]
    fn test_field_invalid_kind() {
        let err = parse_field("Enum").unwrap_err();
        assert!(err.to_string().contains("unknown field kind"));
    }

    #[test]
    fn test_field_unknown_name_value() {
        assert!(parse_field(r#"ty = "string""#).is_err());
    }
}
