//! Code generation for `#[derive(Fields)]`.
//!
//! Generates an implementation of `querystream::Fields` plus one query-name
//! constant per exposed field.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, Data, DeriveInput, Error, Fields, Result};

use super::attrs::{parse_field_attrs, FieldKind};

pub fn fields_derive_impl(input: DeriveInput) -> Result<TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    input.span(),
                    "Fields can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.span(),
                "Fields can only be derived for structs",
            ))
        }
    };

    let mut field_matches: Vec<TokenStream> = Vec::new();
    let mut field_constants: Vec<TokenStream> = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for field in fields.iter() {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new(field.span(), "expected named field"))?;

        let attrs = parse_field_attrs(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let kind = match attrs.kind {
            Some(kind) => kind,
            None => continue,
        };

        let query_name = attrs.rename.unwrap_or_else(|| field_name.to_string());
        if query_name.contains("__") {
            return Err(Error::new(
                attrs.span,
                format!("field name '{query_name}' contains the path delimiter '__'"),
            ));
        }
        if seen.contains(&query_name) {
            return Err(Error::new(
                attrs.span,
                format!("field name '{query_name}' is exposed twice"),
            ));
        }
        seen.push(query_name.clone());

        let const_name = format_ident!("{}", to_screaming_snake_case(&query_name));
        field_constants.push(quote! {
            /// Query name of this field.
            pub const #const_name: &'static str = #query_name;
        });

        let value_expr = match kind {
            FieldKind::String => quote! {
                ::querystream::Value::String(&self.#field_name)
            },
            FieldKind::Number => quote! {
                ::querystream::Value::Number(::querystream::Number::from(self.#field_name))
            },
            FieldKind::Timestamp => quote! {
                ::querystream::Value::Timestamp(
                    ::querystream::AsTimestamp::as_timestamp(&self.#field_name)
                )
            },
            FieldKind::Bool => quote! {
                ::querystream::Value::Bool(self.#field_name)
            },
            FieldKind::Related => quote! {
                ::querystream::Value::Related(&self.#field_name)
            },
        };

        field_matches.push(quote! {
            #query_name => ::core::option::Option::Some(#value_expr),
        });
    }

    Ok(quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            #(#field_constants)*
        }

        impl #impl_generics ::querystream::Fields for #struct_name #ty_generics #where_clause {
            fn field_value(&self, name: &str) -> ::core::option::Option<::querystream::Value<'_>> {
                match name {
                    #(#field_matches)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

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
        } else if c == '_' || c == '-' {
            result.push('_');
            prev_was_lower = false;
        } else {
            result.push(c.to_ascii_uppercase());
            prev_was_lower = c.is_alphabetic();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(src: &str) -> Result<String> {
        let input: DeriveInput = syn::parse_str(src)?;
        fields_derive_impl(input).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("name"), "NAME");
        assert_eq!(to_screaming_snake_case("other_number"), "OTHER_NUMBER");
        assert_eq!(to_screaming_snake_case("createdAt"), "CREATED_AT");
        assert_eq!(to_screaming_snake_case("my-field"), "MY_FIELD");
        assert_eq!(to_screaming_snake_case("item2"), "ITEM2");
    }

    #[test]
    fn test_exposes_annotated_fields_only() {
        let out = expand(
            r#"
            struct Model {
                #[field(Number)]
                number: i64,
                #[field(Related)]
                related_model: Related,
                hidden: String,
                #[field(skip)]
                skipped: String,
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("\"number\""));
        assert!(out.contains("NUMBER"));
        assert!(out.contains("\"related_model\""));
        assert!(out.contains("RELATED_MODEL"));
        assert!(!out.contains("\"hidden\""));
        assert!(!out.contains("\"skipped\""));
    }

    #[test]
    fn test_rename() {
        let out = expand(
            r#"
            struct Model {
                #[field(String, rename = "title")]
                name: String,
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("\"title\""));
        assert!(out.contains("TITLE"));
    }

    #[test]
    fn test_generics_carried_through() {
        let out = expand(
            r#"
            struct Wrapper<T: Clone> {
                #[field(Bool)]
                flag: bool,
                inner: T,
            }
            "#,
        )
        .unwrap();
        assert!(out.contains("Wrapper < T >"));
    }

    #[test]
    fn test_rejects_tuple_structs_and_enums() {
        assert!(expand("struct Pair(i32, i32);").is_err());
        assert!(expand("enum Kind { A, B }").is_err());
    }

    #[test]
    fn test_rejects_delimiter_in_name() {
        let err = expand(
            r#"
            struct Model {
                #[field(String, rename = "a__b")]
                name: String,
            }
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("path delimiter"));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = expand(
            r#"
            struct Model {
                #[field(String)]
                name: String,
                #[field(String, rename = "name")]
                title: String,
            }
            "#,
        );
        assert!(result.is_err());
    }
}
