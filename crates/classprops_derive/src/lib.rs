//! Derive macro for `classprops`.
//!
//! `#[derive(Properties)]` generates a `classprops::Properties` implementation from attributes:
//! - `#[property]` on a field marks the field name (tuple fields are marked by index)
//! - `#[property(rename = "name")]` marks `name` instead of the field name
//! - `#[properties(extends = Base)]` on the type inherits `Base`'s known properties
//! - `#[properties(member = "name")]` on the type marks a non-field member, such as a method (repeatable)

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Attribute, Data, DeriveInput, Field, LitStr, Meta, Type, parse_macro_input, parse_quote};

/// Generates the `Properties` implementation for a struct or enum.
///
/// # Example
/// ```ignore
/// #[derive(Properties)]
/// #[properties(extends = Entity, member = "greet")]
/// struct User {
///     #[property]
///     name: String,
///     #[property(rename = "type")]
///     kind: String,
///     cache: Vec<u8>,
/// }
///
/// // Generates:
/// impl ::classprops::Properties for User {
///     fn declare(decl: &mut ::classprops::Declaration) {
///         decl.extends::<Entity>();
///         decl.mark("name");
///         decl.mark("type");
///         decl.mark("greet");
///     }
/// }
/// ```
#[proc_macro_derive(Properties, attributes(property, properties))]
pub fn derive_properties(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input).unwrap_or_else(syn::Error::into_compile_error).into()
}

/// Container-level `#[properties(...)]` settings.
#[derive(Default)]
struct ContainerAttrs {
    extends: Option<Type>,
    members: Vec<LitStr>,
}

fn expand(mut input: DeriveInput) -> syn::Result<TokenStream2> {
    let container = container_attrs(&input.attrs)?;

    // Field marks come first, in declaration order; container members follow.
    let mut names: Vec<String> = match &input.data {
        Data::Struct(data) => {
            let mut names = Vec::new();
            for (index, field) in data.fields.iter().enumerate() {
                if let Some(name) = field_property(field, index)? {
                    names.push(name);
                }
            }
            names
        }
        Data::Enum(data) => {
            for variant in &data.variants {
                for field in &variant.fields {
                    if let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("property")) {
                        return Err(syn::Error::new_spanned(
                            attr,
                            "`#[property]` is not supported on enum variant fields; use `#[properties(member = ...)]`",
                        ));
                    }
                }
            }
            Vec::new()
        }
        Data::Union(data) => {
            return Err(syn::Error::new(
                data.union_token.span,
                "`Properties` cannot be derived for unions",
            ));
        }
    };
    names.extend(container.members.iter().map(LitStr::value));

    // `Properties: 'static`
    let type_params: Vec<_> = input.generics.type_params().map(|p| p.ident.clone()).collect();
    let where_clause = input.generics.make_where_clause();
    for ident in type_params {
        where_clause.predicates.push(parse_quote!(#ident: 'static));
    }

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let extends = container.extends.map(|base| {
        quote! { decl.extends::<#base>(); }
    });

    Ok(quote! {
        impl #impl_generics ::classprops::Properties for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn declare(decl: &mut ::classprops::Declaration) {
                #extends
                #( decl.mark(#names); )*
            }
        }
    })
}

fn container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("properties")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("extends") {
                if out.extends.is_some() {
                    return Err(meta.error("duplicate `extends`"));
                }
                out.extends = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("member") {
                out.members.push(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported `properties` key; expected `extends` or `member`"))
            }
        })?;
    }
    Ok(out)
}

/// Name marked by a field's `#[property]` attribute, or `None` for unmarked fields.
fn field_property(field: &Field, index: usize) -> syn::Result<Option<String>> {
    let mut marked = false;
    let mut rename: Option<LitStr> = None;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("property")) {
        marked = true;
        match &attr.meta {
            Meta::Path(_) => {}
            Meta::List(_) => attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    if rename.is_some() {
                        return Err(meta.error("duplicate `rename`"));
                    }
                    rename = Some(meta.value()?.parse()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported `property` key; expected `rename`"))
                }
            })?,
            Meta::NameValue(nv) => {
                return Err(syn::Error::new_spanned(
                    nv,
                    "expected `#[property]` or `#[property(rename = \"...\")]`",
                ));
            }
        }
    }

    if !marked {
        return Ok(None);
    }
    let name = match (rename, &field.ident) {
        (Some(lit), _) => lit.value(),
        (None, Some(ident)) => ident.unraw().to_string(),
        (None, None) => index.to_string(),
    };
    Ok(Some(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_of(result: syn::Result<impl Sized>) -> String {
        match result {
            Ok(_) => panic!("expected an error"),
            Err(err) => err.to_string(),
        }
    }

    #[test]
    fn unions_are_rejected() {
        let input: DeriveInput = parse_quote! {
            union Bits {
                int: u32,
                float: f32,
            }
        };
        assert_eq!(error_of(expand(input)), "`Properties` cannot be derived for unions");
    }

    #[test]
    fn property_on_enum_variant_field_is_rejected() {
        let input: DeriveInput = parse_quote! {
            enum Event {
                Created {
                    #[property]
                    id: u64,
                },
            }
        };
        assert!(error_of(expand(input)).starts_with("`#[property]` is not supported on enum variant fields"));
    }

    #[test]
    fn duplicate_extends_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[properties(extends = A)]
            #[properties(extends = B)]
            struct Test;
        };
        assert_eq!(error_of(container_attrs(&input.attrs)), "duplicate `extends`");
    }

    #[test]
    fn unknown_container_key_is_rejected() {
        let input: DeriveInput = parse_quote! {
            #[properties(members = "x")]
            struct Test;
        };
        assert_eq!(
            error_of(container_attrs(&input.attrs)),
            "unsupported `properties` key; expected `extends` or `member`"
        );
    }

    #[test]
    fn container_members_keep_attribute_order() {
        let input: DeriveInput = parse_quote! {
            #[properties(member = "b", extends = Base)]
            #[properties(member = "a")]
            struct Test;
        };
        let attrs = container_attrs(&input.attrs).expect("valid attributes");
        assert!(attrs.extends.is_some());
        let members: Vec<String> = attrs.members.iter().map(LitStr::value).collect();
        assert_eq!(members, ["b", "a"]);
    }

    #[test]
    fn duplicate_rename_is_rejected() {
        let field: Field = parse_quote! {
            #[property(rename = "a", rename = "b")]
            name: String
        };
        assert_eq!(error_of(field_property(&field, 0)), "duplicate `rename`");
    }

    #[test]
    fn unknown_property_key_is_rejected() {
        let field: Field = parse_quote! {
            #[property(skip)]
            name: String
        };
        assert_eq!(
            error_of(field_property(&field, 0)),
            "unsupported `property` key; expected `rename`"
        );
    }

    #[test]
    fn name_value_property_is_rejected() {
        let field: Field = parse_quote! {
            #[property = "a"]
            name: String
        };
        assert!(error_of(field_property(&field, 0)).starts_with("expected `#[property]`"));
    }

    #[test]
    fn field_names_resolve_from_attribute_ident_or_index() {
        let plain: Field = parse_quote! { #[property] r#type: String };
        let renamed: Field = parse_quote! { #[property(rename = "userName")] user_name: String };
        let skipped: Field = parse_quote! { cache: Vec<u8> };

        assert_eq!(field_property(&plain, 0).ok().flatten().as_deref(), Some("type"));
        assert_eq!(field_property(&renamed, 1).ok().flatten().as_deref(), Some("userName"));
        assert_eq!(field_property(&skipped, 2).ok().flatten(), None);
    }

    #[test]
    fn generated_impl_marks_fields_then_members() {
        let input: DeriveInput = parse_quote! {
            #[properties(extends = Base, member = "run")]
            struct Test {
                #[property]
                first: u8,
            }
        };
        let tokens = expand(input).expect("valid derive input").to_string();
        let extends = tokens.find("extends").expect("extends call");
        let first = tokens.find("\"first\"").expect("field mark");
        let run = tokens.find("\"run\"").expect("member mark");
        assert!(extends < first && first < run, "{tokens}");
    }
}
