use proc_macro::TokenStream;
use quote::quote;
use syn::{self};

pub fn impl_encode_macro(ast: &syn::DeriveInput) -> TokenStream {
    let name = ast.ident.clone();
    match ast.data {
        syn::Data::Struct(ref data) => {
            let statements: Vec<quote::__private::TokenStream> = data
                .fields
                .iter()
                .enumerate()
                .map(|(index, field)| encode_field(field, index))
                .collect();

            let expanded = quote! {
                impl Encode for #name {
                    fn encode<W>(&self, mut target: W) -> Result<(), std::io::Error>
                    where
                        W: std::io::Write,
                    {
                        #(#statements)*
                        Ok(())
                    }
                }
            };
            TokenStream::from(expanded)
        }
        syn::Data::Enum(ref data) => {
            let variants: Vec<quote::__private::TokenStream> = data
                .variants
                .iter()
                .enumerate()
                .map(|(index, variant)| encode_variant(variant, &name, index as u8))
                .collect();

            let expanded: quote::__private::TokenStream = quote! {
                impl Encode for #name {
                    fn encode<W>(&self, mut target: W) -> Result<(), std::io::Error>
                    where
                        W: std::io::Write,
                    {
                        match self {
                            #(#variants)*
                        }
                        Ok(())
                    }
                }
            };
            TokenStream::from(expanded)
        }
        _ => unimplemented!("Encode can only be derived for structs and enums"),
    }
}

fn encode_field(field: &syn::Field, index: usize) -> quote::__private::TokenStream {
    match field.ident.clone() {
        Some(id) => quote! { self.#id.encode(&mut target)?; },
        None => {
            let index = syn::Index::from(index);
            quote! { self.#index.encode(&mut target)?; }
        }
    }
}

/// Every variant is tagged with a leading `u8` discriminant (its declaration
/// order) so that decode can dispatch without relying on field contents.
fn encode_variant(
    variant: &syn::Variant,
    name: &syn::Ident,
    tag: u8,
) -> quote::__private::TokenStream {
    let ident = variant.ident.clone();
    let is_named = matches!(variant.fields, syn::Fields::Named(_));

    let bindings: Vec<quote::__private::TokenStream> = variant
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| match field.ident.clone() {
            Some(ident) => quote! { #ident , },
            None => {
                let binding = quote::format_ident!("field_{}", i);
                quote! { #binding , }
            }
        })
        .collect();

    let statements: Vec<quote::__private::TokenStream> = variant
        .fields
        .iter()
        .enumerate()
        .map(|(i, field)| match field.ident.clone() {
            Some(ident) => quote! { #ident.encode(&mut target)?; },
            None => {
                let binding = quote::format_ident!("field_{}", i);
                quote! { #binding.encode(&mut target)?; }
            }
        })
        .collect();

    let pattern = if bindings.is_empty() {
        quote! { #name::#ident }
    } else if is_named {
        quote! { #name::#ident { #(#bindings)* } }
    } else {
        quote! { #name::#ident ( #(#bindings)* ) }
    };

    quote! {
        #pattern => {
            (#tag as u8).encode(&mut target)?;
            #(#statements)*
        },
    }
}
