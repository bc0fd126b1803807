//! FromRow derive macro implementation
//!
//! Emits both the by-name `FromRow` impl and the opt-in `FromRowPositional` impl.

use crate::attrs::{FieldKind, record_fields};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let fields = record_fields(&input, "FromRow")?;

    let mut by_name = Vec::new();
    let mut by_index = Vec::new();
    let mut widths = Vec::new();

    for field in &fields {
        let ident = field.ident;
        let ty = field.ty;
        match &field.kind {
            FieldKind::Column(column) => {
                by_name.push(quote! { #ident: row.try_get_column(#column)? });
                by_index.push(quote! {
                    #ident: {
                        let value = row.try_get_index(*index)?;
                        *index += 1;
                        value
                    }
                });
                widths.push(quote! { 1 });
            }
            FieldKind::Flatten => {
                by_name.push(quote! { #ident: <#ty as ::tagorm::FromRow>::from_row(row)? });
                by_index.push(quote! {
                    #ident: <#ty as ::tagorm::FromRowPositional>::from_row_at(row, index)?
                });
                widths.push(quote! { <#ty as ::tagorm::FromRowPositional>::width() });
            }
            FieldKind::Plain => {
                by_name.push(quote! { #ident: ::core::default::Default::default() });
                by_index.push(quote! { #ident: ::core::default::Default::default() });
            }
        }
    }

    Ok(quote! {
        impl #impl_generics ::tagorm::FromRow for #name #ty_generics #where_clause {
            #[allow(unused_imports, unused_variables)]
            fn from_row(row: &::tagorm::tokio_postgres::Row) -> ::tagorm::OrmResult<Self> {
                use ::tagorm::RowExt;
                Ok(Self {
                    #(#by_name),*
                })
            }
        }

        impl #impl_generics ::tagorm::FromRowPositional for #name #ty_generics #where_clause {
            fn width() -> usize {
                0 #(+ #widths)*
            }

            #[allow(unused_imports, unused_variables)]
            fn from_row_at(
                row: &::tagorm::tokio_postgres::Row,
                index: &mut usize,
            ) -> ::tagorm::OrmResult<Self> {
                use ::tagorm::RowExt;
                Ok(Self {
                    #(#by_index),*
                })
            }
        }
    })
}
