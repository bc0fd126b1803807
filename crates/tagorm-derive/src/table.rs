//! Table derive macro implementation

use crate::attrs::{FieldKind, record_fields, table_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Table cannot be derived for generic structs",
        ));
    }

    let name = &input.ident;
    let vis = &input.vis;
    let table = table_name(&input)?;
    let fields = record_fields(&input, "Table")?;
    let columns_ident = format_ident!("{}Columns", name);
    let doc = format!("Column handles of [`{name}`].");

    let mut handle_fields = Vec::new();
    let mut name_pushes = Vec::new();
    let mut binds = Vec::new();

    for field in &fields {
        let ident = field.ident;
        let ty = field.ty;
        match &field.kind {
            FieldKind::Column(column) => {
                handle_fields.push(quote! { pub #ident: ::tagorm::Column });
                name_pushes.push(quote! { out.push(#column); });
                binds.push(quote! { #ident: ::tagorm::Column::bind(instance, next) });
            }
            FieldKind::Flatten => {
                handle_fields.push(quote! { pub #ident: <#ty as ::tagorm::Record>::Columns });
                name_pushes.push(quote! { <#ty as ::tagorm::Record>::column_names(out); });
                binds.push(quote! { #ident: <#ty as ::tagorm::Record>::bind_columns(instance, next) });
            }
            FieldKind::Plain => {}
        }
    }

    Ok(quote! {
        #[doc = #doc]
        #[derive(Debug, Clone, Copy)]
        #vis struct #columns_ident {
            #(#handle_fields),*
        }

        impl ::tagorm::Record for #name {
            type Columns = #columns_ident;

            const TABLE: &'static str = #table;

            #[allow(unused_variables)]
            fn column_names(out: &mut ::std::vec::Vec<&'static str>) {
                #(#name_pushes)*
            }

            #[allow(unused_variables)]
            fn bind_columns(instance: ::tagorm::Instance, next: &mut u32) -> #columns_ident {
                #columns_ident {
                    #(#binds),*
                }
            }
        }
    })
}
