//! Attribute parsing shared by the `Table` and `FromRow` derives.
//!
//! Handles struct-level `#[orm(table = "...")]` and field-level
//! `#[orm(column = "...")]` / `#[orm(flatten)]`.

use heck::ToSnakeCase;
use syn::{Data, DeriveInput, Fields, Result};

/// What a struct field contributes to the record.
pub(crate) enum FieldKind {
    /// Annotated column.
    Column(String),
    /// Nested record whose fields are spliced in place.
    Flatten,
    /// Plain data, not part of the relation.
    Plain,
}

pub(crate) struct RecordField<'a> {
    pub ident: &'a syn::Ident,
    pub ty: &'a syn::Type,
    pub kind: FieldKind,
}

/// Parsed contents of one `#[orm(...)]` list.
#[derive(Default)]
struct OrmAttr {
    table: Option<String>,
    column: Option<String>,
    flatten: bool,
}

impl syn::parse::Parse for OrmAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = OrmAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident == "flatten" {
                attr.flatten = true;
            } else if ident == "table" || ident == "column" {
                let _: syn::Token![=] = input.parse()?;
                let value: syn::LitStr = input.parse()?;
                if value.value().is_empty() {
                    return Err(syn::Error::new_spanned(&value, "name must not be empty"));
                }
                if ident == "table" {
                    attr.table = Some(value.value());
                } else {
                    attr.column = Some(value.value());
                }
            } else {
                return Err(syn::Error::new_spanned(
                    &ident,
                    format!("unknown orm attribute `{ident}`"),
                ));
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        if !input.is_empty() {
            return Err(input.error("expected `,`"));
        }
        Ok(attr)
    }
}

fn parse_orm_attrs(attrs: &[syn::Attribute]) -> Result<OrmAttr> {
    let mut merged = OrmAttr::default();
    for attr in attrs {
        if !attr.path().is_ident("orm") {
            continue;
        }
        let parsed: OrmAttr = attr.parse_args()?;
        merged.table = parsed.table.or(merged.table);
        merged.column = parsed.column.or(merged.column);
        merged.flatten |= parsed.flatten;
    }
    Ok(merged)
}

/// Table name: `#[orm(table = "...")]`, else the snake-cased type name.
pub(crate) fn table_name(input: &DeriveInput) -> Result<String> {
    let attr = parse_orm_attrs(&input.attrs)?;
    if attr.column.is_some() || attr.flatten {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "only `table` is accepted at struct level",
        ));
    }
    Ok(attr
        .table
        .unwrap_or_else(|| input.ident.to_string().to_snake_case()))
}

/// Classify every named field of a struct, in declaration order.
pub(crate) fn record_fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<RecordField<'a>>> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    fields
        .iter()
        .map(|field| {
            let attr = parse_orm_attrs(&field.attrs)?;
            let kind = match (attr.column, attr.flatten) {
                (Some(_), true) => {
                    return Err(syn::Error::new_spanned(
                        field,
                        "`column` and `flatten` cannot be combined",
                    ));
                }
                (Some(column), false) => FieldKind::Column(column),
                (None, true) => FieldKind::Flatten,
                (None, false) => FieldKind::Plain,
            };
            if attr.table.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "`table` is only accepted at struct level",
                ));
            }
            let ident = field
                .ident
                .as_ref()
                .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
            Ok(RecordField {
                ident,
                ty: &field.ty,
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn table_name_defaults_to_snake_case() {
        let input: DeriveInput = parse_quote! {
            struct TestItem { id: i64 }
        };
        assert_eq!(table_name(&input).unwrap(), "test_item");

        let input: DeriveInput = parse_quote! {
            #[orm(table = "items")]
            struct TestItem { id: i64 }
        };
        assert_eq!(table_name(&input).unwrap(), "items");
    }

    #[test]
    fn fields_are_classified() {
        let input: DeriveInput = parse_quote! {
            struct TestItem {
                #[orm(column = "id")]
                id: i64,
                #[orm(flatten)]
                audit: Audit,
                note: String,
            }
        };
        let fields = record_fields(&input, "Table").unwrap();
        assert!(matches!(&fields[0].kind, FieldKind::Column(c) if c == "id"));
        assert!(matches!(fields[1].kind, FieldKind::Flatten));
        assert!(matches!(fields[2].kind, FieldKind::Plain));
        assert_eq!(fields[2].ident.to_string(), "note");
    }

    #[test]
    fn conflicting_attributes_are_rejected() {
        let input: DeriveInput = parse_quote! {
            struct TestItem {
                #[orm(column = "id", flatten)]
                id: i64,
            }
        };
        assert!(record_fields(&input, "Table").is_err());

        let input: DeriveInput = parse_quote! {
            struct TestItem {
                #[orm(colum = "id")]
                id: i64,
            }
        };
        assert!(record_fields(&input, "Table").is_err());
    }

    #[test]
    fn tuple_structs_are_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Pair(i64, i64);
        };
        let err = record_fields(&input, "FromRow").err().unwrap();
        assert!(err.to_string().contains("named fields"));
    }
}
