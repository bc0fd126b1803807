//! Derive macros for tagorm
//!
//! Provides `#[derive(Table)]` and `#[derive(FromRow)]` macros.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod table;

/// Derive `Record` for a struct and generate its column-handle struct.
///
/// # Example
///
/// ```ignore
/// use tagorm::{Record, Table};
///
/// #[derive(Table)]
/// struct TestItem {
///     #[orm(column = "id")]
///     id: i64,
///     #[orm(flatten)]
///     audit: Audit,
///     #[orm(column = "name")]
///     name: String,
///     // not part of the relation
///     cached: bool,
/// }
///
/// let item = TestItem::table();
/// let name: tagorm::Column = item.name;
/// ```
///
/// # Generated
///
/// - `struct TestItemColumns` with one `Column` per annotated field
/// - `impl Record for TestItem` with `TABLE = "test_item"`
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Override the snake-cased table name
/// - `#[orm(column = "name")]` - Map field to a column
/// - `#[orm(flatten)]` - Splice in the columns of a nested `Table` struct
#[proc_macro_derive(Table, attributes(orm))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    table::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive `FromRow` and `FromRowPositional` for a struct.
///
/// # Example
///
/// ```ignore
/// use tagorm::FromRow;
///
/// #[derive(FromRow)]
/// struct TestUser {
///     #[orm(column = "id")]
///     id: i64,
///     #[orm(column = "name")]
///     name: Option<String>,
/// }
/// ```
///
/// Annotated fields are read by column name (or by position through
/// `FromRowPositional`), flattened fields recurse, and plain fields take
/// `Default::default()`.
#[proc_macro_derive(FromRow, attributes(orm))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
