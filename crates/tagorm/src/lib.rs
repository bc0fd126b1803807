//! # tagorm
//!
//! A dialect-aware SQL statement builder driven by annotated record types.
//!
//! ## Features
//!
//! - **No column strings**: clauses reference fields through typed column handles
//! - **Two dialects**: Postgres (`"quoted"`, `$n`) and MySQL (bare, `?`)
//! - **Explicit grouping**: AND/OR prefixes with open/close nesting markers
//! - **Safe defaults**: UPDATE and DELETE require WHERE, UPDATE requires SET
//! - **Transaction-friendly**: pass a transaction anywhere a `GenericClient` is expected
//!
//! ## Usage
//!
//! ```ignore
//! use tagorm::{Cond, Dialect, FromRow, Query, Record, Table};
//!
//! #[derive(Table, FromRow)]
//! struct TestItem {
//!     #[orm(column = "id")]
//!     id: i64,
//!     #[orm(column = "name")]
//!     name: String,
//!     #[orm(column = "user_id")]
//!     user_id: i64,
//! }
//!
//! let item = TestItem::table();
//!
//! // SELECT "test_item".* FROM "test_item" WHERE "test_item"."name" = $1
//! let items: Vec<TestItem> = Query::new(Dialect::Postgres)
//!     .table(&item)
//!     .select_all(&item)
//!     .where_and(Cond::is(item.name, "book"))
//!     .fetch_all(&client)
//!     .await?;
//!
//! // DELETE FROM "test_item" WHERE "id" = $1
//! Query::new(Dialect::Postgres)
//!     .table(&item)
//!     .where_and(Cond::is(item.id, 1_i64))
//!     .delete(&client)
//!     .await?;
//! ```

// derive output refers to `::tagorm`
extern crate self as tagorm;

pub use tokio_postgres;

pub mod clause;
pub mod client;
pub mod config;
pub mod dialect;
pub mod error;
pub mod meta;
pub mod predicate;
pub mod query;
pub mod row;
pub mod value;

pub use client::GenericClient;
pub use config::{Config, ResultKey};
pub use dialect::Dialect;
pub use error::{Clause, OrmError, OrmResult};
pub use meta::{Column, FieldId, Instance, Record, Table, TableSource};
pub use predicate::Cond;
pub use query::{BuiltQuery, Query};
pub use row::{FromRow, FromRowPositional, RowExt};
pub use value::{Arg, IntoArg, IntoRow, Param};

#[cfg(feature = "derive")]
pub use tagorm_derive::{FromRow, Table};
