//! Record types, field identity and the metadata resolver.
//!
//! A record type (usually `#[derive(Table)]`) exposes a generated column-handle
//! struct. Creating a [`Table`] handle stamps every column handle with a fresh
//! instance identity, so two handles over the same record type (a self join,
//! for example) never resolve to each other's columns.
//!
//! ```ignore
//! let item = TestItem::table();
//! let user = TestUser::table();
//!
//! let q = Query::new(Dialect::Postgres)
//!     .table(&item)
//!     .join(&user, item.user_id, user.id)
//!     .select(item.name);
//! ```

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one [`Table`] handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instance(u64);

impl Instance {
    /// Allocate a process-unique instance identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Instance(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Stable key of one field of one table handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldId {
    pub instance: Instance,
    pub index: u32,
}

/// Handle to an annotated field, used in place of a column-name string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    id: FieldId,
}

impl Column {
    /// Allocate the next field of `instance`. Called by generated code.
    #[doc(hidden)]
    pub fn bind(instance: Instance, next: &mut u32) -> Self {
        let id = FieldId {
            instance,
            index: *next,
        };
        *next += 1;
        Self { id }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }
}

/// A struct mapped to exactly one table.
///
/// Usually derived; see `#[derive(Table)]`.
pub trait Record {
    /// Generated struct holding one [`Column`] per annotated field.
    type Columns;

    /// Base table name.
    const TABLE: &'static str;

    /// Push annotated column names in field order, descending into flattened fields.
    fn column_names(out: &mut Vec<&'static str>);

    /// Build column handles in the same order as [`Record::column_names`].
    fn bind_columns(instance: Instance, next: &mut u32) -> Self::Columns;

    /// Create a fresh table handle for this record.
    fn table() -> Table<Self>
    where
        Self: Sized,
    {
        Table::new()
    }
}

/// Type-erased description of a table handle, stored in clause descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSource {
    instance: Instance,
    name: &'static str,
    columns: Arc<[&'static str]>,
}

impl TableSource {
    pub fn instance(&self) -> Instance {
        self.instance
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    /// The identity a table is looked up by: that of its first field.
    pub fn key(&self) -> OrmResult<FieldId> {
        if self.columns.is_empty() {
            return Err(OrmError::Address(format!(
                "table '{}' has no field to take an identity from",
                self.name
            )));
        }
        Ok(FieldId {
            instance: self.instance,
            index: 0,
        })
    }
}

/// A table handle: record metadata plus typed column handles.
///
/// Derefs to the record's column struct, so `item.name` is a [`Column`].
pub struct Table<T: Record> {
    source: TableSource,
    columns: T::Columns,
    _record: PhantomData<fn() -> T>,
}

impl<T: Record> Table<T> {
    pub fn new() -> Self {
        let instance = Instance::next();
        let mut names = Vec::new();
        T::column_names(&mut names);
        let mut next = 0;
        let columns = T::bind_columns(instance, &mut next);
        debug_assert_eq!(next as usize, names.len());

        Self {
            source: TableSource {
                instance,
                name: T::TABLE,
                columns: names.into(),
            },
            columns,
            _record: PhantomData,
        }
    }

    pub fn source(&self) -> &TableSource {
        &self.source
    }

    pub fn columns(&self) -> &T::Columns {
        &self.columns
    }
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Deref for Table<T> {
    type Target = T::Columns;

    fn deref(&self) -> &T::Columns {
        &self.columns
    }
}

impl<T: Record> fmt::Debug for Table<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.source.name)
            .field("instance", &self.source.instance)
            .finish()
    }
}

/// Resolved naming forms for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEntry {
    pub table_base: &'static str,
    pub alias: Option<String>,
    /// Quoted base table name.
    pub table: String,
    /// Quoted alias, or the quoted base table name when unaliased.
    pub table_as: String,
    /// Column qualified with the base table name.
    pub table_column: String,
    /// Column qualified with `table_as`.
    pub table_as_column: String,
    /// Quoted bare column.
    pub column: String,
    pub column_base: &'static str,
}

impl MetaEntry {
    /// `table` or `table as alias`, for FROM and JOIN.
    pub fn table_expr(&self) -> String {
        match &self.alias {
            Some(_) => format!("{} as {}", self.table, self.table_as),
            None => self.table.clone(),
        }
    }
}

/// Field identity -> metadata, rebuilt on every render.
#[derive(Debug, Default)]
pub struct MetaMap {
    entries: HashMap<FieldId, MetaEntry>,
}

impl MetaMap {
    pub fn get(&self, column: Column, clause: &'static str) -> OrmResult<&MetaEntry> {
        self.entries
            .get(&column.id())
            .ok_or_else(|| OrmError::unresolved(clause))
    }

    pub fn table(&self, source: &TableSource, clause: &'static str) -> OrmResult<&MetaEntry> {
        let key = source.key()?;
        self.entries
            .get(&key)
            .ok_or_else(|| OrmError::unresolved(clause))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build metadata for every `(table, alias)` pair a statement references.
pub fn resolve<'a, I>(dialect: Dialect, tables: I) -> OrmResult<MetaMap>
where
    I: IntoIterator<Item = (&'a TableSource, Option<&'a str>)>,
{
    let mut map = MetaMap::default();

    for (source, alias) in tables {
        if source.columns.is_empty() {
            return Err(OrmError::NoFields {
                table: source.name.to_string(),
            });
        }

        let table = dialect.quote_table(source.name);
        let table_as = match alias {
            Some(a) => dialect.quote_ident(a),
            None => table.clone(),
        };

        for (index, column_base) in source.columns.iter().copied().enumerate() {
            let entry = MetaEntry {
                table_base: source.name,
                alias: alias.map(str::to_string),
                table_column: dialect.quote_column(&table, column_base),
                table_as_column: dialect.quote_column(&table_as, column_base),
                column: dialect.quote_ident(column_base),
                table: table.clone(),
                table_as: table_as.clone(),
                column_base,
            };
            let key = FieldId {
                instance: source.instance,
                index: index as u32,
            };
            map.entries.insert(key, entry);
        }
    }

    Ok(map)
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Hand-written records, so unit tests do not depend on the derive crate.

    use super::{Column, Instance, Record};

    #[derive(Debug, Clone, Copy)]
    pub struct AuditColumns {
        pub created_at: Column,
        pub created_by: Column,
    }

    pub struct Audit;

    impl Record for Audit {
        type Columns = AuditColumns;
        const TABLE: &'static str = "audit";

        fn column_names(out: &mut Vec<&'static str>) {
            out.push("created_at");
            out.push("created_by");
        }

        fn bind_columns(instance: Instance, next: &mut u32) -> AuditColumns {
            AuditColumns {
                created_at: Column::bind(instance, next),
                created_by: Column::bind(instance, next),
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct TestItemColumns {
        pub id: Column,
        pub audit: AuditColumns,
        pub name: Column,
        pub user_id: Column,
    }

    /// `id`, `created_at`, `created_by`, `name`, `user_id`
    pub struct TestItem;

    impl Record for TestItem {
        type Columns = TestItemColumns;
        const TABLE: &'static str = "test_item";

        fn column_names(out: &mut Vec<&'static str>) {
            out.push("id");
            Audit::column_names(out);
            out.push("name");
            out.push("user_id");
        }

        fn bind_columns(instance: Instance, next: &mut u32) -> TestItemColumns {
            TestItemColumns {
                id: Column::bind(instance, next),
                audit: Audit::bind_columns(instance, next),
                name: Column::bind(instance, next),
                user_id: Column::bind(instance, next),
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct TestUserColumns {
        pub id: Column,
        pub name: Column,
    }

    pub struct TestUser;

    impl Record for TestUser {
        type Columns = TestUserColumns;
        const TABLE: &'static str = "test_user";

        fn column_names(out: &mut Vec<&'static str>) {
            out.push("id");
            out.push("name");
        }

        fn bind_columns(instance: Instance, next: &mut u32) -> TestUserColumns {
            TestUserColumns {
                id: Column::bind(instance, next),
                name: Column::bind(instance, next),
            }
        }
    }

    #[derive(Debug, Clone, Copy)]
    pub struct EmptyColumns;

    /// A record without annotated fields.
    pub struct Empty;

    impl Record for Empty {
        type Columns = EmptyColumns;
        const TABLE: &'static str = "empty";

        fn column_names(_out: &mut Vec<&'static str>) {}

        fn bind_columns(_instance: Instance, _next: &mut u32) -> EmptyColumns {
            EmptyColumns
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn flattened_fields_share_the_instance() {
        let item = TestItem::table();
        assert_eq!(
            item.source().columns(),
            &["id", "created_at", "created_by", "name", "user_id"]
        );
        assert_eq!(item.audit.created_by.id().index, 2);
        assert_eq!(item.name.id().index, 3);
        assert_eq!(item.audit.created_at.id().instance, item.id.id().instance);
    }

    #[test]
    fn handles_never_collide() {
        let a = TestItem::table();
        let b = TestItem::table();
        assert_eq!(a.name, a.name);
        assert_ne!(a.name, b.name);
        assert_ne!(a.name, a.user_id);
    }

    #[test]
    fn resolves_qualified_and_aliased_forms() {
        let item = TestItem::table();
        let user = TestUser::table();
        let map = resolve(
            Dialect::Postgres,
            [(item.source(), None), (user.source(), Some("u"))],
        )
        .unwrap();
        assert_eq!(map.len(), 7);

        let name = map.get(item.name, "test").unwrap();
        assert_eq!(name.table_column, r#""test_item"."name""#);
        assert_eq!(name.table_as_column, r#""test_item"."name""#);
        assert_eq!(name.column, r#""name""#);
        assert_eq!(name.table_expr(), r#""test_item""#);

        let uid = map.get(user.id, "test").unwrap();
        assert_eq!(uid.table_column, r#""test_user"."id""#);
        assert_eq!(uid.table_as_column, r#""u"."id""#);
        assert_eq!(uid.table_expr(), r#""test_user" as "u""#);
    }

    #[test]
    fn unknown_handle_is_unresolved() {
        let item = TestItem::table();
        let other = TestItem::table();
        let map = resolve(Dialect::Mysql, [(item.source(), None)]).unwrap();
        assert!(matches!(
            map.get(other.name, "where"),
            Err(OrmError::UnresolvedField { clause: "where" })
        ));
    }

    #[test]
    fn record_without_fields() {
        let empty = Empty::table();
        assert!(matches!(
            resolve(Dialect::Postgres, [(empty.source(), None)]),
            Err(OrmError::NoFields { .. })
        ));
        assert!(matches!(empty.source().key(), Err(OrmError::Address(_))));
    }
}
