//! Dialect-aware statement builder.
//!
//! A [`Query`] collects clause descriptors that reference columns through
//! table handles rather than name strings, then renders select, count,
//! insert, update or delete statements on demand.
//!
//! # Usage
//!
//! ```ignore
//! use tagorm::{Cond, Dialect, Query, Record};
//!
//! let item = TestItem::table();
//! let user = TestUser::table();
//!
//! let built = Query::new(Dialect::Postgres)
//!     .table(&item)
//!     .join_as(&user, "u", item.user_id, user.id)
//!     .select_all(&item)
//!     .select_as(user.name, "user_name")
//!     .where_and(Cond::gte(item.id, 10_i64))
//!     .order_by_desc(item.id)
//!     .limit(20)
//!     .build_select()?;
//!
//! // UPDATE
//! Query::new(Dialect::Postgres)
//!     .table(&item)
//!     .set(item.name, "renamed")
//!     .where_and(Cond::is(item.id, 1_i64))
//!     .update(&client)
//!     .await?;
//! ```

mod exec;
mod render;

pub use render::BuiltQuery;

use crate::clause::{
    Assignment, Join, JoinKind, JoinPredicate, Order, OrderItem, Predicate, Prefix, SelectItem,
    Selection, TableRef, Term,
};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::meta::{Column, Record, Table};
use crate::predicate::Cond;
use crate::value::{Arg, IntoArg, IntoRow};

/// Statement builder.
///
/// Setters only record descriptors; nothing is resolved until a `build_*`
/// method runs, and every build starts from scratch.
#[derive(Clone, Debug, Default)]
pub struct Query {
    config: Config,
    table: Option<TableRef>,
    joins: Vec<Join>,
    join_predicates: Vec<JoinPredicate>,
    selects: Vec<Selection>,
    sets: Vec<Assignment>,
    values_columns: Vec<Column>,
    values: Vec<Vec<Arg>>,
    wheres: Vec<Predicate>,
    group_by: Vec<Term>,
    having: Vec<Predicate>,
    order_by: Vec<OrderItem>,
    limit: u64,
    offset: u64,
}

impl Query {
    /// Create an empty builder for `dialect`.
    pub fn new(dialect: Dialect) -> Self {
        Self::with_config(Config::new(dialect))
    }

    /// Create an empty builder with full configuration.
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn dialect(&self) -> Dialect {
        self.config.dialect
    }

    // ==================== Table ====================

    /// Set the primary table, replacing any previous one.
    pub fn table<T: Record>(mut self, table: &Table<T>) -> Self {
        self.table = Some(TableRef {
            source: table.source().clone(),
            alias: None,
        });
        self
    }

    /// Set the primary table under an alias.
    pub fn table_as<T: Record>(mut self, table: &Table<T>, alias: &str) -> Self {
        self.table = Some(TableRef {
            source: table.source().clone(),
            alias: Some(alias.to_string()),
        });
        self
    }

    // ==================== Joins ====================

    fn push_join<T: Record>(
        mut self,
        kind: JoinKind,
        table: &Table<T>,
        alias: Option<&str>,
        left: Column,
        right: Column,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: TableRef {
                source: table.source().clone(),
                alias: alias.map(str::to_string),
            },
            left,
            right,
        });
        self
    }

    /// `INNER JOIN table ON left = right`
    pub fn join<T: Record>(self, table: &Table<T>, left: Column, right: Column) -> Self {
        self.push_join(JoinKind::Inner, table, None, left, right)
    }

    pub fn join_as<T: Record>(
        self,
        table: &Table<T>,
        alias: &str,
        left: Column,
        right: Column,
    ) -> Self {
        self.push_join(JoinKind::Inner, table, Some(alias), left, right)
    }

    pub fn left_join<T: Record>(self, table: &Table<T>, left: Column, right: Column) -> Self {
        self.push_join(JoinKind::Left, table, None, left, right)
    }

    pub fn left_join_as<T: Record>(
        self,
        table: &Table<T>,
        alias: &str,
        left: Column,
        right: Column,
    ) -> Self {
        self.push_join(JoinKind::Left, table, Some(alias), left, right)
    }

    pub fn right_join<T: Record>(self, table: &Table<T>, left: Column, right: Column) -> Self {
        self.push_join(JoinKind::Right, table, None, left, right)
    }

    pub fn right_join_as<T: Record>(
        self,
        table: &Table<T>,
        alias: &str,
        left: Column,
        right: Column,
    ) -> Self {
        self.push_join(JoinKind::Right, table, Some(alias), left, right)
    }

    fn push_join_predicate<T: Record>(mut self, table: &Table<T>, predicate: Predicate) -> Self {
        self.join_predicates.push(JoinPredicate {
            table: table.source().instance(),
            predicate,
        });
        self
    }

    /// Extend the ON clause of the join on `table` with `AND cond`.
    pub fn join_and<T: Record>(self, table: &Table<T>, cond: Cond) -> Self {
        self.push_join_predicate(table, cond.with_prefix(Prefix::And))
    }

    /// Extend the ON clause of the join on `table` with `OR cond`.
    pub fn join_or<T: Record>(self, table: &Table<T>, cond: Cond) -> Self {
        self.push_join_predicate(table, cond.with_prefix(Prefix::Or))
    }

    /// Open an `AND (` group in the ON clause of the join on `table`.
    pub fn join_nest<T: Record>(self, table: &Table<T>) -> Self {
        self.push_join_predicate(table, Predicate::nest(Prefix::And))
    }

    pub fn join_or_nest<T: Record>(self, table: &Table<T>) -> Self {
        self.push_join_predicate(table, Predicate::nest(Prefix::Or))
    }

    pub fn join_nest_close<T: Record>(self, table: &Table<T>) -> Self {
        self.push_join_predicate(table, Predicate::nest_close())
    }

    // ==================== Projection ====================

    fn push_select(mut self, item: SelectItem, alias: Option<&str>) -> Self {
        self.selects.push(Selection {
            item,
            alias: alias.map(str::to_string),
        });
        self
    }

    pub fn select(self, column: Column) -> Self {
        self.push_select(SelectItem::One(column), None)
    }

    pub fn select_as(self, column: Column, alias: &str) -> Self {
        self.push_select(SelectItem::One(column), Some(alias))
    }

    /// `table.*`
    pub fn select_all<T: Record>(self, table: &Table<T>) -> Self {
        self.push_select(SelectItem::All(table.source().clone()), None)
    }

    pub fn select_raw(self, sql: impl Into<String>) -> Self {
        self.push_select(SelectItem::Raw(sql.into()), None)
    }

    pub fn select_raw_as(self, sql: impl Into<String>, alias: &str) -> Self {
        self.push_select(SelectItem::Raw(sql.into()), Some(alias))
    }

    /// Projection whose `%s` slot is the column, e.g. `count(%s)`.
    pub fn select_format(self, template: impl Into<String>, column: Column) -> Self {
        self.push_select(SelectItem::Format(template.into(), column), None)
    }

    pub fn select_format_as(self, template: impl Into<String>, column: Column, alias: &str) -> Self {
        self.push_select(SelectItem::Format(template.into(), column), Some(alias))
    }

    // ==================== Assignments / insert values ====================

    /// `SET column = value`; the value must render to exactly one item.
    pub fn set(mut self, column: Column, value: impl IntoArg) -> Self {
        self.sets.push(Assignment {
            column,
            value: value.into_arg(),
        });
        self
    }

    /// Append insert columns.
    pub fn values_columns(mut self, columns: impl IntoIterator<Item = Column>) -> Self {
        self.values_columns.extend(columns);
        self
    }

    /// Append one insert row.
    pub fn values(mut self, row: impl IntoRow) -> Self {
        self.values.push(row.into_row());
        self
    }

    /// Drop all insert rows, keeping the column list.
    pub fn clear_values(mut self) -> Self {
        self.values.clear();
        self
    }

    // ==================== WHERE ====================

    pub fn where_and(mut self, cond: Cond) -> Self {
        self.wheres.push(cond.with_prefix(Prefix::And));
        self
    }

    pub fn where_or(mut self, cond: Cond) -> Self {
        self.wheres.push(cond.with_prefix(Prefix::Or));
        self
    }

    /// Open a group joined with `AND`.
    pub fn where_nest(mut self) -> Self {
        self.wheres.push(Predicate::nest(Prefix::And));
        self
    }

    /// Open a group joined with `OR`.
    pub fn where_or_nest(mut self) -> Self {
        self.wheres.push(Predicate::nest(Prefix::Or));
        self
    }

    pub fn where_nest_close(mut self) -> Self {
        self.wheres.push(Predicate::nest_close());
        self
    }

    // ==================== GROUP BY / HAVING ====================

    pub fn group_by(mut self, column: Column) -> Self {
        self.group_by.push(Term::Column(column));
        self
    }

    pub fn group_by_raw(mut self, sql: impl Into<String>) -> Self {
        self.group_by.push(Term::Raw(sql.into()));
        self
    }

    pub fn group_by_format(mut self, template: impl Into<String>, column: Column) -> Self {
        self.group_by.push(Term::Format(template.into(), column));
        self
    }

    pub fn having_and(mut self, cond: Cond) -> Self {
        self.having.push(cond.with_prefix(Prefix::And));
        self
    }

    pub fn having_or(mut self, cond: Cond) -> Self {
        self.having.push(cond.with_prefix(Prefix::Or));
        self
    }

    pub fn having_nest(mut self) -> Self {
        self.having.push(Predicate::nest(Prefix::And));
        self
    }

    pub fn having_or_nest(mut self) -> Self {
        self.having.push(Predicate::nest(Prefix::Or));
        self
    }

    pub fn having_nest_close(mut self) -> Self {
        self.having.push(Predicate::nest_close());
        self
    }

    // ==================== ORDER BY / paging ====================

    fn push_order(mut self, term: Term, order: Order) -> Self {
        self.order_by.push(OrderItem { term, order });
        self
    }

    pub fn order_by_asc(self, column: Column) -> Self {
        self.push_order(Term::Column(column), Order::Asc)
    }

    pub fn order_by_desc(self, column: Column) -> Self {
        self.push_order(Term::Column(column), Order::Desc)
    }

    pub fn order_by_asc_raw(self, sql: impl Into<String>) -> Self {
        self.push_order(Term::Raw(sql.into()), Order::Asc)
    }

    pub fn order_by_desc_raw(self, sql: impl Into<String>) -> Self {
        self.push_order(Term::Raw(sql.into()), Order::Desc)
    }

    pub fn order_by_asc_format(self, template: impl Into<String>, column: Column) -> Self {
        self.push_order(Term::Format(template.into(), column), Order::Asc)
    }

    pub fn order_by_desc_format(self, template: impl Into<String>, column: Column) -> Self {
        self.push_order(Term::Format(template.into(), column), Order::Desc)
    }

    /// `LIMIT n`; zero leaves the statement unlimited.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// `OFFSET n`; zero is omitted.
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }
}
