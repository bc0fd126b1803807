//! Clause descriptors collected by [`Query`](crate::Query).
//!
//! Pure data: every descriptor is rendered later by the statement assembler.

use crate::meta::{Column, Instance, TableSource};
use crate::value::Arg;

/// A table handle plus its optional alias.
#[derive(Debug, Clone)]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn keyword(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
        }
    }
}

/// `<kind> JOIN table ON left = right`
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableRef,
    pub left: Column,
    pub right: Column,
}

/// Boolean connective placed before a predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Prefix {
    None,
    #[default]
    And,
    Or,
}

impl Prefix {
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Prefix::None => None,
            Prefix::And => Some("AND"),
            Prefix::Or => Some("OR"),
        }
    }
}

/// Comparison modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compare {
    Is,
    IsNot,
    IsNull,
    IsNotNull,
    Like,
    NotLike,
    In,
    NotIn,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Compare {
    /// Render `column <op> values`.
    pub fn render(self, column: &str, values: &str) -> String {
        match self {
            Compare::Is => format!("{column} = {values}"),
            Compare::IsNot => format!("{column} != {values}"),
            Compare::IsNull => format!("{column} IS NULL"),
            Compare::IsNotNull => format!("{column} IS NOT NULL"),
            Compare::Like => format!("{column} LIKE {values}"),
            Compare::NotLike => format!("{column} NOT LIKE {values}"),
            Compare::In => format!("{column} IN ({values})"),
            Compare::NotIn => format!("{column} NOT IN ({values})"),
            Compare::Gt => format!("{column} > {values}"),
            Compare::Gte => format!("{column} >= {values}"),
            Compare::Lt => format!("{column} < {values}"),
            Compare::Lte => format!("{column} <= {values}"),
        }
    }

    /// Whether the mode consumes bound values.
    pub fn takes_values(self) -> bool {
        !matches!(self, Compare::IsNull | Compare::IsNotNull)
    }
}

#[derive(Debug, Clone)]
pub enum PredicateKind {
    /// Literal fragment; `%s` slots are filled with values when any are given.
    Raw(String),
    /// Fragment whose first `%s` is the column, the rest are values.
    Format(String, Column),
    Compare(Compare, Column),
    Nest,
    NestClose,
}

/// One entry of a WHERE, HAVING or join predicate list.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub prefix: Prefix,
    pub kind: PredicateKind,
    pub args: Vec<Arg>,
}

impl Predicate {
    pub fn nest(prefix: Prefix) -> Self {
        Self {
            prefix,
            kind: PredicateKind::Nest,
            args: Vec::new(),
        }
    }

    pub fn nest_close() -> Self {
        Self {
            prefix: Prefix::None,
            kind: PredicateKind::NestClose,
            args: Vec::new(),
        }
    }

    /// Whether this entry restricts rows: not a nest marker, not blank raw SQL.
    pub fn is_condition(&self) -> bool {
        match &self.kind {
            PredicateKind::Nest | PredicateKind::NestClose => false,
            PredicateKind::Raw(sql) => !sql.trim().is_empty(),
            PredicateKind::Format(..) | PredicateKind::Compare(..) => true,
        }
    }
}

/// A predicate scoped to one joined table, rendered after its ON equality.
#[derive(Debug, Clone)]
pub struct JoinPredicate {
    pub table: Instance,
    pub predicate: Predicate,
}

#[derive(Debug, Clone)]
pub enum SelectItem {
    One(Column),
    All(TableSource),
    Raw(String),
    Format(String, Column),
}

/// Projection entry with an optional output alias.
#[derive(Debug, Clone)]
pub struct Selection {
    pub item: SelectItem,
    pub alias: Option<String>,
}

/// A GROUP BY or ORDER BY term.
#[derive(Debug, Clone)]
pub enum Term {
    Column(Column),
    Raw(String),
    Format(String, Column),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
pub struct OrderItem {
    pub term: Term,
    pub order: Order,
}

/// `column = value` in an UPDATE.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub column: Column,
    pub value: Arg,
}
