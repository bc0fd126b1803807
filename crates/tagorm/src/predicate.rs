//! Predicate constructors and the boolean expression assembler.
//!
//! [`Cond`] describes a single condition; [`Query`](crate::Query) attaches it
//! to a WHERE, HAVING or join predicate list with an `AND`/`OR` prefix.
//!
//! # Example
//! ```ignore
//! use tagorm::Cond;
//!
//! Cond::is(item.name, "book")
//! Cond::in_list(item.id, vec![1, 2, 3])
//! Cond::is_null(item.user_id)
//! Cond::raw_with("length(name) > %s", (3,))
//! Cond::format("lower(%s) LIKE %s", item.name, ("b%",))
//! ```

use crate::clause::{Compare, Predicate, PredicateKind, Prefix};
use crate::dialect::{Dialect, Placeholders};
use crate::error::{OrmError, OrmResult};
use crate::meta::{Column, MetaMap};
use crate::value::{Arg, IntoArg, IntoRow, Param};

/// A condition ready to be attached to a predicate list.
#[derive(Debug, Clone)]
pub struct Cond {
    kind: PredicateKind,
    args: Vec<Arg>,
}

impl Cond {
    fn compare(op: Compare, column: Column, args: Vec<Arg>) -> Self {
        Self {
            kind: PredicateKind::Compare(op, column),
            args,
        }
    }

    /// Literal SQL fragment, emitted as-is.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self {
            kind: PredicateKind::Raw(sql.into()),
            args: Vec::new(),
        }
    }

    /// Literal SQL fragment whose `%s` slots take one value each.
    pub fn raw_with(sql: impl Into<String>, values: impl IntoRow) -> Self {
        Self {
            kind: PredicateKind::Raw(sql.into()),
            args: values.into_row(),
        }
    }

    /// Fragment whose single `%s` slot is the resolved column.
    pub fn format(template: impl Into<String>, column: Column) -> Self {
        Self {
            kind: PredicateKind::Format(template.into(), column),
            args: Vec::new(),
        }
    }

    /// Fragment whose first `%s` is the column and the following ones values.
    pub fn format_with(template: impl Into<String>, column: Column, values: impl IntoRow) -> Self {
        Self {
            kind: PredicateKind::Format(template.into(), column),
            args: values.into_row(),
        }
    }

    /// `column = value`
    pub fn is(column: Column, value: impl IntoArg) -> Self {
        Self::compare(Compare::Is, column, vec![value.into_arg()])
    }

    /// `column != value`
    pub fn is_not(column: Column, value: impl IntoArg) -> Self {
        Self::compare(Compare::IsNot, column, vec![value.into_arg()])
    }

    pub fn is_null(column: Column) -> Self {
        Self::compare(Compare::IsNull, column, Vec::new())
    }

    pub fn is_not_null(column: Column) -> Self {
        Self::compare(Compare::IsNotNull, column, Vec::new())
    }

    pub fn like(column: Column, pattern: impl IntoArg) -> Self {
        Self::compare(Compare::Like, column, vec![pattern.into_arg()])
    }

    pub fn not_like(column: Column, pattern: impl IntoArg) -> Self {
        Self::compare(Compare::NotLike, column, vec![pattern.into_arg()])
    }

    /// `column IN (...)`; an empty list renders `IN (NULL)`.
    pub fn in_list(column: Column, values: impl IntoArg) -> Self {
        Self::compare(Compare::In, column, vec![values.into_arg()])
    }

    pub fn not_in(column: Column, values: impl IntoArg) -> Self {
        Self::compare(Compare::NotIn, column, vec![values.into_arg()])
    }

    pub fn gt(column: Column, value: impl IntoArg) -> Self {
        Self::compare(Compare::Gt, column, vec![value.into_arg()])
    }

    pub fn gte(column: Column, value: impl IntoArg) -> Self {
        Self::compare(Compare::Gte, column, vec![value.into_arg()])
    }

    pub fn lt(column: Column, value: impl IntoArg) -> Self {
        Self::compare(Compare::Lt, column, vec![value.into_arg()])
    }

    pub fn lte(column: Column, value: impl IntoArg) -> Self {
        Self::compare(Compare::Lte, column, vec![value.into_arg()])
    }

    pub(crate) fn with_prefix(self, prefix: Prefix) -> Predicate {
        Predicate {
            prefix,
            kind: self.kind,
            args: self.args,
        }
    }
}

/// Placeholder numbering and bind values for one render pass.
#[derive(Debug)]
pub(crate) struct Binds {
    placeholders: Placeholders,
    params: Vec<Param>,
}

impl Binds {
    pub(crate) fn new(dialect: Dialect) -> Self {
        Self {
            placeholders: dialect.placeholders(),
            params: Vec::new(),
        }
    }

    /// Render one argument into a single SQL item list.
    ///
    /// `NULL` binds nothing; lists flatten in order, an empty list is `NULL`.
    pub(crate) fn render(&mut self, arg: &Arg) -> String {
        match arg {
            Arg::Null => "NULL".to_string(),
            Arg::Value(param) => {
                self.params.push(param.clone());
                self.placeholders.next()
            }
            Arg::List(items) if items.is_empty() => "NULL".to_string(),
            Arg::List(items) => items
                .iter()
                .map(|item| self.render(item))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    pub(crate) fn into_params(self) -> Vec<Param> {
        self.params
    }
}

/// The two renderings of one predicate list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Rendered {
    /// Bare column references, for UPDATE and DELETE.
    pub local: String,
    /// Alias-qualified column references, for SELECT and joins.
    pub qualified: String,
}

impl Rendered {
    pub(crate) fn is_empty(&self) -> bool {
        self.qualified.is_empty()
    }
}

/// Space-joined tokens without padding inside parentheses.
#[derive(Debug, Default)]
struct Tokens {
    out: String,
    open: bool,
}

impl Tokens {
    fn push(&mut self, token: &str) {
        if !self.out.is_empty() && !self.open && token != ")" {
            self.out.push(' ');
        }
        self.out.push_str(token);
        self.open = token == "(";
    }
}

/// Render a predicate list.
///
/// `leading_prefix` is set for join predicates, which follow the ON equality
/// and so keep the prefix of their first entry.
pub(crate) fn render_predicates<'p>(
    predicates: impl IntoIterator<Item = &'p Predicate>,
    meta: &MetaMap,
    binds: &mut Binds,
    clause: &'static str,
    leading_prefix: bool,
) -> OrmResult<Rendered> {
    let mut local = Tokens::default();
    let mut qualified = Tokens::default();
    let mut prefix_flag = leading_prefix;

    for predicate in predicates {
        if prefix_flag {
            if let Some(keyword) = predicate.prefix.keyword() {
                local.push(keyword);
                qualified.push(keyword);
            }
        } else {
            prefix_flag = true;
        }

        match &predicate.kind {
            PredicateKind::Nest => {
                local.push("(");
                qualified.push("(");
                prefix_flag = false;
            }
            PredicateKind::NestClose => {
                local.push(")");
                qualified.push(")");
            }
            PredicateKind::Raw(sql) => {
                if predicate.args.is_empty() {
                    local.push(sql);
                    qualified.push(sql);
                } else {
                    let values = render_args(&predicate.args, binds);
                    let text = fill_template(sql, &values)?;
                    local.push(&text);
                    qualified.push(&text);
                }
            }
            PredicateKind::Format(template, column) => {
                let entry = meta.get(*column, clause)?;
                let values = render_args(&predicate.args, binds);

                let mut slots = Vec::with_capacity(values.len() + 1);
                slots.push(entry.column.clone());
                slots.extend(values.iter().cloned());
                local.push(&fill_template(template, &slots)?);

                slots[0] = entry.table_as_column.clone();
                qualified.push(&fill_template(template, &slots)?);
            }
            PredicateKind::Compare(op, column) => {
                let entry = meta.get(*column, clause)?;
                let values = if op.takes_values() {
                    render_args(&predicate.args, binds).join(", ")
                } else {
                    String::new()
                };
                local.push(&op.render(&entry.column, &values));
                qualified.push(&op.render(&entry.table_as_column, &values));
            }
        }
    }

    Ok(Rendered {
        local: local.out,
        qualified: qualified.out,
    })
}

fn render_args(args: &[Arg], binds: &mut Binds) -> Vec<String> {
    args.iter().map(|arg| binds.render(arg)).collect()
}

fn count_slots(template: &str) -> usize {
    let mut count = 0;
    let mut chars = template.chars();
    while let Some(c) = chars.next() {
        if c == '%' && chars.next() == Some('s') {
            count += 1;
        }
    }
    count
}

/// Substitute `%s` slots in order; `%%` is a literal percent sign.
///
/// The number of slots must equal the number of items supplied.
pub(crate) fn fill_template(template: &str, slots: &[String]) -> OrmResult<String> {
    let expected = count_slots(template);
    if expected != slots.len() {
        return Err(OrmError::ArityMismatch {
            expected,
            got: slots.len(),
        });
    }

    let mut out = String::with_capacity(template.len() + slots.iter().map(String::len).sum::<usize>());
    let mut slots = slots.iter();
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            match chars.peek() {
                Some('s') => {
                    chars.next();
                    if let Some(slot) = slots.next() {
                        out.push_str(slot);
                    }
                    continue;
                }
                Some('%') => {
                    chars.next();
                    out.push('%');
                    continue;
                }
                _ => {}
            }
        }
        out.push(c);
    }
    Ok(out)
}
