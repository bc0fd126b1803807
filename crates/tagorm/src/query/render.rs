//! Statement assembly.

use super::Query;
use crate::clause::{Order, Predicate, SelectItem, Term};
use crate::error::{Clause, OrmError, OrmResult};
use crate::meta::{Column, MetaEntry, MetaMap, resolve};
use crate::predicate::{Binds, Rendered, fill_template, render_predicates};
use crate::value::Param;
use std::fmt;
use tokio_postgres::types::ToSql;

/// The result of building a query.
#[derive(Debug, Clone)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Param>,
}

impl BuiltQuery {
    /// Create a new built query.
    pub fn new(sql: String, params: Vec<Param>) -> Self {
        Self { sql, params }
    }

    /// Get parameters as references for tokio-postgres.
    pub fn params_ref(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

impl fmt::Display for BuiltQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Append a clause fragment, space separated.
fn push_fragment(sql: &mut String, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    if !sql.is_empty() {
        sql.push(' ');
    }
    sql.push_str(fragment);
}

impl Query {
    fn require(&self, clause: Clause, present: bool) -> OrmResult<()> {
        if present {
            Ok(())
        } else {
            Err(OrmError::MissingClause(clause))
        }
    }

    /// UPDATE and DELETE need at least one real condition; nest markers alone do not scope.
    fn has_where_condition(&self) -> bool {
        self.wheres.iter().any(Predicate::is_condition)
    }

    fn resolve_meta(&self) -> OrmResult<MetaMap> {
        let primary = self
            .table
            .iter()
            .map(|t| (&t.source, t.alias()));
        let joined = self.joins.iter().map(|j| (&j.table.source, j.table.alias()));
        resolve(self.config.dialect, primary.chain(joined))
    }

    fn primary_table<'m>(&self, meta: &'m MetaMap) -> OrmResult<&'m MetaEntry> {
        let table = self
            .table
            .as_ref()
            .ok_or(OrmError::MissingClause(Clause::Table))?;
        meta.table(&table.source, "table")
    }

    fn render_projection(&self, meta: &MetaMap) -> OrmResult<String> {
        let dialect = self.config.dialect;
        let mut items = Vec::with_capacity(self.selects.len());

        for selection in &self.selects {
            let mut item = match &selection.item {
                SelectItem::One(column) => meta.get(*column, "select")?.table_as_column.clone(),
                SelectItem::All(source) => format!("{}.*", meta.table(source, "select")?.table_as),
                SelectItem::Raw(sql) => sql.clone(),
                SelectItem::Format(template, column) => {
                    let entry = meta.get(*column, "select")?;
                    fill_template(template, std::slice::from_ref(&entry.table_as_column))?
                }
            };
            if let Some(alias) = &selection.alias {
                item = format!("{} as {}", item, dialect.quote_ident(alias));
            }
            items.push(item);
        }

        Ok(format!("SELECT {}", items.join(", ")))
    }

    fn render_from(&self, meta: &MetaMap) -> OrmResult<String> {
        Ok(format!("FROM {}", self.primary_table(meta)?.table_expr()))
    }

    fn render_joins(&self, meta: &MetaMap, binds: &mut Binds) -> OrmResult<String> {
        for predicate in &self.join_predicates {
            let joined = self
                .joins
                .iter()
                .any(|j| j.table.source.instance() == predicate.table);
            if !joined {
                return Err(OrmError::unresolved("joinWhere"));
            }
        }

        let mut parts = Vec::with_capacity(self.joins.len());
        for join in &self.joins {
            let table = meta.table(&join.table.source, "join")?;
            let left = meta.get(join.left, "join")?;
            let right = meta.get(join.right, "join")?;

            let mut part = format!(
                "{} JOIN {} ON {} = {}",
                join.kind.keyword(),
                table.table_expr(),
                left.table_as_column,
                right.table_as_column
            );

            let instance = join.table.source.instance();
            let scoped = self
                .join_predicates
                .iter()
                .filter(|p| p.table == instance)
                .map(|p| &p.predicate);
            let extra = render_predicates(scoped, meta, binds, "joinWhere", true)?;
            push_fragment(&mut part, &extra.qualified);

            parts.push(part);
        }
        Ok(parts.join(" "))
    }

    fn render_where(&self, meta: &MetaMap, binds: &mut Binds) -> OrmResult<Rendered> {
        let rendered = render_predicates(&self.wheres, meta, binds, "where", false)?;
        if rendered.is_empty() {
            return Ok(rendered);
        }
        Ok(Rendered {
            local: format!("WHERE {}", rendered.local),
            qualified: format!("WHERE {}", rendered.qualified),
        })
    }

    fn render_group_by(&self, meta: &MetaMap) -> OrmResult<String> {
        if self.group_by.is_empty() {
            return Ok(String::new());
        }
        let items = self
            .group_by
            .iter()
            .map(|term| render_term(term, meta, "groupBy", false))
            .collect::<OrmResult<Vec<_>>>()?;
        Ok(format!("GROUP BY {}", items.join(", ")))
    }

    fn render_having(&self, meta: &MetaMap, binds: &mut Binds) -> OrmResult<String> {
        let rendered = render_predicates(&self.having, meta, binds, "having", false)?;
        if rendered.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("HAVING {}", rendered.qualified))
    }

    fn render_order_by(&self, meta: &MetaMap) -> OrmResult<String> {
        if self.order_by.is_empty() {
            return Ok(String::new());
        }
        let mut items = Vec::with_capacity(self.order_by.len());
        for order in &self.order_by {
            let mut item = render_term(&order.term, meta, "orderBy", true)?;
            if order.order == Order::Desc {
                item.push_str(" DESC");
            }
            items.push(item);
        }
        Ok(format!("ORDER BY {}", items.join(", ")))
    }

    fn render_paging(&self, sql: &mut String) {
        if self.limit > 0 {
            push_fragment(sql, &format!("LIMIT {}", self.limit));
        }
        if self.offset > 0 {
            push_fragment(sql, &format!("OFFSET {}", self.offset));
        }
    }

    fn finish(&self, kind: &'static str, sql: String, binds: Binds) -> BuiltQuery {
        let built = BuiltQuery::new(sql, binds.into_params());
        tracing::trace!(
            target: "tagorm.sql",
            dialect = self.config.dialect.name(),
            kind,
            param_count = built.params.len(),
            sql = %built.sql,
        );
        built
    }

    /// Render `SELECT ... FROM ... [JOIN] [WHERE] [GROUP BY] [HAVING] [ORDER BY] [LIMIT] [OFFSET]`.
    pub fn build_select(&self) -> OrmResult<BuiltQuery> {
        self.require(Clause::Select, !self.selects.is_empty())?;
        self.require(Clause::Table, self.table.is_some())?;

        let meta = self.resolve_meta()?;
        let mut binds = Binds::new(self.config.dialect);
        let mut sql = self.render_projection(&meta)?;

        push_fragment(&mut sql, &self.render_from(&meta)?);
        push_fragment(&mut sql, &self.render_joins(&meta, &mut binds)?);
        push_fragment(&mut sql, &self.render_where(&meta, &mut binds)?.qualified);
        push_fragment(&mut sql, &self.render_group_by(&meta)?);
        push_fragment(&mut sql, &self.render_having(&meta, &mut binds)?);
        push_fragment(&mut sql, &self.render_order_by(&meta)?);
        self.render_paging(&mut sql);

        Ok(self.finish("select", sql, binds))
    }

    /// Render `SELECT count(*) FROM ...`, ignoring projection, ordering and paging.
    pub fn build_select_count(&self) -> OrmResult<BuiltQuery> {
        self.require(Clause::Table, self.table.is_some())?;

        let meta = self.resolve_meta()?;
        let mut binds = Binds::new(self.config.dialect);
        let mut sql = String::from("SELECT count(*)");

        push_fragment(&mut sql, &self.render_from(&meta)?);
        push_fragment(&mut sql, &self.render_joins(&meta, &mut binds)?);
        push_fragment(&mut sql, &self.render_where(&meta, &mut binds)?.qualified);
        push_fragment(&mut sql, &self.render_group_by(&meta)?);
        push_fragment(&mut sql, &self.render_having(&meta, &mut binds)?);

        Ok(self.finish("count", sql, binds))
    }

    /// Render `INSERT INTO table (columns) VALUES (...), (...)`.
    pub fn build_insert(&self) -> OrmResult<BuiltQuery> {
        self.require(Clause::Table, self.table.is_some())?;
        self.require(Clause::ValuesColumn, !self.values_columns.is_empty())?;
        self.require(Clause::Values, !self.values.is_empty())?;

        let meta = self.resolve_meta()?;
        let mut binds = Binds::new(self.config.dialect);
        let table = self.primary_table(&meta)?;

        let columns = self
            .values_columns
            .iter()
            .map(|c| meta.get(*c, "valuesColumn").map(|e| e.column.as_str()))
            .collect::<OrmResult<Vec<_>>>()?;

        let mut rows = Vec::with_capacity(self.values.len());
        for row in &self.values {
            let got: usize = row.iter().map(|arg| arg.width()).sum();
            if got != columns.len() {
                return Err(OrmError::ArityMismatch {
                    expected: columns.len(),
                    got,
                });
            }
            let items: Vec<String> = row.iter().map(|arg| binds.render(arg)).collect();
            rows.push(format!("({})", items.join(", ")));
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES {}",
            table.table,
            columns.join(", "),
            rows.join(", ")
        );
        Ok(self.finish("insert", sql, binds))
    }

    /// Render `UPDATE table SET ... WHERE ...` with bare column names.
    pub fn build_update(&self) -> OrmResult<BuiltQuery> {
        self.require(Clause::Table, self.table.is_some())?;
        self.require(Clause::Set, !self.sets.is_empty())?;
        self.require(Clause::Where, self.has_where_condition())?;

        let meta = self.resolve_meta()?;
        let mut binds = Binds::new(self.config.dialect);
        let table = self.primary_table(&meta)?;

        let mut assignments = Vec::with_capacity(self.sets.len());
        for assignment in &self.sets {
            let entry = meta.get(assignment.column, "set")?;
            let width = assignment.value.width();
            if width != 1 {
                return Err(OrmError::ArityMismatch {
                    expected: 1,
                    got: width,
                });
            }
            assignments.push(format!("{} = {}", entry.column, binds.render(&assignment.value)));
        }

        let mut sql = format!("UPDATE {} SET {}", table.table, assignments.join(", "));
        push_fragment(&mut sql, &self.render_where(&meta, &mut binds)?.local);

        Ok(self.finish("update", sql, binds))
    }

    /// Render `DELETE FROM table WHERE ...` with bare column names.
    pub fn build_delete(&self) -> OrmResult<BuiltQuery> {
        self.require(Clause::Table, self.table.is_some())?;
        self.require(Clause::Where, self.has_where_condition())?;

        let meta = self.resolve_meta()?;
        let mut binds = Binds::new(self.config.dialect);
        let table = self.primary_table(&meta)?;

        let mut sql = format!("DELETE FROM {}", table.table);
        push_fragment(&mut sql, &self.render_where(&meta, &mut binds)?.local);

        Ok(self.finish("delete", sql, binds))
    }
}

fn column_ref<'m>(
    meta: &'m MetaMap,
    column: Column,
    clause: &'static str,
    qualified: bool,
) -> OrmResult<&'m str> {
    let entry = meta.get(column, clause)?;
    Ok(if qualified {
        &entry.table_as_column
    } else {
        &entry.column
    })
}

/// GROUP BY uses the bare column, ORDER BY the alias-qualified one.
fn render_term(term: &Term, meta: &MetaMap, clause: &'static str, qualified: bool) -> OrmResult<String> {
    match term {
        Term::Column(column) => Ok(column_ref(meta, *column, clause, qualified)?.to_string()),
        Term::Raw(sql) => Ok(sql.clone()),
        Term::Format(template, column) => {
            let slot = column_ref(meta, *column, clause, qualified)?.to_string();
            fill_template(template, &[slot])
        }
    }
}
