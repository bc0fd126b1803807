//! Execution helpers: render, log, run through a [`GenericClient`], map rows.
//!
//! The driver is tokio-postgres, so builders rendered for [`Dialect::Mysql`]
//! are rejected with [`OrmError::Configuration`] before anything is sent.

use super::{BuiltQuery, Query};
use crate::client::GenericClient;
use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::row::{FromRow, FromRowPositional, RowExt, from_row_positional, row_to_map};
use serde_json::{Map, Value};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

impl Query {
    fn log_statement(&self, kind: &'static str, sql: &str, param_count: usize) {
        if self.config.log_statements {
            tracing::info!(target: "tagorm.sql", kind, param_count, sql = %sql, "execute");
        } else {
            tracing::debug!(target: "tagorm.sql", kind, param_count, sql = %sql, "execute");
        }
    }

    fn ensure_executable(&self) -> OrmResult<()> {
        match self.config.dialect {
            Dialect::Postgres => Ok(()),
            other => Err(OrmError::Configuration(format!(
                "cannot execute {} statements on a postgres connection",
                other.name()
            ))),
        }
    }

    async fn fetch_rows(
        &self,
        conn: &impl GenericClient,
        kind: &'static str,
        built: BuiltQuery,
    ) -> OrmResult<Vec<Row>> {
        self.ensure_executable()?;
        self.log_statement(kind, &built.sql, built.params.len());
        conn.query(&built.sql, &built.params_ref()).await
    }

    async fn run(
        &self,
        conn: &impl GenericClient,
        kind: &'static str,
        built: BuiltQuery,
    ) -> OrmResult<u64> {
        self.ensure_executable()?;
        self.log_statement(kind, &built.sql, built.params.len());
        conn.execute(&built.sql, &built.params_ref()).await
    }

    /// Run the SELECT and map every row by column name.
    pub async fn fetch_all<T: FromRow>(&self, conn: &impl GenericClient) -> OrmResult<Vec<T>> {
        let rows = self.fetch_rows(conn, "select", self.build_select()?).await?;
        rows.iter().map(T::from_row).collect()
    }

    /// Run the SELECT and map column N to field N.
    ///
    /// Every row must have exactly `T::width()` columns.
    pub async fn fetch_positional<T: FromRowPositional>(
        &self,
        conn: &impl GenericClient,
    ) -> OrmResult<Vec<T>> {
        let rows = self.fetch_rows(conn, "select", self.build_select()?).await?;
        rows.iter().map(from_row_positional::<T>).collect()
    }

    /// Run the SELECT and collect each row as a JSON object.
    ///
    /// Keys follow the configured [`ResultKey`](crate::ResultKey) mode.
    pub async fn fetch_maps(
        &self,
        conn: &impl GenericClient,
    ) -> OrmResult<Vec<Map<String, Value>>> {
        let rows = self.fetch_rows(conn, "select", self.build_select()?).await?;
        let key = self.config.result_key;
        rows.iter().map(|row| row_to_map(row, key)).collect()
    }

    /// Run the count statement and return the first count, or 0 when no row comes back.
    pub async fn count(&self, conn: &impl GenericClient) -> OrmResult<i64> {
        let rows = self.fetch_rows(conn, "count", self.build_select_count()?).await?;
        match rows.first() {
            Some(row) => row.try_get_index::<i64>(0),
            None => Ok(0),
        }
    }

    /// Run the count statement and return one count per group.
    pub async fn count_rows(&self, conn: &impl GenericClient) -> OrmResult<Vec<i64>> {
        let rows = self.fetch_rows(conn, "count", self.build_select_count()?).await?;
        rows.iter().map(|row| row.try_get_index::<i64>(0)).collect()
    }

    /// Run the INSERT and return the number of inserted rows.
    pub async fn insert(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.run(conn, "insert", self.build_insert()?).await
    }

    /// Run the UPDATE and return the number of affected rows.
    pub async fn update(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.run(conn, "update", self.build_update()?).await
    }

    /// Run the DELETE and return the number of affected rows.
    pub async fn delete(&self, conn: &impl GenericClient) -> OrmResult<u64> {
        self.run(conn, "delete", self.build_delete()?).await
    }

    /// Run hand-written SQL with the builder's logging.
    pub async fn exec(
        &self,
        conn: &impl GenericClient,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<u64> {
        self.log_statement("exec", sql, params.len());
        conn.execute(sql, params).await
    }

    /// Run hand-written SQL and map every row by column name.
    pub async fn exec_query<T: FromRow>(
        &self,
        conn: &impl GenericClient,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> OrmResult<Vec<T>> {
        self.log_statement("query", sql, params.len());
        let rows = conn.query(sql, params).await?;
        rows.iter().map(T::from_row).collect()
    }
}
