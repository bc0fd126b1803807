//! Per-backend rendering strategy: identifier quoting and placeholders.

use crate::error::{OrmError, OrmResult};
use serde::Deserialize;
use std::fmt::Write;
use std::str::FromStr;

/// Target database dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Double-quoted identifiers, `$1, $2, ...` placeholders.
    #[default]
    #[serde(alias = "postgresql")]
    Postgres,
    /// Bare identifiers, `?` placeholders.
    Mysql,
}

impl Dialect {
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Mysql => "mysql",
        }
    }

    /// Quote a single identifier.
    pub fn quote_ident(self, name: &str) -> String {
        match self {
            Dialect::Postgres => {
                let mut out = String::with_capacity(name.len() + 2);
                out.push('"');
                for c in name.chars() {
                    if c == '"' {
                        out.push('"');
                    }
                    out.push(c);
                }
                out.push('"');
                out
            }
            Dialect::Mysql => name.to_string(),
        }
    }

    /// Quote a table name.
    pub fn quote_table(self, name: &str) -> String {
        self.quote_ident(name)
    }

    /// Qualify a column with an already-quoted table expression.
    pub fn quote_column(self, table_expr: &str, column: &str) -> String {
        let mut out = String::with_capacity(table_expr.len() + column.len() + 3);
        let _ = write!(out, "{}.{}", table_expr, self.quote_ident(column));
        out
    }

    /// Start a placeholder sequence for one render pass.
    pub fn placeholders(self) -> Placeholders {
        Placeholders {
            dialect: self,
            count: 0,
        }
    }
}

impl FromStr for Dialect {
    type Err = OrmError;

    fn from_str(s: &str) -> OrmResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "mysql" => Ok(Dialect::Mysql),
            other => Err(OrmError::Configuration(format!(
                "unknown dialect '{other}'"
            ))),
        }
    }
}

/// Placeholder generator, stateful within a single render.
#[derive(Debug)]
pub struct Placeholders {
    dialect: Dialect,
    count: usize,
}

impl Placeholders {
    /// Produce the next placeholder.
    pub fn next(&mut self) -> String {
        self.count += 1;
        match self.dialect {
            Dialect::Postgres => format!("${}", self.count),
            Dialect::Mysql => "?".to_string(),
        }
    }

    /// Number of placeholders handed out so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn postgres_quotes_and_escapes() {
        let d = Dialect::Postgres;
        assert_eq!(d.quote_table("test_item"), r#""test_item""#);
        assert_eq!(d.quote_ident(r#"we"ird"#), r#""we""ird""#);
        assert_eq!(
            d.quote_column(r#""test_item""#, "name"),
            r#""test_item"."name""#
        );
    }

    #[test]
    fn mysql_is_bare() {
        let d = Dialect::Mysql;
        assert_eq!(d.quote_table("test_item"), "test_item");
        assert_eq!(d.quote_column("t", "name"), "t.name");
    }

    #[test]
    fn placeholders_number_from_one() {
        let mut p = Dialect::Postgres.placeholders();
        assert_eq!(p.next(), "$1");
        assert_eq!(p.next(), "$2");
        assert_eq!(p.count(), 2);

        let mut fresh = Dialect::Postgres.placeholders();
        assert_eq!(fresh.next(), "$1");
    }

    #[test]
    fn mysql_placeholder_is_fixed() {
        let mut p = Dialect::Mysql.placeholders();
        assert_eq!(p.next(), "?");
        assert_eq!(p.next(), "?");
        assert_eq!(p.count(), 2);
    }

    #[test]
    fn parse_names() {
        assert_eq!("postgres".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("PostgreSQL".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("mysql".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert!(matches!(
            "oracle".parse::<Dialect>(),
            Err(OrmError::Configuration(_))
        ));
    }
}
