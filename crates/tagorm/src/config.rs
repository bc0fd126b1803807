//! Builder configuration.

use crate::dialect::Dialect;
use heck::{ToLowerCamelCase, ToSnakeCase};
use serde::Deserialize;

/// How column names become keys when rows are collected into maps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKey {
    /// Keep the column name as returned by the server.
    #[default]
    AsIs,
    /// `user_id` -> `userId`
    CamelCase,
    /// `userId` -> `user_id`
    SnakeCase,
}

impl ResultKey {
    pub fn apply(self, column: &str) -> String {
        match self {
            ResultKey::AsIs => column.to_string(),
            ResultKey::CamelCase => column.to_lower_camel_case(),
            ResultKey::SnakeCase => column.to_snake_case(),
        }
    }
}

/// Settings shared by every statement a [`Query`](crate::Query) renders and runs.
///
/// # Example
/// ```ignore
/// let config: tagorm::Config =
///     serde_json::from_str(r#"{ "dialect": "mysql", "log_statements": true }"#)?;
/// let q = tagorm::Query::with_config(config);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dialect: Dialect,
    pub result_key: ResultKey,
    /// Emit executed SQL at `info` instead of `debug`.
    pub log_statements: bool,
}

impl Config {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub fn result_key(mut self, mode: ResultKey) -> Self {
        self.result_key = mode;
        self
    }

    pub fn log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_modes() {
        assert_eq!(ResultKey::AsIs.apply("user_id"), "user_id");
        assert_eq!(ResultKey::CamelCase.apply("user_id"), "userId");
        assert_eq!(ResultKey::SnakeCase.apply("createdAt"), "created_at");
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: Config = serde_json::from_str(r#"{ "dialect": "postgresql" }"#).unwrap();
        assert_eq!(cfg, Config::new(Dialect::Postgres));

        let cfg: Config = serde_json::from_str(
            r#"{ "dialect": "mysql", "result_key": "camel_case", "log_statements": true }"#,
        )
        .unwrap();
        assert_eq!(cfg.dialect, Dialect::Mysql);
        assert_eq!(cfg.result_key, ResultKey::CamelCase);
        assert!(cfg.log_statements);
    }

    #[test]
    fn unknown_dialect_is_rejected() {
        assert!(serde_json::from_str::<Config>(r#"{ "dialect": "oracle" }"#).is_err());
    }
}
