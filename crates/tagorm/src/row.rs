//! Row mapping traits and utilities

use crate::config::ResultKey;
use crate::error::{OrmError, OrmResult};
use rust_decimal::Decimal;
use serde_json::{Map, Number, Value};
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

/// Trait for converting a database row into a Rust struct, binding columns by name.
///
/// This trait should typically be derived using `#[derive(FromRow)]`.
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
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> OrmResult<Self>;
}

/// Opt-in mapping that binds result column N to annotated field N.
///
/// Derived together with [`FromRow`]. Used only by
/// [`Query::fetch_positional`](crate::Query::fetch_positional).
pub trait FromRowPositional: Sized {
    /// Number of columns this type consumes.
    fn width() -> usize;

    /// Read `Self` starting at column `*index`, advancing it past the consumed columns.
    fn from_row_at(row: &Row, index: &mut usize) -> OrmResult<Self>;
}

/// Map a whole row positionally, requiring its width to match exactly.
pub fn from_row_positional<T: FromRowPositional>(row: &Row) -> OrmResult<T> {
    let expected = T::width();
    if row.len() != expected {
        return Err(OrmError::ArityMismatch {
            expected,
            got: row.len(),
        });
    }
    let mut index = 0;
    T::from_row_at(row, &mut index)
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning OrmError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>;

    /// Try to get a column value by position, returning OrmError::Decode on failure
    fn try_get_index<T>(&self, index: usize) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| OrmError::decode(column, e.to_string()))
    }

    fn try_get_index<T>(&self, index: usize) -> OrmResult<T>
    where
        T: for<'a> FromSql<'a>,
    {
        self.try_get(index).map_err(|e| {
            let name = self
                .columns()
                .get(index)
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| format!("#{index}"));
            OrmError::decode(name, e.to_string())
        })
    }
}

/// Convert a row into a JSON object keyed by column name.
///
/// NULL becomes [`Value::Null`]; keys are converted with `key`.
pub fn row_to_map(row: &Row, key: ResultKey) -> OrmResult<Map<String, Value>> {
    let mut map = Map::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        let value = column_value(row, index, column.name(), column.type_())?;
        map.insert(key.apply(column.name()), value);
    }
    Ok(map)
}

fn get<T>(row: &Row, index: usize) -> OrmResult<Option<T>>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get_index::<Option<T>>(index)
}

fn column_value(row: &Row, index: usize, name: &str, ty: &Type) -> OrmResult<Value> {
    let value = match *ty {
        Type::BOOL => get::<bool>(row, index)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, index)?.map(Value::from),
        Type::INT4 => get::<i32>(row, index)?.map(Value::from),
        Type::INT8 => get::<i64>(row, index)?.map(Value::from),
        Type::OID => get::<u32>(row, index)?.map(Value::from),
        Type::FLOAT4 => get::<f32>(row, index)?
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(Value::Number),
        Type::FLOAT8 => get::<f64>(row, index)?
            .and_then(Number::from_f64)
            .map(Value::Number),
        Type::NUMERIC => get::<Decimal>(row, index)?.map(|v| Value::String(v.to_string())),
        Type::JSON | Type::JSONB => get::<Value>(row, index)?,
        Type::UUID => get::<uuid::Uuid>(row, index)?.map(|v| Value::String(v.to_string())),
        Type::DATE => get::<chrono::NaiveDate>(row, index)?.map(|v| Value::String(v.to_string())),
        Type::TIME => get::<chrono::NaiveTime>(row, index)?.map(|v| Value::String(v.to_string())),
        Type::TIMESTAMP => {
            get::<chrono::NaiveDateTime>(row, index)?.map(|v| Value::String(v.to_string()))
        }
        Type::TIMESTAMPTZ => get::<chrono::DateTime<chrono::Utc>>(row, index)?
            .map(|v| Value::String(v.to_rfc3339())),
        Type::BYTEA => get::<Vec<u8>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(Value::from).collect())),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => get::<Vec<String>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(Value::String).collect())),
        Type::INT4_ARRAY => get::<Vec<i32>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(Value::from).collect())),
        Type::INT8_ARRAY => get::<Vec<i64>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(Value::from).collect())),
        Type::INT2_ARRAY => get::<Vec<i16>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(Value::from).collect())),
        Type::BOOL_ARRAY => get::<Vec<bool>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(Value::Bool).collect())),
        Type::FLOAT8_ARRAY => get::<Vec<f64>>(row, index)?.map(|v| {
            Value::Array(
                v.into_iter()
                    .map(|f| Number::from_f64(f).map_or(Value::Null, Value::Number))
                    .collect(),
            )
        }),
        Type::NUMERIC_ARRAY => get::<Vec<Decimal>>(row, index)?
            .map(|v| Value::Array(v.into_iter().map(|d| Value::String(d.to_string())).collect())),
        // text, varchar, bpchar, name, citext and friends
        _ if <String as FromSql<'_>>::accepts(ty) => get::<String>(row, index)?.map(Value::String),
        _ => {
            return Err(OrmError::decode(
                name,
                format!("unsupported column type '{ty}' for map rows"),
            ));
        }
    };
    Ok(value.unwrap_or(Value::Null))
}
