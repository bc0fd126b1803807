//! Bind values for rendered statements.
//!
//! Values are collected as [`Arg`]s when a clause is registered and only
//! turned into placeholders at render time, so the same builder can be
//! rendered repeatedly with fresh numbering.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A clone-friendly bind parameter.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Create a new parameter from any ToSql value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// Get a reference to the inner value as a ToSql trait object.
    pub fn as_ref(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // ToSql: Debug, so the bound value itself is printable.
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// A value attached to a clause descriptor.
///
/// `Null` renders as the `NULL` literal and never produces a bind value.
/// `List` is flattened in order, one placeholder per scalar.
#[derive(Clone, Debug)]
pub enum Arg {
    Null,
    Value(Param),
    List(Vec<Arg>),
}

impl Arg {
    /// Wrap any driver-bindable value.
    pub fn value<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Arg::Value(Param::new(value))
    }

    /// Number of rendered items after flattening.
    ///
    /// An empty list renders as a single `NULL` and so counts as one item.
    pub fn width(&self) -> usize {
        match self {
            Arg::Null | Arg::Value(_) => 1,
            Arg::List(items) if items.is_empty() => 1,
            Arg::List(items) => items.iter().map(Arg::width).sum(),
        }
    }
}

/// Conversion into an [`Arg`].
pub trait IntoArg {
    fn into_arg(self) -> Arg;
}

impl IntoArg for Arg {
    fn into_arg(self) -> Arg {
        self
    }
}

impl IntoArg for Param {
    fn into_arg(self) -> Arg {
        Arg::Value(self)
    }
}

macro_rules! impl_scalar_arg {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoArg for $ty {
                fn into_arg(self) -> Arg {
                    Arg::value(self)
                }
            }
        )*
    };
}

impl_scalar_arg!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &'static str,
    serde_json::Value,
    rust_decimal::Decimal,
    uuid::Uuid,
    chrono::NaiveDate,
    chrono::NaiveTime,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::FixedOffset>,
);

impl<T: IntoArg> IntoArg for Option<T> {
    fn into_arg(self) -> Arg {
        match self {
            Some(v) => v.into_arg(),
            None => Arg::Null,
        }
    }
}

impl<T: IntoArg> IntoArg for Vec<T> {
    fn into_arg(self) -> Arg {
        Arg::List(self.into_iter().map(IntoArg::into_arg).collect())
    }
}

impl<T: IntoArg, const N: usize> IntoArg for [T; N] {
    fn into_arg(self) -> Arg {
        Arg::List(self.into_iter().map(IntoArg::into_arg).collect())
    }
}

impl<T: IntoArg + Clone> IntoArg for &[T] {
    fn into_arg(self) -> Arg {
        Arg::List(self.iter().cloned().map(IntoArg::into_arg).collect())
    }
}

/// A row of insert values.
///
/// Implemented for `Vec<Arg>` and for tuples of [`IntoArg`] values.
pub trait IntoRow {
    fn into_row(self) -> Vec<Arg>;
}

impl IntoRow for Vec<Arg> {
    fn into_row(self) -> Vec<Arg> {
        self
    }
}

macro_rules! impl_tuple_row {
    ($($name:ident),+) => {
        impl<$($name: IntoArg),+> IntoRow for ($($name,)+) {
            #[allow(non_snake_case)]
            fn into_row(self) -> Vec<Arg> {
                let ($($name,)+) = self;
                vec![$($name.into_arg()),+]
            }
        }
    };
}

impl_tuple_row!(A);
impl_tuple_row!(A, B);
impl_tuple_row!(A, B, C);
impl_tuple_row!(A, B, C, D);
impl_tuple_row!(A, B, C, D, E);
impl_tuple_row!(A, B, C, D, E, F);
impl_tuple_row!(A, B, C, D, E, F, G);
impl_tuple_row!(A, B, C, D, E, F, G, H);
impl_tuple_row!(A, B, C, D, E, F, G, H, I);
impl_tuple_row!(A, B, C, D, E, F, G, H, I, J);
impl_tuple_row!(A, B, C, D, E, F, G, H, I, J, K);
impl_tuple_row!(A, B, C, D, E, F, G, H, I, J, K, L);
