//! Attribute values: dynamic scalars that bind as statement parameters and
//! extract from result rows.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

use crate::error::{RecordError, RecordResult};

/// Canonical timestamp rendering for `created_at` / `updated_at`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a timestamp with [`DATETIME_FORMAT`].
pub fn format_datetime(datetime: &NaiveDateTime) -> String {
    datetime.format(DATETIME_FORMAT).to_string()
}

/// View a parameter list as the reference slice the driver expects.
pub(crate) fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|p| p as &(dyn ToSql + Sync)).collect()
}

/// A single attribute value.
///
/// Attributes are dynamically typed: a `Value` carries whatever the row (or
/// the caller) supplied and binds itself to the column type the server
/// expects. `Null` doubles as "attribute present but empty" and as the
/// explicit NULL-check marker in [`QueryBuilder::eq`](crate::QueryBuilder::eq).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value, used by collection aggregates.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Convert into a JSON value. Timestamps render through the canonical
    /// formatter.
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(v) => (*v).into(),
            Self::Int(v) => (*v).into(),
            Self::Float(v) => serde_json::Number::from_f64(*v)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(v) => v.clone().into(),
            Self::DateTime(v) => format_datetime(v).into(),
        }
    }

    /// Extract the value of one result column by its declared type.
    ///
    /// Column types outside the supported scalar set are [`RecordError::Decode`]
    /// failures; NULLs of any supported type become [`Value::Null`].
    pub fn from_column(row: &Row, idx: usize) -> RecordResult<Self> {
        let column = &row.columns()[idx];
        let name = column.name();
        let ty = column.type_();

        fn get<'a, T>(row: &'a Row, idx: usize, name: &str) -> RecordResult<Option<T>>
        where
            T: tokio_postgres::types::FromSql<'a>,
        {
            row.try_get(idx)
                .map_err(|e| RecordError::decode(name, e.to_string()))
        }

        let value = if *ty == Type::BOOL {
            get::<bool>(row, idx, name)?.map_or(Self::Null, Self::Bool)
        } else if *ty == Type::INT2 {
            get::<i16>(row, idx, name)?.map_or(Self::Null, |v| Self::Int(v.into()))
        } else if *ty == Type::INT4 {
            get::<i32>(row, idx, name)?.map_or(Self::Null, |v| Self::Int(v.into()))
        } else if *ty == Type::INT8 {
            get::<i64>(row, idx, name)?.map_or(Self::Null, Self::Int)
        } else if *ty == Type::FLOAT4 {
            get::<f32>(row, idx, name)?.map_or(Self::Null, |v| Self::Float(v.into()))
        } else if *ty == Type::FLOAT8 {
            get::<f64>(row, idx, name)?.map_or(Self::Null, Self::Float)
        } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR {
            get::<String>(row, idx, name)?.map_or(Self::Null, Self::Text)
        } else if *ty == Type::TIMESTAMP {
            get::<NaiveDateTime>(row, idx, name)?.map_or(Self::Null, Self::DateTime)
        } else if *ty == Type::TIMESTAMPTZ {
            get::<DateTime<Utc>>(row, idx, name)?
                .map_or(Self::Null, |v| Self::DateTime(v.naive_utc()))
        } else if *ty == Type::DATE {
            get::<NaiveDate>(row, idx, name)?
                .map_or(Self::Null, |v| Self::Text(v.format("%Y-%m-%d").to_string()))
        } else {
            return Err(RecordError::decode(
                name,
                format!("unsupported column type {ty}"),
            ));
        };

        Ok(value)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::Int(v) => serializer.serialize_i64(*v),
            Self::Float(v) => serializer.serialize_f64(*v),
            Self::Text(v) => serializer.serialize_str(v),
            Self::DateTime(v) => serializer.serialize_str(&format_datetime(v)),
        }
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            Self::Null => Ok(IsNull::Yes),
            Self::Bool(v) => v.to_sql(ty, out),
            // Narrow to the column's integer width before encoding.
            Self::Int(v) => {
                if *ty == Type::INT2 {
                    (*v as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (*v as i32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Self::Float(v) => {
                if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else {
                    v.to_sql(ty, out)
                }
            }
            Self::Text(v) => v.to_sql(ty, out),
            Self::DateTime(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <bool as ToSql>::accepts(ty)
            || <i64 as ToSql>::accepts(ty)
            || <i32 as ToSql>::accepts(ty)
            || <i16 as ToSql>::accepts(ty)
            || <f64 as ToSql>::accepts(ty)
            || <String as ToSql>::accepts(ty)
            || <NaiveDateTime as ToSql>::accepts(ty)
            || <DateTime<Utc> as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}
