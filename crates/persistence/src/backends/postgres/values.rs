//! Conversions between PostgreSQL values and the crate's value types.
//!
//! Statements are prepared without explicit parameter types, so the server
//! infers each `$n` from context. [`SqlParam`] then encodes itself as whatever
//! type was inferred: an integer bound against a `numeric` column is sent as
//! numeric, a string compared with a `date` column is parsed as a date.

use std::error::Error;
use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::BytesMut;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres_types::{IsNull, ToSql, Type, to_sql_checked};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::DataAccessError;
use crate::types::SqlParam;

type BoxError = Box<dyn Error + Sync + Send>;

fn is_text(ty: &Type) -> bool {
    [Type::TEXT, Type::VARCHAR, Type::BPCHAR, Type::NAME, Type::UNKNOWN].contains(ty)
}

impl ToSql for SqlParam {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        match self {
            SqlParam::Null => Ok(IsNull::Yes),
            SqlParam::Integer(i) => integer_to_sql(*i, ty, out),
            SqlParam::Float(f) => float_to_sql(*f, ty, out),
            SqlParam::String(s) => string_to_sql(s, ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn integer_to_sql(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::INT2 {
        i16::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(i)?.to_sql(ty, out)
    } else if *ty == Type::INT8 {
        i.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        (i as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        (i as f64).to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from(i).to_sql(ty, out)
    } else if *ty == Type::BOOL {
        (i != 0).to_sql(ty, out)
    } else if is_text(ty) {
        i.to_string().to_sql(ty, out)
    } else {
        Err(format!("cannot bind an integer to a parameter of type {}", ty).into())
    }
}

fn float_to_sql(f: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if *ty == Type::FLOAT4 {
        (f as f32).to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        f.to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::try_from(f)?.to_sql(ty, out)
    } else if is_text(ty) {
        f.to_string().to_sql(ty, out)
    } else {
        Err(format!("cannot bind a float to a parameter of type {}", ty).into())
    }
}

fn string_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if is_text(ty) {
        s.to_sql(ty, out)
    } else if *ty == Type::INT2 {
        s.trim().parse::<i16>()?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        s.trim().parse::<i32>()?.to_sql(ty, out)
    } else if *ty == Type::INT8 {
        s.trim().parse::<i64>()?.to_sql(ty, out)
    } else if *ty == Type::FLOAT4 {
        s.trim().parse::<f32>()?.to_sql(ty, out)
    } else if *ty == Type::FLOAT8 {
        s.trim().parse::<f64>()?.to_sql(ty, out)
    } else if *ty == Type::NUMERIC {
        Decimal::from_str(s.trim())?.to_sql(ty, out)
    } else if *ty == Type::BOOL {
        parse_bool(s)?.to_sql(ty, out)
    } else if *ty == Type::DATE {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMP {
        parse_timestamp(s)?.to_sql(ty, out)
    } else if *ty == Type::TIMESTAMPTZ {
        match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(dt) => dt.with_timezone(&Utc).to_sql(ty, out),
            Err(_) => parse_timestamp(s)?.and_utc().to_sql(ty, out),
        }
    } else if *ty == Type::TIME {
        NaiveTime::from_str(s.trim())?.to_sql(ty, out)
    } else if *ty == Type::UUID {
        Uuid::parse_str(s.trim())?.to_sql(ty, out)
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        serde_json::from_str::<Value>(s)?.to_sql(ty, out)
    } else {
        Err(format!("cannot bind a string to a parameter of type {}", ty).into())
    }
}

fn parse_bool(s: &str) -> Result<bool, BoxError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "1" | "yes" | "on" => Ok(true),
        "f" | "false" | "0" | "no" | "off" => Ok(false),
        other => Err(format!("invalid boolean: '{}'", other).into()),
    }
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, BoxError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
        .or_else(|_| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
        })
        .map_err(Into::into)
}

/// Converts the cell at `idx` to JSON according to its column type.
pub(crate) fn cell_to_json(
    row: &Row,
    idx: usize,
    backend_name: &str,
) -> Result<Value, DataAccessError> {
    let ty = row.columns()[idx].type_().clone();
    let failed = |e: tokio_postgres::Error| DataAccessError::query_failed(backend_name, e);

    let value = if ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx).map_err(failed)?.map(Value::from)
    } else if ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx).map_err(failed)?.map(Value::from)
    } else if ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx).map_err(failed)?.map(Value::from)
    } else if ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx).map_err(failed)?.map(Value::from)
    } else if ty == Type::OID {
        row.try_get::<_, Option<u32>>(idx).map_err(failed)?.map(Value::from)
    } else if ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map_err(failed)?
            .map(|f| float_to_json(f64::from(f)))
    } else if ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx).map_err(failed)?.map(float_to_json)
    } else if ty == Type::NUMERIC {
        row.try_get::<_, Option<Decimal>>(idx)
            .map_err(failed)?
            .map(|d| Value::String(d.to_string()))
    } else if ty == Type::JSON || ty == Type::JSONB {
        row.try_get::<_, Option<Value>>(idx).map_err(failed)?
    } else if ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)
            .map_err(failed)?
            .map(|t| Value::String(t.format("%Y-%m-%d %H:%M:%S%.f").to_string()))
    } else if ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<FixedOffset>>>(idx)
            .map_err(failed)?
            .map(|t| Value::String(t.to_rfc3339()))
    } else if ty == Type::DATE {
        row.try_get::<_, Option<NaiveDate>>(idx)
            .map_err(failed)?
            .map(|d| Value::String(d.to_string()))
    } else if ty == Type::TIME {
        row.try_get::<_, Option<NaiveTime>>(idx)
            .map_err(failed)?
            .map(|t| Value::String(t.to_string()))
    } else if ty == Type::UUID {
        row.try_get::<_, Option<Uuid>>(idx)
            .map_err(failed)?
            .map(|u| Value::String(u.to_string()))
    } else if ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx)
            .map_err(failed)?
            .map(|b| Value::String(STANDARD.encode(b)))
    } else {
        match row.try_get::<_, Option<String>>(idx) {
            Ok(s) => s.map(Value::String),
            Err(_) => {
                return Err(DataAccessError::UnexpectedResult {
                    backend_name: backend_name.to_string(),
                    message: format!(
                        "unsupported column type {} for '{}'",
                        ty,
                        row.columns()[idx].name()
                    ),
                });
            }
        }
    };

    Ok(value.unwrap_or(Value::Null))
}

fn float_to_json(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
