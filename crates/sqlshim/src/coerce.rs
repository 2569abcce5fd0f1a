//! Bidirectional value coercion.
//!
//! To-wire: host values are reshaped into what the dialect's driver accepts
//! before binding (booleans as 0/1, narrowed integers, truncated timestamps).
//! From-wire: raw driver column values are normalized back into host types
//! using the declared column metadata (scale-0 numerics become integers,
//! bit columns become booleans, text forms collapse to one representation).
//!
//! Coercion failures indicate caller bugs and are never retried.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::core::value::{ColumnMeta, SqlValue, WireTypeCode};
use crate::dialect::{Dialect, IntegerWidth, TimestampPrecision};
use crate::error::{Result, ShimError};

/// Coerce a single parameter value into the dialect's wire representation.
///
/// Unmapped values pass through unchanged. Sub-second truncation is lossy by
/// design; oversized integers and timezone-aware timestamps on naive-only
/// dialects fail with [`ShimError::UnsupportedValue`] instead of silently
/// losing data.
pub fn to_wire(value: SqlValue<'static>, dialect: &Dialect) -> Result<SqlValue<'static>> {
    let coerced = match value {
        SqlValue::Bool(b) if !dialect.native_booleans => SqlValue::I32(i32::from(b)),
        SqlValue::I64(v) if dialect.integer_width == IntegerWidth::Int32 => {
            match i32::try_from(v) {
                Ok(narrow) => SqlValue::I32(narrow),
                Err(_) => {
                    return Err(ShimError::unsupported(format!(
                        "integer {v} exceeds the 32-bit width the {} driver can bind",
                        dialect.name
                    )))
                }
            }
        }
        SqlValue::DateTime(dt) => {
            SqlValue::DateTime(truncate_datetime(dt, dialect.timestamp_precision))
        }
        SqlValue::DateTimeTz(dt) => {
            if !dialect.tz_aware_timestamps {
                return Err(ShimError::unsupported(format!(
                    "the {} dialect stores naive timestamps only; cannot bind a \
                     timezone-aware datetime",
                    dialect.name
                )));
            }
            let nanos = subsecond_floor(dt.nanosecond(), dialect.timestamp_precision);
            SqlValue::DateTimeTz(dt.with_nanosecond(nanos).unwrap_or(dt))
        }
        SqlValue::Time(t) => {
            let t = truncate_time(t, dialect.timestamp_precision);
            if dialect.time_as_datetime {
                SqlValue::DateTime(time_anchor().and_time(t))
            } else {
                SqlValue::Time(t)
            }
        }
        other => other,
    };
    Ok(coerced)
}

/// Coerce a full parameter list for binding.
pub fn to_wire_params(
    params: &[SqlValue<'static>],
    dialect: &Dialect,
) -> Result<Vec<SqlValue<'static>>> {
    params
        .iter()
        .map(|p| to_wire(p.clone(), dialect))
        .collect()
}

/// Decode one raw column value using its declared metadata.
pub fn from_wire(value: SqlValue<'static>, meta: &ColumnMeta) -> SqlValue<'static> {
    if value.is_null() {
        return value;
    }
    match meta.type_code {
        WireTypeCode::Bit => decode_bool(value),
        WireTypeCode::Numeric => decode_numeric(value, meta),
        WireTypeCode::Float => decode_float(value),
        WireTypeCode::Real => decode_real(value),
        WireTypeCode::Char | WireTypeCode::VarChar | WireTypeCode::LongVarChar => {
            decode_text(value)
        }
        // SQL Server has no separate DATE/TIME storage types; both come back
        // as datetimes and the declared column type picks the part to keep.
        WireTypeCode::Date => match value {
            SqlValue::DateTime(dt) => SqlValue::Date(dt.date()),
            other => other,
        },
        WireTypeCode::Time => match value {
            SqlValue::DateTime(dt) => SqlValue::Time(dt.time()),
            other => other,
        },
        _ => value,
    }
}

/// Decode a fetched row in column order.
///
/// Columns beyond the metadata (or rows wider than the probe) pass through
/// unchanged rather than failing the whole fetch.
pub fn from_wire_row(
    row: Vec<SqlValue<'static>>,
    metas: &[ColumnMeta],
) -> Vec<SqlValue<'static>> {
    row.into_iter()
        .enumerate()
        .map(|(i, v)| match metas.get(i) {
            Some(meta) => from_wire(v, meta),
            None => v,
        })
        .collect()
}

fn decode_bool(value: SqlValue<'static>) -> SqlValue<'static> {
    match value {
        SqlValue::Bool(_) => value,
        SqlValue::I16(v) => SqlValue::Bool(v == 1),
        SqlValue::I32(v) => SqlValue::Bool(v == 1),
        SqlValue::I64(v) => SqlValue::Bool(v == 1),
        SqlValue::Text(s) => SqlValue::Bool(matches!(s.as_ref(), "1" | "t" | "true" | "True")),
        other => other,
    }
}

fn decode_numeric(value: SqlValue<'static>, meta: &ColumnMeta) -> SqlValue<'static> {
    // Oracle reports NUMBER columns with an internal scale of -127:
    // precision 0 is a decimal-precision value (sequence integers or
    // decimals, often delivered as text), anything else is binary-precision
    // floating point.
    if meta.scale == -127 {
        if meta.precision == 0 {
            return match value {
                SqlValue::Text(s) => parse_integer_or_decimal(&s)
                    .unwrap_or(SqlValue::Text(Cow::Owned(s.into_owned()))),
                other => other,
            };
        }
        return decode_float(value);
    }
    if meta.scale == 0 {
        match value {
            SqlValue::Decimal(d) => d.to_i64().map(SqlValue::I64).unwrap_or(SqlValue::Decimal(d)),
            SqlValue::Text(s) => s
                .parse::<i64>()
                .map(SqlValue::I64)
                .unwrap_or(SqlValue::Text(Cow::Owned(s.into_owned()))),
            other => other,
        }
    } else {
        match value {
            SqlValue::Text(s) => s
                .parse::<Decimal>()
                .map(SqlValue::Decimal)
                .unwrap_or(SqlValue::Text(Cow::Owned(s.into_owned()))),
            SqlValue::F64(f) => Decimal::from_f64(f)
                .map(SqlValue::Decimal)
                .unwrap_or(SqlValue::F64(f)),
            other => other,
        }
    }
}

fn parse_integer_or_decimal(s: &str) -> Option<SqlValue<'static>> {
    if s.contains('.') {
        s.parse::<Decimal>().ok().map(SqlValue::Decimal)
    } else {
        s.parse::<i64>().ok().map(SqlValue::I64)
    }
}

fn decode_float(value: SqlValue<'static>) -> SqlValue<'static> {
    match value {
        SqlValue::F32(v) => SqlValue::F64(f64::from(v)),
        SqlValue::I64(v) => SqlValue::F64(v as f64),
        SqlValue::Decimal(d) => d.to_f64().map(SqlValue::F64).unwrap_or(SqlValue::Decimal(d)),
        SqlValue::Text(s) => s
            .parse::<f64>()
            .map(SqlValue::F64)
            .unwrap_or(SqlValue::Text(Cow::Owned(s.into_owned()))),
        other => other,
    }
}

fn decode_real(value: SqlValue<'static>) -> SqlValue<'static> {
    match value {
        SqlValue::F64(v) => SqlValue::F32(v as f32),
        SqlValue::Text(s) => s
            .parse::<f32>()
            .map(SqlValue::F32)
            .unwrap_or(SqlValue::Text(Cow::Owned(s.into_owned()))),
        other => other,
    }
}

fn decode_text(value: SqlValue<'static>) -> SqlValue<'static> {
    match value {
        SqlValue::Text(_) => value,
        SqlValue::Bytes(b) => {
            SqlValue::Text(Cow::Owned(String::from_utf8_lossy(b.as_ref()).into_owned()))
        }
        other => other,
    }
}

fn subsecond_floor(nanos: u32, precision: TimestampPrecision) -> u32 {
    match precision {
        TimestampPrecision::Microseconds => nanos - nanos % 1_000,
        TimestampPrecision::Milliseconds => nanos - nanos % 1_000_000,
        TimestampPrecision::Seconds => 0,
    }
}

fn truncate_time(t: NaiveTime, precision: TimestampPrecision) -> NaiveTime {
    t.with_nanosecond(subsecond_floor(t.nanosecond(), precision))
        .unwrap_or(t)
}

fn truncate_datetime(dt: NaiveDateTime, precision: TimestampPrecision) -> NaiveDateTime {
    dt.with_nanosecond(subsecond_floor(dt.nanosecond(), precision))
        .unwrap_or(dt)
}

/// TIME values on datetime-only backends are anchored at this date.
fn time_anchor() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("constant date")
}
