//! `tokio-postgres` execution backend.
//!
//! [`Value`] binds as a Postgres parameter, adapting integers and floats to
//! the width the server declared for the placeholder, and result rows are
//! decoded by column type into [`Row`]s.
//!
//! Text-like columns decode as [`Value::Text`], as do `DATE` and `TIME` (ISO
//! format). Types with no [`Value`] counterpart, such as `NUMERIC`,
//! `INTERVAL` and arrays, fail with a decode error; cast them to `text` in
//! the query.

use crate::client::{ExecResult, Executor};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type};

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql_checked(ty, out),
            Value::Int(v) => match *ty {
                Type::INT2 => i16::try_from(*v)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*v)?.to_sql(ty, out),
                Type::OID => u32::try_from(*v)?.to_sql(ty, out),
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                Type::FLOAT8 => (*v as f64).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Float(v) => match *ty {
                Type::FLOAT4 => (*v as f32).to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Text(v) => v.to_sql_checked(ty, out),
            Value::Bytes(v) => v.to_sql_checked(ty, out),
            Value::Json(v) => v.to_sql_checked(ty, out),
            Value::Timestamp(v) => match *ty {
                Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
                _ => v.to_sql_checked(ty, out),
            },
            Value::Uuid(v) => v.to_sql_checked(ty, out),
        }
    }

    // Each variant checks the declared type itself.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn get<'a, T: FromSql<'a>>(row: &'a tokio_postgres::Row, idx: usize) -> OrmResult<Option<T>> {
    row.try_get(idx)
        .map_err(|e| OrmError::decode(row.columns()[idx].name(), e.to_string()))
}

/// Error for a column type that has no [`Value`] mapping and is not text.
fn unsupported_type(column: &str, ty: &Type) -> Option<OrmError> {
    if <String as FromSql>::accepts(ty) {
        return None;
    }
    Some(OrmError::decode(
        column,
        format!("unsupported column type `{ty}`; cast it with `::text`"),
    ))
}

fn decode_column(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_().clone();
    let value = match ty {
        Type::BOOL => get::<bool>(row, idx)?.map(Value::Bool),
        Type::INT2 => get::<i16>(row, idx)?.map(Value::from),
        Type::INT4 => get::<i32>(row, idx)?.map(Value::from),
        Type::INT8 => get::<i64>(row, idx)?.map(Value::Int),
        Type::OID => get::<u32>(row, idx)?.map(Value::from),
        Type::FLOAT4 => get::<f32>(row, idx)?.map(Value::from),
        Type::FLOAT8 => get::<f64>(row, idx)?.map(Value::Float),
        Type::BYTEA => get::<Vec<u8>>(row, idx)?.map(Value::Bytes),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx)?.map(Value::Json),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx)?.map(Value::Timestamp),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx)?.map(|t| Value::Timestamp(t.and_utc())),
        Type::UUID => get::<uuid::Uuid>(row, idx)?.map(Value::Uuid),
        Type::DATE => get::<NaiveDate>(row, idx)?.map(|d| Value::Text(d.to_string())),
        Type::TIME => get::<NaiveTime>(row, idx)?.map(|t| Value::Text(t.to_string())),
        _ => {
            if let Some(err) = unsupported_type(column.name(), &ty) {
                return Err(err);
            }
            get::<String>(row, idx)?.map(Value::Text)
        }
    };
    Ok(value.unwrap_or(Value::Null))
}

/// Convert driver rows, sharing one column list across them.
fn convert_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Row>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|c| c.name().to_string())
        .collect();
    rows.iter()
        .map(|row| {
            let values = (0..row.len())
                .map(|idx| decode_column(row, idx))
                .collect::<OrmResult<Vec<_>>>()?;
            Ok(Row::new(Arc::clone(&columns), values))
        })
        .collect()
}

fn params(args: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    args.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Executor for tokio_postgres::Client {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &params(args))
            .await
            .map_err(OrmError::from_db_error)?;
        convert_rows(rows)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        tokio_postgres::Client::execute(self, sql, &params(args))
            .await
            .map(ExecResult::new)
            .map_err(OrmError::from_db_error)
    }
}

impl Executor for tokio_postgres::Transaction<'_> {
    async fn query(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &params(args))
            .await
            .map_err(OrmError::from_db_error)?;
        convert_rows(rows)
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> OrmResult<ExecResult> {
        tokio_postgres::Transaction::execute(self, sql, &params(args))
            .await
            .map(ExecResult::new)
            .map_err(OrmError::from_db_error)
    }
}
