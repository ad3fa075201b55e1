use crate::error::{AppError, AppResult};
use serde_json::Value;
use sqlx::MySqlPool;

/// A value bound into a dynamic UPDATE.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    String(String),
    I64(i64),
    Null,
}

/// A parameterised `UPDATE` statement and its bindings, in order.
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Builds `UPDATE <table> SET a = ?, b = ? WHERE <id_column> = ?` from a JSON
/// object. Only keys listed in `allowed` may appear; anything else is a
/// validation error rather than being silently dropped.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    allowed: &[&str],
    id_column: &str,
    id_value: u64,
) -> AppResult<SqlUpdate> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::Validation("payload must be a JSON object".to_string()))?;

    if obj.is_empty() {
        return Err(AppError::Validation("no fields provided for update".to_string()));
    }

    if let Some(unknown) = obj.keys().find(|k| !allowed.contains(&k.as_str())) {
        return Err(AppError::Validation(format!("field `{unknown}` cannot be updated")));
    }

    // Column names come from `allowed`, never from the payload.
    let mut columns = Vec::with_capacity(obj.len());
    let mut values = Vec::with_capacity(obj.len() + 1);

    for column in allowed {
        let Some(value) = obj.get(*column) else {
            continue;
        };
        let bound = match value {
            Value::String(s) => SqlValue::String(s.clone()),
            Value::Number(n) => SqlValue::I64(n.as_i64().ok_or_else(|| {
                AppError::Validation(format!("field `{column}` must be an integer"))
            })?),
            Value::Null => SqlValue::Null,
            _ => {
                return Err(AppError::Validation(format!(
                    "field `{column}` has an unsupported type"
                )));
            }
        };
        columns.push(format!("{column} = ?"));
        values.push(bound);
    }

    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        table,
        columns.join(", "),
        id_column
    );
    values.push(SqlValue::I64(id_value as i64));

    Ok(SqlUpdate { sql, values })
}

pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
