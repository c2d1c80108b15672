use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{json, Map, Value};
use sqlx::mysql::MySqlRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, TypeInfo, ValueRef};

// 核心转换函数：按数据库原生类型名解码每一列
// 列按下标读取，聚合查询里重名的列也不会互相覆盖取值

pub fn mysql_row_to_json(row: &MySqlRow) -> Map<String, Value> {
    let mut map = Map::new();

    for (idx, col) in row.columns().iter().enumerate() {
        let val = match col.type_info().name() {
            "BOOLEAN" => json!(row.try_get::<Option<bool>, _>(idx).unwrap_or(None).map(u8::from)),
            "TINYINT" | "SMALLINT" | "INT" | "MEDIUMINT" | "BIGINT" => {
                json!(row.try_get::<Option<i64>, _>(idx).unwrap_or(None))
            }
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "INT UNSIGNED" | "MEDIUMINT UNSIGNED"
            | "BIGINT UNSIGNED" => json!(row.try_get::<Option<u64>, _>(idx).unwrap_or(None)),
            "FLOAT" => json!(row.try_get::<Option<f32>, _>(idx).unwrap_or(None)),
            "DOUBLE" => json!(row.try_get::<Option<f64>, _>(idx).unwrap_or(None)),
            // SUM(CASE ...) 与 ROUND(...) 在 MySQL 中返回 DECIMAL
            "DECIMAL" | "NEWDECIMAL" => {
                decimal_json(row.try_get::<Option<Decimal>, _>(idx).unwrap_or(None))
            }
            "DATE" => json!(row
                .try_get::<Option<NaiveDate>, _>(idx)
                .unwrap_or(None)
                .map(|d| d.to_string())),
            "TIME" => json!(row
                .try_get::<Option<NaiveTime>, _>(idx)
                .unwrap_or(None)
                .map(|t| t.format("%H:%M:%S").to_string())),
            "DATETIME" | "TIMESTAMP" => json!(row
                .try_get::<Option<NaiveDateTime>, _>(idx)
                .unwrap_or(None)
                .map(|dt| dt.to_string())),
            _ => json!(row.try_get::<Option<String>, _>(idx).unwrap_or(None)),
        };
        map.insert(col.name().to_string(), val);
    }

    map
}

/// SQLite 列的声明类型对表达式列不可靠，这里按每个值的实际存储类型解码。
pub fn sqlite_row_to_json(row: &SqliteRow) -> Map<String, Value> {
    let mut map = Map::new();

    for (idx, col) in row.columns().iter().enumerate() {
        let storage = match row.try_get_raw(idx) {
            Ok(raw) if raw.is_null() => None,
            Ok(raw) => Some(raw.type_info().name().to_string()),
            Err(_) => None,
        };
        let val = match storage.as_deref() {
            None => Value::Null,
            Some("INTEGER") | Some("BOOLEAN") => {
                json!(row.try_get::<Option<i64>, _>(idx).unwrap_or(None))
            }
            Some("REAL") => json!(row.try_get::<Option<f64>, _>(idx).unwrap_or(None)),
            _ => json!(row.try_get::<Option<String>, _>(idx).unwrap_or(None)),
        };
        map.insert(col.name().to_string(), val);
    }

    map
}

fn decimal_json(v: Option<Decimal>) -> Value {
    // 比率字段已在 SQL 中 ROUND 到两位小数，f64 足够
    json!(v.map(|d| d.to_f64().unwrap_or(0.0)))
}
