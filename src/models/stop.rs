use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::table::{Row, Table};

/// 快照与全部预置查询共用的表
pub const STOPS_TABLE: &str = "traffic_stop";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Male, Gender::Female];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

/// traffic_stop 表中的一行。
///
/// Every field is optional and decoded leniently, so a row of any shape
/// still produces a record and the snapshot length always matches the table.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StopRecord {
    #[serde(default, deserialize_with = "lenient_text")]
    pub stop_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub stop_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub country_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub driver_gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_age")]
    pub driver_age: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub driver_race: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub search_conducted: Option<bool>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub drugs_related_stop: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub stop_duration: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub stop_outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub violation: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub vehicle_number: Option<String>,
}

impl StopRecord {
    pub fn from_row(row: &Row) -> Self {
        match StopRecord::deserialize(&Value::Object(row.clone())) {
            Ok(record) => record,
            Err(e) => {
                warn!("无法解析 traffic_stop 行, 使用空记录: {}", e);
                StopRecord::default()
            }
        }
    }

    fn date(&self) -> Option<NaiveDate> {
        let raw = self.stop_date.as_deref()?.trim();
        // DATETIME 值也接受，只取日期部分
        let head = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
    }

    fn time(&self) -> Option<NaiveTime> {
        let raw = self.stop_time.as_deref()?.trim();
        NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
            .ok()
    }

    pub fn year(&self) -> Option<i32> {
        self.date().map(|d| d.year())
    }

    pub fn hour(&self) -> Option<u32> {
        self.time().map(|t| t.hour())
    }

    /// Equality test the catalog statements use (`stop_outcome = 'Arrest'`),
    /// case-insensitive like the store's default collation.
    pub fn is_arrest(&self) -> bool {
        self.stop_outcome
            .as_deref()
            .is_some_and(|o| o.trim_end().eq_ignore_ascii_case("arrest"))
    }

    pub fn was_searched(&self) -> bool {
        self.search_conducted == Some(true)
    }

    pub fn was_drug_related(&self) -> bool {
        self.drugs_related_stop == Some(true)
    }
}

/// Decodes every row of a `SELECT * FROM traffic_stop` result, keeping row order.
pub fn records_from(table: &Table) -> Vec<StopRecord> {
    table.rows.iter().map(StopRecord::from_row).collect()
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn lenient_age<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let age = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    };
    Ok(age.filter(|a| *a >= 0))
}

/// Strict flag decoding for user input: 0/1, booleans or their text forms.
pub fn required_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_flag(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected 0, 1, true or false"))
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => Some(b),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "0" | "false" => Some(false),
            "1" | "true" => Some(true),
            _ => None,
        },
        _ => None,
    })
}
