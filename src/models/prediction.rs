use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::stop::{required_flag, Gender};

pub const MIN_DRIVER_AGE: i64 = 16;
pub const MAX_DRIVER_AGE: i64 = 100;

/// 相似度过滤条件
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub driver_gender: Gender,
    pub driver_age: i64,
    pub search_conducted: bool,
    pub drugs_related_stop: bool,
    pub stop_duration: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PredictionResult {
    pub predicted_violation: String,
    pub predicted_outcome: String,
    /// Number of historical stops the prediction was drawn from; 0 means fallback.
    pub matched_stops: usize,
}

impl PredictionResult {
    pub fn is_fallback(&self) -> bool {
        self.matched_stops == 0
    }
}

/// 新增巡逻日志表单
#[derive(Debug, Clone, Deserialize)]
pub struct NewStopLog {
    pub stop_date: NaiveDate,
    pub stop_time: NaiveTime,
    #[serde(default)]
    pub country_name: String,
    pub driver_gender: Gender,
    pub driver_age: i64,
    #[serde(default)]
    pub driver_race: String,
    #[serde(deserialize_with = "required_flag")]
    pub search_conducted: bool,
    #[serde(deserialize_with = "required_flag")]
    pub drugs_related_stop: bool,
    pub stop_duration: String,
    #[serde(default)]
    pub vehicle_number: String,
}

impl NewStopLog {
    pub fn criteria(&self) -> PredictionRequest {
        PredictionRequest {
            driver_gender: self.driver_gender,
            driver_age: self.driver_age,
            search_conducted: self.search_conducted,
            drugs_related_stop: self.drugs_related_stop,
            stop_duration: self.stop_duration.clone(),
        }
    }
}
