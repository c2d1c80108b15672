use std::collections::HashMap;

use tracing::{debug, instrument};

use crate::models::prediction::{NewStopLog, PredictionRequest, PredictionResult};
use crate::models::stop::StopRecord;

pub const FALLBACK_OUTCOME: &str = "warning";
pub const FALLBACK_VIOLATION: &str = "speeding";
pub const AGE_TOLERANCE: i64 = 2;

fn is_similar(record: &StopRecord, req: &PredictionRequest) -> bool {
    record.driver_gender.as_deref() == Some(req.driver_gender.as_str())
        && record
            .driver_age
            .is_some_and(|age| (age - req.driver_age).abs() <= AGE_TOLERANCE)
        && record.search_conducted == Some(req.search_conducted)
        && record.stop_duration.as_deref() == Some(req.stop_duration.as_str())
        && record.drugs_related_stop == Some(req.drugs_related_stop)
}

/// 众数；并列时取最先出现的值，空值忽略
pub fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut counts: HashMap<&'a str, (usize, usize)> = HashMap::new();
    for (pos, v) in values.into_iter().flatten().enumerate() {
        counts.entry(v).or_insert((0, pos)).0 += 1;
    }
    counts
        .into_iter()
        .max_by(|(_, (ca, pa)), (_, (cb, pb))| ca.cmp(cb).then(pb.cmp(pa)))
        .map(|(v, _)| v)
}

/// Nearest-neighbourhood lookup: the most frequent outcome and violation among
/// stops with the same gender, search, drug and duration values and an age
/// within two years. Never fails; no similar stops yields the fixed fallback.
#[instrument(skip_all, fields(gender = req.driver_gender.as_str(), age = req.driver_age))]
pub fn predict(req: &PredictionRequest, records: &[StopRecord]) -> PredictionResult {
    let similar: Vec<&StopRecord> = records.iter().filter(|r| is_similar(r, req)).collect();
    debug!("相似记录数: {}", similar.len());

    let outcome = mode(similar.iter().map(|r| r.stop_outcome.as_deref()));
    let violation = mode(similar.iter().map(|r| r.violation.as_deref()));

    PredictionResult {
        predicted_violation: violation.unwrap_or(FALLBACK_VIOLATION).to_string(),
        predicted_outcome: outcome.unwrap_or(FALLBACK_OUTCOME).to_string(),
        matched_stops: similar.len(),
    }
}

/// Narrative shown under the prediction.
pub fn render_summary(log: &NewStopLog, result: &PredictionResult) -> String {
    let search_text = if log.search_conducted {
        "A search was conducted"
    } else {
        "No search was conducted"
    };
    let drug_text = if log.drugs_related_stop {
        "was drug-related"
    } else {
        "was not drug-related"
    };

    format!(
        "Predicted Violation: {violation}\n\
         Predicted Stop Outcome: {outcome}\n\
         A {age}-year-old {gender} driver in {country} was stopped at {time} on {date}.\n\
         {search_text}, and the stop {drug_text}.\n\
         Driver Race: {race}\n\
         Stop Duration: {duration}\n\
         Vehicle Number: {vehicle}",
        violation = result.predicted_violation,
        outcome = result.predicted_outcome,
        age = log.driver_age,
        gender = log.driver_gender.as_str(),
        country = log.country_name,
        time = log.stop_time.format("%I:%M %p"),
        date = log.stop_date,
        race = log.driver_race,
        duration = log.stop_duration,
        vehicle = log.vehicle_number,
    )
}
