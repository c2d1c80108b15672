//! In-memory counterparts of the catalog's rate, bucketing, running-total
//! and ranking rules, evaluated over an already loaded snapshot.

use std::collections::{BTreeMap, HashMap};

use serde::{Serialize, Serializer};

use crate::models::stop::StopRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgeGroup {
    Under18,
    From18To25,
    From26To35,
    From36To50,
    Over50,
}

impl AgeGroup {
    /// 闭区间分组: <18, 18-25, 26-35, 36-50, 51+
    pub fn of(age: i64) -> Self {
        match age {
            i64::MIN..=17 => AgeGroup::Under18,
            18..=25 => AgeGroup::From18To25,
            26..=35 => AgeGroup::From26To35,
            36..=50 => AgeGroup::From36To50,
            _ => AgeGroup::Over50,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under18 => "<18",
            AgeGroup::From18To25 => "18-25",
            AgeGroup::From26To35 => "26-35",
            AgeGroup::From36To50 => "36-50",
            AgeGroup::Over50 => "51+",
        }
    }
}

// JSON 中直接输出分组标签
impl Serialize for AgeGroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TimePeriod {
    Day,
    Night,
}

impl TimePeriod {
    /// Night is 20:00 through 04:59 on the stored 24-hour clock.
    pub fn of_hour(hour: u32) -> Self {
        if hour >= 20 || hour < 5 {
            TimePeriod::Night
        } else {
            TimePeriod::Day
        }
    }
}

/// `round(100 * conditional / total, 2)`; `None` when there is nothing to divide by.
pub fn rate_percent(conditional: u64, total: u64) -> Option<f64> {
    if total == 0 {
        return None;
    }
    let pct = 100.0 * conditional as f64 / total as f64;
    Some((pct * 100.0).round() / 100.0)
}

/// Prefix sums in input order.
pub fn cumulative_sums(values: &[u64]) -> Vec<u64> {
    values
        .iter()
        .scan(0u64, |acc, v| {
            *acc += v;
            Some(*acc)
        })
        .collect()
}

/// Standard (competition) rank, highest value first: ties share a rank and
/// the next distinct value skips ahead.
pub fn standard_rank(values: &[f64]) -> Vec<usize> {
    values
        .iter()
        .map(|v| 1 + values.iter().filter(|other| *other > v).count())
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AgeGroupArrests {
    pub age_group: AgeGroup,
    pub arrest_count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PeriodArrests {
    pub time_period: TimePeriod,
    pub total_stops: u64,
    pub arrest_count: u64,
    pub arrest_rate_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CountryYear {
    pub country_name: Option<String>,
    pub stop_year: Option<i32>,
    pub total_stops: u64,
    pub total_arrests: u64,
    pub cumulative_stops: u64,
    pub cumulative_arrests: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ViolationRank {
    pub violation: Option<String>,
    pub total_stops: u64,
    pub searches: u64,
    pub arrests: u64,
    pub search_rate_percent: Option<f64>,
    pub arrest_rate_percent: Option<f64>,
    pub arrest_rank: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SnapshotInsights {
    pub arrests_by_age_group: Vec<AgeGroupArrests>,
    pub arrests_by_time_period: Vec<PeriodArrests>,
    pub yearly_by_country: Vec<CountryYear>,
    pub violations_by_arrest_rank: Vec<ViolationRank>,
}

impl SnapshotInsights {
    pub fn compute(records: &[StopRecord]) -> Self {
        Self {
            arrests_by_age_group: arrests_by_age_group(records),
            arrests_by_time_period: arrests_by_time_period(records),
            yearly_by_country: yearly_by_country(records),
            violations_by_arrest_rank: violations_by_arrest_rank(records),
        }
    }
}

/// Arrested drivers of known age per age group, most arrests first.
pub fn arrests_by_age_group(records: &[StopRecord]) -> Vec<AgeGroupArrests> {
    let mut counts: BTreeMap<AgeGroup, u64> = BTreeMap::new();
    for r in records.iter().filter(|r| r.is_arrest()) {
        if let Some(age) = r.driver_age {
            *counts.entry(AgeGroup::of(age)).or_default() += 1;
        }
    }
    let mut out: Vec<_> = counts
        .into_iter()
        .map(|(age_group, arrest_count)| AgeGroupArrests { age_group, arrest_count })
        .collect();
    out.sort_by(|a, b| b.arrest_count.cmp(&a.arrest_count));
    out
}

/// 无法解析时间的记录归入 Day，与 SQL 中 CASE 的 ELSE 分支一致
pub fn arrests_by_time_period(records: &[StopRecord]) -> Vec<PeriodArrests> {
    let mut counts: BTreeMap<TimePeriod, (u64, u64)> = BTreeMap::new();
    for r in records {
        let period = r.hour().map(TimePeriod::of_hour).unwrap_or(TimePeriod::Day);
        let entry = counts.entry(period).or_default();
        entry.0 += 1;
        if r.is_arrest() {
            entry.1 += 1;
        }
    }
    counts
        .into_iter()
        .map(|(time_period, (total_stops, arrest_count))| PeriodArrests {
            time_period,
            total_stops,
            arrest_count,
            arrest_rate_percent: rate_percent(arrest_count, total_stops),
        })
        .collect()
}

/// Yearly totals per country with running totals, ordered by country then year.
pub fn yearly_by_country(records: &[StopRecord]) -> Vec<CountryYear> {
    let mut yearly: BTreeMap<(Option<String>, Option<i32>), (u64, u64)> = BTreeMap::new();
    for r in records {
        let entry = yearly.entry((r.country_name.clone(), r.year())).or_default();
        entry.0 += 1;
        if r.is_arrest() {
            entry.1 += 1;
        }
    }

    let mut out: Vec<CountryYear> = Vec::with_capacity(yearly.len());
    let mut partition: Vec<((Option<String>, Option<i32>), (u64, u64))> = Vec::new();
    let mut flush = |partition: &mut Vec<((Option<String>, Option<i32>), (u64, u64))>| {
        let stops: Vec<u64> = partition.iter().map(|(_, t)| t.0).collect();
        let arrests: Vec<u64> = partition.iter().map(|(_, t)| t.1).collect();
        let cum_stops = cumulative_sums(&stops);
        let cum_arrests = cumulative_sums(&arrests);
        for (i, ((country_name, stop_year), (total_stops, total_arrests))) in
            partition.drain(..).enumerate()
        {
            out.push(CountryYear {
                country_name,
                stop_year,
                total_stops,
                total_arrests,
                cumulative_stops: cum_stops[i],
                cumulative_arrests: cum_arrests[i],
            });
        }
    };

    for (key, totals) in yearly {
        if partition.last().is_some_and(|((country, _), _)| *country != key.0) {
            flush(&mut partition);
        }
        partition.push((key, totals));
    }
    flush(&mut partition);
    out
}

/// Violations with search and arrest rates, ranked by arrest rate (ties share a rank).
pub fn violations_by_arrest_rank(records: &[StopRecord]) -> Vec<ViolationRank> {
    // 保持首次出现的顺序，便于并列名次稳定输出
    let mut index: HashMap<Option<&str>, usize> = HashMap::new();
    let mut groups: Vec<(Option<&str>, u64, u64, u64)> = Vec::new();
    for r in records {
        let key = r.violation.as_deref();
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key, 0, 0, 0));
            groups.len() - 1
        });
        let g = &mut groups[slot];
        g.1 += 1;
        if r.was_searched() {
            g.2 += 1;
        }
        if r.is_arrest() {
            g.3 += 1;
        }
    }

    let arrest_rates: Vec<f64> = groups
        .iter()
        .map(|(_, total, _, arrests)| rate_percent(*arrests, *total).unwrap_or(0.0))
        .collect();
    let ranks = standard_rank(&arrest_rates);

    let mut out: Vec<ViolationRank> = groups
        .into_iter()
        .zip(ranks)
        .map(|((violation, total_stops, searches, arrests), arrest_rank)| ViolationRank {
            violation: violation.map(str::to_string),
            total_stops,
            searches,
            arrests,
            search_rate_percent: rate_percent(searches, total_stops),
            arrest_rate_percent: rate_percent(arrests, total_stops),
            arrest_rank,
        })
        .collect();
    out.sort_by_key(|v| v.arrest_rank);
    out
}
