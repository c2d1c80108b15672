use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown query label: {0}")]
    UnknownLabel(String),
    #[error("no query at position {0}")]
    IndexOutOfRange(usize),
}

#[derive(Debug, Clone, Copy)]
pub struct QueryEntry {
    pub label: &'static str,
    pub statement: &'static str,
}

/// 预置分析查询，顺序即菜单顺序
///
/// Rates are `ROUND(100.0 * conditional / COUNT(*), 2)`; `NULLIF` keeps an
/// empty group from dividing by zero.
static ENTRIES: [QueryEntry; 19] = [
    QueryEntry {
        label: "1. Top 10 vehicle numbers involved in drug-related stops",
        statement: r#"
            SELECT vehicle_number, COUNT(*) AS stop_count
            FROM traffic_stop
            WHERE drugs_related_stop = 1
            GROUP BY vehicle_number
            ORDER BY stop_count DESC
            LIMIT 10
        "#,
    },
    QueryEntry {
        label: "2. Top 10 vehicles most frequently searched",
        statement: r#"
            SELECT vehicle_number, COUNT(*) AS search_count
            FROM traffic_stop
            WHERE search_conducted = 1
            GROUP BY vehicle_number
            ORDER BY search_count DESC
            LIMIT 10
        "#,
    },
    QueryEntry {
        label: "3. Driver age group with the highest arrest rate",
        statement: r#"
            SELECT
                CASE
                    WHEN driver_age < 18 THEN '<18'
                    WHEN driver_age BETWEEN 18 AND 25 THEN '18-25'
                    WHEN driver_age BETWEEN 26 AND 35 THEN '26-35'
                    WHEN driver_age BETWEEN 36 AND 50 THEN '36-50'
                    ELSE '51+'
                END AS age_group,
                COUNT(*) AS arrest_count
            FROM traffic_stop
            WHERE stop_outcome = 'Arrest' AND driver_age IS NOT NULL
            GROUP BY age_group
            ORDER BY arrest_count DESC
        "#,
    },
    QueryEntry {
        label: "4. Gender distribution of drivers stopped by country",
        statement: r#"
            SELECT country_name, driver_gender, COUNT(*) AS stop_count
            FROM traffic_stop
            WHERE driver_gender IS NOT NULL AND country_name IS NOT NULL
            GROUP BY country_name, driver_gender
            ORDER BY country_name, stop_count DESC
        "#,
    },
    QueryEntry {
        label: "5. Race and gender combination with the highest search rate",
        statement: r#"
            SELECT
                driver_race,
                driver_gender,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN search_conducted = 1 THEN 1 ELSE 0 END) AS total_searches
            FROM traffic_stop
            GROUP BY driver_race, driver_gender
            ORDER BY total_searches DESC
        "#,
    },
    QueryEntry {
        label: "6. Time of day with the most traffic stops (by hour)",
        statement: r#"
            SELECT HOUR(stop_time) AS stop_hour, COUNT(*) AS stop_count
            FROM traffic_stop
            GROUP BY stop_hour
            ORDER BY stop_count DESC
        "#,
    },
    QueryEntry {
        label: "7. Are stops at night more likely to lead to arrests?",
        statement: r#"
            SELECT
                CASE
                    WHEN HOUR(stop_time) >= 20 OR HOUR(stop_time) < 5 THEN 'Night'
                    ELSE 'Day'
                END AS time_period,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS arrest_count,
                ROUND(100.0 * SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS arrest_rate_percent
            FROM traffic_stop
            GROUP BY time_period
        "#,
    },
    QueryEntry {
        label: "8. Violations most associated with searches or arrests",
        statement: r#"
            SELECT
                violation,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN search_conducted = 1 THEN 1 ELSE 0 END) AS searches,
                SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS arrests
            FROM traffic_stop
            GROUP BY violation
            ORDER BY searches DESC, arrests DESC
        "#,
    },
    QueryEntry {
        label: "9. Most common violations among younger drivers (<25)",
        statement: r#"
            SELECT violation, COUNT(*) AS total_stops
            FROM traffic_stop
            WHERE driver_age < 25
            GROUP BY violation
            ORDER BY total_stops DESC
        "#,
    },
    QueryEntry {
        label: "10. Violations rarely resulting in search or arrest (low rates)",
        statement: r#"
            SELECT
                violation,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN search_conducted = 1 THEN 1 ELSE 0 END) AS searches,
                SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS arrests,
                ROUND(100.0 * SUM(CASE WHEN search_conducted = 1 THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS search_rate_percent,
                ROUND(100.0 * SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS arrest_rate_percent
            FROM traffic_stop
            GROUP BY violation
            ORDER BY search_rate_percent ASC, arrest_rate_percent ASC
        "#,
    },
    QueryEntry {
        label: "11. Countries with highest rate of drug-related stops",
        statement: r#"
            SELECT
                country_name,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN drugs_related_stop = 1 THEN 1 ELSE 0 END) AS drug_stops,
                ROUND(100.0 * SUM(CASE WHEN drugs_related_stop = 1 THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS drug_stop_rate_percent
            FROM traffic_stop
            GROUP BY country_name
            ORDER BY drug_stop_rate_percent DESC
        "#,
    },
    QueryEntry {
        label: "12. Arrest rate by country and violation",
        statement: r#"
            SELECT
                country_name,
                violation,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS arrests,
                ROUND(100.0 * SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS arrest_rate_percent
            FROM traffic_stop
            GROUP BY country_name, violation
            ORDER BY arrest_rate_percent DESC
        "#,
    },
    QueryEntry {
        label: "13. Countries with the most stops where a search was conducted",
        statement: r#"
            SELECT country_name, COUNT(*) AS total_search_stops
            FROM traffic_stop
            WHERE search_conducted = 1
            GROUP BY country_name
            ORDER BY total_search_stops DESC
        "#,
    },
    QueryEntry {
        label: "14. Yearly breakdown of stops and arrests by country (with cumulative sums)",
        statement: r#"
            WITH yearly_data AS (
                SELECT
                    country_name,
                    YEAR(stop_date) AS stop_year,
                    COUNT(*) AS total_stops,
                    SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS total_arrests
                FROM traffic_stop
                GROUP BY country_name, YEAR(stop_date)
            )
            SELECT
                country_name,
                stop_year,
                total_stops,
                total_arrests,
                SUM(total_stops) OVER (PARTITION BY country_name ORDER BY stop_year) AS cumulative_stops,
                SUM(total_arrests) OVER (PARTITION BY country_name ORDER BY stop_year) AS cumulative_arrests
            FROM yearly_data
            ORDER BY country_name, stop_year
        "#,
    },
    QueryEntry {
        label: "15. Driver violation trends by age group and race",
        statement: r#"
            SELECT
                CASE
                    WHEN driver_age < 18 THEN '<18'
                    WHEN driver_age BETWEEN 18 AND 25 THEN '18-25'
                    WHEN driver_age BETWEEN 26 AND 35 THEN '26-35'
                    WHEN driver_age BETWEEN 36 AND 50 THEN '36-50'
                    ELSE '51+'
                END AS age_group,
                driver_race,
                violation,
                COUNT(*) AS violation_count
            FROM traffic_stop
            GROUP BY age_group, driver_race, violation
            ORDER BY age_group, driver_race, violation_count DESC
        "#,
    },
    QueryEntry {
        label: "16. Number of stops by year, month, and hour of the day",
        statement: r#"
            SELECT
                YEAR(stop_date) AS stop_year,
                MONTH(stop_date) AS stop_month,
                HOUR(stop_time) AS stop_hour,
                COUNT(*) AS total_stops
            FROM traffic_stop
            GROUP BY stop_year, stop_month, stop_hour
            ORDER BY stop_year, stop_month, stop_hour
        "#,
    },
    QueryEntry {
        label: "17. Violations with highest search and arrest rates, ranked by arrest rate",
        statement: r#"
            SELECT
                violation,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN search_conducted = 1 THEN 1 ELSE 0 END) AS searches,
                SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS arrests,
                ROUND(100.0 * SUM(CASE WHEN search_conducted = 1 THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS search_rate_percent,
                ROUND(100.0 * SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS arrest_rate_percent,
                RANK() OVER (
                    ORDER BY ROUND(100.0 * SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END)
                                   / NULLIF(COUNT(*), 0), 2) DESC
                ) AS arrest_rank
            FROM traffic_stop
            GROUP BY violation
            ORDER BY arrest_rank
        "#,
    },
    QueryEntry {
        label: "18. Driver demographics by country (age group, gender, race)",
        statement: r#"
            SELECT
                country_name,
                CASE
                    WHEN driver_age < 18 THEN '<18'
                    WHEN driver_age BETWEEN 18 AND 25 THEN '18-25'
                    WHEN driver_age BETWEEN 26 AND 35 THEN '26-35'
                    WHEN driver_age BETWEEN 36 AND 50 THEN '36-50'
                    ELSE '51+'
                END AS age_group,
                driver_gender,
                driver_race,
                COUNT(*) AS driver_count
            FROM traffic_stop
            GROUP BY country_name, age_group, driver_gender, driver_race
            ORDER BY country_name, age_group, driver_gender, driver_race
        "#,
    },
    QueryEntry {
        label: "19. Top 5 violations with the highest arrest rates",
        statement: r#"
            SELECT
                violation,
                COUNT(*) AS total_stops,
                SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END) AS total_arrests,
                ROUND(100.0 * SUM(CASE WHEN stop_outcome = 'Arrest' THEN 1 ELSE 0 END)
                      / NULLIF(COUNT(*), 0), 2) AS arrest_rate_percent
            FROM traffic_stop
            GROUP BY violation
            ORDER BY arrest_rate_percent DESC
            LIMIT 5
        "#,
    },
];

/// Read-only view over the built-in query list.
#[derive(Debug, Clone, Copy)]
pub struct QueryCatalog {
    entries: &'static [QueryEntry],
}

impl QueryCatalog {
    pub fn builtin() -> Self {
        Self { entries: &ENTRIES }
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.label).collect()
    }

    pub fn statement_for(&self, label: &str) -> Result<&'static str, CatalogError> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.statement)
            .ok_or_else(|| CatalogError::UnknownLabel(label.to_string()))
    }

    /// 下拉框按位置选择时使用
    pub fn entry_at(&self, index: usize) -> Result<&'static QueryEntry, CatalogError> {
        self.entries
            .get(index)
            .ok_or(CatalogError::IndexOutOfRange(index))
    }
}
