//! Shared fixtures: a throwaway SQLite `traffic_stop` database per test.

use std::path::{Path, PathBuf};

use sqlx::{Connection, SqliteConnection};

use crate::models::stop::STOPS_TABLE;

pub fn unique_temp_db_path() -> PathBuf {
    std::env::temp_dir().join(format!("securecheck-{}.sqlite3", uuid::Uuid::new_v4()))
}

/// 测试数据库文件；drop 时连同 WAL/SHM 旁路文件一起删除
#[derive(Debug)]
pub struct TestDb {
    path: PathBuf,
    pub url: String,
}

impl TestDb {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TestDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm", "-journal"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeedStop {
    pub stop_date: String,
    pub stop_time: String,
    pub country_name: String,
    pub driver_gender: String,
    pub driver_age: Option<i64>,
    pub driver_race: String,
    pub search_conducted: i64,
    pub drugs_related_stop: i64,
    pub stop_duration: String,
    pub stop_outcome: String,
    pub violation: String,
    pub vehicle_number: String,
}

impl SeedStop {
    pub fn new(gender: &str, age: i64, violation: &str, outcome: &str) -> Self {
        Self {
            stop_date: "2020-01-05".to_string(),
            stop_time: "10:00:00".to_string(),
            country_name: "Canada".to_string(),
            driver_gender: gender.to_string(),
            driver_age: Some(age),
            driver_race: "Asian".to_string(),
            search_conducted: 0,
            drugs_related_stop: 0,
            stop_duration: "0-15 Min".to_string(),
            stop_outcome: outcome.to_string(),
            violation: violation.to_string(),
            vehicle_number: "AB1234".to_string(),
        }
    }

    pub fn searched(mut self) -> Self {
        self.search_conducted = 1;
        self
    }

    pub fn drug_related(mut self) -> Self {
        self.drugs_related_stop = 1;
        self
    }

    pub fn duration(mut self, duration: &str) -> Self {
        self.stop_duration = duration.to_string();
        self
    }
}

/// Creates a fresh database file holding `stops`; the file lives as long as the guard.
pub async fn seed_stops_db(stops: &[SeedStop]) -> TestDb {
    let path = unique_temp_db_path();
    let db = TestDb {
        url: format!("sqlite://{}", path.display()),
        path,
    };
    let mut conn = SqliteConnection::connect(&format!("{}?mode=rwc", db.url))
        .await
        .unwrap_or_else(|err| panic!("failed to create test database: {err}"));

    sqlx::query(&format!(
        "CREATE TABLE {STOPS_TABLE} (
            stop_date TEXT, stop_time TEXT, country_name TEXT, driver_gender TEXT,
            driver_age INTEGER, driver_race TEXT, search_conducted INTEGER,
            drugs_related_stop INTEGER, stop_duration TEXT, stop_outcome TEXT,
            violation TEXT, vehicle_number TEXT
        )"
    ))
    .execute(&mut conn)
    .await
    .unwrap_or_else(|err| panic!("failed to create {STOPS_TABLE}: {err}"));

    let insert = format!("INSERT INTO {STOPS_TABLE} VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)");
    for s in stops {
        sqlx::query(&insert)
            .bind(&s.stop_date)
            .bind(&s.stop_time)
            .bind(&s.country_name)
            .bind(&s.driver_gender)
            .bind(s.driver_age)
            .bind(&s.driver_race)
            .bind(s.search_conducted)
            .bind(s.drugs_related_stop)
            .bind(&s.stop_duration)
            .bind(&s.stop_outcome)
            .bind(&s.violation)
            .bind(&s.vehicle_number)
            .execute(&mut conn)
            .await
            .unwrap_or_else(|err| panic!("failed to seed {STOPS_TABLE}: {err}"));
    }

    if let Err(err) = conn.close().await {
        panic!("failed to close seed connection: {err}");
    }
    db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn database_file_is_removed_with_the_guard() {
        let db = seed_stops_db(&[SeedStop::new("male", 27, "Speeding", "Warning")]).await;
        let path = db.path().to_path_buf();
        assert!(path.exists());

        drop(db);

        assert!(!path.exists());
        for suffix in ["-wal", "-shm"] {
            let mut side = path.clone().into_os_string();
            side.push(suffix);
            assert!(!PathBuf::from(side).exists());
        }
    }
}
