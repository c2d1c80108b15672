use serde::Serialize;
use sqlx::{Connection, MySqlConnection, SqliteConnection};
use thiserror::Error;
use tracing::{debug, error, instrument, warn};

use crate::infra::row_json::{mysql_row_to_json, sqlite_row_to_json};
use crate::models::stop::STOPS_TABLE;
use crate::models::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    MySql,
    Sqlite,
}

impl Backend {
    /// 根据连接串的 scheme 选择驱动。预置查询是 MySQL 方言，SQLite 仅用于本地文件
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split(':').next()?.to_lowercase();
        match scheme.as_str() {
            "mysql" | "mariadb" => Some(Backend::MySql),
            "sqlite" => Some(Backend::Sqlite),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Database Connection Error: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("Error Fetching Data: {0}")]
    Execution(#[source] sqlx::Error),
    #[error("Unsupported database URL scheme: {0}")]
    UnsupportedBackend(String),
}

/// What every caller of the gateway receives: a table (empty on failure)
/// plus the failure message to display, if any.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryOutcome {
    pub table: Table,
    pub notice: Option<String>,
}

impl QueryOutcome {
    fn failed(err: &GatewayError) -> Self {
        Self {
            table: Table::empty(),
            notice: Some(err.to_string()),
        }
    }
}

/// 每次查询都新建连接，执行后无条件关闭；不做连接池、不重试。
#[derive(Debug, Clone)]
pub struct StoreGateway {
    connection_url: String,
}

macro_rules! fetch_and_release {
    ($conn:ty, $url:expr, $sql:expr, $to_json:path) => {{
        let mut conn = <$conn as Connection>::connect($url)
            .await
            .map_err(GatewayError::Connection)?;
        let fetched = sqlx::query($sql).fetch_all(&mut conn).await;
        // 先释放连接，再处理查询结果
        if let Err(e) = conn.close().await {
            warn!("关闭数据库连接失败: {}", e);
        }
        let rows = fetched.map_err(GatewayError::Execution)?;
        Ok(Table::from_rows(rows.iter().map($to_json).collect()))
    }};
}

impl StoreGateway {
    pub fn new(connection_url: impl Into<String>) -> Self {
        Self {
            connection_url: connection_url.into(),
        }
    }

    pub fn backend(&self) -> Option<Backend> {
        Backend::from_url(&self.connection_url)
    }

    /// Runs `sql` and never fails: faults collapse into an empty table with a notice.
    #[instrument(skip(self, sql), fields(backend = ?self.backend()))]
    pub async fn execute(&self, sql: &str) -> QueryOutcome {
        match self.try_execute(sql).await {
            Ok(table) => {
                debug!("查询完成, 返回 {} 行", table.len());
                QueryOutcome { table, notice: None }
            }
            Err(e) => {
                error!(sql = %sql.trim(), "{}", e);
                QueryOutcome::failed(&e)
            }
        }
    }

    /// 全量加载 traffic_stop 快照
    pub async fn fetch_stops(&self) -> QueryOutcome {
        self.execute(&format!("SELECT * FROM {STOPS_TABLE}")).await
    }

    async fn try_execute(&self, sql: &str) -> Result<Table, GatewayError> {
        let url = self.connection_url.as_str();
        match self.backend() {
            Some(Backend::MySql) => fetch_and_release!(MySqlConnection, url, sql, mysql_row_to_json),
            Some(Backend::Sqlite) => fetch_and_release!(SqliteConnection, url, sql, sqlite_row_to_json),
            None => Err(GatewayError::UnsupportedBackend(mask_credentials(url))),
        }
    }
}

/// 日志中隐藏用户名和密码
pub fn mask_credentials(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***@{}", &url[..scheme_end], &url[at + 1..])
        }
        _ => url.to_string(),
    }
}
