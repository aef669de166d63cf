use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    Row,
    sqlite::{self, SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
};
use tracing::{debug, info};

use crate::{
    error::StoreError,
    table_store::{Table, TableStore},
};

const ROW_ID: &str = "row_id";

pub struct SqliteTableStore {
    pool: SqlitePool,
}

impl SqliteTableStore {
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(sqlx::Error::Io)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(30))
            .statement_cache_capacity(100);

        let pool = SqlitePool::connect_with(options).await?;
        info!("Opened table store at {}", db_path.display());
        Ok(Self { pool })
    }

    /// Private in-memory database; a single connection keeps every query on the same database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    async fn columns(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", quote_ident(name)))
            .fetch_all(&self.pool)
            .await?;

        let mut columns = Vec::with_capacity(rows.len());
        for row in rows {
            let column: String = row.try_get("name")?;
            if column != ROW_ID {
                columns.push(column);
            }
        }

        if columns.is_empty() {
            return Err(StoreError::UnknownTable(name.to_string()));
        }
        Ok(columns)
    }
}

#[async_trait]
impl TableStore for SqliteTableStore {
    async fn ensure_table(&self, name: &str, header: &[&str]) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'table' AND name = ?",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?
            > 0;

        if exists {
            return Ok(false);
        }

        let columns = header
            .iter()
            .map(|c| format!("{} TEXT NOT NULL", quote_ident(c)))
            .collect::<Vec<_>>()
            .join(", ");
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} ({} INTEGER PRIMARY KEY AUTOINCREMENT, {})",
            quote_ident(name),
            ROW_ID,
            columns
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        debug!("Created table {} with {} columns", name, header.len());
        Ok(true)
    }

    async fn read_all_rows(&self, name: &str) -> Result<Table, StoreError> {
        let header = self.columns(name).await?;
        let select = format!(
            "SELECT {} FROM {} ORDER BY {}",
            header.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
            quote_ident(name),
            ROW_ID
        );

        let fetched = sqlx::query(&select).fetch_all(&self.pool).await?;
        let mut rows = Vec::with_capacity(fetched.len());
        for row in fetched {
            let cells = (0..header.len())
                .map(|i| row.try_get::<String, _>(i))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(cells);
        }

        debug!("Read {} rows from {}", rows.len(), name);
        Ok(Table { header, rows })
    }

    async fn append_rows(&self, name: &str, rows: &[Vec<String>]) -> Result<(), StoreError> {
        if rows.is_empty() {
            return Ok(());
        }

        let columns = self.columns(name).await?;
        if let Some(bad) = rows.iter().find(|r| r.len() != columns.len()) {
            return Err(StoreError::RowWidth {
                table: name.to_string(),
                expected: columns.len(),
                got: bad.len(),
            });
        }

        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(name),
            columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let mut tx = self.pool.begin().await?;
        for row in rows {
            let mut query = sqlx::query(&insert);
            for cell in row {
                query = query.bind(cell.as_str());
            }
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
