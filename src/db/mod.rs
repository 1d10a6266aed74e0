use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::env;
use std::fs;
use std::path::Path;

pub mod models;

mod appointments;
mod cash;
mod content;
mod donations;

pub use appointments::*;
pub use cash::*;
pub use content::*;
pub use donations::*;

pub type DbPool = Pool<SqliteConnectionManager>;

pub const SCHEMA_SQL: &str = include_str!("../../migrations/init.sql");

pub fn init_pool() -> anyhow::Result<DbPool> {
    let path = env::var("DATABASE_PATH").unwrap_or_else(|_| "data/masjidku.db".to_string());
    init_pool_at(Path::new(&path))
}

pub fn init_pool_at(path: &Path) -> anyhow::Result<DbPool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let manager = SqliteConnectionManager::file(path)
        .with_init(|conn| conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;"));
    let pool = Pool::builder()
        .max_size(10)
        .connection_timeout(std::time::Duration::from_secs(30))
        .build(manager)
        .map_err(|e| anyhow::anyhow!("Failed to create DB pool: {}", e))?;

    apply_schema(&*pool.get()?)?;

    Ok(pool)
}

/// Idempotent: every statement in init.sql is IF NOT EXISTS.
pub fn apply_schema(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
