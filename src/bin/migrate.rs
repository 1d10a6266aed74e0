use rusqlite::Connection;
use std::env;
use std::fs;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    // Load .env if it exists
    dotenvy::dotenv().ok();

    println!("Starting database migration...");

    let db_path = env::var("DATABASE_PATH").unwrap_or_else(|_| "data/masjidku.db".to_string());
    if let Some(parent) = Path::new(&db_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let migration_path =
        env::var("MIGRATION_FILE").unwrap_or_else(|_| "migrations/init.sql".to_string());
    if !Path::new(&migration_path).exists() {
        println!("Migration file not found at: {}", migration_path);
        return Ok(());
    }

    let sql_content = fs::read_to_string(&migration_path)?;

    println!("Applying migration to {}...", db_path);
    let conn = Connection::open(&db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    // Every statement in init.sql is IF NOT EXISTS, so re-running is safe.
    conn.execute_batch(&sql_content)?;

    println!("Migration complete.");
    Ok(())
}
