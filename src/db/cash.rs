use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::models::{CashEntry, Direction};
use super::DbPool;

const CASH_COLUMNS: &str = "id, date, direction, amount, category, description, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct CashFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub direction: Option<Direction>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CashSummary {
    pub total_in: f64,
    pub total_out: f64,
    pub balance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyBucket {
    pub year: i32,
    pub month: u32,
    pub total_in: f64,
    pub total_out: f64,
}

type CashRow = (
    String,
    NaiveDate,
    String,
    f64,
    String,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn read_cash_row(row: &Row) -> rusqlite::Result<CashRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn into_cash_entry(raw: CashRow) -> Result<CashEntry> {
    let (id, date, direction, amount, category, description, created_at, updated_at) = raw;
    let direction = Direction::parse(&direction)
        .ok_or_else(|| anyhow!("Unknown cash direction '{}' for entry {}", direction, id))?;
    Ok(CashEntry {
        id,
        date,
        direction,
        amount,
        category,
        description,
        created_at,
        updated_at,
    })
}

pub fn insert_cash_entry(pool: &DbPool, entry: &CashEntry) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO cash_entries (id, date, direction, amount, category, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            entry.id,
            entry.date,
            entry.direction.as_str(),
            entry.amount,
            entry.category,
            entry.description,
            entry.created_at,
            entry.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_cash_entry(pool: &DbPool, id: &str) -> Result<Option<CashEntry>> {
    let conn = pool.get()?;
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM cash_entries WHERE id = ?1", CASH_COLUMNS),
            params![id],
            read_cash_row,
        )
        .optional()?;
    raw.map(into_cash_entry).transpose()
}

pub fn list_cash_entries(pool: &DbPool, filter: &CashFilter) -> Result<Vec<CashEntry>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM cash_entries
         WHERE (?1 IS NULL OR date >= ?1)
           AND (?2 IS NULL OR date <= ?2)
           AND (?3 IS NULL OR direction = ?3)
         ORDER BY date DESC, created_at DESC",
        CASH_COLUMNS
    ))?;

    let rows = stmt.query_map(
        params![filter.from, filter.to, filter.direction.map(|d| d.as_str())],
        read_cash_row,
    )?;

    let mut entries = Vec::new();
    for raw in rows {
        entries.push(into_cash_entry(raw?)?);
    }
    Ok(entries)
}

/// Returns false when no row has the given id. Last write wins: no staleness check.
pub fn update_cash_entry(pool: &DbPool, entry: &CashEntry) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE cash_entries
         SET date = ?2, direction = ?3, amount = ?4, category = ?5, description = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            entry.id,
            entry.date,
            entry.direction.as_str(),
            entry.amount,
            entry.category,
            entry.description,
            entry.updated_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_cash_entry(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM cash_entries WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

pub fn cash_summary(pool: &DbPool, filter: &CashFilter) -> Result<CashSummary> {
    let conn = pool.get()?;
    let (total_in, total_out): (f64, f64) = conn.query_row(
        "SELECT COALESCE(SUM(CASE WHEN direction = 'in' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN direction = 'out' THEN amount ELSE 0 END), 0)
         FROM cash_entries
         WHERE (?1 IS NULL OR date >= ?1)
           AND (?2 IS NULL OR date <= ?2)
           AND (?3 IS NULL OR direction = ?3)",
        params![filter.from, filter.to, filter.direction.map(|d| d.as_str())],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(CashSummary {
        total_in,
        total_out,
        balance: total_in - total_out,
    })
}

/// Inflow/outflow from the first of the current server-local month through `today`.
pub fn month_to_date_summary(pool: &DbPool, today: NaiveDate) -> Result<CashSummary> {
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1)
        .ok_or_else(|| anyhow!("Invalid first-of-month for {}", today))?;
    cash_summary(
        pool,
        &CashFilter {
            from: Some(first),
            to: Some(today),
            direction: None,
        },
    )
}

pub fn monthly_totals(pool: &DbPool, year: i32) -> Result<Vec<MonthlyBucket>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT CAST(strftime('%m', date) AS INTEGER),
                COALESCE(SUM(CASE WHEN direction = 'in' THEN amount ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN direction = 'out' THEN amount ELSE 0 END), 0)
         FROM cash_entries
         WHERE strftime('%Y', date) = ?1
         GROUP BY strftime('%m', date)
         ORDER BY 1",
    )?;

    let rows = stmt.query_map(params![format!("{:04}", year)], |row| {
        Ok((row.get::<_, u32>(0)?, row.get::<_, f64>(1)?, row.get::<_, f64>(2)?))
    })?;

    let mut buckets = Vec::new();
    for row in rows {
        let (month, total_in, total_out) = row?;
        buckets.push(MonthlyBucket {
            year,
            month,
            total_in,
            total_out,
        });
    }
    Ok(buckets)
}

/// Distinct years that have ledger or donation records, newest first.
pub fn ledger_years(pool: &DbPool) -> Result<Vec<i32>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT DISTINCT CAST(strftime('%Y', date) AS INTEGER)
         FROM (SELECT date FROM cash_entries UNION SELECT date FROM donations)
         ORDER BY 1 DESC",
    )?;
    let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;

    let mut years = Vec::new();
    for year in rows {
        years.push(year?);
    }
    Ok(years)
}
