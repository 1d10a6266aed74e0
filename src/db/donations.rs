use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::models::{Donation, DonationCategory, DonationStatus, PaymentMethod};
use super::DbPool;

const DONATION_COLUMNS: &str = "id, donor_name, email, phone, date, category, program, amount, \
                                payment_method, status, anonymous, description, created_at, updated_at";

#[derive(Debug, Clone, Default)]
pub struct DonationFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub category: Option<DonationCategory>,
    pub status: Option<DonationStatus>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DonationStats {
    pub total: f64,
    pub count: i64,
    /// Counted by donor name string; two donors sharing a display name collapse to one.
    pub donor_count: i64,
    pub average: f64,
}

type DonationRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    NaiveDate,
    String,
    Option<String>,
    f64,
    String,
    String,
    bool,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn read_donation_row(row: &Row) -> rusqlite::Result<DonationRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
        row.get(10)?,
        row.get(11)?,
        row.get(12)?,
        row.get(13)?,
    ))
}

fn into_donation(raw: DonationRow) -> Result<Donation> {
    let (
        id,
        donor_name,
        email,
        phone,
        date,
        category,
        program,
        amount,
        payment_method,
        status,
        anonymous,
        description,
        created_at,
        updated_at,
    ) = raw;

    let category = DonationCategory::parse(&category)
        .ok_or_else(|| anyhow!("Unknown donation category '{}' for {}", category, id))?;
    let payment_method = PaymentMethod::parse(&payment_method)
        .ok_or_else(|| anyhow!("Unknown payment method '{}' for {}", payment_method, id))?;
    let status = DonationStatus::parse(&status)
        .ok_or_else(|| anyhow!("Unknown donation status '{}' for {}", status, id))?;

    Ok(Donation {
        id,
        donor_name,
        email,
        phone,
        date,
        category,
        program,
        amount,
        payment_method,
        status,
        anonymous,
        description,
        created_at,
        updated_at,
    })
}

pub fn insert_donation(pool: &DbPool, donation: &Donation) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO donations (id, donor_name, email, phone, date, category, program, amount,
                                payment_method, status, anonymous, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            donation.id,
            donation.donor_name,
            donation.email,
            donation.phone,
            donation.date,
            donation.category.as_str(),
            donation.program,
            donation.amount,
            donation.payment_method.as_str(),
            donation.status.as_str(),
            donation.anonymous,
            donation.description,
            donation.created_at,
            donation.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_donation(pool: &DbPool, id: &str) -> Result<Option<Donation>> {
    let conn = pool.get()?;
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM donations WHERE id = ?1", DONATION_COLUMNS),
            params![id],
            read_donation_row,
        )
        .optional()?;
    raw.map(into_donation).transpose()
}

pub fn list_donations(pool: &DbPool, filter: &DonationFilter) -> Result<Vec<Donation>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM donations
         WHERE (?1 IS NULL OR date >= ?1)
           AND (?2 IS NULL OR date <= ?2)
           AND (?3 IS NULL OR category = ?3)
           AND (?4 IS NULL OR status = ?4)
         ORDER BY date DESC, created_at DESC",
        DONATION_COLUMNS
    ))?;

    let rows = stmt.query_map(
        params![
            filter.from,
            filter.to,
            filter.category.map(|c| c.as_str()),
            filter.status.map(|s| s.as_str()),
        ],
        read_donation_row,
    )?;

    let mut donations = Vec::new();
    for raw in rows {
        donations.push(into_donation(raw?)?);
    }
    Ok(donations)
}

/// Last write wins: no staleness check.
pub fn update_donation(pool: &DbPool, donation: &Donation) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE donations
         SET donor_name = ?2, email = ?3, phone = ?4, date = ?5, category = ?6, program = ?7,
             amount = ?8, payment_method = ?9, status = ?10, anonymous = ?11, description = ?12,
             updated_at = ?13
         WHERE id = ?1",
        params![
            donation.id,
            donation.donor_name,
            donation.email,
            donation.phone,
            donation.date,
            donation.category.as_str(),
            donation.program,
            donation.amount,
            donation.payment_method.as_str(),
            donation.status.as_str(),
            donation.anonymous,
            donation.description,
            donation.updated_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_donation(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM donations WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

/// Average reports as 0 when the filter matches no records.
pub fn donation_stats(pool: &DbPool, filter: &DonationFilter) -> Result<DonationStats> {
    let conn = pool.get()?;
    let (total, count, donor_count): (f64, i64, i64) = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0), COUNT(*), COUNT(DISTINCT donor_name)
         FROM donations
         WHERE (?1 IS NULL OR date >= ?1)
           AND (?2 IS NULL OR date <= ?2)
           AND (?3 IS NULL OR category = ?3)
           AND (?4 IS NULL OR status = ?4)",
        params![
            filter.from,
            filter.to,
            filter.category.map(|c| c.as_str()),
            filter.status.map(|s| s.as_str()),
        ],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;

    let average = if count > 0 { total / count as f64 } else { 0.0 };

    Ok(DonationStats {
        total,
        count,
        donor_count,
        average,
    })
}
