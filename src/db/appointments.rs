use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::models::{Appointment, AppointmentStatus};
use super::DbPool;

const APPOINTMENT_COLUMNS: &str = "id, requester_name, email, phone, date, time, ustadz_id, topic, \
                                   description, status, created_at, updated_at";

type AppointmentRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    NaiveDate,
    String,
    Option<String>,
    String,
    Option<String>,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn read_appointment_row(row: &Row) -> rusqlite::Result<AppointmentRow> {
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
    ))
}

fn into_appointment(raw: AppointmentRow) -> Result<Appointment> {
    let (
        id,
        requester_name,
        email,
        phone,
        date,
        time,
        ustadz_id,
        topic,
        description,
        status,
        created_at,
        updated_at,
    ) = raw;

    let status = AppointmentStatus::parse(&status)
        .ok_or_else(|| anyhow!("Unknown appointment status '{}' for {}", status, id))?;

    Ok(Appointment {
        id,
        requester_name,
        email,
        phone,
        date,
        time,
        ustadz_id,
        topic,
        description,
        status,
        created_at,
        updated_at,
    })
}

pub fn insert_appointment(pool: &DbPool, appointment: &Appointment) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO appointments (id, requester_name, email, phone, date, time, ustadz_id, topic,
                                   description, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appointment.id,
            appointment.requester_name,
            appointment.email,
            appointment.phone,
            appointment.date,
            appointment.time,
            appointment.ustadz_id,
            appointment.topic,
            appointment.description,
            appointment.status.as_str(),
            appointment.created_at,
            appointment.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(pool: &DbPool, id: &str) -> Result<Option<Appointment>> {
    let conn = pool.get()?;
    let raw = conn
        .query_row(
            &format!("SELECT {} FROM appointments WHERE id = ?1", APPOINTMENT_COLUMNS),
            params![id],
            read_appointment_row,
        )
        .optional()?;
    raw.map(into_appointment).transpose()
}

pub fn list_appointments(pool: &DbPool, status: Option<AppointmentStatus>) -> Result<Vec<Appointment>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM appointments
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY date DESC, time ASC",
        APPOINTMENT_COLUMNS
    ))?;

    let rows = stmt.query_map(params![status.map(|s| s.as_str())], read_appointment_row)?;

    let mut appointments = Vec::new();
    for raw in rows {
        appointments.push(into_appointment(raw?)?);
    }
    Ok(appointments)
}

pub fn update_appointment(pool: &DbPool, appointment: &Appointment) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE appointments
         SET requester_name = ?2, email = ?3, phone = ?4, date = ?5, time = ?6, ustadz_id = ?7,
             topic = ?8, description = ?9, status = ?10, updated_at = ?11
         WHERE id = ?1",
        params![
            appointment.id,
            appointment.requester_name,
            appointment.email,
            appointment.phone,
            appointment.date,
            appointment.time,
            appointment.ustadz_id,
            appointment.topic,
            appointment.description,
            appointment.status.as_str(),
            appointment.updated_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_appointment(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM appointments WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}
