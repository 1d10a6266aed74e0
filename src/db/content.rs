//! Site content: staff directory, news posts, upcoming events.

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::models::{Event, NewsPost, StaffMember};
use super::DbPool;

fn read_staff_row(row: &Row) -> rusqlite::Result<StaffMember> {
    Ok(StaffMember {
        id: row.get(0)?,
        name: row.get(1)?,
        position: row.get(2)?,
        specialty: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        bio: row.get(6)?,
        photo_url: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

const STAFF_COLUMNS: &str =
    "id, name, position, specialty, phone, email, bio, photo_url, created_at, updated_at";

pub fn insert_staff(pool: &DbPool, member: &StaffMember) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO staff (id, name, position, specialty, phone, email, bio, photo_url, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            member.id,
            member.name,
            member.position,
            member.specialty,
            member.phone,
            member.email,
            member.bio,
            member.photo_url,
            member.created_at,
            member.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_staff(pool: &DbPool, id: &str) -> Result<Option<StaffMember>> {
    let conn = pool.get()?;
    let member = conn
        .query_row(
            &format!("SELECT {} FROM staff WHERE id = ?1", STAFF_COLUMNS),
            params![id],
            read_staff_row,
        )
        .optional()?;
    Ok(member)
}

pub fn list_staff(pool: &DbPool) -> Result<Vec<StaffMember>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!("SELECT {} FROM staff ORDER BY name", STAFF_COLUMNS))?;
    let rows = stmt.query_map([], read_staff_row)?;

    let mut members = Vec::new();
    for member in rows {
        members.push(member?);
    }
    Ok(members)
}

pub fn update_staff(pool: &DbPool, member: &StaffMember) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE staff
         SET name = ?2, position = ?3, specialty = ?4, phone = ?5, email = ?6, bio = ?7,
             photo_url = ?8, updated_at = ?9
         WHERE id = ?1",
        params![
            member.id,
            member.name,
            member.position,
            member.specialty,
            member.phone,
            member.email,
            member.bio,
            member.photo_url,
            member.updated_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_staff(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM staff WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

const NEWS_COLUMNS: &str = "id, title, body, author, published_on, created_at, updated_at";

fn read_news_row(row: &Row) -> rusqlite::Result<NewsPost> {
    Ok(NewsPost {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        author: row.get(3)?,
        published_on: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

pub fn insert_news(pool: &DbPool, post: &NewsPost) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO news_posts (id, title, body, author, published_on, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            post.id,
            post.title,
            post.body,
            post.author,
            post.published_on,
            post.created_at,
            post.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_news(pool: &DbPool, id: &str) -> Result<Option<NewsPost>> {
    let conn = pool.get()?;
    let post = conn
        .query_row(
            &format!("SELECT {} FROM news_posts WHERE id = ?1", NEWS_COLUMNS),
            params![id],
            read_news_row,
        )
        .optional()?;
    Ok(post)
}

pub fn list_news(pool: &DbPool) -> Result<Vec<NewsPost>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM news_posts ORDER BY published_on DESC, created_at DESC",
        NEWS_COLUMNS
    ))?;
    let rows = stmt.query_map([], read_news_row)?;

    let mut posts = Vec::new();
    for post in rows {
        posts.push(post?);
    }
    Ok(posts)
}

pub fn update_news(pool: &DbPool, post: &NewsPost) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE news_posts
         SET title = ?2, body = ?3, author = ?4, published_on = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            post.id,
            post.title,
            post.body,
            post.author,
            post.published_on,
            post.updated_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_news(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM news_posts WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}

const EVENT_COLUMNS: &str = "id, title, date, time, location, description, created_at, updated_at";

fn read_event_row(row: &Row) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        title: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
        location: row.get(4)?,
        description: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

pub fn insert_event(pool: &DbPool, event: &Event) -> Result<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO events (id, title, date, time, location, description, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.id,
            event.title,
            event.date,
            event.time,
            event.location,
            event.description,
            event.created_at,
            event.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_event(pool: &DbPool, id: &str) -> Result<Option<Event>> {
    let conn = pool.get()?;
    let event = conn
        .query_row(
            &format!("SELECT {} FROM events WHERE id = ?1", EVENT_COLUMNS),
            params![id],
            read_event_row,
        )
        .optional()?;
    Ok(event)
}

/// With `after`, only events on or past that date (the public upcoming listing).
pub fn list_events(pool: &DbPool, after: Option<NaiveDate>) -> Result<Vec<Event>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM events
         WHERE (?1 IS NULL OR date >= ?1)
         ORDER BY date ASC, time ASC",
        EVENT_COLUMNS
    ))?;
    let rows = stmt.query_map(params![after], read_event_row)?;

    let mut events = Vec::new();
    for event in rows {
        events.push(event?);
    }
    Ok(events)
}

pub fn update_event(pool: &DbPool, event: &Event) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE events
         SET title = ?2, date = ?3, time = ?4, location = ?5, description = ?6, updated_at = ?7
         WHERE id = ?1",
        params![
            event.id,
            event.title,
            event.date,
            event.time,
            event.location,
            event.description,
            event.updated_at,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_event(pool: &DbPool, id: &str) -> Result<bool> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
    Ok(changed > 0)
}
