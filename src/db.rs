use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use crate::parser::Spot;

pub fn connect(path: &str) -> Result<Connection> {
    if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {}", path))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS exchanges (
            id         INTEGER PRIMARY KEY,
            session    TEXT NOT NULL,
            query      TEXT NOT NULL,
            response   TEXT,
            error      TEXT,
            latency_ms INTEGER,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_exchanges_session ON exchanges(session);

        CREATE TABLE IF NOT EXISTS spots (
            id           INTEGER PRIMARY KEY,
            exchange_id  INTEGER NOT NULL REFERENCES exchanges(id),
            position     INTEGER NOT NULL,
            name         TEXT NOT NULL,
            description  TEXT NOT NULL,
            number       INTEGER NOT NULL,
            ticket_price TEXT,
            rating       REAL,
            UNIQUE(exchange_id, position)
        );
        CREATE INDEX IF NOT EXISTS idx_spots_exchange ON spots(exchange_id);
        ",
    )?;
    Ok(())
}

/// One round trip with the chat backend, or one imported response file.
pub struct ExchangeRow {
    pub session: String,
    pub query: String,
    pub response: Option<String>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
    pub created_at: String,
}

/// Save an exchange and the spots extracted from it. Returns the exchange id.
pub fn save_exchange(conn: &Connection, exchange: &ExchangeRow, spots: &[Spot]) -> Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO exchanges (session, query, response, error, latency_ms, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            exchange.session,
            exchange.query,
            exchange.response,
            exchange.error,
            exchange.latency_ms,
            exchange.created_at,
        ],
    )?;
    let exchange_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare(
            "INSERT INTO spots
             (exchange_id, position, name, description, number, ticket_price, rating)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for (position, s) in spots.iter().enumerate() {
            stmt.execute(rusqlite::params![
                exchange_id,
                position as i64,
                s.name,
                s.description,
                i64::try_from(s.number).unwrap_or(i64::MAX),
                s.ticket_price,
                s.rating,
            ])?;
        }
    }
    tx.commit()?;
    debug!(exchange_id, spots = spots.len(), "Saved exchange");
    Ok(exchange_id)
}

/// Successful (query, response) pairs of a session, oldest first.
pub fn fetch_history(conn: &Connection, session: &str) -> Result<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT query, response
         FROM exchanges
         WHERE session = ?1 AND error IS NULL AND response IS NOT NULL
         ORDER BY id",
    )?;
    let rows = stmt
        .query_map([session], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Listings ──

pub struct SpotRow {
    pub exchange_id: i64,
    pub query: String,
    pub spot: Spot,
}

pub fn fetch_spots(conn: &Connection, session: Option<&str>, limit: usize) -> Result<Vec<SpotRow>> {
    let mut stmt = conn.prepare(
        "SELECT s.exchange_id, e.query, s.name, s.description, s.number, s.ticket_price, s.rating
         FROM spots s
         JOIN exchanges e ON e.id = s.exchange_id
         WHERE ?1 IS NULL OR e.session = ?1
         ORDER BY s.exchange_id, s.position
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![session, limit as i64], |row| {
            Ok(SpotRow {
                exchange_id: row.get(0)?,
                query: row.get(1)?,
                spot: Spot {
                    name: row.get(2)?,
                    description: row.get(3)?,
                    number: row.get::<_, i64>(4)?.max(0) as u64,
                    ticket_price: row.get(5)?,
                    rating: row.get(6)?,
                },
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct ExchangeSummary {
    pub id: i64,
    pub session: String,
    pub query: String,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
    pub created_at: String,
    pub spot_count: usize,
}

/// Most recent exchanges first.
pub fn fetch_exchanges(
    conn: &Connection,
    session: Option<&str>,
    limit: usize,
) -> Result<Vec<ExchangeSummary>> {
    let mut stmt = conn.prepare(
        "SELECT e.id, e.session, e.query, e.error, e.latency_ms, e.created_at,
                (SELECT COUNT(*) FROM spots s WHERE s.exchange_id = e.id)
         FROM exchanges e
         WHERE ?1 IS NULL OR e.session = ?1
         ORDER BY e.id DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![session, limit as i64], |row| {
            Ok(ExchangeSummary {
                id: row.get(0)?,
                session: row.get(1)?,
                query: row.get(2)?,
                error: row.get(3)?,
                latency_ms: row.get(4)?,
                created_at: row.get(5)?,
                spot_count: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Stats ──

pub struct Stats {
    pub exchanges: usize,
    pub errors: usize,
    pub empty: usize,
    pub spots: usize,
    pub sessions: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let exchanges: usize = conn.query_row("SELECT COUNT(*) FROM exchanges", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM exchanges WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let empty: usize = conn.query_row(
        "SELECT COUNT(*) FROM exchanges e
         WHERE e.error IS NULL
           AND NOT EXISTS (SELECT 1 FROM spots s WHERE s.exchange_id = e.id)",
        [],
        |r| r.get(0),
    )?;
    let spots: usize = conn.query_row("SELECT COUNT(*) FROM spots", [], |r| r.get(0))?;
    let sessions: usize =
        conn.query_row("SELECT COUNT(DISTINCT session) FROM exchanges", [], |r| r.get(0))?;
    Ok(Stats {
        exchanges,
        errors,
        empty,
        spots,
        sessions,
    })
}
