use crate::domain::{Category, ScrapedEvent, StoredEvent, Translation};
use crate::error::Result;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::{debug, info};

/// Whether an upsert created a new row or refreshed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// SQLite-backed store for events and their translations.
///
/// `events.link` is the natural key: re-running the scraper against the same
/// pages updates rows in place instead of duplicating them.
pub struct EventStore {
    conn: Connection,
}

impl EventStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        info!("Opening event database at {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;
            PRAGMA foreign_keys=ON;
            "#,
        )?;
        conn.execute_batch(include_str!("../migrations/001_create_events.sql"))?;
        Ok(Self { conn })
    }

    /// Upsert an event and its three translation rows in one transaction.
    ///
    /// A refresh overwrites the scraped columns, bumps `updated_at` and
    /// clears `deleted_at`; `created_at` and the row id are preserved.
    pub fn save_event(&mut self, event: &ScrapedEvent) -> Result<UpsertOutcome> {
        let now = Utc::now();
        let tx = self.conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM events WHERE link = ?1",
                params![event.link],
                |row| row.get(0),
            )
            .optional()?;

        let (event_id, outcome) = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE events SET image = ?1, date = ?2, start_time = ?3, duration = ?4,
                            artist = ?5, cost = ?6, currency = ?7, category = ?8, address = ?9,
                            updated_at = ?10, deleted_at = NULL
                     WHERE id = ?11",
                    params![
                        event.image,
                        event.date,
                        event.start_time,
                        event.duration,
                        event.artist,
                        event.cost,
                        event.currency,
                        event.category.as_i64(),
                        event.address,
                        now,
                        id,
                    ],
                )?;
                (id, UpsertOutcome::Updated)
            }
            None => {
                tx.execute(
                    "INSERT INTO events (image, date, start_time, duration, artist, cost,
                            currency, category, address, link, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        event.image,
                        event.date,
                        event.start_time,
                        event.duration,
                        event.artist,
                        event.cost,
                        event.currency,
                        event.category.as_i64(),
                        event.address,
                        event.link,
                        now,
                        now,
                    ],
                )?;
                (tx.last_insert_rowid(), UpsertOutcome::Created)
            }
        };

        // Russian is the only language the source publishes; it is the
        // baseline for all three rows until a translation service fills in
        // English and Kazakh.
        for language in crate::domain::Language::ALL {
            tx.execute(
                "INSERT INTO event_translations (event_id, language_id, name, description)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(event_id, language_id)
                 DO UPDATE SET name = excluded.name, description = excluded.description",
                params![
                    event_id,
                    language.as_i64(),
                    event.name_ru,
                    event.description_ru
                ],
            )?;
        }

        tx.commit()?;
        debug!(link = %event.link, ?outcome, "saved event");
        Ok(outcome)
    }

    /// Live events ordered by date. `limit` of 0 means no limit.
    pub fn list_events(&self, limit: usize) -> Result<Vec<StoredEvent>> {
        let limit = if limit == 0 { -1 } else { limit as i64 };
        let mut stmt = self.conn.prepare(
            "SELECT id, image, date, start_time, duration, artist, cost, currency,
                    category, address, link, created_at, updated_at, deleted_at
             FROM events
             WHERE deleted_at IS NULL
             ORDER BY date, id
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(StoredEvent {
                id: row.get(0)?,
                image: row.get(1)?,
                date: row.get(2)?,
                start_time: row.get(3)?,
                duration: row.get(4)?,
                artist: row.get(5)?,
                cost: row.get(6)?,
                currency: row.get(7)?,
                category: Category::from_i64(row.get(8)?),
                address: row.get(9)?,
                link: row.get(10)?,
                created_at: row.get(11)?,
                updated_at: row.get(12)?,
                deleted_at: row.get(13)?,
            })
        })?;
        let mut events = Vec::new();
        for event in rows {
            events.push(event?);
        }
        Ok(events)
    }

    pub fn count_events(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn translations_for(&self, event_id: i64) -> Result<Vec<Translation>> {
        let mut stmt = self.conn.prepare(
            "SELECT event_id, language_id, name, description
             FROM event_translations
             WHERE event_id = ?1
             ORDER BY language_id",
        )?;
        let rows = stmt.query_map(params![event_id], |row| {
            Ok(Translation {
                event_id: row.get(0)?,
                language_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
            })
        })?;
        let mut translations = Vec::new();
        for translation in rows {
            translations.push(translation?);
        }
        Ok(translations)
    }

    pub fn event_id_by_link(&self, link: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM events WHERE link = ?1",
                params![link],
                |row| row.get(0),
            )
            .optional()?)
    }

    /// Delete all scraped rows. Translations go first to satisfy the
    /// foreign key even when cascades are off.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM event_translations", [])?;
        self.conn.execute("DELETE FROM events", [])?;
        info!("Cleared all events and translations");
        Ok(())
    }
}
