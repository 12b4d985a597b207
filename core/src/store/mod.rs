//! SQLite event store.
//!
//! RULE: Only store/ talks to the database.
//! Layouts and seeds are grouped into named datasets. Block rows keep the
//! external field names (`realization_index`, `block_event_start`, ...).

use crate::error::{SeedError, SeedResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

mod blocks;
mod seeds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    Blocks,
    Seeds,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocks => "blocks",
            Self::Seeds => "seeds",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "blocks" => Some(Self::Blocks),
            "seeds" => Some(Self::Seeds),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub name: String,
    pub kind: DatasetKind,
    pub created_at: DateTime<Utc>,
}

pub struct SeedStore {
    conn: Connection,
}

impl SeedStore {
    /// Open (or create) the store at `path`.
    pub fn open(path: &str) -> SeedResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode only matters for real files; in-memory ignores it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SeedResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SeedResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_layout.sql"))?;
        Ok(())
    }

    // ── Datasets ───────────────────────────────────────────────

    /// Create `name`, dropping any existing dataset of that name and its rows.
    pub fn create_dataset(&self, name: &str, kind: DatasetKind) -> SeedResult<()> {
        self.conn.execute("DELETE FROM block WHERE dataset = ?1", params![name])?;
        self.conn.execute("DELETE FROM seed WHERE dataset = ?1", params![name])?;
        self.conn.execute("DELETE FROM dataset WHERE name = ?1", params![name])?;
        self.insert_dataset(name, kind)?;
        log::debug!("created {} dataset '{name}'", kind.as_str());
        Ok(())
    }

    /// Create `name` if it does not exist yet. Existing rows are kept.
    pub fn ensure_dataset(&self, name: &str, kind: DatasetKind) -> SeedResult<()> {
        match self.dataset(name)? {
            Some(info) if info.kind == kind => Ok(()),
            Some(info) => Err(SeedError::config(
                "dataset",
                format!("'{name}' holds {}, not {}", info.kind.as_str(), kind.as_str()),
            )),
            None => self.insert_dataset(name, kind),
        }
    }

    pub fn dataset(&self, name: &str) -> SeedResult<Option<DatasetInfo>> {
        let row: Option<(String, String, String)> = self
            .conn
            .query_row(
                "SELECT name, kind, created_at FROM dataset WHERE name = ?1",
                params![name],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .optional()?;

        let Some((name, kind, created_at)) = row else {
            return Ok(None);
        };
        let kind = DatasetKind::parse(&kind)
            .ok_or_else(|| anyhow::anyhow!("dataset '{name}' has unknown kind '{kind}'"))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| anyhow::anyhow!("dataset '{name}' has bad timestamp: {e}"))?
            .with_timezone(&Utc);
        Ok(Some(DatasetInfo { name, kind, created_at }))
    }

    fn insert_dataset(&self, name: &str, kind: DatasetKind) -> SeedResult<()> {
        self.conn.execute(
            "INSERT INTO dataset (name, kind, created_at) VALUES (?1, ?2, ?3)",
            params![name, kind.as_str(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn require_dataset(&self, name: &str, kind: DatasetKind) -> SeedResult<()> {
        match self.dataset(name)? {
            Some(info) if info.kind == kind => Ok(()),
            _ => Err(SeedError::DatasetNotFound { name: name.to_string() }),
        }
    }
}
