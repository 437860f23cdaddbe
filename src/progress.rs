use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;

/// Per-item statistics for one game type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordStats {
    pub shown: u32,
    pub correct: u32,
    pub mistakes: u32,
    pub last_shown: Option<DateTime<Utc>>,
}

/// Everything the learner has accumulated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    /// game type -> item id -> stats
    pub word_stats: BTreeMap<String, BTreeMap<String, WordStats>>,
    /// Best star rating per category (letter). Only ever increases.
    pub best_scores: BTreeMap<String, u8>,
    pub games_played: BTreeMap<String, u32>,
    /// Unlocked achievement ids in unlock order, no duplicates
    pub unlocked: Vec<String>,
}

impl ProgressRecord {
    fn stats_mut(&mut self, game_type: &str, item_id: &str) -> &mut WordStats {
        self.word_stats
            .entry(game_type.to_string())
            .or_default()
            .entry(item_id.to_string())
            .or_default()
    }

    pub fn word_stats(&self, game_type: &str, item_id: &str) -> WordStats {
        self.word_stats
            .get(game_type)
            .and_then(|m| m.get(item_id))
            .copied()
            .unwrap_or_default()
    }

    pub fn note_shown(&mut self, game_type: &str, item_id: &str, at: DateTime<Utc>) {
        let stats = self.stats_mut(game_type, item_id);
        stats.shown += 1;
        stats.last_shown = Some(at);
    }

    pub fn note_correct(&mut self, game_type: &str, item_id: &str) {
        self.stats_mut(game_type, item_id).correct += 1;
    }

    pub fn note_mistake(&mut self, game_type: &str, item_id: &str) {
        self.stats_mut(game_type, item_id).mistakes += 1;
    }

    /// Applied only when strictly greater than what is stored
    pub fn raise_best_score(&mut self, category: &str, stars: u8) -> bool {
        match self.best_scores.get(category) {
            Some(&current) if current >= stars => false,
            _ => {
                self.best_scores.insert(category.to_string(), stars);
                true
            }
        }
    }

    pub fn note_game_played(&mut self, game_type: &str) {
        *self.games_played.entry(game_type.to_string()).or_default() += 1;
    }

    pub fn unlock(&mut self, achievement: &str) -> bool {
        if self.is_unlocked(achievement) {
            return false;
        }
        self.unlocked.push(achievement.to_string());
        true
    }

    pub fn is_unlocked(&self, achievement: &str) -> bool {
        self.unlocked.iter().any(|a| a == achievement)
    }

    pub fn games_played(&self, game_type: &str) -> u32 {
        self.games_played.get(game_type).copied().unwrap_or(0)
    }

    pub fn total_stars(&self) -> u32 {
        self.best_scores.values().map(|&s| u32::from(s)).sum()
    }

    /// Categories with any recorded score
    pub fn categories_played(&self) -> usize {
        self.best_scores.len()
    }

    pub fn categories_with_stars(&self, stars: u8) -> usize {
        self.best_scores.values().filter(|&&s| s >= stars).count()
    }
}

/// Persistent sink for learner progress.
///
/// Play-time calls never fail; implementations recover internally.
pub trait ProgressStore {
    fn read(&self) -> ProgressRecord;
    fn record_shown(&mut self, game_type: &str, item_id: &str);
    fn record_correct(&mut self, game_type: &str, item_id: &str);
    fn record_mistake(&mut self, game_type: &str, item_id: &str);
    /// Monotonic: returns false and keeps the old value unless `stars` is higher
    fn set_best_score(&mut self, category: &str, stars: u8) -> bool;
    fn record_game_played(&mut self, game_type: &str);
    fn is_unlocked(&self, achievement: &str) -> bool;
    /// Returns false if already unlocked
    fn unlock(&mut self, achievement: &str) -> bool;
    fn reset(&mut self);

    fn word_stats(&self, game_type: &str) -> HashMap<String, WordStats> {
        self.read()
            .word_stats
            .remove(game_type)
            .map(|m| m.into_iter().collect())
            .unwrap_or_default()
    }

    fn best_score(&self, category: &str) -> Option<u8> {
        self.read().best_scores.get(category).copied()
    }
}

/// Progress kept in memory only; lost on exit
#[derive(Debug, Default, Clone)]
pub struct MemoryProgressStore {
    record: ProgressRecord,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_record(record: ProgressRecord) -> Self {
        Self { record }
    }
}

impl ProgressStore for MemoryProgressStore {
    fn read(&self) -> ProgressRecord {
        self.record.clone()
    }

    fn record_shown(&mut self, game_type: &str, item_id: &str) {
        self.record.note_shown(game_type, item_id, Utc::now());
    }

    fn record_correct(&mut self, game_type: &str, item_id: &str) {
        self.record.note_correct(game_type, item_id);
    }

    fn record_mistake(&mut self, game_type: &str, item_id: &str) {
        self.record.note_mistake(game_type, item_id);
    }

    fn set_best_score(&mut self, category: &str, stars: u8) -> bool {
        self.record.raise_best_score(category, stars)
    }

    fn record_game_played(&mut self, game_type: &str) {
        self.record.note_game_played(game_type);
    }

    fn is_unlocked(&self, achievement: &str) -> bool {
        self.record.is_unlocked(achievement)
    }

    fn unlock(&mut self, achievement: &str) -> bool {
        self.record.unlock(achievement)
    }

    fn reset(&mut self) {
        self.record = ProgressRecord::default();
    }
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS word_stats (
    game_type TEXT NOT NULL,
    item_id TEXT NOT NULL,
    shown INTEGER NOT NULL DEFAULT 0,
    correct INTEGER NOT NULL DEFAULT 0,
    mistakes INTEGER NOT NULL DEFAULT 0,
    last_shown TEXT,
    PRIMARY KEY (game_type, item_id)
);
CREATE TABLE IF NOT EXISTS best_scores (
    category TEXT PRIMARY KEY,
    stars INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS games_played (
    game_type TEXT PRIMARY KEY,
    count INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS achievements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    achievement TEXT NOT NULL UNIQUE,
    unlocked_at TEXT NOT NULL
);
"#;

/// SQLite-backed progress database
#[derive(Debug)]
pub struct SqliteProgressStore {
    conn: Connection,
}

impl SqliteProgressStore {
    /// Open (creating if needed) the database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn read(&self) -> rusqlite::Result<ProgressRecord> {
        let mut record = ProgressRecord::default();

        let mut stmt = self.conn.prepare(
            "SELECT game_type, item_id, shown, correct, mistakes, last_shown FROM word_stats",
        )?;
        let rows = stmt.query_map([], |row| {
            let last_shown: Option<String> = row.get(5)?;
            let last_shown = last_shown
                .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
                .map(|dt| dt.with_timezone(&Utc));
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                WordStats {
                    shown: row.get(2)?,
                    correct: row.get(3)?,
                    mistakes: row.get(4)?,
                    last_shown,
                },
            ))
        })?;
        for row in rows {
            let (game_type, item_id, stats) = row?;
            record
                .word_stats
                .entry(game_type)
                .or_default()
                .insert(item_id, stats);
        }

        let mut stmt = self.conn.prepare("SELECT category, stars FROM best_scores")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u8>(1)?)))?;
        for row in rows {
            let (category, stars) = row?;
            record.best_scores.insert(category, stars);
        }

        let mut stmt = self.conn.prepare("SELECT game_type, count FROM games_played")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?)))?;
        for row in rows {
            let (game_type, count) = row?;
            record.games_played.insert(game_type, count);
        }

        let mut stmt = self
            .conn
            .prepare("SELECT achievement FROM achievements ORDER BY id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for row in rows {
            record.unlocked.push(row?);
        }

        Ok(record)
    }

    pub fn record_shown(&self, game_type: &str, item_id: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO word_stats (game_type, item_id, shown, last_shown)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(game_type, item_id)
            DO UPDATE SET shown = shown + 1, last_shown = excluded.last_shown
            "#,
            params![game_type, item_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn record_correct(&self, game_type: &str, item_id: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO word_stats (game_type, item_id, correct) VALUES (?1, ?2, 1)
            ON CONFLICT(game_type, item_id) DO UPDATE SET correct = correct + 1
            "#,
            params![game_type, item_id],
        )?;
        Ok(())
    }

    pub fn record_mistake(&self, game_type: &str, item_id: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO word_stats (game_type, item_id, mistakes) VALUES (?1, ?2, 1)
            ON CONFLICT(game_type, item_id) DO UPDATE SET mistakes = mistakes + 1
            "#,
            params![game_type, item_id],
        )?;
        Ok(())
    }

    /// The `WHERE` on the upsert keeps the score monotonic inside the database
    pub fn set_best_score(&self, category: &str, stars: u8) -> rusqlite::Result<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO best_scores (category, stars) VALUES (?1, ?2)
            ON CONFLICT(category) DO UPDATE SET stars = excluded.stars
            WHERE excluded.stars > best_scores.stars
            "#,
            params![category, stars],
        )?;
        Ok(changed > 0)
    }

    pub fn best_score(&self, category: &str) -> rusqlite::Result<Option<u8>> {
        self.conn
            .query_row(
                "SELECT stars FROM best_scores WHERE category = ?1",
                [category],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn record_game_played(&self, game_type: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO games_played (game_type, count) VALUES (?1, 1)
            ON CONFLICT(game_type) DO UPDATE SET count = count + 1
            "#,
            [game_type],
        )?;
        Ok(())
    }

    pub fn is_unlocked(&self, achievement: &str) -> rusqlite::Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM achievements WHERE achievement = ?1",
                [achievement],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    pub fn unlock(&self, achievement: &str) -> rusqlite::Result<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO achievements (achievement, unlocked_at) VALUES (?1, ?2)",
            params![achievement, Utc::now().to_rfc3339()],
        )?;
        Ok(inserted > 0)
    }

    /// Clear all progress (for reset or testing)
    pub fn clear_all(&self) -> rusqlite::Result<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM word_stats;
            DELETE FROM best_scores;
            DELETE FROM games_played;
            DELETE FROM achievements;
            "#,
        )
    }
}

enum Backend {
    Sqlite(SqliteProgressStore),
    Memory(MemoryProgressStore),
}

/// Store that prefers SQLite and degrades to memory on the first failure.
///
/// After degrading, play continues with what could still be read; nothing
/// more is written to disk for the rest of the process.
pub struct ResilientStore {
    backend: Backend,
    location: Option<PathBuf>,
}

impl ResilientStore {
    pub fn sqlite(store: SqliteProgressStore, location: Option<PathBuf>) -> Self {
        Self {
            backend: Backend::Sqlite(store),
            location,
        }
    }

    pub fn memory() -> Self {
        Self {
            backend: Backend::Memory(MemoryProgressStore::new()),
            location: None,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.backend, Backend::Sqlite(_))
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    /// Run a write on disk; on failure move everything readable into memory
    /// and apply the write there instead
    fn write<T>(
        &mut self,
        on_disk: impl FnOnce(&SqliteProgressStore) -> rusqlite::Result<T>,
        in_memory: impl FnOnce(&mut MemoryProgressStore) -> T,
    ) -> T {
        let record = match &mut self.backend {
            Backend::Memory(mem) => return in_memory(mem),
            Backend::Sqlite(db) => match on_disk(db) {
                Ok(value) => return value,
                Err(err) => {
                    warn!(error = %err, "progress database failed, continuing in memory");
                    db.read().unwrap_or_default()
                }
            },
        };
        let mut mem = MemoryProgressStore::from_record(record);
        let value = in_memory(&mut mem);
        self.backend = Backend::Memory(mem);
        value
    }
}

impl ProgressStore for ResilientStore {
    fn read(&self) -> ProgressRecord {
        match &self.backend {
            Backend::Sqlite(db) => db.read().unwrap_or_else(|err| {
                warn!(error = %err, "could not read progress, using defaults");
                ProgressRecord::default()
            }),
            Backend::Memory(mem) => mem.read(),
        }
    }

    fn record_shown(&mut self, game_type: &str, item_id: &str) {
        self.write(
            |db| db.record_shown(game_type, item_id),
            |mem| mem.record_shown(game_type, item_id),
        )
    }

    fn record_correct(&mut self, game_type: &str, item_id: &str) {
        self.write(
            |db| db.record_correct(game_type, item_id),
            |mem| mem.record_correct(game_type, item_id),
        )
    }

    fn record_mistake(&mut self, game_type: &str, item_id: &str) {
        self.write(
            |db| db.record_mistake(game_type, item_id),
            |mem| mem.record_mistake(game_type, item_id),
        )
    }

    fn set_best_score(&mut self, category: &str, stars: u8) -> bool {
        self.write(
            |db| db.set_best_score(category, stars),
            |mem| mem.set_best_score(category, stars),
        )
    }

    fn record_game_played(&mut self, game_type: &str) {
        self.write(
            |db| db.record_game_played(game_type),
            |mem| mem.record_game_played(game_type),
        )
    }

    fn is_unlocked(&self, achievement: &str) -> bool {
        match &self.backend {
            Backend::Sqlite(db) => db.is_unlocked(achievement).unwrap_or(false),
            Backend::Memory(mem) => mem.is_unlocked(achievement),
        }
    }

    fn unlock(&mut self, achievement: &str) -> bool {
        self.write(|db| db.unlock(achievement), |mem| mem.unlock(achievement))
    }

    fn reset(&mut self) {
        self.write(|db| db.clear_all(), |mem| mem.reset())
    }

    fn best_score(&self, category: &str) -> Option<u8> {
        match &self.backend {
            Backend::Sqlite(db) => db.best_score(category).unwrap_or(None),
            Backend::Memory(mem) => mem.best_score(category),
        }
    }
}

/// Open the progress database, falling back to memory when it is unavailable
pub fn open_progress_store(path: Option<&Path>) -> ResilientStore {
    let Some(path) = path else {
        warn!("no state directory, progress will not be saved");
        return ResilientStore::memory();
    };
    match SqliteProgressStore::open(path) {
        Ok(db) => {
            info!(path = %path.display(), "progress database opened");
            ResilientStore::sqlite(db, Some(path.to_path_buf()))
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "progress database unavailable, using memory");
            ResilientStore::memory()
        }
    }
}
