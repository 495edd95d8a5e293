// SQLite persistence: species cache, listing mirror, rosters and key-value
// application state.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::pokemon::{PokemonDetail, PokemonSummary};
use crate::roster::{Roster, RosterMember};
use crate::store::{RosterStore, SpeciesCache};
use crate::type_chart::TypeChart;
use crate::types::PokemonType;

/// SQLite-backed store standing in for the hosted document database.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS species_cache (
                pokemon_id INTEGER PRIMARY KEY,
                name       TEXT NOT NULL,
                record     TEXT NOT NULL,
                fetched_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS pokemon_index (
                pokemon_id INTEGER PRIMARY KEY,
                name       TEXT NOT NULL,
                types      TEXT NOT NULL,
                image_url  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS roster_members (
                user_id    TEXT NOT NULL,
                slot       INTEGER NOT NULL,
                pokemon_id INTEGER NOT NULL,
                name       TEXT NOT NULL,
                image_url  TEXT NOT NULL,
                types      TEXT NOT NULL,
                level      INTEGER NOT NULL,
                ability    TEXT NOT NULL,
                held_item  TEXT,
                moves      TEXT NOT NULL,
                base_stats TEXT NOT NULL,
                PRIMARY KEY (user_id, slot),
                UNIQUE (user_id, pokemon_id)
            );

            CREATE TABLE IF NOT EXISTS app_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Species cache
    // ------------------------------------------------------------------

    /// Write a detail record through to the cache, replacing any older copy.
    pub fn store_species(&self, detail: &PokemonDetail) -> Result<()> {
        let record = serde_json::to_string(detail).context("failed to serialize species record")?;
        self.store_species_raw(detail.id, &detail.name, &record)
    }

    /// Store an arbitrary JSON record. Used by tests to plant partial records
    /// like the ones older bulk seeds produced.
    pub fn store_species_raw(&self, id: u32, name: &str, record: &str) -> Result<()> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO species_cache (pokemon_id, name, record)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(pokemon_id) DO UPDATE SET
                name       = excluded.name,
                record     = excluded.record,
                fetched_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
            params![id, name, record],
        )
        .context("failed to store species record")?;
        Ok(())
    }

    pub fn load_species(&self, id: u32) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let record: Option<String> = conn
            .query_row(
                "SELECT record FROM species_cache WHERE pokemon_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query species cache")?;

        match record {
            Some(json_str) => {
                let value = serde_json::from_str(&json_str)
                    .context("failed to deserialize species record")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// When the cached record for `id` was last written.
    pub fn species_fetched_at(&self, id: u32) -> Result<Option<chrono::DateTime<chrono::Utc>>> {
        let conn = self.conn();
        let ts: Option<String> = conn
            .query_row(
                "SELECT fetched_at FROM species_cache WHERE pokemon_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query species timestamp")?;

        ts.map(|s| {
            chrono::DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&chrono::Utc))
                .with_context(|| format!("invalid fetched_at timestamp {s}"))
        })
        .transpose()
    }

    pub fn cached_species_count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM species_cache", [], |row| row.get(0))
            .context("failed to count cached species")?;
        Ok(count as usize)
    }

    /// Drop every cached detail record and the listing mirror. Rosters and
    /// the synced type chart are kept.
    pub fn clear_species_cache(&self) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM species_cache", [])
            .context("failed to delete species cache")?;
        tx.execute("DELETE FROM pokemon_index", [])
            .context("failed to delete pokemon index")?;
        tx.execute(
            "DELETE FROM app_state WHERE key = ?1",
            params![Self::INDEX_LIMIT_KEY],
        )
        .context("failed to delete index coverage")?;
        tx.commit().context("failed to commit clear_species_cache")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Listing mirror
    // ------------------------------------------------------------------

    /// Upsert listing entries fetched for `1..=limit` and record that the
    /// mirror now covers that range, in a single transaction. Coverage only
    /// grows.
    pub fn store_index(&self, limit: u32, entries: &[PokemonSummary]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin index transaction")?;
        for entry in entries {
            let types_json =
                serde_json::to_string(&entry.types).context("failed to serialize types")?;
            tx.execute(
                "INSERT OR REPLACE INTO pokemon_index (pokemon_id, name, types, image_url)
                 VALUES (?1, ?2, ?3, ?4)",
                params![entry.id, entry.name, types_json, entry.image_url],
            )
            .context("failed to store index entry")?;
        }

        let covered: Option<String> = tx
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![Self::INDEX_LIMIT_KEY],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query index coverage")?;
        let covered = covered.and_then(|v| v.parse::<u32>().ok()).unwrap_or(0);
        tx.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![Self::INDEX_LIMIT_KEY, covered.max(limit).to_string()],
        )
        .context("failed to store index coverage")?;

        tx.commit().context("failed to commit index")?;
        Ok(())
    }

    /// Highest `limit` the listing mirror was filled for, if any.
    pub fn index_coverage(&self) -> Result<Option<u32>> {
        Ok(self
            .load_state(Self::INDEX_LIMIT_KEY)?
            .and_then(|v| v.as_u64())
            .map(|n| n as u32))
    }

    /// Mirrored listing entries with ids in `1..=limit`, in id order. `None`
    /// when the mirror was never filled for a range that large.
    pub fn load_index(&self, limit: u32) -> Result<Option<Vec<PokemonSummary>>> {
        if self.index_coverage()?.map_or(true, |covered| covered < limit) {
            return Ok(None);
        }
        self.load_index_rows(limit).map(Some)
    }

    fn load_index_rows(&self, limit: u32) -> Result<Vec<PokemonSummary>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pokemon_id, name, types, image_url FROM pokemon_index
                 WHERE pokemon_id BETWEEN 1 AND ?1 ORDER BY pokemon_id",
            )
            .context("failed to prepare load_index query")?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .context("failed to query pokemon index")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map index rows")?;

        rows.into_iter()
            .map(|(id, name, types_json, image_url)| {
                let types: Vec<PokemonType> = serde_json::from_str(&types_json)
                    .with_context(|| format!("invalid types for index entry {id}"))?;
                Ok(PokemonSummary {
                    id,
                    number: id,
                    name,
                    types,
                    image_url,
                })
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Rosters
    // ------------------------------------------------------------------

    pub fn load_roster(&self, user_id: &str) -> Result<Roster> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT pokemon_id, name, image_url, types, level, ability, held_item, moves, base_stats
                 FROM roster_members WHERE user_id = ?1 ORDER BY slot",
            )
            .context("failed to prepare load_roster query")?;

        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(StoredMember {
                    pokemon_id: row.get(0)?,
                    name: row.get(1)?,
                    image_url: row.get(2)?,
                    types: row.get(3)?,
                    level: row.get(4)?,
                    ability: row.get(5)?,
                    held_item: row.get(6)?,
                    moves: row.get(7)?,
                    base_stats: row.get(8)?,
                })
            })
            .context("failed to query roster members")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map roster rows")?;

        let members = rows
            .into_iter()
            .map(StoredMember::into_member)
            .collect::<Result<Vec<_>>>()?;

        Roster::from_members(members)
            .with_context(|| format!("stored roster for {user_id} is invalid"))
    }

    /// Replace every stored member of `user_id` with the given roster. Uses
    /// a transaction so a failed save leaves the previous roster intact.
    pub fn save_roster(&self, user_id: &str, roster: &Roster) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin roster transaction")?;

        tx.execute("DELETE FROM roster_members WHERE user_id = ?1", params![user_id])
            .context("failed to clear roster")?;

        for (slot, m) in roster.iter().enumerate() {
            let types = serde_json::to_string(&m.types).context("failed to serialize types")?;
            let moves = serde_json::to_string(&m.moves).context("failed to serialize moves")?;
            let base_stats =
                serde_json::to_string(&m.base_stats).context("failed to serialize base stats")?;
            tx.execute(
                "INSERT INTO roster_members
                    (user_id, slot, pokemon_id, name, image_url, types, level, ability, held_item, moves, base_stats)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    user_id,
                    slot as i64,
                    m.pokemon_id,
                    m.name,
                    m.image_url,
                    types,
                    m.level,
                    m.ability,
                    m.held_item,
                    moves,
                    base_stats,
                ],
            )
            .context("failed to insert roster member")?;
        }

        tx.commit().context("failed to commit roster")?;
        debug!(user_id, members = roster.len(), "roster saved");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Key-value application state
    // ------------------------------------------------------------------

    /// Persist an arbitrary JSON value under `key`. Uses INSERT OR REPLACE so
    /// repeated saves overwrite the previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str = serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO app_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM app_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query app state")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    /// Key under which a chart synced from the species API is kept.
    const TYPE_CHART_KEY: &'static str = "type_chart";

    /// Key under which the listing mirror's covered range is kept.
    const INDEX_LIMIT_KEY: &'static str = "index_limit";

    pub fn save_type_chart(&self, chart: &TypeChart) -> Result<()> {
        let value = serde_json::to_value(chart).context("failed to serialize type chart")?;
        self.save_state(Self::TYPE_CHART_KEY, &value)
    }

    /// The synced chart, if one was saved.
    pub fn load_type_chart(&self) -> Result<Option<TypeChart>> {
        self.load_state(Self::TYPE_CHART_KEY)?
            .map(|v| serde_json::from_value(v).context("stored type chart is malformed"))
            .transpose()
    }
}

/// Raw `roster_members` row before JSON columns are decoded.
struct StoredMember {
    pokemon_id: u32,
    name: String,
    image_url: String,
    types: String,
    level: u8,
    ability: String,
    held_item: Option<String>,
    moves: String,
    base_stats: String,
}

impl StoredMember {
    fn into_member(self) -> Result<RosterMember> {
        let id = self.pokemon_id;
        let types: Vec<PokemonType> = serde_json::from_str(&self.types)
            .with_context(|| format!("invalid types for roster member {id}"))?;
        let moves: Vec<String> = serde_json::from_str(&self.moves)
            .with_context(|| format!("invalid moves for roster member {id}"))?;
        let base_stats: BTreeMap<String, u32> = serde_json::from_str(&self.base_stats)
            .with_context(|| format!("invalid base stats for roster member {id}"))?;
        Ok(RosterMember {
            pokemon_id: id,
            name: self.name,
            image_url: self.image_url,
            types,
            level: self.level,
            ability: self.ability,
            held_item: self.held_item,
            moves,
            base_stats,
        })
    }
}

impl RosterStore for Database {
    fn load_roster(&self, user_id: &str) -> Result<Roster> {
        Database::load_roster(self, user_id)
    }

    fn save_roster(&self, user_id: &str, roster: &Roster) -> Result<()> {
        Database::save_roster(self, user_id, roster)
    }
}

impl SpeciesCache for Database {
    fn load_species(&self, id: u32) -> Result<Option<serde_json::Value>> {
        Database::load_species(self, id)
    }

    fn store_species(&self, detail: &PokemonDetail) -> Result<()> {
        Database::store_species(self, detail)
    }

    fn load_index(&self, limit: u32) -> Result<Option<Vec<PokemonSummary>>> {
        Database::load_index(self, limit)
    }

    fn store_index(&self, limit: u32, entries: &[PokemonSummary]) -> Result<()> {
        Database::store_index(self, limit, entries)
    }

    fn clear_species(&self) -> Result<()> {
        Database::clear_species_cache(self)
    }

    fn load_type_chart(&self) -> Result<Option<TypeChart>> {
        Database::load_type_chart(self)
    }

    fn save_type_chart(&self, chart: &TypeChart) -> Result<()> {
        Database::save_type_chart(self, chart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pokemon::{BaseStat, EvolutionStage, Rarity, VersionLocations};
    use serde_json::json;

    /// Helper: create a fresh in-memory database for each test.
    fn test_db() -> Database {
        Database::open(":memory:").expect("in-memory database should open")
    }

    fn sample_detail(id: u32, name: &str) -> PokemonDetail {
        PokemonDetail {
            id,
            name: name.to_string(),
            types: vec![PokemonType::Electric],
            image_url: format!("art/{id}.png"),
            abilities: vec!["static".to_string()],
            stats: vec![BaseStat { name: "hp".to_string(), base_stat: 35 }],
            description: "It keeps its tail raised.".to_string(),
            evolution_chain: vec![EvolutionStage {
                id,
                name: name.to_string(),
                image_url: String::new(),
            }],
            damage_relations: TypeChart::builtin().damage_relations(&[PokemonType::Electric]),
            kanto_locations: vec![VersionLocations {
                version: "yellow".to_string(),
                locations: vec!["viridian forest".to_string()],
            }],
            rarity: Rarity::Common,
        }
    }

    fn sample_member(id: u32) -> RosterMember {
        RosterMember {
            pokemon_id: id,
            name: format!("mon-{id}"),
            image_url: format!("art/{id}.png"),
            types: vec![PokemonType::Water, PokemonType::Ice],
            level: 30,
            ability: "shell-armor".to_string(),
            held_item: Some("leftovers".to_string()),
            moves: vec!["surf".to_string(), "ice-beam".to_string()],
            base_stats: BTreeMap::from([("hp".to_string(), 130), ("speed".to_string(), 60)]),
        }
    }

    // ------------------------------------------------------------------
    // Schema / open
    // ------------------------------------------------------------------

    #[test]
    fn open_creates_tables() {
        let db = test_db();
        let conn = db.conn();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        for table in ["species_cache", "pokemon_index", "roster_members", "app_state"] {
            assert!(tables.contains(&table.to_string()), "missing {table}");
        }
    }

    // ------------------------------------------------------------------
    // Species cache
    // ------------------------------------------------------------------

    #[test]
    fn store_and_load_species() {
        let db = test_db();
        let detail = sample_detail(25, "pikachu");
        db.store_species(&detail).unwrap();

        let value = db.load_species(25).unwrap().expect("record should exist");
        let back: PokemonDetail = serde_json::from_value(value).unwrap();
        assert_eq!(back, detail);
        assert_eq!(db.cached_species_count().unwrap(), 1);
        assert!(db.species_fetched_at(25).unwrap().is_some());
    }

    #[test]
    fn load_species_missing_is_none() {
        let db = test_db();
        assert!(db.load_species(1).unwrap().is_none());
        assert!(db.species_fetched_at(1).unwrap().is_none());
    }

    #[test]
    fn store_species_overwrites_partial_record() {
        let db = test_db();
        db.store_species_raw(25, "pikachu", &json!({ "id": 25, "name": "pikachu" }).to_string())
            .unwrap();
        db.store_species(&sample_detail(25, "pikachu")).unwrap();

        let value = db.load_species(25).unwrap().unwrap();
        assert!(value.get("kanto_locations").is_some());
        assert_eq!(db.cached_species_count().unwrap(), 1);
    }

    #[test]
    fn clear_species_cache_keeps_rosters() {
        let db = test_db();
        db.store_species(&sample_detail(25, "pikachu")).unwrap();
        db.store_index(151, &[sample_detail(25, "pikachu").summary()]).unwrap();
        db.save_type_chart(&TypeChart::builtin()).unwrap();
        let mut roster = Roster::new();
        roster.add(sample_member(131)).unwrap();
        db.save_roster("ash", &roster).unwrap();

        db.clear_species_cache().unwrap();

        assert_eq!(db.cached_species_count().unwrap(), 0);
        assert!(db.load_index(151).unwrap().is_none());
        assert_eq!(db.index_coverage().unwrap(), None);
        assert_eq!(db.load_roster("ash").unwrap().len(), 1);
        assert!(db.load_type_chart().unwrap().is_some());
    }

    // ------------------------------------------------------------------
    // Listing mirror
    // ------------------------------------------------------------------

    #[test]
    fn index_loads_requested_range_in_order() {
        let db = test_db();
        let entries: Vec<PokemonSummary> = [3, 1, 2, 152]
            .iter()
            .map(|&id| sample_detail(id, &format!("mon-{id}")).summary())
            .collect();
        db.store_index(151, &entries).unwrap();

        let loaded = db.load_index(151).unwrap().unwrap();
        let ids: Vec<u32> = loaded.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(loaded[0].types, vec![PokemonType::Electric]);
        assert_eq!(db.load_index(2).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn index_coverage_follows_requested_limit_not_row_count() {
        let db = test_db();
        assert!(db.load_index(10).unwrap().is_none());

        // Upstream answered a request for 10 with only 2 usable entries.
        let entries: Vec<PokemonSummary> = [1, 2]
            .iter()
            .map(|&id| sample_detail(id, &format!("mon-{id}")).summary())
            .collect();
        db.store_index(10, &entries).unwrap();

        assert_eq!(db.index_coverage().unwrap(), Some(10));
        assert_eq!(db.load_index(10).unwrap().unwrap().len(), 2);
        assert!(db.load_index(11).unwrap().is_none());

        // A smaller refresh does not shrink the covered range.
        db.store_index(5, &entries).unwrap();
        assert_eq!(db.index_coverage().unwrap(), Some(10));
    }

    // ------------------------------------------------------------------
    // Rosters
    // ------------------------------------------------------------------

    #[test]
    fn roster_round_trip_keeps_order_and_fields() {
        let db = test_db();
        let mut roster = Roster::new();
        roster.add(sample_member(131)).unwrap();
        let mut second = sample_member(7);
        second.held_item = None;
        second.moves.clear();
        roster.add(second).unwrap();

        db.save_roster("ash", &roster).unwrap();
        let loaded = db.load_roster("ash").unwrap();
        assert_eq!(loaded, roster);
    }

    #[test]
    fn unknown_user_has_empty_roster() {
        let db = test_db();
        assert!(db.load_roster("nobody").unwrap().is_empty());
    }

    #[test]
    fn save_roster_replaces_previous_members() {
        let db = test_db();
        let mut roster = Roster::new();
        roster.add(sample_member(1)).unwrap();
        roster.add(sample_member(2)).unwrap();
        db.save_roster("ash", &roster).unwrap();

        roster.remove(1).unwrap();
        db.save_roster("ash", &roster).unwrap();

        let ids: Vec<u32> = db.load_roster("ash").unwrap().iter().map(|m| m.pokemon_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn rosters_are_scoped_per_user() {
        let db = test_db();
        let mut ash = Roster::new();
        ash.add(sample_member(25)).unwrap();
        db.save_roster("ash", &ash).unwrap();
        db.save_roster("misty", &Roster::new()).unwrap();

        assert_eq!(db.load_roster("ash").unwrap().len(), 1);
        assert!(db.load_roster("misty").unwrap().is_empty());
    }

    // ------------------------------------------------------------------
    // Key-value state
    // ------------------------------------------------------------------

    #[test]
    fn save_and_load_state_round_trip() {
        let db = test_db();
        let value = json!({"synced": true, "types": 18});
        db.save_state("meta", &value).unwrap();
        assert_eq!(db.load_state("meta").unwrap(), Some(value));
        assert!(db.load_state("missing").unwrap().is_none());
    }

    #[test]
    fn type_chart_round_trip() {
        let db = test_db();
        assert!(db.load_type_chart().unwrap().is_none());
        db.save_type_chart(&TypeChart::builtin()).unwrap();
        assert_eq!(db.load_type_chart().unwrap(), Some(TypeChart::builtin()));
    }

    #[test]
    fn species_cache_trait_delegates() {
        let db = test_db();
        let cache: &dyn SpeciesCache = &db;
        cache.store_species(&sample_detail(1, "bulbasaur")).unwrap();
        assert!(cache.load_species(1).unwrap().is_some());
    }
}
