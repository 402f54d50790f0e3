//! Save/load of whole-game snapshots.
//!
//! A save is the JSON form of one [`GameState`] stored under [`STORAGE_KEY`].
//! There is no version field: loading checks that every expected field is
//! present and treats anything else as "no save", removing it from the store.

use crate::game::GameState;
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

/// Key the current game is saved under
pub const STORAGE_KEY: &str = "cosmic-catan";

const REQUIRED_STATE_FIELDS: &[&str] = &[
    "board",
    "players",
    "current_player",
    "phase",
    "mode",
    "turn_number",
    "dice",
    "win_target",
    "deck",
    "discarded",
    "trade_offers",
    "next_offer_id",
    "clock",
    "rules",
    "setup_settlement",
];

const REQUIRED_BOARD_FIELDS: &[&str] = &["tiles", "vertices", "edges", "ports", "black_hole"];

const REQUIRED_PLAYER_FIELDS: &[&str] = &[
    "id",
    "name",
    "color",
    "resources",
    "buildings",
    "victory_points",
    "placed_settlements",
    "placed_roads",
    "cards",
    "gravity_wells_played",
    "has_gravity_dominion",
    "has_longest_chain",
];

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Key-value storage for snapshots
pub trait SnapshotStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

/// In-memory store, mostly for tests and embedding
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl SnapshotStore for FileStore {
    fn read(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path(key)).ok()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

pub fn to_snapshot(state: &GameState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a snapshot, or `None` if it is not a complete game state
pub fn from_snapshot(raw: &str) -> Option<GameState> {
    let value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "snapshot is not valid JSON");
            return None;
        }
    };

    if let Some(missing) = missing_field(&value) {
        warn!(%missing, "snapshot is missing a field");
        return None;
    }

    match serde_json::from_value(value) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!(error = %e, "snapshot does not match the game state");
            None
        }
    }
}

/// First expected field absent from the snapshot
fn missing_field(value: &Value) -> Option<String> {
    let missing_in = |object: &Value, fields: &[&str], prefix: &str| {
        fields
            .iter()
            .find(|f| object.get(**f).is_none())
            .map(|f| format!("{}{}", prefix, f))
    };

    if !value.is_object() {
        return Some("<root>".to_string());
    }
    if let Some(missing) = missing_in(value, REQUIRED_STATE_FIELDS, "") {
        return Some(missing);
    }
    if let Some(missing) = missing_in(&value["board"], REQUIRED_BOARD_FIELDS, "board.") {
        return Some(missing);
    }

    let Some(players) = value["players"].as_array() else {
        return Some("players[]".to_string());
    };
    players.iter().enumerate().find_map(|(i, player)| {
        missing_in(player, REQUIRED_PLAYER_FIELDS, &format!("players[{}].", i))
    })
}

/// Save the game under [`STORAGE_KEY`]
pub fn save(store: &mut dyn SnapshotStore, state: &GameState) -> Result<(), PersistError> {
    let snapshot = to_snapshot(state)?;
    store.write(STORAGE_KEY, &snapshot)?;
    debug!(bytes = snapshot.len(), "game saved");
    Ok(())
}

/// Load the saved game. A stale or corrupt save is removed and reported as absent.
pub fn load(store: &mut dyn SnapshotStore) -> Option<GameState> {
    let raw = store.read(STORAGE_KEY)?;
    let state = from_snapshot(&raw);
    if state.is_none() {
        if let Err(e) = store.remove(STORAGE_KEY) {
            warn!(error = %e, "failed to discard stale save");
        }
    }
    state
}

/// Drop any saved game
pub fn clear(store: &mut dyn SnapshotStore) -> Result<(), PersistError> {
    store.remove(STORAGE_KEY)
}
