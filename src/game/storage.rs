use std::path::{Path, PathBuf};

use chrono::Utc;
use sled::IVec;

use crate::game::content::{self, STARTER_KIT};
use crate::game::errors::StorageError;
use crate::game::leveling::LevelCurve;
use crate::game::types::{
    ActivityKind, InventoryLine, PlayerId, PlayerRecord, QuestRow, QuestStatus, SkillTrack,
    INVENTORY_SCHEMA_VERSION, PLAYER_SCHEMA_VERSION, QUEST_SCHEMA_VERSION, SKILL_SCHEMA_VERSION,
};

const TREE_PLAYERS: &str = "players";
const TREE_SKILLS: &str = "skills";
const TREE_INVENTORY: &str = "inventory";
const TREE_QUESTS: &str = "quests";

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct GameStoreBuilder {
    path: PathBuf,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<GameStore, StorageError> {
        GameStore::open(self.path)
    }
}

/// Sled-backed persistence for players, skill tracks, inventory lines, and
/// quest rows. All calls are synchronous; callers surface failures to the
/// player as a transient error and abandon the current step.
pub struct GameStore {
    _db: sled::Db,
    players: sled::Tree,
    skills: sled::Tree,
    inventory: sled::Tree,
    quests: sled::Tree,
}

impl GameStore {
    /// Open (or create) the game store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let players = db.open_tree(TREE_PLAYERS)?;
        let skills = db.open_tree(TREE_SKILLS)?;
        let inventory = db.open_tree(TREE_INVENTORY)?;
        let quests = db.open_tree(TREE_QUESTS)?;
        Ok(Self {
            _db: db,
            players,
            skills,
            inventory,
            quests,
        })
    }

    fn player_key(player: PlayerId) -> Vec<u8> {
        format!("players:{player}").into_bytes()
    }

    fn skill_key(player: PlayerId, kind: ActivityKind) -> Vec<u8> {
        format!("skills:{player}:{}", kind.key()).into_bytes()
    }

    fn inventory_key(player: PlayerId, item: &str) -> Vec<u8> {
        format!("inv:{player}:{item}").into_bytes()
    }

    fn inventory_prefix(player: PlayerId) -> Vec<u8> {
        format!("inv:{player}:").into_bytes()
    }

    fn quest_key(player: PlayerId, quest_id: u8) -> Vec<u8> {
        format!("quests:{player}:{quest_id:02}").into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StorageError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StorageError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    // ------------------------------------------------------------------
    // Players
    // ------------------------------------------------------------------

    pub fn player_exists(&self, player: PlayerId) -> Result<bool, StorageError> {
        Ok(self.players.contains_key(Self::player_key(player))?)
    }

    pub fn get_player(&self, player: PlayerId) -> Result<PlayerRecord, StorageError> {
        let Some(bytes) = self.players.get(Self::player_key(player))? else {
            return Err(StorageError::NotFound(format!("player: {player}")));
        };
        let record: PlayerRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                entity: "player",
                expected: PLAYER_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    pub fn put_player(&self, mut record: PlayerRecord) -> Result<(), StorageError> {
        record.schema_version = PLAYER_SCHEMA_VERSION;
        let bytes = Self::serialize(&record)?;
        self.players.insert(Self::player_key(record.id), bytes)?;
        self.players.flush()?;
        Ok(())
    }

    /// Create a player on first contact and grant the starter kit.
    pub fn create_player(&self, player: PlayerId, name: &str) -> Result<PlayerRecord, StorageError> {
        let record = PlayerRecord::new(player, name);
        self.put_player(record.clone())?;
        for &(item, quantity, durability) in STARTER_KIT {
            self.add_inventory_with_durability(player, item, quantity, durability)?;
        }
        Ok(record)
    }

    pub fn list_player_ids(&self) -> Result<Vec<PlayerId>, StorageError> {
        let mut ids = Vec::new();
        for entry in self.players.scan_prefix(b"players:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(id) = text.strip_prefix("players:").and_then(|s| s.parse().ok()) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Satiety moves by `delta` and is clamped to 0..=100. Returns the new value.
    pub fn update_satiety(&self, player: PlayerId, delta: i32) -> Result<u32, StorageError> {
        let mut record = self.get_player(player)?;
        record.satiety = (record.satiety as i64 + i64::from(delta)).clamp(0, 100) as u32;
        let satiety = record.satiety;
        self.put_player(record)?;
        Ok(satiety)
    }

    pub fn add_player_experience(&self, player: PlayerId, delta: u32) -> Result<(), StorageError> {
        let mut record = self.get_player(player)?;
        record.experience = record.experience.saturating_add(delta);
        self.put_player(record)
    }

    pub fn set_player_flag(
        &self,
        player: PlayerId,
        name: &str,
        value: bool,
    ) -> Result<(), StorageError> {
        let mut record = self.get_player(player)?;
        record.flags.insert(name.to_string(), value);
        self.put_player(record)
    }

    // ------------------------------------------------------------------
    // Skill tracks
    // ------------------------------------------------------------------

    pub fn get_or_create_skill_track(
        &self,
        player: PlayerId,
        kind: ActivityKind,
    ) -> Result<SkillTrack, StorageError> {
        let key = Self::skill_key(player, kind);
        if let Some(bytes) = self.skills.get(&key)? {
            let track: SkillTrack = Self::deserialize(bytes)?;
            if track.schema_version != SKILL_SCHEMA_VERSION {
                return Err(StorageError::SchemaMismatch {
                    entity: "skill_track",
                    expected: SKILL_SCHEMA_VERSION,
                    found: track.schema_version,
                });
            }
            return Ok(track);
        }
        let track = SkillTrack::new(player, kind);
        self.put_skill_track(track.clone())?;
        Ok(track)
    }

    pub fn put_skill_track(&self, mut track: SkillTrack) -> Result<(), StorageError> {
        track.schema_version = SKILL_SCHEMA_VERSION;
        let key = Self::skill_key(track.player, track.kind);
        let bytes = Self::serialize(&track)?;
        self.skills.insert(key, bytes)?;
        self.skills.flush()?;
        Ok(())
    }

    /// Add experience to a skill track and recompute its level along the
    /// given curve. Returns `(leveled_up, new_level)`.
    pub fn update_skill_experience(
        &self,
        player: PlayerId,
        kind: ActivityKind,
        delta: u32,
        curve: LevelCurve,
    ) -> Result<(bool, u32), StorageError> {
        let mut track = self.get_or_create_skill_track(player, kind)?;
        let old_level = track.level;
        track.experience = track.experience.saturating_add(delta);
        track.level = curve.level_after(track.level, track.experience);
        track.last_used = Utc::now();
        let new_level = track.level;
        self.put_skill_track(track)?;
        Ok((new_level > old_level, new_level))
    }

    pub fn set_exhausted(
        &self,
        player: PlayerId,
        kind: ActivityKind,
        exhausted: bool,
    ) -> Result<(), StorageError> {
        let mut track = self.get_or_create_skill_track(player, kind)?;
        track.exhausted = exhausted;
        track.last_used = Utc::now();
        self.put_skill_track(track)
    }

    // ------------------------------------------------------------------
    // Inventory
    // ------------------------------------------------------------------

    fn get_line(&self, player: PlayerId, item: &str) -> Result<Option<InventoryLine>, StorageError> {
        let Some(bytes) = self.inventory.get(Self::inventory_key(player, item))? else {
            return Ok(None);
        };
        let line: InventoryLine = Self::deserialize(bytes)?;
        if line.schema_version != INVENTORY_SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                entity: "inventory_line",
                expected: INVENTORY_SCHEMA_VERSION,
                found: line.schema_version,
            });
        }
        Ok(Some(line))
    }

    fn put_line(&self, player: PlayerId, line: &InventoryLine) -> Result<(), StorageError> {
        let bytes = Self::serialize(line)?;
        self.inventory.insert(Self::inventory_key(player, &line.item), bytes)?;
        self.inventory.flush()?;
        Ok(())
    }

    pub fn inventory_quantity(&self, player: PlayerId, item: &str) -> Result<u32, StorageError> {
        Ok(self.get_line(player, item)?.map(|l| l.quantity).unwrap_or(0))
    }

    /// Remaining durability of a tool the player holds, or `None` when the
    /// tool is absent. A broken tool is removed outright, so any present
    /// tool has durability > 0.
    pub fn tool_state(&self, player: PlayerId, item: &str) -> Result<Option<u32>, StorageError> {
        Ok(self.get_line(player, item)?.map(|l| l.durability))
    }

    pub fn add_inventory(
        &self,
        player: PlayerId,
        item: &str,
        quantity: u32,
    ) -> Result<(), StorageError> {
        self.add_inventory_with_durability(player, item, quantity, 0)
    }

    /// Add items, stacking onto an existing line. `durability` only applies
    /// when the line is first created (tools are not stackable in practice).
    pub fn add_inventory_with_durability(
        &self,
        player: PlayerId,
        item: &str,
        quantity: u32,
        durability: u32,
    ) -> Result<(), StorageError> {
        let line = match self.get_line(player, item)? {
            Some(mut line) => {
                line.quantity = line.quantity.saturating_add(quantity);
                line
            }
            None => InventoryLine::new(item, quantity, durability),
        };
        self.put_line(player, &line)
    }

    /// Remove items from a line, deleting it when the quantity reaches 0.
    pub fn consume_inventory(
        &self,
        player: PlayerId,
        item: &str,
        quantity: u32,
    ) -> Result<(), StorageError> {
        let Some(mut line) = self.get_line(player, item)? else {
            return Err(StorageError::InsufficientQuantity {
                item: item.to_string(),
                have: 0,
                need: quantity,
            });
        };
        if line.quantity < quantity {
            return Err(StorageError::InsufficientQuantity {
                item: item.to_string(),
                have: line.quantity,
                need: quantity,
            });
        }
        line.quantity -= quantity;
        if line.quantity == 0 {
            self.inventory.remove(Self::inventory_key(player, item))?;
            self.inventory.flush()?;
            Ok(())
        } else {
            self.put_line(player, &line)
        }
    }

    pub fn update_tool_durability(
        &self,
        player: PlayerId,
        item: &str,
        durability: u32,
    ) -> Result<(), StorageError> {
        let Some(mut line) = self.get_line(player, item)? else {
            return Err(StorageError::NotFound(format!("inventory line: {item}")));
        };
        line.durability = durability;
        self.put_line(player, &line)
    }

    pub fn list_inventory(&self, player: PlayerId) -> Result<Vec<InventoryLine>, StorageError> {
        let mut lines = Vec::new();
        for entry in self.inventory.scan_prefix(Self::inventory_prefix(player)) {
            let (_, bytes) = entry?;
            lines.push(Self::deserialize(bytes)?);
        }
        Ok(lines)
    }

    // ------------------------------------------------------------------
    // Quests
    // ------------------------------------------------------------------

    pub fn quest(&self, player: PlayerId, quest_id: u8) -> Result<Option<QuestRow>, StorageError> {
        let Some(bytes) = self.quests.get(Self::quest_key(player, quest_id))? else {
            return Ok(None);
        };
        let row: QuestRow = Self::deserialize(bytes)?;
        if row.schema_version != QUEST_SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                entity: "quest",
                expected: QUEST_SCHEMA_VERSION,
                found: row.schema_version,
            });
        }
        Ok(Some(row))
    }

    pub fn create_quest(
        &self,
        player: PlayerId,
        quest_id: u8,
        target: u32,
    ) -> Result<QuestRow, StorageError> {
        let row = QuestRow::new(quest_id, target);
        self.put_quest(player, row.clone())?;
        Ok(row)
    }

    fn put_quest(&self, player: PlayerId, mut row: QuestRow) -> Result<(), StorageError> {
        row.schema_version = QUEST_SCHEMA_VERSION;
        let bytes = Self::serialize(&row)?;
        self.quests.insert(Self::quest_key(player, row.quest_id), bytes)?;
        self.quests.flush()?;
        Ok(())
    }

    pub fn set_quest_status(
        &self,
        player: PlayerId,
        quest_id: u8,
        status: QuestStatus,
    ) -> Result<(), StorageError> {
        let Some(mut row) = self.quest(player, quest_id)? else {
            return Err(StorageError::NotFound(format!("quest: {quest_id}")));
        };
        row.status = status;
        if status == QuestStatus::Completed {
            row.completed_at = Some(Utc::now());
        }
        self.put_quest(player, row)
    }

    pub fn set_quest_progress(
        &self,
        player: PlayerId,
        quest_id: u8,
        progress: u32,
    ) -> Result<(), StorageError> {
        let Some(mut row) = self.quest(player, quest_id)? else {
            return Err(StorageError::NotFound(format!("quest: {quest_id}")));
        };
        row.progress = progress;
        self.put_quest(player, row)
    }
}

/// Look up an item's display name, falling back to its id for unknown items.
pub fn item_label(id: &str) -> &str {
    content::item(id).map(|spec| spec.name).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, GameStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path()).open().expect("store");
        (dir, store)
    }

    #[test]
    fn player_round_trip_with_starter_kit() {
        let (_dir, store) = setup();
        let created = store.create_player(7, "Rowan").expect("create");
        assert_eq!(created.satiety, 100);

        let fetched = store.get_player(7).expect("get");
        assert_eq!(fetched.name, "Rowan");
        assert_eq!(fetched.level, 1);
        assert_eq!(store.inventory_quantity(7, "arrow").unwrap(), 100);
        assert_eq!(store.tool_state(7, "simple_pickaxe").unwrap(), Some(100));
        assert!(store.player_exists(7).unwrap());
        assert!(!store.player_exists(8).unwrap());
    }

    #[test]
    fn satiety_is_clamped_both_ways() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();
        assert_eq!(store.update_satiety(1, 50).unwrap(), 100);
        assert_eq!(store.update_satiety(1, -300).unwrap(), 0);
        assert_eq!(store.update_satiety(1, 5).unwrap(), 5);
    }

    #[test]
    fn consume_removes_empty_lines() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();
        store.add_inventory(1, "stone", 2).unwrap();
        store.consume_inventory(1, "stone", 2).unwrap();
        assert_eq!(store.inventory_quantity(1, "stone").unwrap(), 0);
        assert!(store
            .list_inventory(1)
            .unwrap()
            .iter()
            .all(|line| line.item != "stone"));
    }

    #[test]
    fn consume_fails_with_shortfall_details() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();
        store.add_inventory(1, "coal", 1).unwrap();
        let err = store.consume_inventory(1, "coal", 3).unwrap_err();
        match err {
            StorageError::InsufficientQuantity { item, have, need } => {
                assert_eq!(item, "coal");
                assert_eq!(have, 1);
                assert_eq!(need, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn skill_experience_levels_along_the_curve() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();

        let (up, level) = store
            .update_skill_experience(1, ActivityKind::Mining, 99, LevelCurve::Cumulative)
            .unwrap();
        assert!(!up);
        assert_eq!(level, 1);

        let (up, level) = store
            .update_skill_experience(1, ActivityKind::Mining, 1, LevelCurve::Cumulative)
            .unwrap();
        assert!(up);
        assert_eq!(level, 2);
    }

    #[test]
    fn exhaustion_flag_round_trips() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();
        store.set_exhausted(1, ActivityKind::Foraging, true).unwrap();
        let track = store
            .get_or_create_skill_track(1, ActivityKind::Foraging)
            .unwrap();
        assert!(track.exhausted);
        store.set_exhausted(1, ActivityKind::Foraging, false).unwrap();
        let track = store
            .get_or_create_skill_track(1, ActivityKind::Foraging)
            .unwrap();
        assert!(!track.exhausted);
    }

    #[test]
    fn quest_rows_round_trip() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();
        assert!(store.quest(1, 1).unwrap().is_none());

        store.create_quest(1, 1, 5).unwrap();
        let row = store.quest(1, 1).unwrap().expect("row");
        assert_eq!(row.status, QuestStatus::Available);
        assert_eq!(row.target, 5);

        store.set_quest_status(1, 1, QuestStatus::Completed).unwrap();
        let row = store.quest(1, 1).unwrap().expect("row");
        assert_eq!(row.status, QuestStatus::Completed);
        assert!(row.completed_at.is_some());
    }

    #[test]
    fn player_flags_persist() {
        let (_dir, store) = setup();
        store.create_player(1, "a").unwrap();
        assert!(!store.get_player(1).unwrap().flag("shelter_built"));
        store.set_player_flag(1, "shelter_built", true).unwrap();
        assert!(store.get_player(1).unwrap().flag("shelter_built"));
    }
}
