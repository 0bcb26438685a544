use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PLAYER_SCHEMA_VERSION: u8 = 1;
pub const SKILL_SCHEMA_VERSION: u8 = 1;
pub const INVENTORY_SCHEMA_VERSION: u8 = 1;
pub const QUEST_SCHEMA_VERSION: u8 = 1;

/// Identity assigned by the chat transport (e.g. a messenger user id).
pub type PlayerId = i64;

/// Opaque handle to a rendered chat surface (message), owned by the
/// presenter. The engine only stores and forwards these.
pub type SurfaceId = i64;

/// Milestone flag set when the player finishes building a shelter.
pub const FLAG_SHELTER_BUILT: &str = "shelter_built";

/// The four timed harvesting disciplines. Crafting and resting share the
/// same exclusivity envelope but are not grid activities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Mining,
    Woodcutting,
    Foraging,
    Hunting,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 4] = [
        ActivityKind::Mining,
        ActivityKind::Woodcutting,
        ActivityKind::Foraging,
        ActivityKind::Hunting,
    ];

    /// Stable key used in storage keys and log lines.
    pub fn key(&self) -> &'static str {
        match self {
            ActivityKind::Mining => "mining",
            ActivityKind::Woodcutting => "woodcutting",
            ActivityKind::Foraging => "foraging",
            ActivityKind::Hunting => "hunting",
        }
    }

    /// Name of the place the player travels to for this activity.
    pub fn site_name(&self) -> &'static str {
        match self {
            ActivityKind::Mining => "mine",
            ActivityKind::Woodcutting => "forest",
            ActivityKind::Foraging => "berry grove",
            ActivityKind::Hunting => "hunting grounds",
        }
    }
}

/// What a populated grid cell yields when struck.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Stone,
    Coal,
    Birch,
    Berry,
    Rabbit,
    Grouse,
}

impl ResourceKind {
    /// Inventory item id credited when this resource is harvested.
    pub fn item_id(&self) -> &'static str {
        match self {
            ResourceKind::Stone => "stone",
            ResourceKind::Coal => "coal",
            ResourceKind::Birch => "birch_log",
            ResourceKind::Berry => "forest_berry",
            ResourceKind::Rabbit => "rabbit",
            ResourceKind::Grouse => "grouse",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::Stone => "stone",
            ResourceKind::Coal => "coal",
            ResourceKind::Birch => "birch log",
            ResourceKind::Berry => "forest berry",
            ResourceKind::Rabbit => "rabbit",
            ResourceKind::Grouse => "grouse",
        }
    }
}

/// Persistent player record. Created on first contact, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub name: String,
    pub level: u32,
    pub experience: u32,
    /// Hunger meter, clamped to 0..=100. Harvesting and crafting spend it.
    pub satiety: u32,
    /// Boolean milestone flags such as [`FLAG_SHELTER_BUILT`].
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    pub created_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerRecord {
    pub fn new(id: PlayerId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            level: 1,
            experience: 0,
            satiety: 100,
            flags: BTreeMap::new(),
            created_at: Utc::now(),
            schema_version: PLAYER_SCHEMA_VERSION,
        }
    }

    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// Per-player, per-activity progression state. Created lazily on first
/// entry to that activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillTrack {
    pub player: PlayerId,
    pub kind: ActivityKind,
    pub level: u32,
    pub experience: u32,
    pub last_used: DateTime<Utc>,
    pub exhausted: bool,
    pub schema_version: u8,
}

impl SkillTrack {
    pub fn new(player: PlayerId, kind: ActivityKind) -> Self {
        Self {
            player,
            kind,
            level: 1,
            experience: 0,
            last_used: Utc::now(),
            exhausted: false,
            schema_version: SKILL_SCHEMA_VERSION,
        }
    }
}

/// One stack of identical items held by a player. `durability` is only
/// meaningful for tools (0 for stackable resources).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryLine {
    pub item: String,
    pub quantity: u32,
    pub durability: u32,
    pub schema_version: u8,
}

impl InventoryLine {
    pub fn new(item: &str, quantity: u32, durability: u32) -> Self {
        Self {
            item: item.to_string(),
            quantity,
            durability,
            schema_version: INVENTORY_SCHEMA_VERSION,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Available,
    Active,
    Completed,
}

/// A player's row in the strictly linear quest chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestRow {
    pub quest_id: u8,
    pub status: QuestStatus,
    pub progress: u32,
    pub target: u32,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub schema_version: u8,
}

impl QuestRow {
    pub fn new(quest_id: u8, target: u32) -> Self {
        Self {
            quest_id,
            status: QuestStatus::Available,
            progress: 0,
            target,
            created_at: Utc::now(),
            completed_at: None,
            schema_version: QUEST_SCHEMA_VERSION,
        }
    }
}

/// Domain events forwarded to the quest coordinator after a step resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    ResourceHarvested {
        kind: ActivityKind,
        resource: ResourceKind,
    },
    ItemCrafted {
        item: &'static str,
        quantity: u32,
    },
    PageRead {
        index: u8,
    },
    BerryEaten,
    ShelterBuilt,
}
