//! Declarative content tables: items, activities, recipes, and the quest
//! chain. The engine only ever consults these through the lookup helpers,
//! so tuning content never touches engine code.

use crate::game::leveling::LevelCurve;
use crate::game::types::{ActivityKind, ResourceKind, FLAG_SHELTER_BUILT};

// ============================================================================
// Item catalog
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemCategory {
    Tool,
    Resource,
    Food,
    Ammo,
    Building,
    Lore,
}

#[derive(Debug, Clone, Copy)]
pub struct ItemSpec {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ItemCategory,
    /// Fresh durability for tools; 0 for everything else.
    pub max_durability: u32,
}

pub const ITEMS: &[ItemSpec] = &[
    ItemSpec { id: "simple_pickaxe", name: "simple pickaxe", category: ItemCategory::Tool, max_durability: 100 },
    ItemSpec { id: "simple_axe", name: "simple axe", category: ItemCategory::Tool, max_durability: 100 },
    ItemSpec { id: "simple_knife", name: "simple knife", category: ItemCategory::Tool, max_durability: 100 },
    ItemSpec { id: "simple_bow", name: "simple bow", category: ItemCategory::Tool, max_durability: 100 },
    ItemSpec { id: "arrow", name: "arrow", category: ItemCategory::Ammo, max_durability: 0 },
    ItemSpec { id: "stone", name: "stone", category: ItemCategory::Resource, max_durability: 0 },
    ItemSpec { id: "coal", name: "coal", category: ItemCategory::Resource, max_durability: 0 },
    ItemSpec { id: "birch_log", name: "birch log", category: ItemCategory::Resource, max_durability: 0 },
    ItemSpec { id: "birch_plank", name: "birch plank", category: ItemCategory::Resource, max_durability: 0 },
    ItemSpec { id: "forest_berry", name: "forest berry", category: ItemCategory::Food, max_durability: 0 },
    ItemSpec { id: "rabbit", name: "rabbit", category: ItemCategory::Resource, max_durability: 0 },
    ItemSpec { id: "grouse", name: "grouse", category: ItemCategory::Resource, max_durability: 0 },
    ItemSpec { id: "simple_hut", name: "simple hut", category: ItemCategory::Building, max_durability: 0 },
    ItemSpec { id: "lore_page_1", name: "page 1, \"The Forgotten Silence\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_2", name: "page 2, \"Ashes of Memory\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_3", name: "page 3, \"The Awakening\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_4", name: "page 4, \"Nameless\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_5", name: "page 5, \"A Spark of Change\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_6", name: "page 6, \"The Watching Woods\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_7", name: "page 7, \"Whisper of the Wind\"", category: ItemCategory::Lore, max_durability: 0 },
    ItemSpec { id: "lore_page_8", name: "page 8, \"Trace of the Ancients\"", category: ItemCategory::Lore, max_durability: 0 },
];

pub fn item(id: &str) -> Option<&'static ItemSpec> {
    ITEMS.iter().find(|spec| spec.id == id)
}

pub fn lore_page_item(index: u8) -> Option<&'static ItemSpec> {
    match index {
        1..=8 => item(LORE_PAGE_IDS[index as usize - 1]),
        _ => None,
    }
}

pub const LORE_PAGE_IDS: [&str; 8] = [
    "lore_page_1", "lore_page_2", "lore_page_3", "lore_page_4",
    "lore_page_5", "lore_page_6", "lore_page_7", "lore_page_8",
];

/// Item consumed by the eat command.
pub const BERRY_ITEM: &str = "forest_berry";
/// Satiety restored per berry eaten.
pub const BERRY_SATIETY_RESTORED: u32 = 5;
/// Resting takes half an hour.
pub const REST_DURATION_SECS: u64 = 1800;
/// Satiety restored by a full rest.
pub const REST_SATIETY_RESTORED: u32 = 50;

/// Items granted to every freshly created player: (item, quantity, durability).
pub const STARTER_KIT: &[(&str, u32, u32)] = &[
    ("simple_bow", 1, 100),
    ("simple_knife", 1, 100),
    ("simple_pickaxe", 1, 100),
    ("simple_axe", 1, 100),
    ("arrow", 100, 0),
    ("forest_berry", 10, 0),
];

// ============================================================================
// Activity table
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub resource: ResourceKind,
    /// How long one strike on this resource takes, in seconds.
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Copy)]
pub struct AmmoSpec {
    pub item: &'static str,
    /// Units consumed per strike, regardless of tool survival.
    pub per_strike: u32,
}

/// Everything that distinguishes one harvesting discipline from another.
#[derive(Debug, Clone, Copy)]
pub struct ActivitySpec {
    pub kind: ActivityKind,
    pub resources: &'static [ResourceSpec],
    pub tool: &'static str,
    pub ammo: Option<AmmoSpec>,
    pub curve: LevelCurve,
    pub exp_per_harvest: u32,
    pub cooldown_secs: u64,
}

impl ActivitySpec {
    pub fn duration_of(&self, resource: ResourceKind) -> Option<u64> {
        self.resources
            .iter()
            .find(|spec| spec.resource == resource)
            .map(|spec| spec.duration_secs)
    }
}

pub const ACTIVITIES: &[ActivitySpec] = &[
    ActivitySpec {
        kind: ActivityKind::Mining,
        resources: &[
            ResourceSpec { resource: ResourceKind::Stone, duration_secs: 10 },
            ResourceSpec { resource: ResourceKind::Coal, duration_secs: 20 },
        ],
        tool: "simple_pickaxe",
        ammo: None,
        curve: LevelCurve::Cumulative,
        exp_per_harvest: 2,
        cooldown_secs: 60,
    },
    ActivitySpec {
        kind: ActivityKind::Woodcutting,
        resources: &[ResourceSpec { resource: ResourceKind::Birch, duration_secs: 10 }],
        tool: "simple_axe",
        ammo: None,
        curve: LevelCurve::Cumulative,
        exp_per_harvest: 2,
        cooldown_secs: 60,
    },
    ActivitySpec {
        kind: ActivityKind::Foraging,
        resources: &[ResourceSpec { resource: ResourceKind::Berry, duration_secs: 10 }],
        tool: "simple_knife",
        ammo: None,
        curve: LevelCurve::Linear,
        exp_per_harvest: 2,
        cooldown_secs: 60,
    },
    ActivitySpec {
        kind: ActivityKind::Hunting,
        resources: &[
            ResourceSpec { resource: ResourceKind::Rabbit, duration_secs: 20 },
            ResourceSpec { resource: ResourceKind::Grouse, duration_secs: 20 },
        ],
        tool: "simple_bow",
        ammo: Some(AmmoSpec { item: "arrow", per_strike: 1 }),
        curve: LevelCurve::Cumulative,
        exp_per_harvest: 2,
        cooldown_secs: 60,
    },
];

pub fn activity(kind: ActivityKind) -> &'static ActivitySpec {
    ACTIVITIES
        .iter()
        .find(|spec| spec.kind == kind)
        .expect("every activity kind has a spec")
}

// ============================================================================
// Recipe table
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub enum RecipeKind {
    /// Produces `quantity` stackable items; takes `per_unit_secs * quantity`
    /// and costs 1 satiety per unit on completion.
    Simple { per_unit_secs: u64 },
    /// One-off construction with a fixed duration; sets a player flag and
    /// costs a flat amount of satiety on completion.
    Building {
        duration_secs: u64,
        flag: &'static str,
        satiety_cost: u32,
    },
}

#[derive(Debug, Clone, Copy)]
pub struct RecipeSpec {
    pub id: &'static str,
    pub output: &'static str,
    /// Material bill. For simple recipes this is the cost per crafted unit;
    /// for buildings it is the whole bill.
    pub cost: &'static [(&'static str, u32)],
    pub kind: RecipeKind,
}

pub const RECIPES: &[RecipeSpec] = &[
    RecipeSpec {
        id: "birch_plank",
        output: "birch_plank",
        cost: &[("birch_log", 2)],
        kind: RecipeKind::Simple { per_unit_secs: 20 },
    },
    RecipeSpec {
        id: "simple_hut",
        output: "simple_hut",
        cost: &[
            ("birch_log", 20),
            ("birch_plank", 10),
            ("stone", 15),
            ("forest_berry", 10),
        ],
        kind: RecipeKind::Building {
            duration_secs: 120,
            flag: FLAG_SHELTER_BUILT,
            satiety_cost: 5,
        },
    },
];

pub fn recipe(id: &str) -> Option<&'static RecipeSpec> {
    RECIPES.iter().find(|spec| spec.id == id)
}

// ============================================================================
// Quest chain
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestGoal {
    /// One unit of progress per harvest of this resource.
    HarvestResource(ResourceKind),
    /// One unit of progress per completed hunt, whatever the game.
    HuntAnyGame,
    /// Progress advances by the crafted quantity.
    CraftItem(&'static str),
    /// Pages must be read strictly in order 1..=target; progress is the
    /// highest page reached.
    ReadPagesInOrder,
    /// One unit of progress per berry eaten.
    EatBerries,
    /// Completed by finishing shelter construction.
    BuildShelter,
}

#[derive(Debug, Clone, Copy)]
pub struct QuestSpec {
    pub id: u8,
    pub name: &'static str,
    pub goal: QuestGoal,
    pub target: u32,
    pub reward_exp: u32,
    pub reward_item: &'static str,
}

/// The strictly linear chain. Quest N+1 is only offered once quest N is
/// completed; the order of this table is the order of the chain.
pub const QUESTS: &[QuestSpec] = &[
    QuestSpec { id: 1, name: "Axe to the Tree", goal: QuestGoal::HarvestResource(ResourceKind::Birch), target: 5, reward_exp: 10, reward_item: "lore_page_1" },
    QuestSpec { id: 2, name: "Going Deeper", goal: QuestGoal::HarvestResource(ResourceKind::Stone), target: 3, reward_exp: 10, reward_item: "lore_page_2" },
    QuestSpec { id: 3, name: "Planks for the Road", goal: QuestGoal::CraftItem("birch_plank"), target: 3, reward_exp: 10, reward_item: "lore_page_3" },
    QuestSpec { id: 4, name: "Gift of the Forest", goal: QuestGoal::HarvestResource(ResourceKind::Berry), target: 5, reward_exp: 10, reward_item: "lore_page_4" },
    QuestSpec { id: 5, name: "The Beast's Gaze", goal: QuestGoal::HuntAnyGame, target: 1, reward_exp: 10, reward_item: "lore_page_5" },
    QuestSpec { id: 6, name: "The Living Archive", goal: QuestGoal::ReadPagesInOrder, target: 5, reward_exp: 10, reward_item: "lore_page_6" },
    QuestSpec { id: 7, name: "A Light Meal", goal: QuestGoal::EatBerries, target: 3, reward_exp: 10, reward_item: "lore_page_7" },
    QuestSpec { id: 8, name: "Under a Roof", goal: QuestGoal::BuildShelter, target: 1, reward_exp: 10, reward_item: "lore_page_8" },
];

pub fn quest(id: u8) -> Option<&'static QuestSpec> {
    QUESTS.iter().find(|spec| spec.id == id)
}
