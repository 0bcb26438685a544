//! Game data model, persistence, and the activity session engine.
//!
//! The content tables in [`content`] describe what exists (items,
//! activities, recipes, the quest chain); everything else is engine:
//! [`session::Engine`] owns per-player state and exclusivity,
//! [`scheduler`] drives timed actions, and [`storage::GameStore`]
//! persists whatever must survive a restart.

pub mod content;
pub mod cooldown;
pub mod errors;
pub mod grid;
pub mod leveling;
pub mod presenter;
pub mod quest;
pub(crate) mod scheduler;
pub mod session;
pub mod storage;
pub mod types;

pub use content::{ActivitySpec, QuestGoal, QuestSpec, RecipeKind, RecipeSpec};
pub use errors::{GameError, StorageError};
pub use grid::{ResourceGrid, GRID_DIM, NODES_PER_GRID};
pub use leveling::{experience_to_next, LevelCurve};
pub use presenter::{
    ConsolePresenter, GridView, HarvestReport, InfoPanel, Notice, Presenter, PresenterEvent,
    ProgressSubject, ProgressView, RecordingPresenter,
};
pub use quest::QuestBoardEntry;
pub use session::Engine;
pub use storage::{item_label, GameStore, GameStoreBuilder};
pub use types::{
    ActivityKind, GameEvent, InventoryLine, PlayerId, PlayerRecord, QuestRow, QuestStatus,
    ResourceKind, SkillTrack, SurfaceId, FLAG_SHELTER_BUILT,
};
