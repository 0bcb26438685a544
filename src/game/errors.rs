use std::time::Duration;
use thiserror::Error;

/// Errors that can arise while interacting with the game storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when a consume would drive a quantity below zero.
    #[error("not enough {item}: have {have}, need {need}")]
    InsufficientQuantity { item: String, have: u32, need: u32 },

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

/// Player-visible failures of engine operations. Every variant except
/// [`GameError::Store`] is a precondition failure resolved locally; none
/// of them ever aborts the process.
#[derive(Debug, Error)]
pub enum GameError {
    /// Another timed action (harvest, craft, or rest) is still running,
    /// or an activity session is already open.
    #[error("you are already busy with another action")]
    AlreadyActive,

    /// The site is depleted and still recovering.
    #[error("the area is still recovering ({} s left)", .remaining.as_secs())]
    OnCooldown { remaining: Duration },

    /// The activity's tool is missing or fully worn out.
    #[error("you need a working {tool} for that")]
    RequiredToolMissing { tool: &'static str },

    /// Not enough of a consumable (materials, ammunition, food, pages).
    #[error("you do not have enough {item}")]
    InsufficientQuantity { item: String },

    /// Satiety is at zero; the player must eat before working.
    #[error("you are too hungry to work; eat something first")]
    Starving,

    /// No activity session is open for this player.
    #[error("you are not at an activity site")]
    NoSession,

    /// The targeted grid cell holds no resource.
    #[error("there is nothing to harvest there")]
    EmptyCell,

    /// Resting requires a built shelter.
    #[error("you need a shelter before you can rest")]
    ShelterRequired,

    /// The requested recipe does not exist in the content table.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(String),

    /// Quest accepted out of order or before it was offered.
    #[error("quest {0} is not available yet")]
    QuestUnavailable(u8),

    /// Persistence failure; reported to the player as a transient error.
    #[error("storage unavailable: {0}")]
    Store(StorageError),
}

impl From<StorageError> for GameError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InsufficientQuantity { item, .. } => {
                GameError::InsufficientQuantity { item }
            }
            other => GameError::Store(other),
        }
    }
}
