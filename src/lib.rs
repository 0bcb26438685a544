//! # Wildgrove - a chat-driven survival RPG engine
//!
//! Wildgrove is the engine of a chat-driven text RPG: a player mines,
//! chops, forages, hunts, crafts, and works through a strictly linear
//! quest chain, all over a chat transport. The crate owns the game rules
//! and the per-player activity session machinery; the chat transport and
//! message rendering sit behind a small presenter boundary.
//!
//! ## Features
//!
//! - **Activity sessions**: 3x3 resource grids for mining, woodcutting,
//!   foraging, and hunting, with at most one timed action per player.
//! - **Timed actions**: one tokio task per in-flight strike, craft, or
//!   rest, ticking a ten-segment progress bar once per second.
//! - **Progression**: per-activity skill tracks with two leveling curves,
//!   tool durability, satiety, and site exhaustion with cooldowns.
//! - **Quests**: a declarative, strictly sequential quest chain advanced
//!   by domain events, with idempotent reward grants.
//! - **Persistence**: sled-backed store for everything that must survive
//!   a restart of the process or the chat transport.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wildgrove::game::{ActivityKind, ConsolePresenter, Engine, GameStoreBuilder};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = GameStoreBuilder::new("data/wildgrove").open()?;
//!     let engine = Engine::new(store, Arc::new(ConsolePresenter::new()));
//!
//!     engine.ensure_player(1, "Rowan")?;
//!     engine.enter(1, ActivityKind::Mining).await?;
//!     engine.strike(1, 0, 0).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Data model, content tables, storage, and the session engine
//! - [`config`] - Configuration loading and validation
//! - [`logutil`] - Log sanitization helpers for player-supplied text

pub mod config;
pub mod game;
pub mod logutil;
