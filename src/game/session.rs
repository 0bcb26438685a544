//! The activity session engine.
//!
//! One [`Engine`] owns every player's in-memory session state: the open
//! activity session, the single pending timed action, and the per-site
//! cooldowns. All of it lives behind one async mutex per player, so the
//! command path and the background resolution path never race on the
//! same player, and the at-most-one-timed-action invariant holds by
//! construction. Different players share nothing and proceed fully in
//! parallel.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::error;
use tokio::sync::Mutex as PlayerMutex;

use crate::game::content::{self, QuestSpec, RecipeKind, BERRY_ITEM, BERRY_SATIETY_RESTORED, REST_DURATION_SECS, REST_SATIETY_RESTORED};
use crate::game::cooldown::CooldownTracker;
use crate::game::errors::{GameError, StorageError};
use crate::game::grid::ResourceGrid;
use crate::game::leveling::experience_to_next;
use crate::game::presenter::{
    GridView, HarvestReport, InfoPanel, Notice, Presenter, ProgressSubject, ProgressView,
};
use crate::game::quest::{self, QuestBoardEntry};
use crate::game::scheduler;
use crate::game::storage::GameStore;
use crate::game::types::{
    ActivityKind, GameEvent, InventoryLine, PlayerId, PlayerRecord, ResourceKind, SurfaceId,
    FLAG_SHELTER_BUILT,
};

/// The in-memory session for a player's current activity. At most one
/// exists per player, across all activity kinds.
#[derive(Debug)]
struct ActivitySession {
    kind: ActivityKind,
    grid: ResourceGrid,
    #[allow(dead_code)]
    opened_at: DateTime<Utc>,
    grid_surface: SurfaceId,
    info_surface: SurfaceId,
    result_surface: Option<SurfaceId>,
}

/// The one timed action a player may have in flight.
#[derive(Debug, Clone, Copy)]
enum PendingKind {
    Harvest {
        resource: ResourceKind,
        row: usize,
        col: usize,
    },
    Craft {
        recipe: &'static str,
        quantity: u32,
    },
    Rest,
}

#[derive(Debug)]
struct PendingAction {
    what: PendingKind,
    surface: SurfaceId,
}

/// Everything the engine tracks for one player. Guarded by the player's
/// own mutex; see the module docs.
#[derive(Default)]
struct PlayerCell {
    session: Option<ActivitySession>,
    pending: Option<PendingAction>,
    cooldowns: CooldownTracker,
}

struct EngineInner {
    store: GameStore,
    presenter: Arc<dyn Presenter>,
    cells: SyncMutex<HashMap<PlayerId, Arc<PlayerMutex<PlayerCell>>>>,
}

/// The activity session engine. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(store: GameStore, presenter: Arc<dyn Presenter>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                store,
                presenter,
                cells: SyncMutex::new(HashMap::new()),
            }),
        }
    }

    pub fn store(&self) -> &GameStore {
        &self.inner.store
    }

    fn cell(&self, player: PlayerId) -> Arc<PlayerMutex<PlayerCell>> {
        let mut cells = self.inner.cells.lock().expect("player cell map");
        cells.entry(player).or_default().clone()
    }

    /// Fetch the player, creating the record (with starter kit) on first
    /// contact.
    pub fn ensure_player(&self, player: PlayerId, name: &str) -> Result<PlayerRecord, GameError> {
        if self.inner.store.player_exists(player)? {
            Ok(self.inner.store.get_player(player)?)
        } else {
            Ok(self.inner.store.create_player(player, name)?)
        }
    }

    pub fn profile(&self, player: PlayerId) -> Result<PlayerRecord, GameError> {
        Ok(self.inner.store.get_player(player)?)
    }

    pub fn inventory(&self, player: PlayerId) -> Result<Vec<InventoryLine>, GameError> {
        Ok(self.inner.store.list_inventory(player)?)
    }

    // ------------------------------------------------------------------
    // Activity sessions
    // ------------------------------------------------------------------

    /// Open an activity session: generate a fresh grid and render it.
    pub async fn enter(&self, player: PlayerId, kind: ActivityKind) -> Result<(), GameError> {
        let cell = self.cell(player);
        let mut guard = cell.lock().await;

        if guard.pending.is_some() || guard.session.is_some() {
            return Err(GameError::AlreadyActive);
        }
        if let Some(remaining) = guard.cooldowns.remaining(kind) {
            return Err(GameError::OnCooldown { remaining });
        }

        let record = self.inner.store.get_player(player)?;
        // Satiety gates entry; it is not re-checked per strike.
        if record.satiety == 0 {
            return Err(GameError::Starving);
        }

        let spec = content::activity(kind);
        let track = self.inner.store.get_or_create_skill_track(player, kind)?;
        let grid = ResourceGrid::generate(spec.resources);
        // The fresh grid supersedes any exhaustion left from the last visit.
        if track.exhausted {
            self.inner.store.set_exhausted(player, kind, false)?;
        }

        let view = GridView { kind, cells: *grid.cells() };
        let grid_surface = self.inner.presenter.show_grid(player, &view);
        let panel = InfoPanel {
            kind,
            level: track.level,
            experience_to_next: experience_to_next(track.level, track.experience),
        };
        let info_surface = self.inner.presenter.show_info(player, &panel);

        guard.session = Some(ActivitySession {
            kind,
            grid,
            opened_at: Utc::now(),
            grid_surface,
            info_surface,
            result_surface: None,
        });
        Ok(())
    }

    /// Begin harvesting one populated cell. Locks out every other timed
    /// action for this player until resolution.
    pub async fn strike(&self, player: PlayerId, row: usize, col: usize) -> Result<(), GameError> {
        let cell = self.cell(player);
        let mut guard = cell.lock().await;

        if guard.pending.is_some() {
            return Err(GameError::AlreadyActive);
        }
        let session = guard.session.as_mut().ok_or(GameError::NoSession)?;
        let kind = session.kind;
        let resource = session.grid.get(row, col).ok_or(GameError::EmptyCell)?;

        let spec = content::activity(kind);
        let duration_secs = spec.duration_of(resource).ok_or(GameError::EmptyCell)?;

        match self.inner.store.tool_state(player, spec.tool)? {
            Some(durability) if durability > 0 => {}
            _ => return Err(GameError::RequiredToolMissing { tool: spec.tool }),
        }
        if let Some(ammo) = spec.ammo {
            let have = self.inner.store.inventory_quantity(player, ammo.item)?;
            if have < ammo.per_strike {
                return Err(GameError::InsufficientQuantity {
                    item: ammo.item.to_string(),
                });
            }
        }

        // The previous strike's report makes way for the new progress bar.
        if let Some(result) = session.result_surface.take() {
            self.inner.presenter.remove(player, result);
        }

        let total = Duration::from_secs(duration_secs);
        let subject = ProgressSubject::Harvest { kind, resource };
        let view = ProgressView::new(subject.clone(), total, Duration::ZERO);
        let surface = self.inner.presenter.show_progress(player, &view);

        guard.pending = Some(PendingAction {
            what: PendingKind::Harvest { resource, row, col },
            surface,
        });
        drop(guard);

        self.spawn_action(player, surface, subject, total);
        Ok(())
    }

    /// Navigate away from the current site. Only allowed while no timed
    /// action is running.
    pub async fn leave(&self, player: PlayerId) -> Result<(), GameError> {
        let cell = self.cell(player);
        let mut guard = cell.lock().await;
        if guard.pending.is_some() {
            return Err(GameError::AlreadyActive);
        }
        if let Some(session) = guard.session.take() {
            self.inner.presenter.remove(player, session.grid_surface);
            self.inner.presenter.remove(player, session.info_surface);
            if let Some(result) = session.result_surface {
                self.inner.presenter.remove(player, result);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Crafting and resting
    // ------------------------------------------------------------------

    /// Queue a craft. The whole material bill is verified and deducted
    /// before the timer starts, so completion can never come up short.
    pub async fn craft(
        &self,
        player: PlayerId,
        recipe_id: &str,
        quantity: u32,
    ) -> Result<(), GameError> {
        let spec = content::recipe(recipe_id)
            .ok_or_else(|| GameError::UnknownRecipe(recipe_id.to_string()))?;
        let (quantity, total_secs) = match spec.kind {
            RecipeKind::Simple { per_unit_secs } => {
                let quantity = quantity.max(1);
                (quantity, per_unit_secs * u64::from(quantity))
            }
            RecipeKind::Building { duration_secs, .. } => (1, duration_secs),
        };

        let cell = self.cell(player);
        let mut guard = cell.lock().await;
        if guard.pending.is_some() {
            return Err(GameError::AlreadyActive);
        }

        // Verify the full bill before touching anything so the deduction
        // below cannot fail halfway through.
        let multiplier = match spec.kind {
            RecipeKind::Simple { .. } => quantity,
            RecipeKind::Building { .. } => 1,
        };
        for &(item, per_unit) in spec.cost {
            let need = per_unit * multiplier;
            let have = self.inner.store.inventory_quantity(player, item)?;
            if have < need {
                return Err(GameError::InsufficientQuantity {
                    item: item.to_string(),
                });
            }
        }
        for &(item, per_unit) in spec.cost {
            self.inner
                .store
                .consume_inventory(player, item, per_unit * multiplier)?;
        }

        let total = Duration::from_secs(total_secs);
        let subject = ProgressSubject::Craft {
            item: spec.output,
            quantity,
        };
        let view = ProgressView::new(subject.clone(), total, Duration::ZERO);
        let surface = self.inner.presenter.show_progress(player, &view);

        guard.pending = Some(PendingAction {
            what: PendingKind::Craft {
                recipe: spec.id,
                quantity,
            },
            surface,
        });
        drop(guard);

        self.spawn_action(player, surface, subject, total);
        Ok(())
    }

    /// Rest inside the shelter: a long timed action restoring satiety.
    pub async fn rest(&self, player: PlayerId) -> Result<(), GameError> {
        let record = self.inner.store.get_player(player)?;
        if !record.flag(FLAG_SHELTER_BUILT) {
            return Err(GameError::ShelterRequired);
        }

        let cell = self.cell(player);
        let mut guard = cell.lock().await;
        if guard.pending.is_some() {
            return Err(GameError::AlreadyActive);
        }

        let total = Duration::from_secs(REST_DURATION_SECS);
        let subject = ProgressSubject::Rest;
        let view = ProgressView::new(subject.clone(), total, Duration::ZERO);
        let surface = self.inner.presenter.show_progress(player, &view);

        guard.pending = Some(PendingAction {
            what: PendingKind::Rest,
            surface,
        });
        drop(guard);

        self.spawn_action(player, surface, subject, total);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Instant actions
    // ------------------------------------------------------------------

    /// Eat one forest berry for a small satiety boost. Returns the new
    /// satiety figure.
    pub async fn eat_berry(&self, player: PlayerId) -> Result<u32, GameError> {
        let cell = self.cell(player);
        let _guard = cell.lock().await;
        self.inner.store.consume_inventory(player, BERRY_ITEM, 1)?;
        let satiety = self
            .inner
            .store
            .update_satiety(player, BERRY_SATIETY_RESTORED as i32)?;
        quest::on_event(
            &self.inner.store,
            self.inner.presenter.as_ref(),
            player,
            GameEvent::BerryEaten,
        )?;
        Ok(satiety)
    }

    /// Record that the player read one of their collected lore pages. The
    /// page text itself is rendered by the transport.
    pub async fn read_page(&self, player: PlayerId, index: u8) -> Result<(), GameError> {
        let page = content::lore_page_item(index).ok_or_else(|| GameError::InsufficientQuantity {
            item: format!("lore page {index}"),
        })?;
        let cell = self.cell(player);
        let _guard = cell.lock().await;
        if self.inner.store.inventory_quantity(player, page.id)? == 0 {
            return Err(GameError::InsufficientQuantity {
                item: page.name.to_string(),
            });
        }
        quest::on_event(
            &self.inner.store,
            self.inner.presenter.as_ref(),
            player,
            GameEvent::PageRead { index },
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Quests
    // ------------------------------------------------------------------

    /// The quest board: surfaces the first quest in the chain that is not
    /// completed, creating its row lazily.
    pub async fn quest_board(&self, player: PlayerId) -> Result<Option<QuestBoardEntry>, GameError> {
        let cell = self.cell(player);
        let _guard = cell.lock().await;
        Ok(quest::quest_board(&self.inner.store, player)?)
    }

    pub async fn accept_quest(
        &self,
        player: PlayerId,
        quest_id: u8,
    ) -> Result<&'static QuestSpec, GameError> {
        let cell = self.cell(player);
        let _guard = cell.lock().await;
        quest::accept_quest(&self.inner.store, player, quest_id)
    }

    // ------------------------------------------------------------------
    // Resolution
    // ------------------------------------------------------------------

    fn spawn_action(
        &self,
        player: PlayerId,
        surface: SurfaceId,
        subject: ProgressSubject,
        total: Duration,
    ) {
        let engine = self.clone();
        let presenter = self.inner.presenter.clone();
        tokio::spawn(async move {
            scheduler::drive(presenter, player, surface, subject, total).await;
            engine.resolve(player).await;
        });
    }

    /// Fires exactly once per action: the pending slot is taken under the
    /// player lock, and only the task that started the action calls this.
    async fn resolve(&self, player: PlayerId) {
        let cell = self.cell(player);
        let mut guard = cell.lock().await;
        let Some(pending) = guard.pending.take() else {
            return;
        };
        self.inner.presenter.remove(player, pending.surface);

        let outcome = match pending.what {
            PendingKind::Harvest { resource, row, col } => {
                self.resolve_harvest(&mut guard, player, resource, row, col)
            }
            PendingKind::Craft { recipe, quantity } => {
                self.resolve_craft(player, recipe, quantity)
            }
            PendingKind::Rest => self.resolve_rest(player),
        };

        if let Err(err) = outcome {
            // The step is abandoned; in-memory session state is left as-is.
            error!("resolution failed for player {player}: {err}");
            self.inner.presenter.notify(player, &Notice::TransientFailure);
        }
    }

    fn resolve_harvest(
        &self,
        cell: &mut PlayerCell,
        player: PlayerId,
        resource: ResourceKind,
        row: usize,
        col: usize,
    ) -> Result<(), StorageError> {
        let kind = match cell.session.as_ref() {
            Some(session) => session.kind,
            None => return Ok(()),
        };
        let spec = content::activity(kind);
        let store = &self.inner.store;
        let presenter = self.inner.presenter.as_ref();

        store.add_inventory(player, resource.item_id(), 1)?;

        // Tool wear; a broken tool leaves the inventory entirely.
        let mut tool_broke = false;
        let mut tool_durability = None;
        if let Some(durability) = store.tool_state(player, spec.tool)? {
            let worn = durability.saturating_sub(1);
            if worn == 0 {
                store.consume_inventory(player, spec.tool, 1)?;
                tool_broke = true;
            } else {
                store.update_tool_durability(player, spec.tool, worn)?;
                tool_durability = Some(worn);
            }
        }

        // Ammunition is spent whether or not the tool survived.
        let mut ammo_remaining = None;
        if let Some(ammo) = spec.ammo {
            store.consume_inventory(player, ammo.item, ammo.per_strike)?;
            ammo_remaining = Some(store.inventory_quantity(player, ammo.item)?);
        }

        let satiety = store.update_satiety(player, -1)?;

        let (leveled_up, new_level) =
            store.update_skill_experience(player, kind, spec.exp_per_harvest, spec.curve)?;
        let track = store.get_or_create_skill_track(player, kind)?;

        quest::on_event(
            store,
            presenter,
            player,
            GameEvent::ResourceHarvested { kind, resource },
        )?;

        if let Some(session) = cell.session.as_mut() {
            session.grid.clear(row, col);
        }

        let report = HarvestReport {
            kind,
            resource,
            experience_gained: spec.exp_per_harvest,
            satiety,
            tool_durability,
            tool_broke,
            ammo_remaining,
            experience_to_next: experience_to_next(track.level, track.experience),
        };
        let result_surface = presenter.show_report(player, &report);

        if leveled_up {
            presenter.notify(player, &Notice::SkillLevelUp { kind, level: new_level });
        }

        let depleted = cell
            .session
            .as_ref()
            .map(|session| session.grid.is_depleted())
            .unwrap_or(false);

        if depleted {
            store.set_exhausted(player, kind, true)?;
            cell.cooldowns
                .start(kind, Duration::from_secs(spec.cooldown_secs));
            if let Some(session) = cell.session.take() {
                presenter.remove(player, session.grid_surface);
                presenter.remove(player, session.info_surface);
            }
            presenter.notify(
                player,
                &Notice::Depleted {
                    kind,
                    cooldown_secs: spec.cooldown_secs,
                },
            );
        } else if let Some(session) = cell.session.as_mut() {
            let view = GridView {
                kind,
                cells: *session.grid.cells(),
            };
            presenter.update_grid(player, session.grid_surface, &view);
            // The info panel is replaced rather than edited in place.
            presenter.remove(player, session.info_surface);
            let panel = InfoPanel {
                kind,
                level: track.level,
                experience_to_next: experience_to_next(track.level, track.experience),
            };
            session.info_surface = presenter.show_info(player, &panel);
            session.result_surface = Some(result_surface);
        }
        Ok(())
    }

    fn resolve_craft(
        &self,
        player: PlayerId,
        recipe_id: &'static str,
        quantity: u32,
    ) -> Result<(), StorageError> {
        let Some(spec) = content::recipe(recipe_id) else {
            return Ok(());
        };
        let store = &self.inner.store;
        let presenter = self.inner.presenter.as_ref();

        match spec.kind {
            RecipeKind::Simple { .. } => {
                store.add_inventory(player, spec.output, quantity)?;
                let satiety = store.update_satiety(player, -(quantity as i32))?;
                presenter.notify(
                    player,
                    &Notice::CraftFinished {
                        item: spec.output,
                        quantity,
                        satiety,
                    },
                );
                quest::on_event(
                    store,
                    presenter,
                    player,
                    GameEvent::ItemCrafted {
                        item: spec.output,
                        quantity,
                    },
                )?;
            }
            RecipeKind::Building { flag, satiety_cost, .. } => {
                store.set_player_flag(player, flag, true)?;
                let satiety = store.update_satiety(player, -(satiety_cost as i32))?;
                presenter.notify(player, &Notice::ShelterFinished { satiety });
                quest::on_event(store, presenter, player, GameEvent::ShelterBuilt)?;
            }
        }
        Ok(())
    }

    fn resolve_rest(&self, player: PlayerId) -> Result<(), StorageError> {
        let satiety = self
            .inner
            .store
            .update_satiety(player, REST_SATIETY_RESTORED as i32)?;
        self.inner
            .presenter
            .notify(player, &Notice::RestFinished { satiety });
        Ok(())
    }
}
