//! Quest progression along the strictly linear chain.
//!
//! Only the currently active quest advances; the next quest becomes
//! available lazily when the player opens the quest board after the
//! previous one completed.

use log::debug;

use crate::game::content::{self, QuestGoal, QuestSpec};
use crate::game::errors::{GameError, StorageError};
use crate::game::presenter::{Notice, Presenter};
use crate::game::storage::GameStore;
use crate::game::types::{ActivityKind, GameEvent, PlayerId, QuestRow, QuestStatus};

/// What the quest board shows: the first quest in the chain that is not
/// yet completed, with the player's current row.
#[derive(Debug, Clone)]
pub struct QuestBoardEntry {
    pub spec: &'static QuestSpec,
    pub row: QuestRow,
}

/// Walk the chain and surface the first non-completed quest, creating its
/// row (as Available) on first sight. `None` once the chain is finished.
pub fn quest_board(
    store: &GameStore,
    player: PlayerId,
) -> Result<Option<QuestBoardEntry>, StorageError> {
    for spec in content::QUESTS {
        match store.quest(player, spec.id)? {
            Some(row) if row.status == QuestStatus::Completed => continue,
            Some(row) => return Ok(Some(QuestBoardEntry { spec, row })),
            None => {
                let row = store.create_quest(player, spec.id, spec.target)?;
                return Ok(Some(QuestBoardEntry { spec, row }));
            }
        }
    }
    Ok(None)
}

/// Accept an offered quest. Fails unless the row exists, is Available, and
/// every predecessor in the chain is completed.
pub fn accept_quest(
    store: &GameStore,
    player: PlayerId,
    quest_id: u8,
) -> Result<&'static QuestSpec, GameError> {
    let spec = content::quest(quest_id).ok_or(GameError::QuestUnavailable(quest_id))?;
    let Some(row) = store.quest(player, quest_id)? else {
        return Err(GameError::QuestUnavailable(quest_id));
    };
    if row.status != QuestStatus::Available {
        return Err(GameError::QuestUnavailable(quest_id));
    }
    if quest_id > 1 {
        let prev = store.quest(player, quest_id - 1)?;
        if !matches!(prev, Some(ref p) if p.status == QuestStatus::Completed) {
            return Err(GameError::QuestUnavailable(quest_id));
        }
    }
    store.set_quest_status(player, quest_id, QuestStatus::Active)?;
    Ok(spec)
}

/// Feed a domain event to the player's active quest, if any. Storage
/// failures bubble up so the caller can report a transient error.
pub fn on_event(
    store: &GameStore,
    presenter: &dyn Presenter,
    player: PlayerId,
    event: GameEvent,
) -> Result<(), StorageError> {
    let Some((spec, row)) = active_quest(store, player)? else {
        return Ok(());
    };

    let new_progress = match (spec.goal, event) {
        // Pages only count when read strictly in order; progress holds the
        // highest page reached so far.
        (QuestGoal::ReadPagesInOrder, GameEvent::PageRead { index }) => {
            if u32::from(index) != row.progress + 1 || u32::from(index) > spec.target {
                return Ok(());
            }
            u32::from(index)
        }
        _ => match magnitude(spec.goal, event) {
            Some(amount) => row.progress.saturating_add(amount),
            None => return Ok(()),
        },
    };

    debug!(
        "quest {} progress {} -> {} for player {}",
        spec.id, row.progress, new_progress, player
    );
    store.set_quest_progress(player, spec.id, new_progress)?;
    if new_progress >= row.target {
        complete_quest(store, presenter, player, spec)?;
    }
    Ok(())
}

/// Mark a quest completed and hand out its rewards. Safe to call again
/// for an already-completed quest: the experience and the unique reward
/// item are granted at most once.
pub fn complete_quest(
    store: &GameStore,
    presenter: &dyn Presenter,
    player: PlayerId,
    spec: &'static QuestSpec,
) -> Result<(), StorageError> {
    let already_completed = matches!(
        store.quest(player, spec.id)?,
        Some(ref row) if row.status == QuestStatus::Completed
    );
    if !already_completed {
        store.set_quest_status(player, spec.id, QuestStatus::Completed)?;
        store.add_player_experience(player, spec.reward_exp)?;
    }
    // The reward item is unique; never grant a second copy.
    if store.inventory_quantity(player, spec.reward_item)? == 0 {
        store.add_inventory(player, spec.reward_item, 1)?;
    }
    if !already_completed {
        presenter.notify(
            player,
            &Notice::QuestCompleted {
                quest_id: spec.id,
                name: spec.name,
                reward_exp: spec.reward_exp,
                reward_item: spec.reward_item,
            },
        );
    }
    Ok(())
}

fn active_quest(
    store: &GameStore,
    player: PlayerId,
) -> Result<Option<(&'static QuestSpec, QuestRow)>, StorageError> {
    for spec in content::QUESTS {
        if let Some(row) = store.quest(player, spec.id)? {
            if row.status == QuestStatus::Active {
                return Ok(Some((spec, row)));
            }
        }
    }
    Ok(None)
}

fn magnitude(goal: QuestGoal, event: GameEvent) -> Option<u32> {
    match (goal, event) {
        (QuestGoal::HarvestResource(wanted), GameEvent::ResourceHarvested { resource, .. })
            if resource == wanted =>
        {
            Some(1)
        }
        (QuestGoal::HuntAnyGame, GameEvent::ResourceHarvested { kind, .. })
            if kind == ActivityKind::Hunting =>
        {
            Some(1)
        }
        (QuestGoal::CraftItem(wanted), GameEvent::ItemCrafted { item, quantity })
            if item == wanted =>
        {
            Some(quantity)
        }
        (QuestGoal::EatBerries, GameEvent::BerryEaten) => Some(1),
        (QuestGoal::BuildShelter, GameEvent::ShelterBuilt) => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::presenter::RecordingPresenter;
    use crate::game::storage::GameStoreBuilder;
    use crate::game::types::ResourceKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, GameStore, RecordingPresenter) {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path()).open().expect("store");
        store.create_player(1, "tester").expect("player");
        (dir, store, RecordingPresenter::new())
    }

    #[test]
    fn board_offers_quests_in_chain_order() {
        let (_dir, store, _presenter) = setup();
        let entry = quest_board(&store, 1).unwrap().expect("first quest");
        assert_eq!(entry.spec.id, 1);
        assert_eq!(entry.row.status, QuestStatus::Available);

        // Asking again does not advance the chain.
        let entry = quest_board(&store, 1).unwrap().expect("still first");
        assert_eq!(entry.spec.id, 1);
    }

    #[test]
    fn later_quests_cannot_be_accepted_early() {
        let (_dir, store, _presenter) = setup();
        quest_board(&store, 1).unwrap();
        // Quest 2 has no row yet.
        assert!(matches!(
            accept_quest(&store, 1, 2),
            Err(GameError::QuestUnavailable(2))
        ));
        // Even with a row present, quest 1 must be completed first.
        store.create_quest(1, 2, 3).unwrap();
        assert!(matches!(
            accept_quest(&store, 1, 2),
            Err(GameError::QuestUnavailable(2))
        ));
    }

    #[test]
    fn events_advance_only_the_active_quest() {
        let (_dir, store, presenter) = setup();
        quest_board(&store, 1).unwrap();

        // Not accepted yet: harvests do nothing.
        on_event(&store, &presenter, 1, GameEvent::ResourceHarvested {
            kind: ActivityKind::Woodcutting,
            resource: ResourceKind::Birch,
        })
        .unwrap();
        assert_eq!(store.quest(1, 1).unwrap().unwrap().progress, 0);

        accept_quest(&store, 1, 1).unwrap();
        for _ in 0..5 {
            on_event(&store, &presenter, 1, GameEvent::ResourceHarvested {
                kind: ActivityKind::Woodcutting,
                resource: ResourceKind::Birch,
            })
            .unwrap();
        }
        let row = store.quest(1, 1).unwrap().unwrap();
        assert_eq!(row.status, QuestStatus::Completed);
        assert_eq!(store.inventory_quantity(1, "lore_page_1").unwrap(), 1);
        let player = store.get_player(1).unwrap();
        assert_eq!(player.experience, 10);
    }

    #[test]
    fn completion_rewards_are_idempotent() {
        let (_dir, store, presenter) = setup();
        quest_board(&store, 1).unwrap();
        accept_quest(&store, 1, 1).unwrap();
        let spec = content::quest(1).unwrap();

        store.set_quest_progress(1, 1, 5).unwrap();
        complete_quest(&store, &presenter, 1, spec).unwrap();
        complete_quest(&store, &presenter, 1, spec).unwrap();

        assert_eq!(store.inventory_quantity(1, "lore_page_1").unwrap(), 1);
        assert_eq!(store.get_player(1).unwrap().experience, 10);
        // Only one completion notice went out.
        let completions = presenter
            .notices()
            .into_iter()
            .filter(|n| matches!(n, Notice::QuestCompleted { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn board_moves_on_after_completion() {
        let (_dir, store, presenter) = setup();
        quest_board(&store, 1).unwrap();
        accept_quest(&store, 1, 1).unwrap();
        store.set_quest_progress(1, 1, 5).unwrap();
        complete_quest(&store, &presenter, 1, content::quest(1).unwrap()).unwrap();

        let entry = quest_board(&store, 1).unwrap().expect("second quest");
        assert_eq!(entry.spec.id, 2);
        assert_eq!(entry.row.status, QuestStatus::Available);
        accept_quest(&store, 1, 2).unwrap();
    }

    #[test]
    fn lore_pages_count_only_in_order() {
        let (_dir, store, presenter) = setup();
        // Fast-forward the chain to quest 6.
        for spec in content::QUESTS.iter().take(5) {
            store.create_quest(1, spec.id, spec.target).unwrap();
            store.set_quest_status(1, spec.id, QuestStatus::Completed).unwrap();
        }
        let entry = quest_board(&store, 1).unwrap().expect("quest 6");
        assert_eq!(entry.spec.id, 6);
        accept_quest(&store, 1, 6).unwrap();

        // Page 3 out of order: ignored.
        on_event(&store, &presenter, 1, GameEvent::PageRead { index: 3 }).unwrap();
        assert_eq!(store.quest(1, 6).unwrap().unwrap().progress, 0);

        for page in 1..=5u8 {
            on_event(&store, &presenter, 1, GameEvent::PageRead { index: page }).unwrap();
        }
        let row = store.quest(1, 6).unwrap().unwrap();
        assert_eq!(row.status, QuestStatus::Completed);

        // Re-reading a page after completion changes nothing.
        on_event(&store, &presenter, 1, GameEvent::PageRead { index: 1 }).unwrap();
        assert_eq!(store.inventory_quantity(1, "lore_page_6").unwrap(), 1);
    }

    #[test]
    fn crafted_quantity_counts_in_bulk() {
        let (_dir, store, presenter) = setup();
        for spec in content::QUESTS.iter().take(2) {
            store.create_quest(1, spec.id, spec.target).unwrap();
            store.set_quest_status(1, spec.id, QuestStatus::Completed).unwrap();
        }
        quest_board(&store, 1).unwrap();
        accept_quest(&store, 1, 3).unwrap();

        on_event(&store, &presenter, 1, GameEvent::ItemCrafted {
            item: "birch_plank",
            quantity: 3,
        })
        .unwrap();
        assert_eq!(
            store.quest(1, 3).unwrap().unwrap().status,
            QuestStatus::Completed
        );
    }
}
