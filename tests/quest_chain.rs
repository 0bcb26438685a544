/// End-to-end quest chain coverage driven through the engine: harvesting
/// across a depletion cooldown, eating berries, and sequential lore pages.
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wildgrove::game::{
    ActivityKind, Engine, GameError, GameStoreBuilder, GridView, Notice, PresenterEvent,
    QuestStatus, RecordingPresenter, GRID_DIM,
};

const PLAYER: i64 = 1;

fn setup() -> (TempDir, Engine, Arc<RecordingPresenter>) {
    let dir = TempDir::new().expect("tempdir");
    let store = GameStoreBuilder::new(dir.path()).open().expect("store");
    store.create_player(PLAYER, "tester").expect("player");
    let presenter = Arc::new(RecordingPresenter::new());
    let engine = Engine::new(store, presenter.clone());
    (dir, engine, presenter)
}

fn latest_grid(presenter: &RecordingPresenter) -> GridView {
    presenter
        .events()
        .into_iter()
        .rev()
        .find_map(|event| match event {
            PresenterEvent::ShowGrid { view, .. } | PresenterEvent::UpdateGrid { view, .. } => {
                Some(view)
            }
            _ => None,
        })
        .expect("a grid was rendered")
}

fn populated_cells(view: &GridView) -> Vec<(usize, usize)> {
    let mut cells = Vec::new();
    for row in 0..GRID_DIM {
        for col in 0..GRID_DIM {
            if view.cells[row][col].is_some() {
                cells.push((row, col));
            }
        }
    }
    cells
}

async fn settle(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

/// Harvest every node of the current grid, one timed strike at a time.
async fn clear_current_grid(engine: &Engine, presenter: &RecordingPresenter) {
    for (row, col) in populated_cells(&latest_grid(presenter)) {
        engine.strike(PLAYER, row, col).await.unwrap();
        settle(21).await;
    }
}

fn complete_first_quests(engine: &Engine, count: u8) {
    let store = engine.store();
    for id in 1..=count {
        store.create_quest(PLAYER, id, 1).unwrap();
        store.set_quest_status(PLAYER, id, QuestStatus::Completed).unwrap();
    }
}

#[tokio::test(start_paused = true)]
async fn first_quest_runs_end_to_end_across_a_cooldown() {
    let (_dir, engine, presenter) = setup();

    let entry = engine.quest_board(PLAYER).await.unwrap().expect("quest 1");
    assert_eq!(entry.spec.id, 1);
    assert_eq!(entry.row.status, QuestStatus::Available);
    engine.accept_quest(PLAYER, 1).await.unwrap();

    // First grid: three birches, then the forest is exhausted.
    engine.enter(PLAYER, ActivityKind::Woodcutting).await.unwrap();
    clear_current_grid(&engine, &presenter).await;
    assert_eq!(engine.store().quest(PLAYER, 1).unwrap().unwrap().progress, 3);

    // Wait out the cooldown and fell two more.
    settle(61).await;
    engine.enter(PLAYER, ActivityKind::Woodcutting).await.unwrap();
    let nodes = populated_cells(&latest_grid(&presenter));
    for (row, col) in nodes.into_iter().take(2) {
        engine.strike(PLAYER, row, col).await.unwrap();
        settle(21).await;
    }

    let row = engine.store().quest(PLAYER, 1).unwrap().expect("row");
    assert_eq!(row.status, QuestStatus::Completed);
    assert!(row.completed_at.is_some());
    assert_eq!(engine.store().inventory_quantity(PLAYER, "lore_page_1").unwrap(), 1);
    assert_eq!(engine.store().get_player(PLAYER).unwrap().experience, 10);
    assert!(presenter
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::QuestCompleted { quest_id: 1, .. })));

    // The board has moved on; quest 2 cannot be skipped backwards.
    let entry = engine.quest_board(PLAYER).await.unwrap().expect("quest 2");
    assert_eq!(entry.spec.id, 2);
    assert!(matches!(
        engine.accept_quest(PLAYER, 3).await,
        Err(GameError::QuestUnavailable(3))
    ));
}

#[tokio::test(start_paused = true)]
async fn berry_quest_counts_meals_not_harvests() {
    let (_dir, engine, _presenter) = setup();
    complete_first_quests(&engine, 6);

    let entry = engine.quest_board(PLAYER).await.unwrap().expect("quest 7");
    assert_eq!(entry.spec.id, 7);
    engine.accept_quest(PLAYER, 7).await.unwrap();

    // Spend satiety so the +5 per berry is visible.
    engine.store().update_satiety(PLAYER, -50).unwrap();
    engine.eat_berry(PLAYER).await.unwrap();
    engine.eat_berry(PLAYER).await.unwrap();
    let satiety = engine.eat_berry(PLAYER).await.unwrap();
    assert_eq!(satiety, 65, "three berries at +5 each");

    let row = engine.store().quest(PLAYER, 7).unwrap().expect("row");
    assert_eq!(row.status, QuestStatus::Completed);
    assert_eq!(engine.store().inventory_quantity(PLAYER, "lore_page_7").unwrap(), 1);

    // A fourth berry is a meal, not quest progress.
    engine.eat_berry(PLAYER).await.unwrap();
    assert_eq!(engine.store().inventory_quantity(PLAYER, "lore_page_7").unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn lore_pages_must_be_read_in_order() {
    let (_dir, engine, _presenter) = setup();
    complete_first_quests(&engine, 5);
    for page in 1..=5usize {
        engine
            .store()
            .add_inventory(PLAYER, &format!("lore_page_{page}"), 1)
            .unwrap();
    }

    let entry = engine.quest_board(PLAYER).await.unwrap().expect("quest 6");
    assert_eq!(entry.spec.id, 6);
    engine.accept_quest(PLAYER, 6).await.unwrap();

    // Reading a page the player does not own is refused outright.
    assert!(matches!(
        engine.read_page(PLAYER, 7).await,
        Err(GameError::InsufficientQuantity { .. })
    ));

    // Out of order: the read succeeds but the quest ignores it.
    engine.read_page(PLAYER, 4).await.unwrap();
    assert_eq!(engine.store().quest(PLAYER, 6).unwrap().unwrap().progress, 0);

    for page in 1..=5u8 {
        engine.read_page(PLAYER, page).await.unwrap();
    }
    let row = engine.store().quest(PLAYER, 6).unwrap().expect("row");
    assert_eq!(row.status, QuestStatus::Completed);
    assert_eq!(row.progress, 5);
    assert_eq!(engine.store().inventory_quantity(PLAYER, "lore_page_6").unwrap(), 1);
}
