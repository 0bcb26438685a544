/// Integration tests for the crafting queue and shelter construction:
/// up-front material deduction, timing, satiety costs, and resting.
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use wildgrove::game::{
    ActivityKind, Engine, GameError, GameStoreBuilder, Notice, QuestStatus, RecordingPresenter,
    FLAG_SHELTER_BUILT,
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

async fn settle(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
}

fn grant_hut_bill(engine: &Engine) {
    let store = engine.store();
    store.add_inventory(PLAYER, "birch_log", 20).unwrap();
    store.add_inventory(PLAYER, "birch_plank", 10).unwrap();
    store.add_inventory(PLAYER, "stone", 15).unwrap();
    // Starter kit already holds 10 berries.
}

#[tokio::test(start_paused = true)]
async fn unknown_recipes_are_rejected() {
    let (_dir, engine, _presenter) = setup();
    assert!(matches!(
        engine.craft(PLAYER, "golden_throne", 1).await,
        Err(GameError::UnknownRecipe(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn short_materials_refuse_the_craft_without_deducting() {
    let (_dir, engine, _presenter) = setup();
    engine.store().add_inventory(PLAYER, "birch_log", 3).unwrap();

    // Two planks need four logs.
    assert!(matches!(
        engine.craft(PLAYER, "birch_plank", 2).await,
        Err(GameError::InsufficientQuantity { .. })
    ));
    // The partial stock is untouched.
    assert_eq!(engine.store().inventory_quantity(PLAYER, "birch_log").unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn materials_are_deducted_before_the_timer_starts() {
    let (_dir, engine, presenter) = setup();
    engine.store().add_inventory(PLAYER, "birch_log", 4).unwrap();

    engine.craft(PLAYER, "birch_plank", 2).await.unwrap();
    // The bill is already paid even though nothing finished yet.
    assert_eq!(engine.store().inventory_quantity(PLAYER, "birch_log").unwrap(), 0);
    assert_eq!(engine.store().inventory_quantity(PLAYER, "birch_plank").unwrap(), 0);

    // The queue is exclusive with every other timed action.
    assert!(matches!(
        engine.craft(PLAYER, "birch_plank", 1).await,
        Err(GameError::AlreadyActive)
    ));
    assert!(matches!(
        engine.enter(PLAYER, ActivityKind::Mining).await,
        Err(GameError::AlreadyActive)
    ));

    // Two units at 20 seconds each.
    settle(41).await;
    assert_eq!(engine.store().inventory_quantity(PLAYER, "birch_plank").unwrap(), 2);
    let player = engine.store().get_player(PLAYER).unwrap();
    assert_eq!(player.satiety, 98, "one satiety per crafted unit");
    assert!(presenter.notices().iter().any(|n| matches!(
        n,
        Notice::CraftFinished { item: "birch_plank", quantity: 2, satiety: 98 }
    )));
}

#[tokio::test(start_paused = true)]
async fn building_the_hut_sets_the_flag_and_costs_a_flat_fee() {
    let (_dir, engine, presenter) = setup();
    grant_hut_bill(&engine);

    engine.craft(PLAYER, "simple_hut", 1).await.unwrap();
    // The whole bill is consumed up front.
    let store = engine.store();
    assert_eq!(store.inventory_quantity(PLAYER, "birch_log").unwrap(), 0);
    assert_eq!(store.inventory_quantity(PLAYER, "birch_plank").unwrap(), 0);
    assert_eq!(store.inventory_quantity(PLAYER, "stone").unwrap(), 0);
    assert_eq!(store.inventory_quantity(PLAYER, "forest_berry").unwrap(), 0);

    settle(121).await;
    let player = store.get_player(PLAYER).unwrap();
    assert!(player.flag(FLAG_SHELTER_BUILT));
    assert_eq!(player.satiety, 95, "construction costs a flat 5 satiety");
    assert!(presenter
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::ShelterFinished { satiety: 95 })));
}

#[tokio::test(start_paused = true)]
async fn resting_needs_a_shelter_and_restores_satiety() {
    let (_dir, engine, presenter) = setup();
    assert!(matches!(
        engine.rest(PLAYER).await,
        Err(GameError::ShelterRequired)
    ));

    engine
        .store()
        .set_player_flag(PLAYER, FLAG_SHELTER_BUILT, true)
        .unwrap();
    engine.store().update_satiety(PLAYER, -80).unwrap();

    engine.rest(PLAYER).await.unwrap();
    // Resting is a timed action like any other.
    assert!(matches!(
        engine.enter(PLAYER, ActivityKind::Foraging).await,
        Err(GameError::AlreadyActive)
    ));

    settle(1801).await;
    let player = engine.store().get_player(PLAYER).unwrap();
    assert_eq!(player.satiety, 70, "20 + 50 restored");
    assert!(presenter
        .notices()
        .iter()
        .any(|n| matches!(n, Notice::RestFinished { satiety: 70 })));
}

#[tokio::test(start_paused = true)]
async fn finishing_the_hut_completes_the_final_quest() {
    let (_dir, engine, _presenter) = setup();
    let store = engine.store();
    // Fast-forward the chain so quest 8 is next.
    for id in 1..=7u8 {
        store.create_quest(PLAYER, id, 1).unwrap();
        store.set_quest_status(PLAYER, id, QuestStatus::Completed).unwrap();
    }
    let entry = engine.quest_board(PLAYER).await.unwrap().expect("quest 8");
    assert_eq!(entry.spec.id, 8);
    engine.accept_quest(PLAYER, 8).await.unwrap();

    grant_hut_bill(&engine);
    engine.craft(PLAYER, "simple_hut", 1).await.unwrap();
    settle(121).await;

    let row = engine.store().quest(PLAYER, 8).unwrap().expect("row");
    assert_eq!(row.status, QuestStatus::Completed);
    assert_eq!(engine.store().inventory_quantity(PLAYER, "lore_page_8").unwrap(), 1);
    // The chain is finished.
    assert!(engine.quest_board(PLAYER).await.unwrap().is_none());
}
