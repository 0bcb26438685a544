//! Rendering boundary between the engine and the chat transport.
//!
//! The engine emits data-only view structs and receives opaque surface
//! ids back; it never formats chat markup itself. A real transport
//! adapter turns these views into messages and keyboards. The crate
//! ships a console implementation for local play and a recording
//! implementation for tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::game::grid::GRID_DIM;
use crate::game::storage::item_label;
use crate::game::types::{ActivityKind, PlayerId, ResourceKind, SurfaceId};

/// Snapshot of an activity grid for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    pub kind: ActivityKind,
    pub cells: [[Option<ResourceKind>; GRID_DIM]; GRID_DIM],
}

/// Activity header: site, level, and distance to the next level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoPanel {
    pub kind: ActivityKind,
    pub level: u32,
    pub experience_to_next: i64,
}

/// What a progress bar is tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressSubject {
    Harvest {
        kind: ActivityKind,
        resource: ResourceKind,
    },
    Craft {
        item: &'static str,
        quantity: u32,
    },
    Rest,
}

/// One frame of a running action's progress bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressView {
    pub subject: ProgressSubject,
    pub total_secs: u64,
    pub elapsed_secs: u64,
}

pub const PROGRESS_SEGMENTS: u64 = 10;

impl ProgressView {
    pub fn new(subject: ProgressSubject, total: Duration, elapsed: Duration) -> Self {
        Self {
            subject,
            total_secs: total.as_secs(),
            elapsed_secs: elapsed.as_secs().min(total.as_secs()),
        }
    }

    pub fn percent(&self) -> u64 {
        if self.total_secs == 0 {
            return 100;
        }
        self.elapsed_secs * 100 / self.total_secs
    }

    /// Filled segment count of the ten-segment bar.
    pub fn segments_filled(&self) -> u64 {
        if self.total_secs == 0 {
            return PROGRESS_SEGMENTS;
        }
        (self.elapsed_secs * PROGRESS_SEGMENTS / self.total_secs).min(PROGRESS_SEGMENTS)
    }
}

/// Outcome summary of one completed harvest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestReport {
    pub kind: ActivityKind,
    pub resource: ResourceKind,
    pub experience_gained: u32,
    pub satiety: u32,
    /// Remaining tool durability; `None` when the tool just broke.
    pub tool_durability: Option<u32>,
    pub tool_broke: bool,
    /// Remaining ammunition, for activities that consume it.
    pub ammo_remaining: Option<u32>,
    pub experience_to_next: i64,
}

/// One-shot notifications pushed to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Depleted {
        kind: ActivityKind,
        cooldown_secs: u64,
    },
    SkillLevelUp {
        kind: ActivityKind,
        level: u32,
    },
    CraftFinished {
        item: &'static str,
        quantity: u32,
        satiety: u32,
    },
    ShelterFinished {
        satiety: u32,
    },
    RestFinished {
        satiety: u32,
    },
    QuestCompleted {
        quest_id: u8,
        name: &'static str,
        reward_exp: u32,
        reward_item: &'static str,
    },
    TransientFailure,
}

/// Chat rendering boundary. Surface ids are opaque to the engine; the
/// implementation may edit or delete a surface it handed out earlier.
pub trait Presenter: Send + Sync {
    fn show_grid(&self, player: PlayerId, view: &GridView) -> SurfaceId;
    fn update_grid(&self, player: PlayerId, surface: SurfaceId, view: &GridView);
    fn show_info(&self, player: PlayerId, panel: &InfoPanel) -> SurfaceId;
    fn show_progress(&self, player: PlayerId, view: &ProgressView) -> SurfaceId;
    fn update_progress(&self, player: PlayerId, surface: SurfaceId, view: &ProgressView);
    fn show_report(&self, player: PlayerId, report: &HarvestReport) -> SurfaceId;
    fn notify(&self, player: PlayerId, notice: &Notice);
    fn remove(&self, player: PlayerId, surface: SurfaceId);
}

// ============================================================================
// Recording presenter (tests)
// ============================================================================

/// Everything a presenter was asked to do, for assertions in tests.
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterEvent {
    ShowGrid { player: PlayerId, surface: SurfaceId, view: GridView },
    UpdateGrid { player: PlayerId, surface: SurfaceId, view: GridView },
    ShowInfo { player: PlayerId, surface: SurfaceId, panel: InfoPanel },
    ShowProgress { player: PlayerId, surface: SurfaceId, view: ProgressView },
    UpdateProgress { player: PlayerId, surface: SurfaceId, view: ProgressView },
    ShowReport { player: PlayerId, surface: SurfaceId, report: HarvestReport },
    Notify { player: PlayerId, notice: Notice },
    Remove { player: PlayerId, surface: SurfaceId },
}

/// Presenter that records every call; the default choice in tests.
#[derive(Default)]
pub struct RecordingPresenter {
    next_surface: AtomicI64,
    events: Mutex<Vec<PresenterEvent>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> SurfaceId {
        self.next_surface.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn record(&self, event: PresenterEvent) {
        self.events.lock().expect("presenter log").push(event);
    }

    pub fn events(&self) -> Vec<PresenterEvent> {
        self.events.lock().expect("presenter log").clone()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PresenterEvent::Notify { notice, .. } => Some(notice),
                _ => None,
            })
            .collect()
    }

    pub fn reports(&self) -> Vec<HarvestReport> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                PresenterEvent::ShowReport { report, .. } => Some(report),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn show_grid(&self, player: PlayerId, view: &GridView) -> SurfaceId {
        let surface = self.next();
        self.record(PresenterEvent::ShowGrid { player, surface, view: view.clone() });
        surface
    }

    fn update_grid(&self, player: PlayerId, surface: SurfaceId, view: &GridView) {
        self.record(PresenterEvent::UpdateGrid { player, surface, view: view.clone() });
    }

    fn show_info(&self, player: PlayerId, panel: &InfoPanel) -> SurfaceId {
        let surface = self.next();
        self.record(PresenterEvent::ShowInfo { player, surface, panel: panel.clone() });
        surface
    }

    fn show_progress(&self, player: PlayerId, view: &ProgressView) -> SurfaceId {
        let surface = self.next();
        self.record(PresenterEvent::ShowProgress { player, surface, view: view.clone() });
        surface
    }

    fn update_progress(&self, player: PlayerId, surface: SurfaceId, view: &ProgressView) {
        self.record(PresenterEvent::UpdateProgress { player, surface, view: view.clone() });
    }

    fn show_report(&self, player: PlayerId, report: &HarvestReport) -> SurfaceId {
        let surface = self.next();
        self.record(PresenterEvent::ShowReport { player, surface, report: report.clone() });
        surface
    }

    fn notify(&self, player: PlayerId, notice: &Notice) {
        self.record(PresenterEvent::Notify { player, notice: notice.clone() });
    }

    fn remove(&self, player: PlayerId, surface: SurfaceId) {
        self.record(PresenterEvent::Remove { player, surface });
    }
}

// ============================================================================
// Console presenter (local play)
// ============================================================================

/// Renders views as plain terminal text. Used by the bundled console
/// transport; a chat transport adapter replaces this wholesale.
#[derive(Default)]
pub struct ConsolePresenter {
    next_surface: AtomicI64,
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> SurfaceId {
        self.next_surface.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn render_grid(view: &GridView) -> String {
        let mut out = format!("-- {} --\n", view.kind.site_name());
        for row in view.cells.iter() {
            for cell in row.iter() {
                match cell {
                    Some(resource) => out.push_str(&format!("[{:^12}]", resource.label())),
                    None => out.push_str(&format!("[{:^12}]", " ")),
                }
            }
            out.push('\n');
        }
        out
    }

    fn render_bar(view: &ProgressView) -> String {
        let filled = view.segments_filled() as usize;
        let bar: String = "#".repeat(filled) + &"-".repeat(PROGRESS_SEGMENTS as usize - filled);
        let label = match &view.subject {
            ProgressSubject::Harvest { resource, .. } => {
                format!("harvesting {}", resource.label())
            }
            ProgressSubject::Craft { item, quantity } => {
                format!("crafting {} x{}", item_label(item), quantity)
            }
            ProgressSubject::Rest => "resting".to_string(),
        };
        format!("{label}: [{bar}] {}% ({}s/{}s)", view.percent(), view.elapsed_secs, view.total_secs)
    }
}

impl Presenter for ConsolePresenter {
    fn show_grid(&self, _player: PlayerId, view: &GridView) -> SurfaceId {
        println!("{}", Self::render_grid(view));
        self.next()
    }

    fn update_grid(&self, player: PlayerId, _surface: SurfaceId, view: &GridView) {
        let _ = self.show_grid(player, view);
    }

    fn show_info(&self, _player: PlayerId, panel: &InfoPanel) -> SurfaceId {
        println!(
            "{} -- level {}, {} experience to next level",
            panel.kind.site_name(),
            panel.level,
            panel.experience_to_next
        );
        self.next()
    }

    fn show_progress(&self, _player: PlayerId, view: &ProgressView) -> SurfaceId {
        println!("{}", Self::render_bar(view));
        self.next()
    }

    fn update_progress(&self, _player: PlayerId, _surface: SurfaceId, view: &ProgressView) {
        println!("{}", Self::render_bar(view));
    }

    fn show_report(&self, _player: PlayerId, report: &HarvestReport) -> SurfaceId {
        let mut line = format!(
            "you got 1 {} (+{} exp, satiety {}/100",
            report.resource.label(),
            report.experience_gained,
            report.satiety
        );
        match report.tool_durability {
            Some(durability) => line.push_str(&format!(", tool {durability}/100")),
            None if report.tool_broke => line.push_str(", tool broke!"),
            None => {}
        }
        if let Some(ammo) = report.ammo_remaining {
            line.push_str(&format!(", {ammo} arrows left"));
        }
        line.push(')');
        println!("{line}");
        self.next()
    }

    fn notify(&self, _player: PlayerId, notice: &Notice) {
        match notice {
            Notice::Depleted { kind, cooldown_secs } => {
                println!(
                    "the {} is depleted; it recovers in {} seconds",
                    kind.site_name(),
                    cooldown_secs
                );
            }
            Notice::SkillLevelUp { kind, level } => {
                println!("your {} skill reached level {level}!", kind.key());
            }
            Notice::CraftFinished { item, quantity, satiety } => {
                println!(
                    "finished crafting {} x{quantity} (satiety {satiety}/100)",
                    item_label(item)
                );
            }
            Notice::ShelterFinished { satiety } => {
                println!("your shelter is built (satiety {satiety}/100)");
            }
            Notice::RestFinished { satiety } => {
                println!("you feel rested (satiety {satiety}/100)");
            }
            Notice::QuestCompleted { quest_id, name, reward_exp, reward_item } => {
                println!(
                    "quest {quest_id} \"{name}\" completed! reward: {reward_exp} exp + {}",
                    item_label(reward_item)
                );
            }
            Notice::TransientFailure => {
                println!("something went wrong; please try again later");
            }
        }
    }

    fn remove(&self, _player: PlayerId, _surface: SurfaceId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_view_clamps_and_scales() {
        let subject = ProgressSubject::Rest;
        let view = ProgressView::new(subject.clone(), Duration::from_secs(10), Duration::from_secs(4));
        assert_eq!(view.percent(), 40);
        assert_eq!(view.segments_filled(), 4);

        let over = ProgressView::new(subject, Duration::from_secs(10), Duration::from_secs(25));
        assert_eq!(over.elapsed_secs, 10);
        assert_eq!(over.percent(), 100);
        assert_eq!(over.segments_filled(), PROGRESS_SEGMENTS);
    }

    #[test]
    fn recording_presenter_hands_out_distinct_surfaces() {
        let presenter = RecordingPresenter::new();
        let panel = InfoPanel {
            kind: ActivityKind::Mining,
            level: 1,
            experience_to_next: 100,
        };
        let a = presenter.show_info(1, &panel);
        let b = presenter.show_info(1, &panel);
        assert_ne!(a, b);
        assert_eq!(presenter.events().len(), 2);
    }
}
