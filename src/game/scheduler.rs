//! Per-action progress ticking.
//!
//! Every in-flight timed action (harvest strike, craft batch, rest) owns
//! one of these loops on its own tokio task. The loop redraws the
//! ten-segment progress bar once per second and returns when the action's
//! duration has elapsed, after which the caller resolves the action
//! exactly once. There is deliberately no cancellation path: an action
//! that started always runs to completion.

use std::sync::Arc;
use std::time::Duration;

use log::warn;
use tokio::time::{interval, timeout_at, Instant};

use crate::game::presenter::{Presenter, ProgressSubject, ProgressView};
use crate::game::types::{PlayerId, SurfaceId};

/// Extra slack past the action duration before the loop gives up on its
/// ticker. Guards against a stalled tick stream leaving an orphaned task.
const SAFETY_SLACK: Duration = Duration::from_secs(1);

/// Tick until `total` has elapsed, redrawing the progress surface each
/// second. Returns once, when the action is due for resolution.
pub(crate) async fn drive(
    presenter: Arc<dyn Presenter>,
    player: PlayerId,
    surface: SurfaceId,
    subject: ProgressSubject,
    total: Duration,
) {
    let started = Instant::now();
    let deadline = started + total + SAFETY_SLACK;
    let mut ticker = interval(Duration::from_secs(1));
    // The first tick completes immediately; consume it so the loop waits
    // a full second before the first redraw.
    ticker.tick().await;

    loop {
        match timeout_at(deadline, ticker.tick()).await {
            Ok(_) => {
                let elapsed = started.elapsed();
                if elapsed >= total {
                    return;
                }
                let view = ProgressView::new(subject.clone(), total, elapsed);
                presenter.update_progress(player, surface, &view);
            }
            Err(_) => {
                warn!(
                    "progress ticker for player {player} stalled past {}s; forcing completion",
                    total.as_secs() + SAFETY_SLACK.as_secs()
                );
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::presenter::{PresenterEvent, RecordingPresenter};
    use crate::game::types::ActivityKind;
    use crate::game::types::ResourceKind;

    #[tokio::test(start_paused = true)]
    async fn emits_one_redraw_per_second_until_done() {
        let presenter = Arc::new(RecordingPresenter::new());
        let subject = ProgressSubject::Harvest {
            kind: ActivityKind::Mining,
            resource: ResourceKind::Stone,
        };
        drive(
            presenter.clone(),
            1,
            42,
            subject,
            Duration::from_secs(10),
        )
        .await;

        let redraws: Vec<ProgressView> = presenter
            .events()
            .into_iter()
            .filter_map(|event| match event {
                PresenterEvent::UpdateProgress { surface, view, .. } => {
                    assert_eq!(surface, 42);
                    Some(view)
                }
                _ => None,
            })
            .collect();
        // Ticks at 1..=9 seconds redraw; the 10s tick resolves instead.
        assert_eq!(redraws.len(), 9);
        // Elapsed figures never decrease.
        for pair in redraws.windows(2) {
            assert!(pair[0].elapsed_secs <= pair[1].elapsed_secs);
        }
        assert_eq!(redraws.last().unwrap().segments_filled(), 9);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_promptly_for_zero_length_actions() {
        let presenter = Arc::new(RecordingPresenter::new());
        drive(
            presenter.clone(),
            1,
            1,
            ProgressSubject::Rest,
            Duration::from_secs(0),
        )
        .await;
        assert!(presenter.events().is_empty());
    }
}
