use super::*;
use crate::{charts::ChartBoard, clock::ManualClock};

fn controller() -> (ManualClock, RevealController) {
    let clock = ManualClock::new();
    let reveal = RevealController::with_seed(Arc::new(clock.clone()), 7);
    (clock, reveal)
}

fn board_with_surfaces() -> ChartBoard {
    let mut board = ChartBoard::new();
    board.mark_surface(ChartSlot::RiskDistribution);
    board.mark_surface(ChartSlot::ConfidenceTrend);
    board
}

fn run_for(clock: &ManualClock, reveal: &mut RevealController, board: &mut ChartBoard, millis: u64) {
    for _ in 0..millis / 50 {
        clock.advance(Duration::from_millis(50));
        reveal.poll(board);
    }
}

#[test]
fn start_is_ignored_while_analyzing_or_complete() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();

    assert!(reveal.start());
    assert!(!reveal.start());
    assert_eq!(reveal.stage(), RevealStage::Processing);

    run_for(&clock, &mut reveal, &mut board, 12_000);
    assert_eq!(reveal.stage(), RevealStage::Complete);
    assert!(!reveal.start());
    assert_eq!(reveal.metrics().len(), RISK_METRICS.len());
}

#[test]
fn stages_follow_fixed_schedule() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();

    let checkpoints = [
        (1_499, RevealStage::Processing),
        (1_500, RevealStage::Extracting),
        (3_000, RevealStage::Modeling),
        (5_000, RevealStage::GeneratingInsights),
        (6_499, RevealStage::GeneratingInsights),
        (6_500, RevealStage::Complete),
    ];
    for (at, expected) in checkpoints {
        clock.set(Duration::from_millis(at));
        reveal.poll(&mut board);
        assert_eq!(reveal.stage(), expected, "at {at}ms");
    }
}

#[test]
fn progress_never_decreases_and_lands_on_exactly_100() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();

    let mut last = reveal.progress();
    while reveal.stage() != RevealStage::Complete {
        clock.advance(Duration::from_millis(37));
        reveal.poll(&mut board);
        let progress = reveal.progress();
        assert!(progress >= last, "{progress} < {last}");
        if reveal.stage() != RevealStage::Complete {
            assert!(progress <= PROGRESS_CEILING);
        }
        last = progress;
    }

    assert_eq!(reveal.progress(), 100.0);
    assert!(matches!(reveal.phase(), RevealPhase::Complete));
}

#[test]
fn late_poll_still_reveals_everything_in_order() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();

    clock.set(Duration::from_secs(30));
    assert!(reveal.poll(&mut board));

    assert_eq!(reveal.stage(), RevealStage::Complete);
    assert_eq!(reveal.metrics(), &RISK_METRICS[..]);
    assert_eq!(reveal.findings(), &RISK_FINDINGS[..]);
    assert_eq!(reveal.insights(), &INSIGHTS[..]);
    assert!(reveal.primary_chart_visible());
    assert!(reveal.secondary_chart_visible());
    assert!(!reveal.is_active());
}

#[test]
fn disclosure_is_progressive() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();

    clock.set(Duration::from_millis(6_500));
    reveal.poll(&mut board);
    assert!(reveal.metrics().is_empty());

    clock.set(Duration::from_millis(7_100));
    reveal.poll(&mut board);
    assert_eq!(reveal.metrics().len(), 2);
    assert!(!reveal.primary_chart_visible());

    clock.set(Duration::from_millis(7_900));
    reveal.poll(&mut board);
    assert!(reveal.primary_chart_visible());
    assert!(!reveal.holds_chart(ChartSlot::RiskDistribution));

    clock.set(Duration::from_millis(8_000));
    reveal.poll(&mut board);
    assert!(reveal.holds_chart(ChartSlot::RiskDistribution));
    assert!(reveal.findings().is_empty());

    clock.set(Duration::from_millis(8_450));
    reveal.poll(&mut board);
    assert_eq!(reveal.findings().len(), 3);

    clock.set(Duration::from_millis(9_400));
    reveal.poll(&mut board);
    assert_eq!(reveal.findings().len(), 6);
    assert_eq!(reveal.insights().len(), 2);

    clock.set(Duration::from_millis(9_950));
    reveal.poll(&mut board);
    assert!(reveal.secondary_chart_visible());
    assert!(reveal.holds_chart(ChartSlot::ConfidenceTrend));
    assert_eq!(board.live_charts(), 2);
}

#[test]
fn chart_render_is_skipped_when_surface_missing() {
    let (clock, mut reveal) = controller();
    let mut board = ChartBoard::new();
    board.mark_surface(ChartSlot::ConfidenceTrend);
    reveal.start();

    clock.set(Duration::from_secs(30));
    reveal.poll(&mut board);

    assert!(!reveal.holds_chart(ChartSlot::RiskDistribution));
    assert!(reveal.holds_chart(ChartSlot::ConfidenceTrend));
    assert_eq!(reveal.findings().len(), RISK_FINDINGS.len());
    assert_eq!(board.live_charts(), 1);
}

#[test]
fn teardown_mid_pipeline_stops_all_timers() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();

    run_for(&clock, &mut reveal, &mut board, 2_000);
    assert_eq!(reveal.stage(), RevealStage::Extracting);
    let progress = reveal.progress();

    reveal.teardown(&mut board);
    assert!(!reveal.is_active());
    assert_eq!(reveal.next_deadline(), None);

    clock.advance(Duration::from_secs(30));
    assert!(!reveal.poll(&mut board));
    assert_eq!(reveal.stage(), RevealStage::Extracting);
    assert_eq!(reveal.progress(), progress);
    assert!(reveal.metrics().is_empty());
}

#[test]
fn teardown_releases_rendered_charts() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();
    clock.set(Duration::from_secs(30));
    reveal.poll(&mut board);
    assert_eq!(board.live_charts(), 2);

    reveal.teardown(&mut board);
    assert_eq!(board.live_charts(), 0);
    assert_eq!(reveal.insights().len(), INSIGHTS.len());
}

#[test]
fn reset_returns_to_idle_and_allows_restart() {
    let (clock, mut reveal) = controller();
    let mut board = board_with_surfaces();
    reveal.start();
    clock.set(Duration::from_secs(30));
    reveal.poll(&mut board);

    reveal.reset(&mut board);
    assert_eq!(reveal.phase(), RevealPhase::Idle);
    assert!(reveal.metrics().is_empty());
    assert_eq!(board.live_charts(), 0);

    assert!(reveal.start());
    assert!(matches!(
        reveal.phase(),
        RevealPhase::Analyzing { step: "Processing uploaded documents", .. }
    ));
}
