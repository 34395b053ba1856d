//! Risk-analysis reveal: a fixed staged "pipeline" followed by progressive
//! disclosure of precomputed results.
//!
//! Both halves are step tables run by a [`Timeline`] polled against the
//! injected [`Clock`]. Progress during the pipeline is a separate [`Ticker`]
//! on the same clock, capped below 100 until the last stage finishes.

use std::{sync::Arc, time::Duration};

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

use crate::{
    charts::{ChartCanvas, ChartSlot, OwnedCharts},
    clock::Clock,
    fixtures::{self, Insight, RiskFinding, RiskMetric, INSIGHTS, RISK_FINDINGS, RISK_METRICS},
    timeline::{Step, Ticker, Timeline},
};

pub const PROGRESS_TICK: Duration = Duration::from_millis(100);
pub const PROGRESS_CEILING: f64 = 95.0;
const PROGRESS_STEP_MIN: f64 = 1.0;
const PROGRESS_STEP_MAX: f64 = 2.0;

const METRIC_DELAY_MS: u64 = 300;
const SECTION_DELAY_MS: u64 = 200;
const CHART_SETTLE_MS: u64 = 100;
const ROW_DELAY_MS: u64 = 150;
const INSIGHT_DELAY_MS: u64 = 250;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RevealStage {
    Idle,
    Processing,
    Extracting,
    Modeling,
    GeneratingInsights,
    Complete,
}

impl RevealStage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Ready to analyze",
            Self::Processing => "Processing uploaded documents",
            Self::Extracting => "Extracting financial indicators",
            Self::Modeling => "Running ML risk models",
            Self::GeneratingInsights => "Generating insights",
            Self::Complete => "Analysis complete",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PipelinePhase {
    pub stage: RevealStage,
    pub hold: Duration,
}

pub const PIPELINE: [PipelinePhase; 4] = [
    PipelinePhase {
        stage: RevealStage::Processing,
        hold: Duration::from_millis(1_500),
    },
    PipelinePhase {
        stage: RevealStage::Extracting,
        hold: Duration::from_millis(1_500),
    },
    PipelinePhase {
        stage: RevealStage::Modeling,
        hold: Duration::from_millis(2_000),
    },
    PipelinePhase {
        stage: RevealStage::GeneratingInsights,
        hold: Duration::from_millis(1_500),
    },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealPhase {
    Idle,
    Analyzing { progress: f64, step: &'static str },
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RevealAction {
    Enter(RevealStage),
    FinishPipeline,
    RevealMetric(usize),
    ShowPrimaryChart,
    RenderPrimaryChart,
    RevealRow(usize),
    RevealInsight(usize),
    ShowSecondaryChart,
    RenderSecondaryChart,
}

/// Stage `n + 1` is entered once stage `n` has been held for its duration.
fn pipeline_steps() -> Vec<Step<RevealAction>> {
    let mut steps = Vec::with_capacity(PIPELINE.len());
    for pair in PIPELINE.windows(2) {
        steps.push(Step::after(pair[0].hold, RevealAction::Enter(pair[1].stage)));
    }
    if let Some(last) = PIPELINE.last() {
        steps.push(Step::after(last.hold, RevealAction::FinishPipeline));
    }
    steps
}

fn disclosure_steps() -> Vec<Step<RevealAction>> {
    let mut steps = Vec::new();
    steps.extend((0..RISK_METRICS.len()).map(|i| Step::after_ms(METRIC_DELAY_MS, RevealAction::RevealMetric(i))));
    steps.push(Step::after_ms(SECTION_DELAY_MS, RevealAction::ShowPrimaryChart));
    steps.push(Step::after_ms(CHART_SETTLE_MS, RevealAction::RenderPrimaryChart));
    steps.extend((0..RISK_FINDINGS.len()).map(|i| Step::after_ms(ROW_DELAY_MS, RevealAction::RevealRow(i))));
    steps.extend((0..INSIGHTS.len()).map(|i| Step::after_ms(INSIGHT_DELAY_MS, RevealAction::RevealInsight(i))));
    steps.push(Step::after_ms(SECTION_DELAY_MS, RevealAction::ShowSecondaryChart));
    steps.push(Step::after_ms(CHART_SETTLE_MS, RevealAction::RenderSecondaryChart));
    steps
}

pub struct RevealController {
    clock: Arc<dyn Clock>,
    rng: StdRng,
    stage: RevealStage,
    progress: f64,
    timeline: Timeline<RevealAction>,
    ticker: Ticker,
    metrics: Vec<RiskMetric>,
    findings: Vec<RiskFinding>,
    insights: Vec<Insight>,
    primary_chart_visible: bool,
    secondary_chart_visible: bool,
    charts: OwnedCharts,
}

impl RevealController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_rng(clock, StdRng::from_entropy())
    }

    pub fn with_seed(clock: Arc<dyn Clock>, seed: u64) -> Self {
        Self::with_rng(clock, StdRng::seed_from_u64(seed))
    }

    fn with_rng(clock: Arc<dyn Clock>, rng: StdRng) -> Self {
        Self {
            clock,
            rng,
            stage: RevealStage::Idle,
            progress: 0.0,
            timeline: Timeline::idle(),
            ticker: Ticker::stopped(PROGRESS_TICK),
            metrics: Vec::new(),
            findings: Vec::new(),
            insights: Vec::new(),
            primary_chart_visible: false,
            secondary_chart_visible: false,
            charts: OwnedCharts::new(),
        }
    }

    pub fn stage(&self) -> RevealStage {
        self.stage
    }

    pub fn phase(&self) -> RevealPhase {
        match self.stage {
            RevealStage::Idle => RevealPhase::Idle,
            RevealStage::Complete => RevealPhase::Complete,
            stage => RevealPhase::Analyzing {
                progress: self.progress,
                step: stage.label(),
            },
        }
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn metrics(&self) -> &[RiskMetric] {
        &self.metrics
    }

    pub fn findings(&self) -> &[RiskFinding] {
        &self.findings
    }

    pub fn insights(&self) -> &[Insight] {
        &self.insights
    }

    pub fn primary_chart_visible(&self) -> bool {
        self.primary_chart_visible
    }

    pub fn secondary_chart_visible(&self) -> bool {
        self.secondary_chart_visible
    }

    pub fn holds_chart(&self, slot: ChartSlot) -> bool {
        self.charts.holds(slot)
    }

    /// True while any timer is pending.
    pub fn is_active(&self) -> bool {
        self.timeline.is_running() || self.ticker.is_running()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        match (self.timeline.next_deadline(), self.ticker.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Enters `Analyzing`. A no-op returning `false` when already analyzing or complete.
    pub fn start(&mut self) -> bool {
        if self.stage != RevealStage::Idle {
            debug!(stage = ?self.stage, "reveal start ignored");
            return false;
        }

        self.metrics.clear();
        self.findings.clear();
        self.insights.clear();
        self.primary_chart_visible = false;
        self.secondary_chart_visible = false;
        self.progress = 0.0;

        let now = self.clock.now();
        self.stage = PIPELINE[0].stage;
        self.ticker = Ticker::start(PROGRESS_TICK, now);
        self.timeline = Timeline::start(pipeline_steps(), now);
        info!(stage = ?self.stage, "risk analysis started");
        true
    }

    /// Applies every progress tick and step that is due. Returns whether anything changed.
    pub fn poll(&mut self, canvas: &mut dyn ChartCanvas) -> bool {
        let now = self.clock.now();
        let mut changed = false;

        loop {
            let horizon = match self.timeline.next_deadline() {
                Some(deadline) if deadline <= now => deadline,
                _ => now,
            };
            changed |= self.advance_progress(horizon);

            match self.timeline.pop_due(now) {
                Some((due_at, action)) => {
                    self.apply(action, due_at, canvas);
                    changed = true;
                }
                None => break,
            }
        }

        changed
    }

    /// Releases chart resources and cancels pending timers. Revealed data stays as it is.
    pub fn teardown(&mut self, canvas: &mut dyn ChartCanvas) {
        self.charts.release_all(canvas);
        self.timeline.cancel();
        self.ticker.stop();
        debug!(stage = ?self.stage, "reveal torn down");
    }

    /// Tears down and returns to `Idle` with nothing revealed.
    pub fn reset(&mut self, canvas: &mut dyn ChartCanvas) {
        self.teardown(canvas);
        self.stage = RevealStage::Idle;
        self.progress = 0.0;
        self.metrics.clear();
        self.findings.clear();
        self.insights.clear();
        self.primary_chart_visible = false;
        self.secondary_chart_visible = false;
    }

    fn advance_progress(&mut self, until: Duration) -> bool {
        let ticks = self.ticker.ticks_until(until);
        if ticks == 0 {
            return false;
        }

        let before = self.progress;
        for _ in 0..ticks {
            let step = self.rng.gen_range(PROGRESS_STEP_MIN..PROGRESS_STEP_MAX);
            self.progress = (self.progress + step).min(PROGRESS_CEILING);
        }
        self.progress != before
    }

    fn apply(&mut self, action: RevealAction, due_at: Duration, canvas: &mut dyn ChartCanvas) {
        match action {
            RevealAction::Enter(stage) => {
                self.stage = stage;
                info!(stage = ?stage, progress = self.progress, "analysis stage entered");
            }
            RevealAction::FinishPipeline => {
                self.ticker.stop();
                self.progress = 100.0;
                self.stage = RevealStage::Complete;
                self.timeline = Timeline::start(disclosure_steps(), due_at);
                info!("risk analysis complete; revealing results");
            }
            RevealAction::RevealMetric(index) => {
                if self.metrics.len() == index {
                    self.metrics.push(RISK_METRICS[index].clone());
                }
            }
            RevealAction::ShowPrimaryChart => self.primary_chart_visible = true,
            RevealAction::RenderPrimaryChart => {
                self.charts.render(
                    canvas,
                    ChartSlot::RiskDistribution,
                    fixtures::risk_distribution_chart(),
                );
            }
            RevealAction::RevealRow(index) => {
                if self.findings.len() == index {
                    self.findings.push(RISK_FINDINGS[index].clone());
                }
            }
            RevealAction::RevealInsight(index) => {
                if self.insights.len() == index {
                    self.insights.push(INSIGHTS[index].clone());
                }
            }
            RevealAction::ShowSecondaryChart => self.secondary_chart_visible = true,
            RevealAction::RenderSecondaryChart => {
                self.charts.render(
                    canvas,
                    ChartSlot::ConfidenceTrend,
                    fixtures::confidence_trend_chart(),
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/reveal_tests.rs"]
mod tests;
