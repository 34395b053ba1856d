use std::collections::HashSet;

use shared::domain::{DashboardSnapshot, RiskLevel};
use storage::SnapshotLoad;
use tracing::{info, warn};

use crate::{
    charts::{ChartCanvas, ChartSlot, ChartSpec, OwnedCharts},
    error::ConsoleError,
    fixtures,
};

const DASHBOARD_SLOTS: [ChartSlot; 2] = [ChartSlot::ComplianceHistory, ChartSlot::WeeklyTrend];

/// Summary view over the session snapshot. Storage IO happens elsewhere; this
/// only decides what to show and which charts need redrawing.
#[derive(Debug, Default)]
pub struct DashboardController {
    snapshot: DashboardSnapshot,
    charts: OwnedCharts,
    stale: HashSet<ChartSlot>,
}

impl DashboardController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adopts whatever the session store held at view entry.
    pub fn enter(&mut self, load: SnapshotLoad) {
        self.snapshot = match load {
            SnapshotLoad::Found(snapshot) => snapshot,
            SnapshotLoad::Absent => DashboardSnapshot::default(),
            SnapshotLoad::Malformed(reason) => {
                let err = ConsoleError::MalformedState(reason);
                warn!(kind = ?err.kind(), %err, "showing empty dashboard");
                DashboardSnapshot::default()
            }
        };
        info!(has_analysis = self.snapshot.has_analysis, "dashboard entered");
        self.invalidate_charts();
    }

    pub fn snapshot(&self) -> &DashboardSnapshot {
        &self.snapshot
    }

    pub fn has_analysis(&self) -> bool {
        self.snapshot.has_analysis
    }

    pub fn total_documents(&self) -> u32 {
        self.snapshot.total_documents()
    }

    pub fn anomaly_count(&self, severity: RiskLevel) -> usize {
        self.snapshot.anomalies_with(severity)
    }

    /// Switches to the demo snapshot and returns it so the caller can persist it.
    pub fn load_demo(&mut self) -> DashboardSnapshot {
        self.snapshot = fixtures::demo_snapshot();
        self.invalidate_charts();
        self.snapshot.clone()
    }

    /// Back to the empty dashboard; the caller removes the stored keys.
    pub fn clear(&mut self) {
        self.snapshot = DashboardSnapshot::default();
        self.invalidate_charts();
    }

    pub fn needs_render(&self) -> bool {
        !self.stale.is_empty()
    }

    pub fn holds_chart(&self, slot: ChartSlot) -> bool {
        self.charts.holds(slot)
    }

    /// Redraws every stale chart whose surface is laid out. Charts whose surface
    /// is missing stay stale until a later frame lays it out.
    pub fn render_charts(&mut self, canvas: &mut dyn ChartCanvas) {
        for slot in DASHBOARD_SLOTS {
            if !self.stale.contains(&slot) {
                continue;
            }
            if self.charts.render(canvas, slot, self.spec_for(slot)) {
                self.stale.remove(&slot);
            }
        }
    }

    pub fn teardown(&mut self, canvas: &mut dyn ChartCanvas) {
        self.charts.release_all(canvas);
        self.invalidate_charts();
    }

    fn invalidate_charts(&mut self) {
        self.stale.extend(DASHBOARD_SLOTS);
    }

    fn spec_for(&self, slot: ChartSlot) -> ChartSpec {
        let spec = match slot {
            ChartSlot::ComplianceHistory => fixtures::compliance_history_chart(),
            _ => fixtures::weekly_trend_chart(),
        };
        if self.snapshot.has_analysis {
            spec
        } else {
            spec.emptied()
        }
    }
}
