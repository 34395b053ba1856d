//! Chart resources and the drawing-surface seam between controllers and the view.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartSlot {
    ComplianceHistory,
    WeeklyTrend,
    RiskDistribution,
    ConfidenceTrend,
}

impl ChartSlot {
    pub fn name(self) -> &'static str {
        match self {
            Self::ComplianceHistory => "compliance_history",
            Self::WeeklyTrend => "weekly_trend",
            Self::RiskDistribution => "risk_distribution",
            Self::ConfidenceTrend => "confidence_trend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
    pub y_max: f64,
    /// Drawn as an explicit "no data" placeholder rather than a real series.
    pub empty: bool,
}

impl ChartSpec {
    pub fn line(title: impl Into<String>, labels: &[&str], y_max: f64) -> Self {
        Self {
            kind: ChartKind::Line,
            title: title.into(),
            labels: labels.iter().map(|label| label.to_string()).collect(),
            series: Vec::new(),
            y_max,
            empty: false,
        }
    }

    pub fn bar(title: impl Into<String>, labels: &[&str], y_max: f64) -> Self {
        Self {
            kind: ChartKind::Bar,
            ..Self::line(title, labels, y_max)
        }
    }

    pub fn with_series(mut self, label: impl Into<String>, values: &[f64]) -> Self {
        self.series.push(ChartSeries {
            label: label.into(),
            values: values.to_vec(),
        });
        self
    }

    pub fn emptied(mut self) -> Self {
        for series in &mut self.series {
            series.values.iter_mut().for_each(|value| *value = 0.0);
        }
        self.empty = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChartId(pub u64);

/// Rendering backend for charts. `draw` may only be called for a slot whose surface is laid out.
pub trait ChartCanvas {
    fn has_surface(&self, slot: ChartSlot) -> bool;
    fn draw(&mut self, slot: ChartSlot, spec: ChartSpec) -> ChartId;
    fn destroy(&mut self, id: ChartId);
}

/// Chart handles exclusively owned by one controller.
#[derive(Debug, Default)]
pub struct OwnedCharts {
    handles: HashMap<ChartSlot, ChartId>,
}

impl OwnedCharts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destroys any chart this owner holds in `slot` and draws `spec` in its place.
    /// Skips (and logs) when the surface is not laid out; no retry is scheduled.
    pub fn render(&mut self, canvas: &mut dyn ChartCanvas, slot: ChartSlot, spec: ChartSpec) -> bool {
        if !canvas.has_surface(slot) {
            tracing::warn!(slot = slot.name(), "chart surface not visible; skipping render");
            return false;
        }

        if let Some(previous) = self.handles.remove(&slot) {
            canvas.destroy(previous);
        }
        let id = canvas.draw(slot, spec);
        self.handles.insert(slot, id);
        tracing::debug!(slot = slot.name(), chart_id = id.0, "chart rendered");
        true
    }

    pub fn release(&mut self, canvas: &mut dyn ChartCanvas, slot: ChartSlot) {
        if let Some(id) = self.handles.remove(&slot) {
            canvas.destroy(id);
        }
    }

    pub fn release_all(&mut self, canvas: &mut dyn ChartCanvas) {
        for (_, id) in self.handles.drain() {
            canvas.destroy(id);
        }
    }

    pub fn holds(&self, slot: ChartSlot) -> bool {
        self.handles.contains_key(&slot)
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

/// In-process canvas: remembers which surfaces the view laid out this frame
/// and the specs of live charts, for the view to paint.
#[derive(Debug, Default)]
pub struct ChartBoard {
    surfaces: HashSet<ChartSlot>,
    charts: HashMap<ChartId, (ChartSlot, ChartSpec)>,
    next_id: u64,
}

impl ChartBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget laid-out surfaces; the view re-marks the ones it draws this frame.
    pub fn clear_surfaces(&mut self) {
        self.surfaces.clear();
    }

    pub fn mark_surface(&mut self, slot: ChartSlot) {
        self.surfaces.insert(slot);
    }

    pub fn chart_for(&self, slot: ChartSlot) -> Option<&ChartSpec> {
        self.charts
            .iter()
            .filter(|(_, (chart_slot, _))| *chart_slot == slot)
            .max_by_key(|(id, _)| id.0)
            .map(|(_, (_, spec))| spec)
    }

    pub fn live_charts(&self) -> usize {
        self.charts.len()
    }
}

impl ChartCanvas for ChartBoard {
    fn has_surface(&self, slot: ChartSlot) -> bool {
        self.surfaces.contains(&slot)
    }

    fn draw(&mut self, slot: ChartSlot, spec: ChartSpec) -> ChartId {
        self.next_id += 1;
        let id = ChartId(self.next_id);
        self.charts.insert(id, (slot, spec));
        id
    }

    fn destroy(&mut self, id: ChartId) {
        self.charts.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> ChartSpec {
        ChartSpec::line("Trend", &["Mon", "Tue"], 100.0).with_series("risk", &[40.0, 45.0])
    }

    #[test]
    fn render_is_skipped_without_surface() {
        let mut board = ChartBoard::new();
        let mut owned = OwnedCharts::new();

        assert!(!owned.render(&mut board, ChartSlot::WeeklyTrend, spec()));
        assert!(owned.is_empty());
        assert_eq!(board.live_charts(), 0);
    }

    #[test]
    fn rerender_replaces_previous_chart() {
        let mut board = ChartBoard::new();
        board.mark_surface(ChartSlot::WeeklyTrend);
        let mut owned = OwnedCharts::new();

        assert!(owned.render(&mut board, ChartSlot::WeeklyTrend, spec()));
        assert!(owned.render(&mut board, ChartSlot::WeeklyTrend, spec().emptied()));
        assert_eq!(board.live_charts(), 1);
        assert!(board.chart_for(ChartSlot::WeeklyTrend).expect("chart").empty);

        owned.release_all(&mut board);
        assert_eq!(board.live_charts(), 0);
        assert!(!owned.holds(ChartSlot::WeeklyTrend));
    }

    #[test]
    fn emptied_spec_zeroes_series() {
        let emptied = spec().emptied();
        assert!(emptied.empty);
        assert_eq!(emptied.series[0].values, vec![0.0, 0.0]);
    }
}
