//! Painter-drawn line/bar charts backed by the shared [`ChartBoard`].

use client_core::{
    charts::ChartKind,
    ChartBoard, ChartSlot, ChartSpec,
};
use eframe::egui;

const SERIES_COLORS: [egui::Color32; 3] = [
    egui::Color32::from_rgb(59, 130, 246),
    egui::Color32::from_rgb(234, 88, 12),
    egui::Color32::from_rgb(22, 163, 74),
];
const AXIS_MARGIN: f32 = 28.0;

/// Lays out the surface for `slot` and paints whatever chart currently owns it.
pub fn chart_surface(ui: &mut egui::Ui, board: &mut ChartBoard, slot: ChartSlot, height: f32) {
    board.mark_surface(slot);
    let width = ui.available_width();
    let (rect, _) = ui.allocate_exact_size(egui::vec2(width, height), egui::Sense::hover());
    let painter = ui.painter_at(rect);
    let visuals = ui.visuals();

    painter.rect_filled(rect, egui::CornerRadius::same(6), visuals.extreme_bg_color);
    painter.rect_stroke(
        rect,
        egui::CornerRadius::same(6),
        visuals.widgets.noninteractive.bg_stroke,
        egui::StrokeKind::Inside,
    );

    let Some(spec) = board.chart_for(slot) else {
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "Preparing chart...",
            egui::FontId::proportional(13.0),
            visuals.weak_text_color(),
        );
        return;
    };

    paint_spec(&painter, rect, spec, visuals.text_color(), visuals.weak_text_color());
}

fn paint_spec(
    painter: &egui::Painter,
    rect: egui::Rect,
    spec: &ChartSpec,
    text_color: egui::Color32,
    weak_color: egui::Color32,
) {
    painter.text(
        rect.left_top() + egui::vec2(10.0, 8.0),
        egui::Align2::LEFT_TOP,
        &spec.title,
        egui::FontId::proportional(13.0),
        text_color,
    );

    let plot = egui::Rect::from_min_max(
        rect.left_top() + egui::vec2(AXIS_MARGIN, AXIS_MARGIN),
        rect.right_bottom() - egui::vec2(12.0, AXIS_MARGIN),
    );
    let axis = egui::Stroke::new(1.0, weak_color);
    painter.line_segment([plot.left_bottom(), plot.right_bottom()], axis);
    painter.line_segment([plot.left_top(), plot.left_bottom()], axis);

    let slots = spec.labels.len().max(1);
    let slot_width = plot.width() / slots as f32;
    for (index, label) in spec.labels.iter().enumerate() {
        let x = plot.left() + slot_width * (index as f32 + 0.5);
        painter.text(
            egui::pos2(x, plot.bottom() + 4.0),
            egui::Align2::CENTER_TOP,
            label,
            egui::FontId::proportional(11.0),
            weak_color,
        );
    }

    if spec.empty {
        painter.text(
            plot.center(),
            egui::Align2::CENTER_CENTER,
            "No analysis data yet",
            egui::FontId::proportional(13.0),
            weak_color,
        );
        return;
    }

    let y_max = if spec.y_max > 0.0 { spec.y_max } else { 1.0 };
    let y_for = |value: f64| {
        let ratio = (value / y_max).clamp(0.0, 1.0) as f32;
        plot.bottom() - ratio * plot.height()
    };

    for (series_index, series) in spec.series.iter().enumerate() {
        let color = SERIES_COLORS[series_index % SERIES_COLORS.len()];
        match spec.kind {
            ChartKind::Line => {
                let points: Vec<egui::Pos2> = series
                    .values
                    .iter()
                    .enumerate()
                    .map(|(index, value)| {
                        egui::pos2(plot.left() + slot_width * (index as f32 + 0.5), y_for(*value))
                    })
                    .collect();
                for point in &points {
                    painter.circle_filled(*point, 3.0, color);
                }
                painter.add(egui::Shape::line(points, egui::Stroke::new(2.0, color)));
            }
            ChartKind::Bar => {
                let bar_width = slot_width * 0.6 / spec.series.len().max(1) as f32;
                for (index, value) in series.values.iter().enumerate() {
                    let left = plot.left()
                        + slot_width * index as f32
                        + slot_width * 0.2
                        + bar_width * series_index as f32;
                    let bar = egui::Rect::from_min_max(
                        egui::pos2(left, y_for(*value)),
                        egui::pos2(left + bar_width, plot.bottom()),
                    );
                    painter.rect_filled(bar, egui::CornerRadius::same(2), color);
                }
            }
        }
    }
}
