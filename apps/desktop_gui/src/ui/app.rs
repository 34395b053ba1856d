use std::{
    collections::VecDeque,
    path::Path,
    sync::Arc,
    time::{Duration, Instant},
};

use client_core::{
    fixtures::Trend,
    reports::{ReportFilter, ReportRecord},
    uploads::{LocalFileKey, ALLOWED_EXTENSIONS},
    AssetSaver, CandidateFile, ChartBoard, ChartSlot, Clock, DashboardController, Notice,
    NoticeLevel, ReportsController, RevealController, RevealPhase, SystemClock, UploadManager,
    UploadPolicy,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{FileStatus, ReportId, ReportKind, ReportStatus, RiskLevel};

use crate::backend_bridge::commands::BackendCommand;
use crate::config::Settings;
use crate::controller::{
    events::{err_label, UiError, UiErrorContext, UiEvent},
    orchestration::{dispatch_backend_command, dispatch_upload_commands},
};
use crate::ui::charts::chart_surface;

const NOTICE_TTL: Duration = Duration::from_secs(6);
const MAX_VISIBLE_NOTICES: usize = 4;
const IDLE_REPAINT: Duration = Duration::from_millis(100);
const MIN_REPAINT: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Upload,
    Dashboard,
    Analysis,
    Reports,
}

impl Screen {
    const ALL: [Screen; 4] = [Self::Upload, Self::Dashboard, Self::Analysis, Self::Reports];

    fn label(self) -> &'static str {
        match self {
            Self::Upload => "Upload",
            Self::Dashboard => "Dashboard",
            Self::Analysis => "Risk Analysis",
            Self::Reports => "Reports",
        }
    }
}

#[derive(Debug, Clone)]
struct StatusBanner {
    title: &'static str,
    message: String,
}

impl From<&UiError> for StatusBanner {
    fn from(err: &UiError) -> Self {
        Self {
            title: err_label(err.category()),
            message: err.message().to_string(),
        }
    }
}

struct ShownNotice {
    notice: Notice,
    shown_at: Instant,
}

enum UploadAction {
    Analyze(LocalFileKey),
    Retry(LocalFileKey),
    Delete(LocalFileKey),
}

enum ReportAction {
    Toggle(ReportId),
    Download(ReportId),
    Regenerate(ReportId),
    Delete(ReportId),
}

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    clock: Arc<dyn Clock>,
    board: ChartBoard,
    saver: AssetSaver,
    screen: Screen,
    uploads: UploadManager,
    dashboard: DashboardController,
    reveal: Option<RevealController>,
    reports: Option<ReportsController>,
    new_report_kind: ReportKind,
    new_report_period: String,
    status: String,
    status_banner: Option<StatusBanner>,
    notices: VecDeque<ShownNotice>,
}

impl DesktopGuiApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>, settings: &Settings) -> Self {
        let policy = UploadPolicy {
            max_bytes: settings.max_upload_bytes,
            ..UploadPolicy::default()
        };
        let mut app = Self {
            cmd_tx,
            ui_rx,
            clock: Arc::new(SystemClock::new()),
            board: ChartBoard::new(),
            saver: AssetSaver::new(&settings.assets_dir, &settings.download_dir),
            screen: Screen::Upload,
            uploads: UploadManager::new(policy),
            dashboard: DashboardController::new(),
            reveal: None,
            reports: None,
            new_report_kind: ReportKind::RiskAssessment,
            new_report_period: String::new(),
            status: "Starting...".to_string(),
            status_banner: None,
            notices: VecDeque::new(),
        };
        app.enter_screen(Screen::Upload);
        app
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(context = ?err.context(), category = ?err.category(), "{}", err.message());
                    self.status_banner = Some(StatusBanner::from(&err));
                }
                UiEvent::Upload(event) => {
                    if let Some(err) = event.error() {
                        self.status_banner =
                            Some(StatusBanner::from(&UiError::from_console(UiErrorContext::Upload, err)));
                    }
                    let follow_up = self.uploads.apply(event);
                    dispatch_upload_commands(&self.cmd_tx, follow_up, &mut self.status);
                }
                UiEvent::SnapshotLoaded(load) => {
                    if self.screen == Screen::Dashboard {
                        self.dashboard.enter(load);
                    }
                }
                UiEvent::SnapshotSaved => {
                    self.status = "Demo data loaded".to_string();
                }
                UiEvent::SnapshotCleared => {
                    self.status = "Dashboard data cleared".to_string();
                }
            }
        }
    }

    fn poll_controllers(&mut self) {
        if let Some(reveal) = self.reveal.as_mut() {
            reveal.poll(&mut self.board);
        }
        if let Some(reports) = self.reports.as_mut() {
            reports.poll(&self.saver);
            let notices = reports.take_notices();
            self.push_notices(notices);
        }
        if self.screen == Screen::Dashboard {
            self.dashboard.render_charts(&mut self.board);
        }
        let notices = self.uploads.take_notices();
        self.push_notices(notices);
    }

    fn push_notices(&mut self, notices: Vec<Notice>) {
        let now = Instant::now();
        for notice in notices {
            self.notices.push_back(ShownNotice {
                notice,
                shown_at: now,
            });
        }
        while self.notices.len() > MAX_VISIBLE_NOTICES {
            self.notices.pop_front();
        }
    }

    fn switch_screen(&mut self, next: Screen) {
        if next == self.screen {
            return;
        }
        match self.screen {
            Screen::Upload => {}
            Screen::Dashboard => self.dashboard.teardown(&mut self.board),
            Screen::Analysis => {
                if let Some(mut reveal) = self.reveal.take() {
                    reveal.teardown(&mut self.board);
                }
            }
            Screen::Reports => {
                if let Some(mut reports) = self.reports.take() {
                    reports.teardown();
                }
            }
        }
        self.enter_screen(next);
    }

    fn enter_screen(&mut self, screen: Screen) {
        self.screen = screen;
        tracing::debug!(screen = screen.label(), "entering screen");
        match screen {
            Screen::Upload => {
                let command = self.uploads.refresh();
                dispatch_upload_commands(&self.cmd_tx, [command], &mut self.status);
            }
            Screen::Dashboard => {
                dispatch_backend_command(&self.cmd_tx, BackendCommand::LoadSnapshot, &mut self.status);
            }
            Screen::Analysis => {
                self.reveal = Some(RevealController::new(self.clock.clone()));
            }
            Screen::Reports => {
                self.reports = Some(ReportsController::new(self.clock.clone()));
            }
        }
    }

    fn next_repaint(&self) -> Duration {
        let now = self.clock.now();
        let deadlines = [
            self.reveal.as_ref().and_then(RevealController::next_deadline),
            self.reports.as_ref().and_then(ReportsController::next_deadline),
        ];
        let timer = deadlines
            .into_iter()
            .flatten()
            .min()
            .map(|deadline| deadline.saturating_sub(now));

        let mut delay = timer.unwrap_or(IDLE_REPAINT).min(IDLE_REPAINT);
        if self.screen == Screen::Dashboard && self.dashboard.needs_render() {
            delay = MIN_REPAINT;
        }
        delay.max(MIN_REPAINT)
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("screen_tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Risk Console");
                ui.separator();
                let mut selected = self.screen;
                for screen in Screen::ALL {
                    ui.selectable_value(&mut selected, screen, screen.label());
                }
                if selected != self.screen {
                    self.switch_screen(selected);
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(&self.status);
                });
            });
        });
    }

    fn show_bottom_bar(&mut self, ctx: &egui::Context) {
        let now = Instant::now();
        self.notices
            .retain(|shown| now.duration_since(shown.shown_at) < NOTICE_TTL);
        if self.notices.is_empty() && self.status_banner.is_none() {
            return;
        }

        egui::TopBottomPanel::bottom("notices").show(ctx, |ui| {
            if let Some(banner) = self.status_banner.clone() {
                ui.horizontal(|ui| {
                    ui.colored_label(
                        ui.visuals().error_fg_color,
                        egui::RichText::new(format!("{} error", banner.title)).strong(),
                    );
                    ui.label(&banner.message);
                    if ui.small_button("Dismiss").clicked() {
                        self.status_banner = None;
                    }
                });
            }
            for shown in &self.notices {
                let color = match shown.notice.level {
                    NoticeLevel::Info => ui.visuals().text_color(),
                    NoticeLevel::Alert => ui.visuals().warn_fg_color,
                };
                ui.colored_label(color, &shown.notice.message);
            }
        });
    }

    fn show_upload_screen(&mut self, ui: &mut egui::Ui) {
        ui.heading("Upload financial documents");
        let policy = self.uploads.policy();
        ui.weak(format!(
            "Accepted types: {} - up to {} per file",
            ALLOWED_EXTENSIONS.join(", "),
            human_readable_bytes(policy.max_bytes)
        ));
        ui.add_space(8.0);

        let dropped = ui.ctx().input(|input| input.raw.dropped_files.clone());
        let hovering = ui.ctx().input(|input| !input.raw.hovered_files.is_empty());
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_height(72.0);
            ui.vertical_centered(|ui| {
                ui.add_space(12.0);
                if hovering {
                    ui.strong("Release to upload");
                } else {
                    ui.label("Drag and drop files here");
                }
                if ui.button("Choose files...").clicked() {
                    let picked = rfd::FileDialog::new()
                        .add_filter("Financial documents", &ALLOWED_EXTENSIONS)
                        .pick_files()
                        .unwrap_or_default();
                    let candidates = picked.iter().filter_map(|path| self.candidate_from_path(path, None)).collect();
                    self.accept_candidates(candidates);
                }
            });
        });

        if !dropped.is_empty() {
            let candidates = dropped
                .into_iter()
                .filter_map(|file| self.candidate_from_drop(file))
                .collect();
            self.accept_candidates(candidates);
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Refresh").clicked() {
                let command = self.uploads.refresh();
                dispatch_upload_commands(&self.cmd_tx, [command], &mut self.status);
            }
            let pending = self.uploads.count_with(FileStatus::Pending);
            let analyze_all = ui.add_enabled(
                pending > 0,
                egui::Button::new(format!("Analyze all ({pending})")),
            );
            if analyze_all.clicked() {
                if let Some(command) = self.uploads.begin_analyze_all() {
                    dispatch_upload_commands(&self.cmd_tx, [command], &mut self.status);
                }
            }
            if self.uploads.is_loading() {
                ui.spinner();
            }
        });
        ui.separator();

        let mut actions = Vec::new();
        egui::ScrollArea::vertical().show(ui, |ui| {
            if self.uploads.records().is_empty() {
                ui.weak("No documents uploaded yet.");
            }
            egui::Grid::new("upload_records")
                .striped(true)
                .num_columns(5)
                .show(ui, |ui| {
                    for record in self.uploads.records() {
                        ui.vertical(|ui| {
                            ui.strong(&record.filename);
                            if let Some(invoice) = record.invoice() {
                                ui.weak(format!(
                                    "Invoice {} from {} - {} {}",
                                    invoice.invoice_number.as_deref().unwrap_or("?"),
                                    invoice.vendor.as_deref().unwrap_or("unknown vendor"),
                                    invoice.total_amount.as_deref().unwrap_or("?"),
                                    invoice.currency.as_deref().unwrap_or("")
                                ));
                            }
                            if let Some(error) = &record.error {
                                ui.colored_label(ui.visuals().error_fg_color, error);
                            }
                        });
                        ui.label(human_readable_bytes(record.size));
                        ui.label(record.status.label());
                        match record.status {
                            FileStatus::Uploading | FileStatus::Analyzing => {
                                ui.add(
                                    egui::ProgressBar::new(f32::from(record.progress) / 100.0)
                                        .desired_width(120.0)
                                        .show_percentage(),
                                );
                            }
                            _ => {
                                ui.label("");
                            }
                        }
                        ui.horizontal(|ui| {
                            let can_analyze = record.status == FileStatus::Pending && record.id.is_some();
                            if ui.add_enabled(can_analyze, egui::Button::new("Analyze")).clicked() {
                                actions.push(UploadAction::Analyze(record.key));
                            }
                            if record.status == FileStatus::Failed && ui.button("Retry").clicked() {
                                actions.push(UploadAction::Retry(record.key));
                            }
                            let busy = matches!(record.status, FileStatus::Uploading | FileStatus::Analyzing);
                            if ui.add_enabled(!busy, egui::Button::new("Delete")).clicked() {
                                actions.push(UploadAction::Delete(record.key));
                            }
                        });
                        ui.end_row();
                    }
                });
        });

        for action in actions {
            self.apply_upload_action(action);
        }
    }

    fn candidate_from_path(&mut self, path: &Path, name: Option<String>) -> Option<CandidateFile> {
        let mime_type = mime_guess::from_path(path).first().map(|mime| mime.to_string());
        match CandidateFile::from_path(path, name, mime_type) {
            Ok(candidate) => Some(candidate),
            Err(err) => {
                self.push_notices(vec![Notice::alert(format!("Could not read {}: {err}", path.display()))]);
                None
            }
        }
    }

    fn candidate_from_drop(&mut self, file: egui::DroppedFile) -> Option<CandidateFile> {
        if let Some(bytes) = file.bytes {
            let mime_type = (!file.mime.is_empty())
                .then(|| file.mime.clone())
                .or_else(|| mime_guess::from_path(&file.name).first().map(|mime| mime.to_string()));
            return Some(CandidateFile::new(file.name, mime_type, bytes.to_vec()));
        }
        let path = file.path?;
        self.candidate_from_path(&path, Some(file.name))
    }

    fn accept_candidates(&mut self, candidates: Vec<CandidateFile>) {
        if candidates.is_empty() {
            return;
        }
        let outcome = self.uploads.accept_files(candidates);
        dispatch_upload_commands(&self.cmd_tx, outcome.commands, &mut self.status);
    }

    fn apply_upload_action(&mut self, action: UploadAction) {
        let command = match action {
            UploadAction::Analyze(key) => match self.uploads.analyze(key) {
                Ok(command) => Some(command),
                Err(err) => {
                    self.status_banner =
                        Some(StatusBanner::from(&UiError::from_console(UiErrorContext::Upload, &err)));
                    None
                }
            },
            UploadAction::Retry(key) => self.uploads.retry(key).ok(),
            UploadAction::Delete(key) => self.uploads.delete(key),
        };
        dispatch_upload_commands(&self.cmd_tx, command, &mut self.status);
    }

    fn show_dashboard_screen(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Risk dashboard");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Clear data").clicked() {
                    self.dashboard.clear();
                    dispatch_backend_command(&self.cmd_tx, BackendCommand::ClearSnapshot, &mut self.status);
                }
                if ui.button("Load demo data").clicked() {
                    let snapshot = self.dashboard.load_demo();
                    dispatch_backend_command(
                        &self.cmd_tx,
                        BackendCommand::SaveSnapshot(snapshot),
                        &mut self.status,
                    );
                }
            });
        });

        if !self.dashboard.has_analysis() {
            ui.weak("No analysis yet. Upload documents and run an analysis, or load demo data.");
        }
        ui.add_space(8.0);

        let snapshot = self.dashboard.snapshot().clone();
        ui.columns(4, |columns| {
            stat_card(&mut columns[0], "Risk score", &format!("{:.0}", snapshot.risk_score), &snapshot.risk_label);
            stat_card(
                &mut columns[1],
                "Compliance",
                &format!("{:.1}%", snapshot.compliance_pct),
                "of controls passing",
            );
            stat_card(
                &mut columns[2],
                "Documents",
                &self.dashboard.total_documents().to_string(),
                "analyzed",
            );
            stat_card(
                &mut columns[3],
                "Anomalies",
                &snapshot.anomalies.len().to_string(),
                &format!("{} high severity", self.dashboard.anomaly_count(RiskLevel::High)),
            );
        });
        ui.add_space(8.0);

        let board = &mut self.board;
        ui.columns(2, |columns| {
            chart_surface(&mut columns[0], board, ChartSlot::ComplianceHistory, 220.0);
            chart_surface(&mut columns[1], board, ChartSlot::WeeklyTrend, 220.0);
        });
        ui.add_space(8.0);

        ui.columns(2, |columns| {
            columns[0].strong("Documents by category");
            egui::Grid::new("document_counts").striped(true).show(&mut columns[0], |ui| {
                for entry in &snapshot.document_counts {
                    ui.label(&entry.category);
                    ui.label(entry.count.to_string());
                    ui.end_row();
                }
            });

            columns[1].strong("Recent anomalies");
            for anomaly in &snapshot.anomalies {
                columns[1].horizontal(|ui| {
                    ui.colored_label(risk_color(anomaly.severity), anomaly.severity.label());
                    ui.strong(&anomaly.title);
                    ui.weak(&anomaly.detected_at);
                });
                columns[1].label(&anomaly.description);
            }
        });
    }

    fn show_analysis_screen(&mut self, ui: &mut egui::Ui) {
        let Some(reveal) = self.reveal.as_mut() else {
            return;
        };
        ui.heading("Risk analysis");

        match reveal.phase() {
            RevealPhase::Idle => {
                ui.label("Run the risk models over the uploaded documents.");
                if ui.button("Start risk analysis").clicked() {
                    reveal.start();
                }
            }
            RevealPhase::Analyzing { progress, step } => {
                ui.add(
                    egui::ProgressBar::new((progress / 100.0) as f32)
                        .text(format!("{step} - {progress:.0}%"))
                        .animate(true),
                );
            }
            RevealPhase::Complete => {
                ui.horizontal(|ui| {
                    ui.strong("Analysis complete");
                    if !reveal.is_active() && ui.button("Run again").clicked() {
                        reveal.reset(&mut self.board);
                    }
                });
            }
        }
        ui.add_space(8.0);

        egui::ScrollArea::vertical().show(ui, |ui| {
            let metrics = reveal.metrics();
            if !metrics.is_empty() {
                ui.columns(4, |columns| {
                    for (column, metric) in columns.iter_mut().zip(metrics) {
                        let arrow = match metric.trend {
                            Trend::Up => "^",
                            Trend::Down => "v",
                            Trend::Flat => "-",
                        };
                        egui::Frame::group(column.style()).show(column, |ui| {
                            ui.weak(metric.label);
                            ui.heading(metric.value);
                            ui.colored_label(risk_color(metric.level), format!("{arrow} {}", metric.change));
                        });
                    }
                });
            }

            if reveal.primary_chart_visible() {
                ui.add_space(8.0);
                chart_surface(ui, &mut self.board, ChartSlot::RiskDistribution, 220.0);
            }

            if !reveal.findings().is_empty() {
                ui.add_space(8.0);
                ui.strong("Risk breakdown");
                egui::Grid::new("risk_findings").striped(true).num_columns(5).show(ui, |ui| {
                    for header in ["Category", "Exposure", "Probability", "Impact", "Level"] {
                        ui.strong(header);
                    }
                    ui.end_row();
                    for finding in reveal.findings() {
                        ui.label(finding.category);
                        ui.label(finding.exposure);
                        ui.label(format!("{:.0}%", finding.probability * 100.0));
                        ui.label(finding.impact);
                        ui.colored_label(risk_color(finding.level), finding.level.label());
                        ui.end_row();
                    }
                });
            }

            if !reveal.insights().is_empty() {
                ui.add_space(8.0);
                ui.strong("AI insights");
                for insight in reveal.insights() {
                    egui::Frame::group(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(risk_color(insight.level), insight.title);
                            ui.weak(format!("confidence {:.0}%", insight.confidence * 100.0));
                        });
                        ui.label(insight.detail);
                    });
                }
            }

            if reveal.secondary_chart_visible() {
                ui.add_space(8.0);
                chart_surface(ui, &mut self.board, ChartSlot::ConfidenceTrend, 160.0);
            }
        });
    }

    fn show_reports_screen(&mut self, ui: &mut egui::Ui) {
        let Some(reports) = self.reports.as_mut() else {
            return;
        };
        ui.heading("Reports");

        let mut filter = reports.filter().clone();
        ui.horizontal(|ui| {
            ui.label("Search");
            ui.text_edit_singleline(&mut filter.search);
            option_combo(ui, "report_kind_filter", "All types", &mut filter.kind, &ReportKind::ALL, |kind| {
                kind.label()
            });
            option_combo(
                ui,
                "report_status_filter",
                "All statuses",
                &mut filter.status,
                &ReportStatus::ALL,
                |status| status.label(),
            );
            if ui.button("Reset filters").clicked() {
                filter = ReportFilter::default();
            }
        });
        reports.set_filter(filter);

        ui.horizontal(|ui| {
            egui::ComboBox::from_id_salt("new_report_kind")
                .selected_text(self.new_report_kind.label())
                .show_ui(ui, |ui| {
                    for kind in ReportKind::ALL {
                        ui.selectable_value(&mut self.new_report_kind, kind, kind.label());
                    }
                });
            ui.add(egui::TextEdit::singleline(&mut self.new_report_period).hint_text("Period, e.g. Q4 2024"));
            let period = self.new_report_period.trim().to_string();
            if ui.add_enabled(!period.is_empty(), egui::Button::new("Generate report")).clicked() {
                reports.generate(self.new_report_kind, period);
                self.new_report_period.clear();
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| match reports.export_progress() {
                Some(percent) => {
                    ui.add(
                        egui::ProgressBar::new(f32::from(percent) / 100.0)
                            .desired_width(140.0)
                            .text(format!("Exporting {percent}%")),
                    );
                }
                None => {
                    if ui.button("Export all").clicked() {
                        reports.export_all();
                    }
                }
            });
        });
        ui.separator();

        let rows: Vec<ReportRecord> = reports.visible().into_iter().cloned().collect();
        let mut select_page = reports.all_visible_selected();
        let mut actions = Vec::new();

        egui::Grid::new("reports_table").striped(true).num_columns(9).show(ui, |ui| {
            if ui.checkbox(&mut select_page, "").changed() {
                reports.select_all_visible(select_page);
            }
            for header in ["Name", "Type", "Period", "Risk", "Generated", "Status", "Size", ""] {
                ui.strong(header);
            }
            ui.end_row();

            for row in &rows {
                let mut selected = row.selected;
                if ui.checkbox(&mut selected, "").changed() {
                    actions.push(ReportAction::Toggle(row.id));
                }
                ui.label(&row.name);
                ui.label(row.kind.label());
                ui.label(&row.period);
                ui.colored_label(risk_color(row.risk_level), row.risk_level.label());
                ui.label(row.generated_on.format("%Y-%m-%d").to_string());
                ui.label(row.status.label());
                ui.label(&row.size_label);
                ui.horizontal(|ui| {
                    match reports.download_progress(row.id) {
                        Some(percent) => {
                            ui.add(
                                egui::ProgressBar::new(f32::from(percent) / 100.0)
                                    .desired_width(90.0)
                                    .show_percentage(),
                            );
                        }
                        None => {
                            let ready = row.status == ReportStatus::Completed;
                            if ui.add_enabled(ready, egui::Button::new("Download")).clicked() {
                                actions.push(ReportAction::Download(row.id));
                            }
                        }
                    }
                    let idle = row.status != ReportStatus::InProgress;
                    if ui.add_enabled(idle, egui::Button::new("Regenerate")).clicked() {
                        actions.push(ReportAction::Regenerate(row.id));
                    }
                    if ui.button("Delete").clicked() {
                        actions.push(ReportAction::Delete(row.id));
                    }
                });
                ui.end_row();
            }
        });
        if rows.is_empty() {
            ui.weak("No reports match the current filters.");
        }

        for action in actions {
            match action {
                ReportAction::Toggle(id) => reports.toggle_selected(id),
                ReportAction::Download(id) => {
                    reports.download(id);
                }
                ReportAction::Regenerate(id) => {
                    reports.regenerate(id);
                }
                ReportAction::Delete(id) => {
                    reports.delete(id);
                }
            }
        }

        ui.horizontal(|ui| {
            let page = reports.page();
            let pages = reports.page_count();
            if ui.add_enabled(page > 1, egui::Button::new("< Prev")).clicked() {
                reports.set_page(page - 1);
            }
            ui.label(format!("Page {page} of {pages}"));
            if ui.add_enabled(page < pages, egui::Button::new("Next >")).clicked() {
                reports.set_page(page + 1);
            }
            ui.weak(format!("{} matching reports", reports.filtered().len()));
        });
    }
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.poll_controllers();

        // Surfaces are re-marked by whatever the screens below lay out this frame.
        self.board.clear_surfaces();

        self.show_top_bar(ctx);
        self.show_bottom_bar(ctx);
        egui::CentralPanel::default().show(ctx, |ui| match self.screen {
            Screen::Upload => self.show_upload_screen(ui),
            Screen::Dashboard => self.show_dashboard_screen(ui),
            Screen::Analysis => self.show_analysis_screen(ui),
            Screen::Reports => self.show_reports_screen(ui),
        });

        ctx.request_repaint_after(self.next_repaint());
    }
}

fn stat_card(ui: &mut egui::Ui, title: &str, value: &str, caption: &str) {
    egui::Frame::group(ui.style()).show(ui, |ui| {
        ui.weak(title);
        ui.heading(value);
        ui.label(caption);
    });
}

fn option_combo<T: Copy + PartialEq>(
    ui: &mut egui::Ui,
    id: &str,
    any_label: &str,
    value: &mut Option<T>,
    options: &[T],
    label: impl Fn(T) -> &'static str,
) {
    let selected = value.map(&label).unwrap_or(any_label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(selected)
        .show_ui(ui, |ui| {
            ui.selectable_value(value, None, any_label);
            for option in options {
                ui.selectable_value(value, Some(*option), label(*option));
            }
        });
}

fn risk_color(level: RiskLevel) -> egui::Color32 {
    match level {
        RiskLevel::High => egui::Color32::from_rgb(220, 38, 38),
        RiskLevel::Medium => egui::Color32::from_rgb(217, 119, 6),
        RiskLevel::Low => egui::Color32::from_rgb(22, 163, 74),
        RiskLevel::Pending => egui::Color32::GRAY,
    }
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}
