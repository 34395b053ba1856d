//! Report library: filter/search/pagination over an in-memory list plus
//! simulated generation and download progress.

use std::{sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use shared::domain::{ReportId, ReportKind, ReportStatus, RiskLevel};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    downloads::FileSaver,
    fixtures::{SeedReport, SEED_REPORTS},
    timeline::Ticker,
    uploads::Notice,
};

pub const PAGE_SIZE: usize = 5;
pub const GENERATION_DELAY: Duration = Duration::from_secs(3);
pub const DOWNLOAD_TICK: Duration = Duration::from_millis(200);
pub const DOWNLOAD_STEP_PERCENT: u8 = 10;

const GENERATED_FILE_REF: &str = "reports/generated-report.pdf";
const GENERATED_SIZE_LABEL: &str = "1.2 MB";
const PENDING_SIZE_LABEL: &str = "--";

#[derive(Debug, Clone, PartialEq)]
pub struct ReportRecord {
    pub id: ReportId,
    pub name: String,
    pub kind: ReportKind,
    pub period: String,
    pub risk_level: RiskLevel,
    pub generated_on: NaiveDate,
    pub status: ReportStatus,
    pub selected: bool,
    pub file_ref: String,
    pub size_label: String,
}

impl From<&SeedReport> for ReportRecord {
    fn from(seed: &SeedReport) -> Self {
        Self {
            id: seed.report_id(),
            name: seed.name.to_string(),
            kind: seed.kind,
            period: seed.period.to_string(),
            risk_level: seed.risk_level,
            generated_on: seed.date(),
            status: seed.status,
            selected: false,
            file_ref: seed.file_ref.to_string(),
            size_label: seed.size_label.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    pub kind: Option<ReportKind>,
    pub status: Option<ReportStatus>,
    pub search: String,
}

impl ReportFilter {
    pub fn matches(&self, report: &ReportRecord) -> bool {
        if self.kind.is_some_and(|kind| kind != report.kind) {
            return false;
        }
        if self.status.is_some_and(|status| status != report.status) {
            return false;
        }

        let needle = self.search.trim().to_lowercase();
        needle.is_empty()
            || report.name.to_lowercase().contains(&needle)
            || report.kind.label().to_lowercase().contains(&needle)
    }
}

/// Reports matching `filter`, in list order. Never touches the source list.
pub fn filter_reports<'a>(reports: &'a [ReportRecord], filter: &ReportFilter) -> Vec<&'a ReportRecord> {
    reports.iter().filter(|report| filter.matches(report)).collect()
}

pub fn page_count(matching: usize) -> usize {
    matching.div_ceil(PAGE_SIZE).max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    Single(ReportId),
    Bulk,
}

#[derive(Debug, Clone)]
struct ExportJob {
    target: ExportTarget,
    files: Vec<String>,
    percent: u8,
    ticker: Ticker,
}

#[derive(Debug, Clone, Copy)]
struct PendingCompletion {
    due_at: Duration,
    id: ReportId,
}

pub struct ReportsController {
    clock: Arc<dyn Clock>,
    reports: Vec<ReportRecord>,
    filter: ReportFilter,
    page: usize,
    next_id: i64,
    completions: Vec<PendingCompletion>,
    exports: Vec<ExportJob>,
    notices: Vec<Notice>,
}

impl ReportsController {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_reports(clock, SEED_REPORTS.iter().map(ReportRecord::from).collect())
    }

    pub fn with_reports(clock: Arc<dyn Clock>, reports: Vec<ReportRecord>) -> Self {
        let next_id = reports.iter().map(|report| report.id.0).max().unwrap_or(0) + 1;
        let in_progress: Vec<ReportId> = reports
            .iter()
            .filter(|report| report.status == ReportStatus::InProgress)
            .map(|report| report.id)
            .collect();
        let mut controller = Self {
            clock,
            reports,
            filter: ReportFilter::default(),
            page: 1,
            next_id,
            completions: Vec::new(),
            exports: Vec::new(),
            notices: Vec::new(),
        };
        // Reports listed as in progress finish like freshly generated ones.
        for id in in_progress {
            controller.schedule_completion(id);
        }
        controller
    }

    pub fn reports(&self) -> &[ReportRecord] {
        &self.reports
    }

    pub fn report(&self, id: ReportId) -> Option<&ReportRecord> {
        self.reports.iter().find(|report| report.id == id)
    }

    pub fn filter(&self) -> &ReportFilter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: ReportFilter) {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        let filter = ReportFilter {
            search: search.into(),
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    pub fn set_kind(&mut self, kind: Option<ReportKind>) {
        let filter = ReportFilter {
            kind,
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    pub fn set_status(&mut self, status: Option<ReportStatus>) {
        let filter = ReportFilter {
            status,
            ..self.filter.clone()
        };
        self.set_filter(filter);
    }

    pub fn filtered(&self) -> Vec<&ReportRecord> {
        filter_reports(&self.reports, &self.filter)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        page_count(self.filtered().len())
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    pub fn visible(&self) -> Vec<&ReportRecord> {
        self.filtered()
            .into_iter()
            .skip((self.page - 1) * PAGE_SIZE)
            .take(PAGE_SIZE)
            .collect()
    }

    pub fn toggle_selected(&mut self, id: ReportId) {
        if let Some(report) = self.reports.iter_mut().find(|report| report.id == id) {
            report.selected = !report.selected;
        }
    }

    pub fn select_all_visible(&mut self, selected: bool) {
        let visible: Vec<ReportId> = self.visible().iter().map(|report| report.id).collect();
        for report in &mut self.reports {
            if visible.contains(&report.id) {
                report.selected = selected;
            }
        }
    }

    pub fn all_visible_selected(&self) -> bool {
        let visible = self.visible();
        !visible.is_empty() && visible.iter().all(|report| report.selected)
    }

    pub fn selected_ids(&self) -> Vec<ReportId> {
        self.reports
            .iter()
            .filter(|report| report.selected)
            .map(|report| report.id)
            .collect()
    }

    /// Removes the report with `id` regardless of filters, then re-clamps the page.
    pub fn delete(&mut self, id: ReportId) -> bool {
        let Some(index) = self.reports.iter().position(|report| report.id == id) else {
            return false;
        };
        let removed = self.reports.remove(index);
        self.completions.retain(|pending| pending.id != id);
        self.set_page(self.page);
        self.notices.push(Notice::info(format!("Deleted {}", removed.name)));
        info!(report_id = id.0, "report deleted");
        true
    }

    /// Inserts a new in-progress report at the front; it completes after [`GENERATION_DELAY`].
    pub fn generate(&mut self, kind: ReportKind, period: impl Into<String>) -> ReportId {
        let id = ReportId(self.next_id);
        self.next_id += 1;
        let period = period.into();

        self.reports.insert(
            0,
            ReportRecord {
                id,
                name: format!("{} Report - {period}", kind.label()),
                kind,
                period,
                risk_level: RiskLevel::Pending,
                generated_on: Local::now().date_naive(),
                status: ReportStatus::InProgress,
                selected: false,
                file_ref: GENERATED_FILE_REF.to_string(),
                size_label: PENDING_SIZE_LABEL.to_string(),
            },
        );
        self.schedule_completion(id);
        self.notices.push(Notice::info("Report generation started"));
        info!(report_id = id.0, kind = kind.label(), "report generation started");
        id
    }

    /// Resets an existing report to in-progress/pending and completes it again.
    pub fn regenerate(&mut self, id: ReportId) -> bool {
        let Some(report) = self.reports.iter_mut().find(|report| report.id == id) else {
            return false;
        };
        if report.status == ReportStatus::InProgress {
            debug!(report_id = id.0, "regenerate ignored; already in progress");
            return false;
        }

        report.status = ReportStatus::InProgress;
        report.risk_level = RiskLevel::Pending;
        let name = report.name.clone();
        self.schedule_completion(id);
        self.notices.push(Notice::info(format!("Regenerating {name}")));
        true
    }

    /// Starts a simulated download of one completed report.
    pub fn download(&mut self, id: ReportId) -> bool {
        let Some(report) = self.report(id) else {
            return false;
        };
        if report.status != ReportStatus::Completed {
            let message = format!("{} is not ready for download", report.name);
            self.notices.push(Notice::alert(message));
            return false;
        }
        let target = ExportTarget::Single(id);
        if self.exports.iter().any(|job| job.target == target) {
            return false;
        }

        let files = vec![report.file_ref.clone()];
        self.start_export(target, files);
        true
    }

    /// Exports the selected completed reports, or every completed report when none is selected.
    pub fn export_all(&mut self) -> bool {
        if self.exports.iter().any(|job| job.target == ExportTarget::Bulk) {
            return false;
        }

        let completed = || {
            self.reports
                .iter()
                .filter(|report| report.status == ReportStatus::Completed)
        };
        let mut files: Vec<String> = completed()
            .filter(|report| report.selected)
            .map(|report| report.file_ref.clone())
            .collect();
        if files.is_empty() {
            files = completed().map(|report| report.file_ref.clone()).collect();
        }
        if files.is_empty() {
            self.notices.push(Notice::alert("No completed reports to export"));
            return false;
        }

        self.start_export(ExportTarget::Bulk, files);
        true
    }

    pub fn download_progress(&self, id: ReportId) -> Option<u8> {
        self.progress_of(&ExportTarget::Single(id))
    }

    pub fn export_progress(&self) -> Option<u8> {
        self.progress_of(&ExportTarget::Bulk)
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn is_active(&self) -> bool {
        !self.completions.is_empty() || !self.exports.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        let completion = self.completions.iter().map(|pending| pending.due_at);
        let exports = self.exports.iter().filter_map(|job| job.ticker.next_deadline());
        completion.chain(exports).min()
    }

    /// Applies due completions and download ticks. Finished downloads are handed to `saver`.
    pub fn poll(&mut self, saver: &dyn FileSaver) -> bool {
        let now = self.clock.now();
        let mut changed = self.complete_due(now);

        let mut finished = Vec::new();
        for job in &mut self.exports {
            let ticks = job.ticker.ticks_until(now);
            if ticks == 0 {
                continue;
            }
            let gained = u32::from(DOWNLOAD_STEP_PERCENT) * ticks;
            job.percent = (u32::from(job.percent) + gained).min(100) as u8;
            changed = true;
            if job.percent >= 100 {
                job.ticker.stop();
                finished.push(job.target.clone());
            }
        }

        for target in finished {
            let Some(index) = self.exports.iter().position(|job| job.target == target) else {
                continue;
            };
            let job = self.exports.remove(index);
            self.save_files(&job, saver);
        }

        changed
    }

    /// Drops pending completions and downloads. Report data stays as it is.
    pub fn teardown(&mut self) {
        if self.is_active() {
            debug!(
                completions = self.completions.len(),
                exports = self.exports.len(),
                "reports torn down with timers pending"
            );
        }
        self.completions.clear();
        self.exports.clear();
    }

    fn schedule_completion(&mut self, id: ReportId) {
        self.completions.retain(|pending| pending.id != id);
        self.completions.push(PendingCompletion {
            due_at: self.clock.now() + GENERATION_DELAY,
            id,
        });
    }

    fn complete_due(&mut self, now: Duration) -> bool {
        let (due, waiting): (Vec<_>, Vec<_>) = self
            .completions
            .drain(..)
            .partition(|pending| pending.due_at <= now);
        self.completions = waiting;

        let mut changed = false;
        for pending in due {
            let Some(report) = self.reports.iter_mut().find(|report| report.id == pending.id) else {
                continue;
            };
            if report.status != ReportStatus::InProgress {
                continue;
            }
            report.status = ReportStatus::Completed;
            report.risk_level = RiskLevel::Low;
            if report.size_label == PENDING_SIZE_LABEL {
                report.size_label = GENERATED_SIZE_LABEL.to_string();
            }
            info!(report_id = pending.id.0, "report generation finished");
            self.notices.push(Notice::info(format!("{} is ready", report.name)));
            changed = true;
        }
        changed
    }

    fn start_export(&mut self, target: ExportTarget, files: Vec<String>) {
        info!(target = ?target, files = files.len(), "report download started");
        self.exports.push(ExportJob {
            target,
            files,
            percent: 0,
            ticker: Ticker::start(DOWNLOAD_TICK, self.clock.now()),
        });
    }

    fn progress_of(&self, target: &ExportTarget) -> Option<u8> {
        self.exports
            .iter()
            .find(|job| &job.target == target)
            .map(|job| job.percent)
    }

    fn save_files(&mut self, job: &ExportJob, saver: &dyn FileSaver) {
        let mut saved = 0;
        for file_ref in &job.files {
            match saver.save(file_ref) {
                Ok(_) => saved += 1,
                Err(err) => {
                    warn!(asset = %file_ref, error = %format!("{err:#}"), "report save failed");
                    self.notices
                        .push(Notice::alert(format!("Could not save {file_ref}: {err}")));
                }
            }
        }
        if saved > 0 {
            let message = match job.target {
                ExportTarget::Single(_) => "Report downloaded".to_string(),
                ExportTarget::Bulk => format!("Exported {saved} reports"),
            };
            self.notices.push(Notice::info(message));
        }
    }
}

#[cfg(test)]
#[path = "tests/reports_tests.rs"]
mod tests;
