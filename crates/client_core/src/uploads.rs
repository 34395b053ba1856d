//! Upload screen state: validation, per-file lifecycle, optimistic bulk analysis.
//!
//! The manager is a reducer. Intents (`accept_files`, `begin_analyze_all`,
//! `delete`, `retry`, ...) mutate local state and hand back [`UploadCommand`]s;
//! [`execute`] runs a command against a [`FileBackend`] and reports
//! [`UploadEvent`]s; [`UploadManager::apply`] folds those events back in.

use std::{
    collections::HashMap,
    ffi::OsStr,
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDateTime;
use shared::{
    domain::{FileId, FileStatus},
    protocol::{
        AnalyzeAllResponse, AnalyzeFileResponse, ExtractedInvoice, StoredFileRecord,
        UploadFileResponse,
    },
};
use tracing::{debug, info, warn};

use crate::{
    backend::{FileBackend, FileUpload, ProgressFn},
    error::ConsoleError,
};

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["pdf", "doc", "docx", "xls", "xlsx", "csv"];
const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    pub fn validate(&self, filename: &str, size: u64) -> Result<(), ConsoleError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let allowed = extension
            .as_deref()
            .is_some_and(|ext| self.allowed_extensions.iter().any(|allowed| allowed == ext));
        if !allowed {
            return Err(ConsoleError::UnsupportedType {
                filename: filename.to_string(),
                allowed: self.allowed_extensions.join(", "),
            });
        }

        if size > self.max_bytes {
            return Err(ConsoleError::TooLarge {
                filename: filename.to_string(),
                size,
                limit_mb: self.max_bytes / (1024 * 1024),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalFileKey(pub u64);

#[derive(Debug, Clone)]
enum CandidateSource {
    Memory(Vec<u8>),
    Disk(PathBuf),
}

/// A file picked or dropped by the user, not yet validated.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub filename: String,
    pub mime_type: Option<String>,
    size: u64,
    source: CandidateSource,
}

impl CandidateFile {
    pub fn new(filename: impl Into<String>, mime_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime_type,
            size: bytes.len() as u64,
            source: CandidateSource::Memory(bytes),
        }
    }

    /// Describes a file on disk from its metadata. Contents are read only once it passes validation.
    pub fn from_path(
        path: impl Into<PathBuf>,
        filename: Option<String>,
        mime_type: Option<String>,
    ) -> io::Result<Self> {
        let path = path.into();
        let size = fs::metadata(&path)?.len();
        let filename = filename
            .filter(|name| !name.is_empty())
            .or_else(|| path.file_name().map(|name| name.to_string_lossy().into_owned()))
            .unwrap_or_default();
        Ok(Self {
            filename,
            mime_type,
            size,
            source: CandidateSource::Disk(path),
        })
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    fn into_bytes(self) -> io::Result<Vec<u8>> {
        match self.source {
            CandidateSource::Memory(bytes) => Ok(bytes),
            CandidateSource::Disk(path) => fs::read(path),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRecord {
    pub key: LocalFileKey,
    pub id: Option<FileId>,
    pub filename: String,
    pub size: u64,
    pub mime_type: String,
    pub status: FileStatus,
    pub progress: u8,
    pub uploaded_at: Option<NaiveDateTime>,
    pub extracted_data: Option<serde_json::Value>,
    pub error: Option<String>,
    payload: Option<Arc<Vec<u8>>>,
}

impl UploadRecord {
    fn from_stored(key: LocalFileKey, stored: StoredFileRecord, payload: Option<Arc<Vec<u8>>>) -> Self {
        let progress = if stored.status == FileStatus::Completed { 100 } else { 0 };
        Self {
            key,
            id: Some(stored.id),
            filename: stored.filename,
            size: stored.file_size,
            mime_type: stored
                .file_type
                .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string()),
            status: stored.status,
            progress,
            uploaded_at: stored.upload_time,
            extracted_data: stored.extracted_data,
            error: stored.error_message,
            payload,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.status == FileStatus::Failed && self.payload.is_some()
    }

    pub fn holds_payload(&self) -> bool {
        self.payload.is_some()
    }

    pub fn invoice(&self) -> Option<ExtractedInvoice> {
        self.extracted_data
            .as_ref()
            .and_then(ExtractedInvoice::from_value)
    }

    fn upload_job(&self) -> Option<UploadJob> {
        let bytes = self.payload.clone()?;
        Some(UploadJob {
            key: self.key,
            upload: FileUpload {
                filename: self.filename.clone(),
                mime_type: self.mime_type.clone(),
                bytes,
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct UploadJob {
    pub key: LocalFileKey,
    pub upload: FileUpload,
}

#[derive(Debug, Clone)]
pub enum UploadCommand {
    List,
    Upload(UploadJob),
    AnalyzeAll { optimistic: Vec<LocalFileKey> },
    Analyze { key: LocalFileKey, id: FileId },
    Delete { key: LocalFileKey, id: FileId },
}

impl UploadCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::List => "list_files",
            Self::Upload(_) => "upload_file",
            Self::AnalyzeAll { .. } => "analyze_all",
            Self::Analyze { .. } => "analyze_file",
            Self::Delete { .. } => "delete_file",
        }
    }
}

#[derive(Debug, Clone)]
pub enum UploadEvent {
    Listed(Vec<StoredFileRecord>),
    ListFailed(ConsoleError),
    Progress {
        key: LocalFileKey,
        percent: u8,
    },
    Uploaded {
        key: LocalFileKey,
        response: UploadFileResponse,
    },
    UploadFailed {
        key: LocalFileKey,
        error: ConsoleError,
    },
    AnalyzeAllFinished(AnalyzeAllResponse),
    AnalyzeAllFailed {
        optimistic: Vec<LocalFileKey>,
        error: ConsoleError,
    },
    Analyzed {
        key: LocalFileKey,
        response: AnalyzeFileResponse,
    },
    AnalyzeFailed {
        key: LocalFileKey,
        error: ConsoleError,
    },
    Deleted {
        key: LocalFileKey,
    },
    DeleteFailed {
        key: LocalFileKey,
        error: ConsoleError,
    },
}

impl UploadEvent {
    /// The failure carried by this event, if it reports one.
    pub fn error(&self) -> Option<&ConsoleError> {
        match self {
            Self::ListFailed(error)
            | Self::UploadFailed { error, .. }
            | Self::AnalyzeAllFailed { error, .. }
            | Self::AnalyzeFailed { error, .. }
            | Self::DeleteFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Alert,
}

/// User-facing message queued by a controller for the view to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn alert(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Alert,
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct AcceptOutcome {
    pub commands: Vec<UploadCommand>,
    pub rejected: Vec<ConsoleError>,
}

#[derive(Debug, Default)]
pub struct UploadManager {
    policy: UploadPolicy,
    records: Vec<UploadRecord>,
    next_key: u64,
    notices: Vec<Notice>,
    loading: bool,
}

impl UploadManager {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn records(&self) -> &[UploadRecord] {
        &self.records
    }

    pub fn record(&self, key: LocalFileKey) -> Option<&UploadRecord> {
        self.records.iter().find(|record| record.key == key)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn count_with(&self, status: FileStatus) -> usize {
        self.records
            .iter()
            .filter(|record| record.status == status)
            .count()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn refresh(&mut self) -> UploadCommand {
        self.loading = true;
        UploadCommand::List
    }

    /// Validates each file independently; accepted files are appended as `uploading`.
    pub fn accept_files(&mut self, files: Vec<CandidateFile>) -> AcceptOutcome {
        let mut outcome = AcceptOutcome::default();

        for file in files {
            if let Err(err) = self.policy.validate(&file.filename, file.size()) {
                warn!(filename = %file.filename, size = file.size(), %err, "file rejected");
                self.notices.push(Notice::alert(err.to_string()));
                outcome.rejected.push(err);
                continue;
            }

            let filename = file.filename.clone();
            let mime_type = file
                .mime_type
                .clone()
                .unwrap_or_else(|| FALLBACK_MIME_TYPE.to_string());
            let bytes = match file.into_bytes() {
                Ok(bytes) => bytes,
                Err(err) => {
                    let err = ConsoleError::Unreadable {
                        filename,
                        message: err.to_string(),
                    };
                    warn!(%err, "file rejected");
                    self.notices.push(Notice::alert(err.to_string()));
                    outcome.rejected.push(err);
                    continue;
                }
            };

            let key = self.allocate_key();
            let size = bytes.len() as u64;
            let record = UploadRecord {
                key,
                id: None,
                filename,
                size,
                mime_type,
                status: FileStatus::Uploading,
                progress: 0,
                uploaded_at: None,
                extracted_data: None,
                error: None,
                payload: Some(Arc::new(bytes)),
            };
            info!(filename = %record.filename, size, "file accepted for upload");
            if let Some(job) = record.upload_job() {
                outcome.commands.push(UploadCommand::Upload(job));
            }
            self.records.push(record);
        }

        outcome
    }

    /// Marks every pending server-known file as `analyzing` before the call resolves.
    pub fn begin_analyze_all(&mut self) -> Option<UploadCommand> {
        let mut optimistic = Vec::new();
        for record in &mut self.records {
            if record.status == FileStatus::Pending && record.id.is_some() {
                record.status = FileStatus::Analyzing;
                record.progress = 0;
                optimistic.push(record.key);
            }
        }

        if optimistic.is_empty() {
            self.notices.push(Notice::info("No pending files to analyze"));
            return None;
        }

        info!(count = optimistic.len(), "analyzing all pending files");
        Some(UploadCommand::AnalyzeAll { optimistic })
    }

    pub fn analyze(&mut self, key: LocalFileKey) -> Result<UploadCommand, ConsoleError> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.key == key)
            .ok_or(ConsoleError::UnknownFile)?;

        let id = match (record.status, record.id) {
            (FileStatus::Pending, Some(id)) => id,
            (status, _) => {
                return Err(ConsoleError::InvalidState {
                    filename: record.filename.clone(),
                    action: "analyzed",
                    status: status.label(),
                })
            }
        };

        record.status = FileStatus::Analyzing;
        record.progress = 0;
        Ok(UploadCommand::Analyze { key, id })
    }

    /// Server-known files are deleted remotely and dropped on confirmation; others are dropped now.
    pub fn delete(&mut self, key: LocalFileKey) -> Option<UploadCommand> {
        let index = self.records.iter().position(|record| record.key == key)?;
        match self.records[index].id {
            Some(id) => Some(UploadCommand::Delete { key, id }),
            None => {
                let removed = self.records.remove(index);
                debug!(filename = %removed.filename, "removed local-only file");
                None
            }
        }
    }

    /// Re-uploads a failed file. Refused when the original bytes are no longer held.
    pub fn retry(&mut self, key: LocalFileKey) -> Result<UploadCommand, ConsoleError> {
        let result = self.prepare_retry(key);
        if let Err(err) = &result {
            self.notices.push(Notice::alert(err.to_string()));
        }
        result
    }

    fn prepare_retry(&mut self, key: LocalFileKey) -> Result<UploadCommand, ConsoleError> {
        let record = self
            .records
            .iter_mut()
            .find(|record| record.key == key)
            .ok_or(ConsoleError::UnknownFile)?;

        if record.status != FileStatus::Failed {
            return Err(ConsoleError::InvalidState {
                filename: record.filename.clone(),
                action: "retried",
                status: record.status.label(),
            });
        }

        let job = record.upload_job().ok_or_else(|| ConsoleError::MissingPayload {
            filename: record.filename.clone(),
        })?;

        record.status = FileStatus::Uploading;
        record.progress = 0;
        record.error = None;
        Ok(UploadCommand::Upload(job))
    }

    /// Folds a backend outcome into state; returns follow-up commands (list reconciliation).
    pub fn apply(&mut self, event: UploadEvent) -> Vec<UploadCommand> {
        match event {
            UploadEvent::Listed(files) => {
                self.loading = false;
                self.reconcile(files);
            }
            UploadEvent::ListFailed(error) => {
                self.loading = false;
                warn!(%error, "file listing failed");
                self.notices.push(Notice::alert(error.to_string()));
            }
            UploadEvent::Progress { key, percent } => {
                if let Some(record) = self.record_mut(key) {
                    if record.status == FileStatus::Uploading {
                        record.progress = record.progress.max(percent.min(100));
                    }
                }
            }
            UploadEvent::Uploaded { key, response } => match self.record_mut(key) {
                Some(record) => {
                    record.id = Some(response.id);
                    record.status = response.status;
                    record.progress = 100;
                    record.uploaded_at = Some(response.upload_time);
                    record.error = None;
                    info!(file_id = response.id.0, filename = %record.filename, "upload confirmed");
                }
                None => debug!(file_id = response.id.0, "upload confirmed for untracked file"),
            },
            UploadEvent::UploadFailed { key, error } => {
                let alert = self.record_mut(key).map(|record| {
                    record.status = FileStatus::Failed;
                    record.progress = 0;
                    record.error = Some(error.to_string());
                    format!("{}: {error}", record.filename)
                });
                if let Some(alert) = alert {
                    warn!(%error, "upload failed");
                    self.notices.push(Notice::alert(alert));
                }
            }
            UploadEvent::AnalyzeAllFinished(response) => {
                info!(analyzed = response.analyzed_count, "bulk analysis finished");
                self.notices.push(Notice::info(response.message));
                return vec![self.refresh()];
            }
            UploadEvent::AnalyzeAllFailed { optimistic, error } => {
                self.roll_back_to_pending(&optimistic);
                warn!(%error, count = optimistic.len(), "bulk analysis failed; rolled back");
                self.notices.push(Notice::alert(error.to_string()));
            }
            UploadEvent::Analyzed { key, response } => {
                if let Some(record) = self.record_mut(key) {
                    record.status = response.status;
                    record.progress = if response.status == FileStatus::Completed {
                        100
                    } else {
                        0
                    };
                    if let Some(extracted) = response.extracted {
                        record.error = extracted
                            .get("error")
                            .and_then(serde_json::Value::as_str)
                            .map(str::to_string);
                        record.extracted_data = extracted.get("data").cloned();
                    }
                }
            }
            UploadEvent::AnalyzeFailed { key, error } => {
                self.roll_back_to_pending(&[key]);
                self.notices.push(Notice::alert(error.to_string()));
            }
            UploadEvent::Deleted { key } => {
                self.records.retain(|record| record.key != key);
            }
            UploadEvent::DeleteFailed { key, error } => {
                let filename = self
                    .record(key)
                    .map(|record| record.filename.clone())
                    .unwrap_or_default();
                self.notices.push(Notice::alert(format!("{filename}: {error}")));
            }
        }

        Vec::new()
    }

    fn roll_back_to_pending(&mut self, keys: &[LocalFileKey]) {
        for record in &mut self.records {
            if keys.contains(&record.key) && record.status == FileStatus::Analyzing {
                record.status = FileStatus::Pending;
                record.progress = 0;
            }
        }
    }

    /// Replaces server-known records with the listing, keeping local keys and
    /// retained bytes for files the server still knows, and keeping local-only
    /// records after the server ones.
    fn reconcile(&mut self, files: Vec<StoredFileRecord>) {
        let mut known: HashMap<FileId, UploadRecord> = HashMap::new();
        let mut local_only = Vec::new();
        for record in self.records.drain(..) {
            match record.id {
                Some(id) => {
                    known.insert(id, record);
                }
                None => local_only.push(record),
            }
        }

        let mut merged = Vec::with_capacity(files.len() + local_only.len());
        for stored in files {
            let (key, payload) = match known.remove(&stored.id) {
                Some(previous) => (previous.key, previous.payload),
                None => (self.allocate_key(), None),
            };
            merged.push(UploadRecord::from_stored(key, stored, payload));
        }
        merged.extend(local_only);
        self.records = merged;
    }

    fn record_mut(&mut self, key: LocalFileKey) -> Option<&mut UploadRecord> {
        self.records.iter_mut().find(|record| record.key == key)
    }

    fn allocate_key(&mut self) -> LocalFileKey {
        self.next_key += 1;
        LocalFileKey(self.next_key)
    }
}

pub type EventSink = Arc<dyn Fn(UploadEvent) + Send + Sync>;

/// Runs one command against the file service and reports the outcome through `sink`.
pub async fn execute(backend: &dyn FileBackend, command: UploadCommand, sink: EventSink) {
    let operation = command.name();
    debug!(operation, "executing upload command");

    let event = match command {
        UploadCommand::List => match backend.list_files().await {
            Ok(files) => UploadEvent::Listed(files),
            Err(err) => UploadEvent::ListFailed(ConsoleError::transport("Loading files", &err)),
        },
        UploadCommand::Upload(job) => {
            let key = job.key;
            let progress_sink = sink.clone();
            let progress: ProgressFn = Arc::new(move |percent| {
                progress_sink(UploadEvent::Progress { key, percent });
            });
            match backend.upload_file(job.upload, progress).await {
                Ok(response) => UploadEvent::Uploaded { key, response },
                Err(err) => UploadEvent::UploadFailed {
                    key,
                    error: ConsoleError::transport("Upload", &err),
                },
            }
        }
        UploadCommand::AnalyzeAll { optimistic } => match backend.analyze_all().await {
            Ok(response) => UploadEvent::AnalyzeAllFinished(response),
            Err(err) => UploadEvent::AnalyzeAllFailed {
                optimistic,
                error: ConsoleError::transport("Analysis", &err),
            },
        },
        UploadCommand::Analyze { key, id } => match backend.analyze_file(id).await {
            Ok(response) => UploadEvent::Analyzed { key, response },
            Err(err) => UploadEvent::AnalyzeFailed {
                key,
                error: ConsoleError::transport("Analysis", &err),
            },
        },
        UploadCommand::Delete { key, id } => match backend.delete_file(id).await {
            Ok(_) => UploadEvent::Deleted { key },
            Err(err) => UploadEvent::DeleteFailed {
                key,
                error: ConsoleError::transport("Delete", &err),
            },
        },
    };

    sink(event);
}

#[cfg(test)]
#[path = "tests/uploads_tests.rs"]
mod tests;
