use super::*;
use crate::backend::BackendError;
use async_trait::async_trait;
use shared::{
    error::{ApiError, ErrorCode},
    protocol::DeleteFileResponse,
};
use std::{collections::VecDeque, sync::Mutex};

const MB: usize = 1024 * 1024;

#[derive(Default)]
struct ScriptedBackend {
    files: Mutex<Vec<StoredFileRecord>>,
    next_id: Mutex<i64>,
    fail_uploads: bool,
    fail_listing: bool,
    fail_analysis: bool,
}

impl ScriptedBackend {
    fn with_files(files: Vec<StoredFileRecord>) -> Self {
        Self {
            next_id: Mutex::new(files.iter().map(|file| file.id.0).max().unwrap_or(0)),
            files: Mutex::new(files),
            ..Self::default()
        }
    }

    fn failure(message: &str) -> BackendError {
        BackendError::Api(ApiError::new(ErrorCode::Internal, message))
    }
}

fn stored(id: i64, filename: &str, status: FileStatus) -> StoredFileRecord {
    StoredFileRecord {
        id: FileId(id),
        filename: filename.to_string(),
        file_size: 1024,
        file_type: Some("application/pdf".to_string()),
        status,
        upload_time: Some(timestamp()),
        extracted_data: None,
        error_message: None,
    }
}

fn timestamp() -> NaiveDateTime {
    "2024-06-01T09:30:00".parse().expect("timestamp")
}

#[async_trait]
impl FileBackend for ScriptedBackend {
    async fn list_files(&self) -> Result<Vec<StoredFileRecord>, BackendError> {
        if self.fail_listing {
            return Err(Self::failure("database offline"));
        }
        Ok(self.files.lock().expect("files").clone())
    }

    async fn get_file(&self, id: FileId) -> Result<StoredFileRecord, BackendError> {
        self.files
            .lock()
            .expect("files")
            .iter()
            .find(|file| file.id == id)
            .cloned()
            .ok_or_else(|| BackendError::Api(ApiError::new(ErrorCode::NotFound, "File not found")))
    }

    async fn upload_file(
        &self,
        upload: FileUpload,
        progress: ProgressFn,
    ) -> Result<UploadFileResponse, BackendError> {
        progress(50);
        if self.fail_uploads {
            return Err(Self::failure("disk full"));
        }
        let id = {
            let mut next_id = self.next_id.lock().expect("next id");
            *next_id += 1;
            FileId(*next_id)
        };
        let size = upload.bytes.len() as u64;
        self.files.lock().expect("files").insert(
            0,
            StoredFileRecord {
                id,
                filename: upload.filename.clone(),
                file_size: size,
                file_type: Some(upload.mime_type.clone()),
                status: FileStatus::Pending,
                upload_time: Some(timestamp()),
                extracted_data: None,
                error_message: None,
            },
        );
        progress(100);
        Ok(UploadFileResponse {
            id,
            filename: upload.filename,
            file_size: size,
            status: FileStatus::Pending,
            upload_time: timestamp(),
            message: "File uploaded successfully.".to_string(),
        })
    }

    async fn analyze_all(&self) -> Result<AnalyzeAllResponse, BackendError> {
        if self.fail_analysis {
            return Err(Self::failure("extraction service down"));
        }
        let mut files = self.files.lock().expect("files");
        let mut analyzed = 0;
        for file in files.iter_mut().filter(|file| file.status == FileStatus::Pending) {
            file.status = FileStatus::Completed;
            file.extracted_data = Some(serde_json::json!({"vendor": "Acme"}));
            analyzed += 1;
        }
        Ok(AnalyzeAllResponse {
            message: format!("Analysis completed for {analyzed} files"),
            analyzed_count: analyzed,
            total_processed: Some(analyzed),
            results: Vec::new(),
        })
    }

    async fn analyze_file(&self, id: FileId) -> Result<AnalyzeFileResponse, BackendError> {
        if self.fail_analysis {
            return Err(Self::failure("extraction service down"));
        }
        Ok(AnalyzeFileResponse {
            id,
            status: FileStatus::Completed,
            message: "Analysis completed successfully".to_string(),
            extracted: Some(serde_json::json!({
                "success": true,
                "data": {"invoice_number": "INV-9", "vendor": "Acme"}
            })),
        })
    }

    async fn delete_file(&self, id: FileId) -> Result<DeleteFileResponse, BackendError> {
        let mut files = self.files.lock().expect("files");
        let before = files.len();
        files.retain(|file| file.id != id);
        if files.len() == before {
            return Err(BackendError::Api(ApiError::new(
                ErrorCode::NotFound,
                "File not found",
            )));
        }
        Ok(DeleteFileResponse {
            message: "File deleted successfully".to_string(),
            id,
        })
    }
}

/// Executes commands (and any follow-ups) until the manager goes quiet.
async fn drive(
    manager: &mut UploadManager,
    backend: &dyn FileBackend,
    commands: Vec<UploadCommand>,
) -> Vec<UploadEvent> {
    let mut queue: VecDeque<UploadCommand> = commands.into();
    let mut seen = Vec::new();
    while let Some(command) = queue.pop_front() {
        let collected = Arc::new(Mutex::new(Vec::new()));
        let sink_target = collected.clone();
        let sink: EventSink = Arc::new(move |event| {
            sink_target.lock().expect("events").push(event);
        });
        execute(backend, command, sink).await;

        let events: Vec<UploadEvent> = collected.lock().expect("events").drain(..).collect();
        for event in events {
            seen.push(event.clone());
            queue.extend(manager.apply(event));
        }
    }
    seen
}

fn candidate(name: &str, size: usize) -> CandidateFile {
    CandidateFile::new(name, None, vec![0u8; size])
}

#[test]
fn rejects_oversized_and_unsupported_files_individually() {
    let mut manager = UploadManager::new(UploadPolicy::default());

    let outcome = manager.accept_files(vec![
        candidate("statement.pdf", 15 * MB),
        candidate("notes.exe", 1024),
        candidate("ledger.CSV", 2 * MB),
    ]);

    assert_eq!(outcome.rejected.len(), 2);
    assert!(matches!(
        outcome.rejected[0],
        ConsoleError::TooLarge { limit_mb: 10, .. }
    ));
    assert!(outcome.rejected[0].to_string().contains("10 MB size limit"));
    assert!(matches!(
        outcome.rejected[1],
        ConsoleError::UnsupportedType { .. }
    ));

    assert_eq!(manager.records().len(), 1);
    assert_eq!(manager.records()[0].filename, "ledger.CSV");
    assert_eq!(manager.records()[0].status, FileStatus::Uploading);
    assert_eq!(outcome.commands.len(), 1);

    let notices = manager.take_notices();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|notice| notice.level == NoticeLevel::Alert));
}

#[test]
fn file_exactly_at_limit_is_accepted() {
    let policy = UploadPolicy::default();
    assert!(policy.validate("a.xlsx", MAX_UPLOAD_BYTES).is_ok());
    assert!(policy.validate("a.xlsx", MAX_UPLOAD_BYTES + 1).is_err());
    assert!(policy.validate("no_extension", 10).is_err());
}

#[test]
fn disk_candidates_are_validated_before_their_contents_are_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let huge = dir.path().join("archive.pdf");
    std::fs::File::create(&huge)
        .and_then(|file| file.set_len((15 * MB) as u64))
        .expect("sparse file");
    let small = dir.path().join("ledger.csv");
    std::fs::write(&small, b"date,amount\n2024-06-01,120.50\n").expect("write");
    let vanished = dir.path().join("gone.xlsx");
    std::fs::write(&vanished, b"xlsx").expect("write");

    let huge_candidate = CandidateFile::from_path(&huge, None, None).expect("metadata");
    let small_candidate = CandidateFile::from_path(&small, None, Some("text/csv".into())).expect("metadata");
    let vanished_candidate = CandidateFile::from_path(&vanished, None, None).expect("metadata");
    assert_eq!(huge_candidate.size(), (15 * MB) as u64);
    // Removing the files shows validation never needed their bytes.
    std::fs::remove_file(&huge).expect("remove");
    std::fs::remove_file(&vanished).expect("remove");

    let mut manager = UploadManager::new(UploadPolicy::default());
    let outcome = manager.accept_files(vec![huge_candidate, small_candidate, vanished_candidate]);

    assert_eq!(outcome.rejected.len(), 2);
    assert!(matches!(outcome.rejected[0], ConsoleError::TooLarge { .. }));
    assert!(matches!(outcome.rejected[1], ConsoleError::Unreadable { .. }));
    assert_eq!(manager.records().len(), 1);
    let record = &manager.records()[0];
    assert_eq!(record.filename, "ledger.csv");
    assert_eq!(record.mime_type, "text/csv");
    assert_eq!(record.size, 30);
    assert!(record.holds_payload());
}

#[tokio::test]
async fn oversized_pdf_leaves_list_unchanged() {
    let backend = ScriptedBackend::default();
    let mut manager = UploadManager::new(UploadPolicy::default());

    let outcome = manager.accept_files(vec![candidate("big.pdf", 15 * MB)]);
    drive(&mut manager, &backend, outcome.commands).await;

    assert!(manager.records().is_empty());
    assert!(backend.files.lock().expect("files").is_empty());
}

#[tokio::test]
async fn accepted_csv_becomes_pending_once_server_responds() {
    let backend = ScriptedBackend::default();
    let mut manager = UploadManager::new(UploadPolicy::default());

    let outcome = manager.accept_files(vec![candidate("q2.csv", 2 * MB)]);
    let key = manager.records()[0].key;
    assert_eq!(manager.records()[0].status, FileStatus::Uploading);

    let events = drive(&mut manager, &backend, outcome.commands).await;
    assert!(events
        .iter()
        .any(|event| matches!(event, UploadEvent::Progress { percent: 50, .. })));

    let record = manager.record(key).expect("record");
    assert_eq!(manager.records().len(), 1);
    assert_eq!(record.status, FileStatus::Pending);
    assert_eq!(record.id, Some(FileId(1)));
    assert_eq!(record.progress, 100);
    assert_eq!(record.uploaded_at, Some(timestamp()));
}

#[tokio::test]
async fn failed_upload_can_be_retried_while_bytes_are_held() {
    let failing = ScriptedBackend {
        fail_uploads: true,
        ..ScriptedBackend::default()
    };
    let mut manager = UploadManager::new(UploadPolicy::default());

    let outcome = manager.accept_files(vec![candidate("q3.pdf", 1024)]);
    let key = manager.records()[0].key;
    drive(&mut manager, &failing, outcome.commands).await;

    let record = manager.record(key).expect("record");
    assert_eq!(record.status, FileStatus::Failed);
    assert_eq!(record.progress, 0);
    assert!(record.error.as_deref().unwrap_or_default().contains("disk full"));
    assert!(record.can_retry());

    let healthy = ScriptedBackend::default();
    let retry = manager.retry(key).expect("retry");
    assert_eq!(manager.record(key).expect("record").status, FileStatus::Uploading);
    drive(&mut manager, &healthy, vec![retry]).await;
    assert_eq!(manager.record(key).expect("record").status, FileStatus::Pending);
}

#[tokio::test]
async fn retry_is_refused_without_original_bytes() {
    let mut failed = stored(5, "old.pdf", FileStatus::Failed);
    failed.error_message = Some("PDF processing failed".to_string());
    let backend = ScriptedBackend::with_files(vec![failed]);
    let mut manager = UploadManager::new(UploadPolicy::default());

    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;
    let key = manager.records()[0].key;
    manager.take_notices();

    let err = manager.retry(key).expect_err("no payload");
    assert!(matches!(err, ConsoleError::MissingPayload { .. }));
    assert_eq!(manager.record(key).expect("record").status, FileStatus::Failed);

    let notices = manager.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Alert);
}

#[tokio::test]
async fn listing_failure_keeps_state_and_raises_alert() {
    let backend = ScriptedBackend::with_files(vec![stored(1, "a.pdf", FileStatus::Pending)]);
    let mut manager = UploadManager::new(UploadPolicy::default());
    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;
    assert_eq!(manager.records().len(), 1);

    let broken = ScriptedBackend {
        fail_listing: true,
        ..ScriptedBackend::default()
    };
    let refresh = manager.refresh();
    drive(&mut manager, &broken, vec![refresh]).await;

    assert!(!manager.is_loading());
    assert_eq!(manager.records().len(), 1);
    assert_eq!(manager.records()[0].filename, "a.pdf");
    let notices = manager.take_notices();
    assert!(notices
        .iter()
        .any(|notice| notice.level == NoticeLevel::Alert && notice.message.contains("database offline")));
}

#[tokio::test]
async fn bulk_analysis_failure_rolls_back_to_pending() {
    let backend = ScriptedBackend {
        fail_analysis: true,
        ..ScriptedBackend::with_files(vec![
            stored(1, "a.pdf", FileStatus::Pending),
            stored(2, "b.pdf", FileStatus::Pending),
            stored(3, "c.pdf", FileStatus::Completed),
        ])
    };
    let mut manager = UploadManager::new(UploadPolicy::default());
    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;

    let command = manager.begin_analyze_all().expect("pending files");
    assert_eq!(manager.count_with(FileStatus::Analyzing), 2);
    assert_eq!(manager.count_with(FileStatus::Completed), 1);

    drive(&mut manager, &backend, vec![command]).await;

    assert_eq!(manager.count_with(FileStatus::Analyzing), 0);
    assert_eq!(manager.count_with(FileStatus::Pending), 2);
    assert!(manager
        .records()
        .iter()
        .filter(|record| record.status == FileStatus::Pending)
        .all(|record| record.progress == 0));
    assert_eq!(manager.count_with(FileStatus::Completed), 1);
}

#[tokio::test]
async fn bulk_analysis_success_reconciles_by_reloading() {
    let backend = ScriptedBackend::with_files(vec![stored(1, "a.pdf", FileStatus::Pending)]);
    let mut manager = UploadManager::new(UploadPolicy::default());
    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;
    let key = manager.records()[0].key;

    let command = manager.begin_analyze_all().expect("pending files");
    let events = drive(&mut manager, &backend, vec![command]).await;

    assert!(events
        .iter()
        .any(|event| matches!(event, UploadEvent::Listed(_))));
    let record = manager.record(key).expect("same local key after reload");
    assert_eq!(record.status, FileStatus::Completed);
    assert_eq!(record.progress, 100);
    assert!(record.extracted_data.is_some());
}

#[test]
fn bulk_analysis_without_pending_files_is_a_notice() {
    let mut manager = UploadManager::new(UploadPolicy::default());
    assert!(manager.begin_analyze_all().is_none());
    assert_eq!(
        manager.take_notices(),
        vec![Notice::info("No pending files to analyze")]
    );
}

#[tokio::test]
async fn single_file_analysis_stores_extracted_invoice() {
    let backend = ScriptedBackend::with_files(vec![stored(4, "inv.pdf", FileStatus::Pending)]);
    let mut manager = UploadManager::new(UploadPolicy::default());
    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;
    let key = manager.records()[0].key;

    let command = manager.analyze(key).expect("analyze");
    assert_eq!(manager.record(key).expect("record").status, FileStatus::Analyzing);
    drive(&mut manager, &backend, vec![command]).await;

    let record = manager.record(key).expect("record");
    assert_eq!(record.status, FileStatus::Completed);
    let invoice = record.invoice().expect("invoice");
    assert_eq!(invoice.invoice_number.as_deref(), Some("INV-9"));

    let err = manager.analyze(key).expect_err("already completed");
    assert!(matches!(err, ConsoleError::InvalidState { .. }));
}

#[tokio::test]
async fn delete_is_remote_for_server_files_and_local_otherwise() {
    let backend = ScriptedBackend::with_files(vec![stored(1, "a.pdf", FileStatus::Pending)]);
    let mut manager = UploadManager::new(UploadPolicy::default());
    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;
    let remote_key = manager.records()[0].key;

    manager.accept_files(vec![candidate("draft.csv", 10)]);
    let local_key = manager.records()[1].key;
    assert!(manager.delete(local_key).is_none());
    assert_eq!(manager.records().len(), 1);

    let command = manager.delete(remote_key).expect("remote delete");
    assert_eq!(manager.records().len(), 1, "removed only after confirmation");
    drive(&mut manager, &backend, vec![command]).await;
    assert!(manager.records().is_empty());
    assert!(backend.files.lock().expect("files").is_empty());
}

#[tokio::test]
async fn reload_keeps_in_flight_local_uploads() {
    let backend = ScriptedBackend::with_files(vec![stored(1, "a.pdf", FileStatus::Pending)]);
    let mut manager = UploadManager::new(UploadPolicy::default());
    manager.accept_files(vec![candidate("draft.csv", 10)]);

    let refresh = manager.refresh();
    drive(&mut manager, &backend, vec![refresh]).await;

    let names: Vec<&str> = manager
        .records()
        .iter()
        .map(|record| record.filename.as_str())
        .collect();
    assert_eq!(names, vec!["a.pdf", "draft.csv"]);
    assert_eq!(manager.records()[1].status, FileStatus::Uploading);
}
