use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{FileId, FileStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFileRecord {
    pub id: FileId,
    pub filename: String,
    pub file_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileListResponse {
    pub files: Vec<StoredFileRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadFileResponse {
    pub id: FileId,
    pub filename: String,
    pub file_size: u64,
    pub status: FileStatus,
    pub upload_time: NaiveDateTime,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisOutcome {
    pub id: FileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeAllResponse {
    pub message: String,
    #[serde(default)]
    pub analyzed_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_processed: Option<u32>,
    #[serde(default)]
    pub results: Vec<AnalysisOutcome>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeFileResponse {
    pub id: FileId,
    pub status: FileStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteFileResponse {
    pub message: String,
    pub id: FileId,
}

/// Invoice fields the extraction service fills into `extracted_data`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedInvoice {
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub total_amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl ExtractedInvoice {
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_file_listing_with_naive_timestamps() {
        let raw = r#"{
            "files": [{
                "id": 3,
                "filename": "q3.pdf",
                "file_size": 2048,
                "file_type": "application/pdf",
                "status": "completed",
                "upload_time": "2024-05-01T10:15:30.123456",
                "extracted_data": {"invoice_number": "INV-1", "vendor": "Acme", "currency": "USD"},
                "error_message": null
            }]
        }"#;

        let listing: FileListResponse = serde_json::from_str(raw).expect("listing");
        let record = &listing.files[0];
        assert_eq!(record.id, FileId(3));
        assert_eq!(record.status, FileStatus::Completed);
        assert!(record.upload_time.is_some());

        let invoice = record
            .extracted_data
            .as_ref()
            .and_then(ExtractedInvoice::from_value)
            .expect("invoice fields");
        assert_eq!(invoice.vendor.as_deref(), Some("Acme"));
        assert_eq!(invoice.total_amount, None);
    }

    #[test]
    fn analyze_all_response_tolerates_empty_batch() {
        let raw = r#"{"message": "No pending files to analyze", "analyzed_count": 0}"#;
        let response: AnalyzeAllResponse = serde_json::from_str(raw).expect("response");
        assert_eq!(response.analyzed_count, 0);
        assert!(response.results.is_empty());
        assert_eq!(response.total_processed, None);
    }
}
