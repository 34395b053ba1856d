//! File service collaborator: the four operations the upload screen needs, plus single-file analyze/fetch.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{multipart, Body, Client};
use serde::de::DeserializeOwned;
use shared::{
    domain::FileId,
    error::ApiError,
    protocol::{
        AnalyzeAllResponse, AnalyzeFileResponse, DeleteFileResponse, FileListResponse,
        StoredFileRecord, UploadFileResponse,
    },
};
use thiserror::Error;
use tracing::{debug, info};

const UPLOAD_CHUNK_BYTES: usize = 64 * 1024;

/// Upload progress callback, called with a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("file service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("file service rejected the request: {}", .0.message)]
    Api(#[from] ApiError),
    #[error("file service is not configured")]
    Unavailable,
}

#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Arc<Vec<u8>>,
}

#[async_trait]
pub trait FileBackend: Send + Sync {
    async fn list_files(&self) -> Result<Vec<StoredFileRecord>, BackendError>;
    async fn get_file(&self, id: FileId) -> Result<StoredFileRecord, BackendError>;
    async fn upload_file(
        &self,
        upload: FileUpload,
        progress: ProgressFn,
    ) -> Result<UploadFileResponse, BackendError>;
    async fn analyze_all(&self) -> Result<AnalyzeAllResponse, BackendError>;
    async fn analyze_file(&self, id: FileId) -> Result<AnalyzeFileResponse, BackendError>;
    async fn delete_file(&self, id: FileId) -> Result<DeleteFileResponse, BackendError>;
}

pub struct MissingFileBackend;

#[async_trait]
impl FileBackend for MissingFileBackend {
    async fn list_files(&self) -> Result<Vec<StoredFileRecord>, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn get_file(&self, _id: FileId) -> Result<StoredFileRecord, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn upload_file(
        &self,
        _upload: FileUpload,
        _progress: ProgressFn,
    ) -> Result<UploadFileResponse, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn analyze_all(&self) -> Result<AnalyzeAllResponse, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn analyze_file(&self, _id: FileId) -> Result<AnalyzeFileResponse, BackendError> {
        Err(BackendError::Unavailable)
    }

    async fn delete_file(&self, _id: FileId) -> Result<DeleteFileResponse, BackendError> {
        Err(BackendError::Unavailable)
    }
}

pub struct HttpFileBackend {
    http: Client,
    base_url: String,
}

impl HttpFileBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl FileBackend for HttpFileBackend {
    async fn list_files(&self) -> Result<Vec<StoredFileRecord>, BackendError> {
        let res = self.http.get(self.url("/files")).send().await?;
        let body: FileListResponse = decode(res).await?;
        debug!(count = body.files.len(), "listed files");
        Ok(body.files)
    }

    async fn get_file(&self, id: FileId) -> Result<StoredFileRecord, BackendError> {
        let res = self
            .http
            .get(self.url(&format!("/files/{}", id.0)))
            .send()
            .await?;
        decode(res).await
    }

    async fn upload_file(
        &self,
        upload: FileUpload,
        progress: ProgressFn,
    ) -> Result<UploadFileResponse, BackendError> {
        let total = upload.bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = upload
            .bytes
            .chunks(UPLOAD_CHUNK_BYTES)
            .map(<[u8]>::to_vec)
            .collect();

        let reporter = progress.clone();
        let mut sent = 0u64;
        let stream = futures::stream::iter(chunks.into_iter().map(move |chunk| {
            sent += chunk.len() as u64;
            reporter(percent_of(sent, total));
            Ok::<_, std::io::Error>(chunk)
        }));

        let part = multipart::Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)?;
        let form = multipart::Form::new().part("file", part);

        let res = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        let body: UploadFileResponse = decode(res).await?;
        progress(100);
        info!(file_id = body.id.0, filename = %body.filename, "file uploaded");
        Ok(body)
    }

    async fn analyze_all(&self) -> Result<AnalyzeAllResponse, BackendError> {
        let res = self.http.post(self.url("/analyze-all")).send().await?;
        decode(res).await
    }

    async fn analyze_file(&self, id: FileId) -> Result<AnalyzeFileResponse, BackendError> {
        let res = self
            .http
            .post(self.url(&format!("/analyze/{}", id.0)))
            .send()
            .await?;
        decode(res).await
    }

    async fn delete_file(&self, id: FileId) -> Result<DeleteFileResponse, BackendError> {
        let res = self
            .http
            .delete(self.url(&format!("/files/{}", id.0)))
            .send()
            .await?;
        decode(res).await
    }
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, BackendError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(ApiError::from_response(status.as_u16(), &body).into());
    }
    Ok(res.json::<T>().await?)
}

fn percent_of(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
