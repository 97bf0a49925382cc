use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response, multipart};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::UpstreamError;
use crate::model::{
    DeleteResponse, FileEntry, InsightRequest, InsightResponse, PipelineConfig, RunResponse,
    SavePayload,
};

pub const UPLOAD_FIELD: &str = "files[]";

pub trait PipelineApi {
    fn load_config(&self) -> Result<PipelineConfig, UpstreamError>;
    fn save_config(&self, payload: &SavePayload) -> Result<PipelineConfig, UpstreamError>;
    fn list_files(&self) -> Result<Vec<FileEntry>, UpstreamError>;
    fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<FileEntry>, UpstreamError>;
    fn delete_files(&self, filenames: &[String]) -> Result<DeleteResponse, UpstreamError>;
    fn run_pipeline(&self) -> Result<RunResponse, UpstreamError>;
    fn fetch_insight(&self, request: &InsightRequest) -> Result<InsightResponse, UpstreamError>;
}

pub struct HttpPipelineApi {
    base_url: String,
    client: Client,
    timeout_ms: u64,
}

impl HttpPipelineApi {
    pub fn new(base_url: &str, timeout_ms: u64) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| UpstreamError::Unreachable {
                url: base_url.to_string(),
                message: format!("failed to build http client: {err}"),
            })?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout_ms,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/pipeline/{}", self.base_url, path)
    }

    fn send(&self, request: RequestBuilder, url: &str) -> Result<Response, UpstreamError> {
        debug!(url, "sending pipeline service request");
        request.send().map_err(|err| UpstreamError::Unreachable {
            url: url.to_string(),
            message: if err.is_timeout() {
                format!("request timed out after {}ms", self.timeout_ms)
            } else {
                err.to_string()
            },
        })
    }

    fn expect_json<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T, UpstreamError> {
        let response = self.send(request, url)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<T>()
            .map_err(|err| UpstreamError::Decode(err.to_string()))
    }
}

impl PipelineApi for HttpPipelineApi {
    fn load_config(&self) -> Result<PipelineConfig, UpstreamError> {
        let url = self.url("config");
        self.expect_json(self.client.get(&url), &url)
    }

    fn save_config(&self, payload: &SavePayload) -> Result<PipelineConfig, UpstreamError> {
        let url = self.url("config");
        self.expect_json(self.client.put(&url).json(payload), &url)
    }

    fn list_files(&self) -> Result<Vec<FileEntry>, UpstreamError> {
        let url = self.url("files");
        let response = self.send(self.client.get(&url), &url)?;
        let status = response.status();
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "file listing unavailable; showing no files");
            return Ok(Vec::new());
        }

        response
            .json::<Vec<FileEntry>>()
            .map_err(|err| UpstreamError::Decode(err.to_string()))
    }

    fn upload_files(&self, paths: &[PathBuf]) -> Result<Vec<FileEntry>, UpstreamError> {
        let mut form = multipart::Form::new();
        for path in paths {
            form = form
                .file(UPLOAD_FIELD, path)
                .map_err(|err| UpstreamError::LocalFile {
                    path: path.display().to_string(),
                    message: err.to_string(),
                })?;
        }

        let url = self.url("upload");
        self.expect_json(self.client.post(&url).multipart(form), &url)
    }

    fn delete_files(&self, filenames: &[String]) -> Result<DeleteResponse, UpstreamError> {
        let url = self.url("files");
        self.expect_json(self.client.delete(&url).json(filenames), &url)
    }

    fn run_pipeline(&self) -> Result<RunResponse, UpstreamError> {
        let url = self.url("run");
        self.expect_json(self.client.post(&url), &url)
    }

    fn fetch_insight(&self, request: &InsightRequest) -> Result<InsightResponse, UpstreamError> {
        let url = self.url("tech-insight");
        self.expect_json(self.client.post(&url).json(request), &url)
    }
}
