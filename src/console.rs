use std::path::PathBuf;

use tracing::{info, warn};

use crate::aggregate::{SummaryDiscrepancy, reconcile_summary, summarize};
use crate::client::PipelineApi;
use crate::error::ConsoleError;
use crate::insight::{InsightBroker, InsightOutcome, OpenInsight};
use crate::model::{
    ConfigField, DeleteResponse, FileEntry, InsightRequest, MailResult, PipelineConfig,
    RunSummary,
};
use crate::session::{EditingSession, FieldEdit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSnapshot {
    pub results: Vec<MailResult>,
    pub summary: RunSummary,
    pub upstream_summary: RunSummary,
    pub discrepancies: Vec<SummaryDiscrepancy>,
}

/// Everything the operator sees, passed explicitly to each handler.
#[derive(Debug, Default)]
pub struct ConsoleState {
    config: Option<PipelineConfig>,
    session: Option<EditingSession>,
    files: Vec<FileEntry>,
    last_run: Option<RunSnapshot>,
    insight: InsightBroker,
    running: bool,
    uploading: bool,
    notices: Vec<Notice>,
}

impl ConsoleState {
    pub fn config(&self) -> Option<&PipelineConfig> {
        self.config.as_ref()
    }

    pub fn session(&self) -> Option<&EditingSession> {
        self.session.as_ref()
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn last_run(&self) -> Option<&RunSnapshot> {
        self.last_run.as_ref()
    }

    pub fn insight(&self) -> Option<&OpenInsight> {
        self.insight.open()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn load_config(&mut self, api: &dyn PipelineApi) -> Result<&PipelineConfig, ConsoleError> {
        let config = match api.load_config() {
            Ok(config) => config,
            Err(err) => {
                self.notify(NoticeLevel::Error, "Failed to load config");
                return Err(err.into());
            }
        };

        info!(
            source = config.source.as_str(),
            steps = config.steps.len(),
            "loaded pipeline configuration"
        );
        Ok(self.replace_config(config))
    }

    pub fn edit(&mut self, field: ConfigField, edit: FieldEdit) -> Result<(), ConsoleError> {
        let session = self.session.as_mut().ok_or(ConsoleError::NoConfig)?;
        session.apply_field_edit(field, edit)?;
        Ok(())
    }

    pub fn save_config(&mut self, api: &dyn PipelineApi) -> Result<&PipelineConfig, ConsoleError> {
        let session = self.session.as_ref().ok_or(ConsoleError::NoConfig)?;
        let payload = session
            .build_save_payload()
            .map_err(ConsoleError::Rejected)?;

        let saved = match api.save_config(&payload) {
            Ok(saved) => saved,
            Err(err) => {
                self.notify(NoticeLevel::Error, "Failed to save config");
                return Err(err.into());
            }
        };

        info!(source = saved.source.as_str(), "saved pipeline configuration");
        self.notify(NoticeLevel::Success, "Configuration saved");
        Ok(self.replace_config(saved))
    }

    pub fn refresh_files(&mut self, api: &dyn PipelineApi) -> Result<&[FileEntry], ConsoleError> {
        match api.list_files() {
            Ok(files) => {
                self.files = files;
                Ok(&self.files)
            }
            Err(err) => {
                self.notify(NoticeLevel::Error, "Failed to load files");
                Err(err.into())
            }
        }
    }

    pub fn upload_files(
        &mut self,
        api: &dyn PipelineApi,
        paths: &[PathBuf],
    ) -> Result<Vec<FileEntry>, ConsoleError> {
        if self.uploading {
            return Err(ConsoleError::Busy("upload"));
        }

        self.uploading = true;
        let result = api.upload_files(paths);
        self.uploading = false;

        match result {
            Ok(uploaded) => {
                merge_files(&mut self.files, &uploaded);
                self.notify(NoticeLevel::Success, format!("Uploaded {} files", paths.len()));
                Ok(uploaded)
            }
            Err(err) => {
                self.notify(NoticeLevel::Error, "Upload failed");
                Err(err.into())
            }
        }
    }

    pub fn delete_files(
        &mut self,
        api: &dyn PipelineApi,
        filenames: &[String],
    ) -> Result<DeleteResponse, ConsoleError> {
        match api.delete_files(filenames) {
            Ok(response) => {
                self.files
                    .retain(|entry| !filenames.iter().any(|name| name == &entry.filename));
                self.notify(NoticeLevel::Success, "Files deleted");
                Ok(response)
            }
            Err(err) => {
                self.notify(NoticeLevel::Error, "Delete failed");
                Err(err.into())
            }
        }
    }

    pub fn run_pipeline(&mut self, api: &dyn PipelineApi) -> Result<&RunSnapshot, ConsoleError> {
        if self.running {
            return Err(ConsoleError::Busy("pipeline run"));
        }

        self.running = true;
        let previous = self.last_run.take();
        let result = api.run_pipeline();
        self.running = false;

        let response = match result {
            Ok(response) => response,
            Err(err) => {
                self.last_run = previous;
                self.notify(NoticeLevel::Error, "Pipeline run failed");
                return Err(err.into());
            }
        };

        let summary = summarize(&response.results);
        let discrepancies = reconcile_summary(&response.summary, &summary);
        for discrepancy in &discrepancies {
            warn!(detail = %discrepancy, "upstream run summary disagrees with recomputed summary");
        }

        info!(
            message_count = summary.message_count,
            block_count = summary.block_count,
            "pipeline run finished"
        );
        self.notify(NoticeLevel::Success, "Pipeline finished successfully");

        let snapshot = self.last_run.insert(RunSnapshot {
            results: response.results,
            summary,
            upstream_summary: response.summary,
            discrepancies,
        });
        Ok(&*snapshot)
    }

    pub fn request_insight(
        &mut self,
        api: &dyn PipelineApi,
        request: InsightRequest,
    ) -> Result<Option<&OpenInsight>, ConsoleError> {
        let ticket = self.insight.request_for(request.clone());
        let result = api.fetch_insight(&request);

        match self.insight.complete(ticket, result) {
            InsightOutcome::Resolved => Ok(self.insight.open()),
            InsightOutcome::Superseded => Ok(None),
            InsightOutcome::Failed(err) => {
                self.notify(NoticeLevel::Error, "Failed to get insight");
                Err(err.into())
            }
        }
    }

    fn replace_config(&mut self, config: PipelineConfig) -> &PipelineConfig {
        self.session = Some(EditingSession::begin_edit(&config));
        self.config.insert(config)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }
}

pub fn merge_files(files: &mut Vec<FileEntry>, uploaded: &[FileEntry]) {
    for entry in uploaded {
        match files.iter_mut().find(|existing| existing.filename == entry.filename) {
            Some(existing) => existing.size = entry.size,
            None => files.push(entry.clone()),
        }
    }
}
