pub mod config;
pub mod files;
pub mod insight;
pub mod run;
pub mod summarize;

mod output;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::ServiceArgs;
use crate::client::HttpPipelineApi;
use crate::console::{ConsoleState, NoticeLevel};

fn connect(service: &ServiceArgs) -> Result<HttpPipelineApi> {
    let api = HttpPipelineApi::new(&service.api_base, service.timeout_ms)
        .context("failed to prepare pipeline service client")?;
    info!(api_base = %api.base_url(), timeout_ms = service.timeout_ms, "using pipeline service");
    Ok(api)
}

fn flush_notices(console: &mut ConsoleState) {
    for notice in console.take_notices() {
        match notice.level {
            NoticeLevel::Success => info!(notice = %notice.message, "console"),
            NoticeLevel::Error => warn!(notice = %notice.message, "console"),
        }
    }
}
