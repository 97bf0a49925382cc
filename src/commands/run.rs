use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::aggregate::SummaryDiscrepancy;
use crate::cli::{RunArgs, ServiceArgs};
use crate::commands::{connect, flush_notices, output};
use crate::console::{ConsoleState, RunSnapshot};
use crate::model::{MailResult, RunSummary};
use crate::util::{now_utc_string, write_json_pretty};

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    generated_at: String,
    results: &'a [MailResult],
    summary: &'a RunSummary,
    upstream_summary: &'a RunSummary,
    discrepancies: &'a [SummaryDiscrepancy],
}

impl<'a> RunReport<'a> {
    fn new(snapshot: &'a RunSnapshot) -> Self {
        Self {
            generated_at: now_utc_string(),
            results: &snapshot.results,
            summary: &snapshot.summary,
            upstream_summary: &snapshot.upstream_summary,
            discrepancies: &snapshot.discrepancies,
        }
    }
}

pub fn run(service: &ServiceArgs, args: RunArgs) -> Result<()> {
    let api = connect(service)?;
    let mut console = ConsoleState::default();

    info!(api_base = %service.api_base, "starting pipeline run");
    let outcome = console.run_pipeline(&api).map(|_| ());
    flush_notices(&mut console);
    outcome.context("pipeline run failed")?;

    let Some(snapshot) = console.last_run() else {
        return Ok(());
    };
    let report = RunReport::new(snapshot);

    if let Some(path) = &args.output_path {
        write_json_pretty(path, &report)?;
        info!(path = %path.display(), "wrote run report");
    }

    if args.json {
        return output::write_json(&report);
    }
    output::write_run_summary(&snapshot.summary, &snapshot.discrepancies, args.top)
}
