use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::aggregate::{SummaryDiscrepancy, reconcile_summary, summarize};
use crate::cli::SummarizeArgs;
use crate::commands::output;
use crate::model::{MailResult, RunResponse, RunSummary};
use crate::util::read_json;

/// Report written by `run --output-path`; its `summary` is already recomputed.
#[derive(Debug, Deserialize)]
struct SavedReport {
    #[serde(default)]
    results: Vec<MailResult>,
    upstream_summary: RunSummary,
}

/// A saved run report, a raw run response, or a bare results array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SavedRun {
    Results(Vec<MailResult>),
    Report(SavedReport),
    Response(RunResponse),
}

#[derive(Debug, Serialize)]
struct SummaryReport {
    summary: RunSummary,
    discrepancies: Vec<SummaryDiscrepancy>,
}

fn summarize_saved(saved: SavedRun) -> SummaryReport {
    match saved {
        SavedRun::Results(results) => SummaryReport {
            summary: summarize(&results),
            discrepancies: Vec::new(),
        },
        SavedRun::Report(report) => reconciled(&report.results, &report.upstream_summary),
        SavedRun::Response(response) => reconciled(&response.results, &response.summary),
    }
}

fn reconciled(results: &[MailResult], upstream: &RunSummary) -> SummaryReport {
    let summary = summarize(results);
    SummaryReport {
        discrepancies: reconcile_summary(upstream, &summary),
        summary,
    }
}

pub fn run(args: SummarizeArgs) -> Result<()> {
    let saved: SavedRun = read_json(&args.results_path)?;
    let report = summarize_saved(saved);

    info!(
        path = %args.results_path.display(),
        message_count = report.summary.message_count,
        block_count = report.summary.block_count,
        "summarized saved results"
    );
    for discrepancy in &report.discrepancies {
        warn!(detail = %discrepancy, "saved summary disagrees with recomputed summary");
    }

    if args.json {
        return output::write_json(&report);
    }
    output::write_run_summary(&report.summary, &report.discrepancies, args.top)
}
