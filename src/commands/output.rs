use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::aggregate::{SummaryDiscrepancy, format_percentage, ranked_classes, top_n};
use crate::model::{ConfigField, FileEntry, RunSummary};
use crate::session::EditingSession;
use crate::transcode::{encode_key_value, encode_tag_list};

pub(super) fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_config(session: &EditingSession) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_config(&mut output, session)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_block(text: &str) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "{text}")?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_run_summary(
    summary: &RunSummary,
    discrepancies: &[SummaryDiscrepancy],
    top: usize,
) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    render_run_summary(&mut output, summary, discrepancies, top)?;
    output.flush()?;
    Ok(())
}

pub(super) fn write_files(files: &[FileEntry]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Files: {}", files.len())?;
    for entry in files {
        writeln!(output, "\t{}\t{} bytes", entry.filename, entry.size)?;
    }
    output.flush()?;
    Ok(())
}

pub(super) fn write_insight(keyword: &str, insight: &str) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Insight: {keyword}")?;
    for line in insight.lines() {
        writeln!(output, "\t{line}")?;
    }
    output.flush()?;
    Ok(())
}

fn render_config<W: Write>(output: &mut W, session: &EditingSession) -> io::Result<()> {
    writeln!(output, "Source: {}", session.source().as_str())?;
    writeln!(output, "Summary (read-only):")?;
    for row in encode_key_value(session.summary()) {
        writeln!(output, "\t{}: {}", row.key, row.text)?;
    }

    let steps = encode_tag_list(session.steps());
    writeln!(output, "steps: {}", steps.len())?;
    for (index, step) in steps.iter().enumerate() {
        writeln!(output, "\t{index}. {step}")?;
    }

    for field in ConfigField::KEY_VALUE {
        let rows = session.rows(field).unwrap_or_default();
        writeln!(output, "{field}: {}", rows.len())?;
        for row in rows {
            writeln!(output, "\t{}: {}", row.key, row.text)?;
        }
    }

    let categories = session.keyword_categories();
    writeln!(output, "{}: {}", ConfigField::KeywordsTech, categories.len())?;
    for (category, keywords) in categories {
        writeln!(output, "\t{category}: {}", keywords.join(", "))?;
    }

    Ok(())
}

fn render_run_summary<W: Write>(
    output: &mut W,
    summary: &RunSummary,
    discrepancies: &[SummaryDiscrepancy],
    top: usize,
) -> io::Result<()> {
    writeln!(
        output,
        "Messages: {} Blocks: {}",
        summary.message_count, summary.block_count
    )?;

    for (category, stats) in &summary.keyword_summary {
        writeln!(output, "Keywords [{category}]:")?;
        for (rank, stat) in top_n(stats, top).iter().enumerate() {
            writeln!(
                output,
                "\t{}.\t{}\t{}\t{}",
                rank + 1,
                stat.keyword,
                stat.count,
                format_percentage(stat.ratio)
            )?;
        }
    }

    let classes = ranked_classes(&summary.class_summary);
    if !classes.is_empty() {
        writeln!(output, "Classes:")?;
        for (label, stat) in classes {
            writeln!(
                output,
                "\t{label}\t{}\t{}",
                stat.count,
                format_percentage(stat.ratio)
            )?;
        }
    }

    if !discrepancies.is_empty() {
        writeln!(output, "Upstream summary discrepancies: {}", discrepancies.len())?;
        for discrepancy in discrepancies {
            writeln!(output, "\t{discrepancy}")?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::model::{MailResult, PipelineConfig};

    fn rendered(render: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buffer = Vec::new();
        render(&mut buffer).expect("render");
        String::from_utf8(buffer).expect("utf8 output")
    }

    #[test]
    fn config_overview_lists_every_field() {
        let config: PipelineConfig = serde_json::from_str(
            r#"{
              "summary": {"config_source": "db"},
              "steps": ["cleaner", "semantic"],
              "line_filter": {"max_len": 200, "decoration_chars": "-="},
              "keywords_tech": {"cloud": ["aws", "gcp"]},
              "source": "db"
            }"#,
        )
        .expect("config fixture");
        let session = EditingSession::begin_edit(&config);

        let text = rendered(|out| render_config(out, &session));
        assert!(text.starts_with("Source: persisted\n"));
        assert!(text.contains("\t1. semantic\n"));
        assert!(text.contains("line_filter: 2\n\tdecoration_chars: -=\n\tmax_len: 200\n"));
        assert!(text.contains("semantic_templates: 0\n"));
        assert!(text.contains("keywords_tech: 1\n\tcloud: aws, gcp\n"));
    }

    #[test]
    fn run_summary_ranks_keywords_and_classes() {
        let results: Vec<MailResult> = serde_json::from_str(
            r#"[
              {
                "source_path": "data/a.eml",
                "aggregation": {
                  "block_count": 4,
                  "keyword_summary": {"lang": [
                    {"keyword": "go", "count": 1, "ratio": 0.25},
                    {"keyword": "rust", "count": 3, "ratio": 0.75}
                  ]},
                  "class_summary": {"ng": {"count": 1, "ratio": 0.25}, "ok": {"count": 3, "ratio": 0.75}}
                }
              }
            ]"#,
        )
        .expect("results fixture");
        let summary = summarize(&results);

        let text = rendered(|out| render_run_summary(out, &summary, &[], 1));
        assert!(text.starts_with("Messages: 1 Blocks: 4\n"));
        assert!(text.contains("Keywords [lang]:\n\t1.\trust\t3\t75.0%\n"));
        assert!(!text.contains("\tgo\t"));
        assert!(text.contains("Classes:\n\tok\t3\t75.0%\n\tng\t1\t25.0%\n"));
        assert!(!text.contains("discrepancies"));
    }
}
