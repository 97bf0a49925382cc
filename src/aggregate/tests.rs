use super::*;
use crate::model::{Aggregation, RunResponse};

fn stat(keyword: &str, count: u64) -> KeywordStat {
    KeywordStat {
        keyword: keyword.to_string(),
        count,
        ratio: 0.0,
    }
}

fn mail(path: &str, raw_aggregation: &str) -> MailResult {
    let aggregation: Aggregation =
        serde_json::from_str(raw_aggregation).expect("aggregation fixture");
    MailResult {
        source_path: path.to_string(),
        subject: String::new(),
        semantic: None,
        aggregation,
    }
}

fn sample_results() -> Vec<MailResult> {
    vec![
        mail(
            "data/a.eml",
            r#"{
              "block_count": 3,
              "keyword_summary": {
                "lang": [
                  {"keyword": "rust", "count": 2, "ratio": 0.66},
                  {"keyword": "go", "count": 1, "ratio": 0.33}
                ]
              },
              "class_summary": {
                "ok": {"count": 2, "ratio": 0.66},
                "ng": {"count": 1, "ratio": 0.33}
              }
            }"#,
        ),
        mail(
            "data/b.eml",
            r#"{
              "block_count": 1,
              "keyword_summary": {
                "lang": [{"keyword": "python", "count": 1, "ratio": 1.0},
                         {"keyword": "rust", "count": 1, "ratio": 1.0}],
                "cloud": [{"keyword": "aws", "count": 1, "ratio": 1.0}]
              },
              "class_summary": {"ok": {"count": 1, "ratio": 1.0}}
            }"#,
        ),
    ]
}

#[test]
fn summarize_sums_counts_and_blocks() {
    let summary = summarize(&sample_results());

    assert_eq!(summary.message_count, 2);
    assert_eq!(summary.block_count, 4);
    assert_eq!(summary.class_summary["ok"].count, 3);
    assert_eq!(summary.class_summary["ng"].count, 1);

    let lang = &summary.keyword_summary["lang"];
    let keywords = lang
        .iter()
        .map(|stat| (stat.keyword.as_str(), stat.count))
        .collect::<Vec<(&str, u64)>>();
    assert_eq!(keywords, vec![("rust", 3), ("go", 1), ("python", 1)]);
}

#[test]
fn ratios_are_recomputed_at_run_level() {
    let summary = summarize(&sample_results());

    assert!((summary.class_summary["ok"].ratio - 0.75).abs() < 1e-9);
    assert!((summary.class_summary["ng"].ratio - 0.25).abs() < 1e-9);

    let lang = &summary.keyword_summary["lang"];
    assert!((lang[0].ratio - 0.6).abs() < 1e-9);
    assert!((lang[1].ratio - 0.2).abs() < 1e-9);
    assert!((summary.keyword_summary["cloud"][0].ratio - 1.0).abs() < 1e-9);
}

#[test]
fn class_ratios_partition_to_one() {
    let summary = summarize(&sample_results());
    let total = summary
        .class_summary
        .values()
        .map(|stat| stat.ratio)
        .sum::<f64>();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn block_count_is_additive_across_documents() {
    let results = sample_results();
    let expected = results
        .iter()
        .map(|result| result.aggregation.block_count)
        .sum::<u64>();
    assert_eq!(summarize(&results).block_count, expected);
}

#[test]
fn empty_run_has_zero_counts() {
    let summary = summarize(&[]);
    assert_eq!(summary, RunSummary::default());
}

#[test]
fn zero_totals_yield_zero_ratios() {
    let results = vec![
        mail(
            "data/empty.eml",
            r#"{
              "block_count": 0,
              "keyword_summary": {"lang": [{"keyword": "rust", "count": 0, "ratio": 0.0}]},
              "class_summary": {"ok": {"count": 2, "ratio": 1.0}}
            }"#,
        ),
        mail("data/missing.eml", r#"{}"#),
    ];

    let summary = summarize(&results);
    assert_eq!(summary.block_count, 0);
    assert_eq!(summary.keyword_summary["lang"][0].ratio, 0.0);
    assert!(summary.class_summary.values().all(|stat| stat.ratio == 0.0));
}

#[test]
fn top_n_orders_by_count_and_keeps_tie_order() {
    let stats = vec![stat("a", 5), stat("b", 5), stat("c", 9)];
    let ranked = top_n(&stats, DEFAULT_TOP_N);

    let names = ranked
        .iter()
        .map(|stat| stat.keyword.as_str())
        .collect::<Vec<&str>>();
    assert_eq!(names, vec!["c", "a", "b"]);
    assert_eq!(stats[0].keyword, "a");
}

#[test]
fn top_n_truncates() {
    let stats = (0..15)
        .map(|index| stat(&format!("k{index}"), index))
        .collect::<Vec<KeywordStat>>();
    let ranked = top_n(&stats, 10);
    assert_eq!(ranked.len(), 10);
    assert_eq!(ranked[0].keyword, "k14");
    assert!(top_n(&stats, 0).is_empty());
}

#[test]
fn ranked_classes_break_ties_by_label() {
    let summary = summarize(&sample_results());
    let mut classes = summary.class_summary.clone();
    classes.insert(
        "aa".to_string(),
        ClassStat {
            count: 1,
            ratio: 0.25,
        },
    );

    let labels = ranked_classes(&classes)
        .into_iter()
        .map(|(label, _)| label)
        .collect::<Vec<String>>();
    assert_eq!(labels, vec!["ok", "aa", "ng"]);
}

#[test]
fn format_percentage_guards_non_finite_values() {
    assert_eq!(format_percentage(0.256), "25.6%");
    assert_eq!(format_percentage(f64::NAN), "0.0%");
    assert_eq!(format_percentage(1.0), "100.0%");
}

#[test]
fn reconcile_reports_count_disagreements_only() {
    let results = sample_results();
    let recomputed = summarize(&results);

    let mut upstream = recomputed.clone();
    upstream.block_count = 0;
    for stat in upstream.class_summary.values_mut() {
        stat.ratio = 0.5;
    }
    assert!(reconcile_summary(&upstream, &recomputed).is_empty());

    upstream.message_count = 3;
    upstream.keyword_summary.insert("db".to_string(), vec![stat("postgres", 2)]);
    upstream.class_summary.remove("ng");

    let discrepancies = reconcile_summary(&upstream, &recomputed);
    assert_eq!(discrepancies.len(), 3);
    assert_eq!(
        discrepancies[0],
        SummaryDiscrepancy::MessageCount {
            upstream: 3,
            recomputed: 2
        }
    );
    assert!(discrepancies[1].to_string().contains("db/postgres"));
    assert_eq!(
        discrepancies[2],
        SummaryDiscrepancy::ClassCount {
            label: "ng".to_string(),
            upstream: 0,
            recomputed: 1
        }
    );
}

#[test]
fn run_response_without_block_count_deserializes() {
    let raw = r#"
    {
      "results": [],
      "summary": {"message_count": 0, "blocks": [], "keyword_summary": {}, "class_summary": {}}
    }
    "#;
    let response: RunResponse = serde_json::from_str(raw).expect("run response");
    assert_eq!(response.summary.block_count, 0);
    assert!(response.results.is_empty());
}
