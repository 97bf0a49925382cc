use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::model::{KeywordSummary, RunSummary};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SummaryDiscrepancy {
    MessageCount {
        upstream: u64,
        recomputed: u64,
    },
    BlockCount {
        upstream: u64,
        recomputed: u64,
    },
    KeywordCount {
        category: String,
        keyword: String,
        upstream: u64,
        recomputed: u64,
    },
    ClassCount {
        label: String,
        upstream: u64,
        recomputed: u64,
    },
}

impl fmt::Display for SummaryDiscrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MessageCount {
                upstream,
                recomputed,
            } => write!(f, "message_count upstream={upstream} recomputed={recomputed}"),
            Self::BlockCount {
                upstream,
                recomputed,
            } => write!(f, "block_count upstream={upstream} recomputed={recomputed}"),
            Self::KeywordCount {
                category,
                keyword,
                upstream,
                recomputed,
            } => write!(
                f,
                "keyword {category}/{keyword} upstream={upstream} recomputed={recomputed}"
            ),
            Self::ClassCount {
                label,
                upstream,
                recomputed,
            } => write!(f, "class {label} upstream={upstream} recomputed={recomputed}"),
        }
    }
}

// Counts only: ratios use different denominators upstream.
pub fn reconcile_summary(upstream: &RunSummary, recomputed: &RunSummary) -> Vec<SummaryDiscrepancy> {
    let mut discrepancies = Vec::new();

    if upstream.message_count != recomputed.message_count {
        discrepancies.push(SummaryDiscrepancy::MessageCount {
            upstream: upstream.message_count,
            recomputed: recomputed.message_count,
        });
    }

    // The run endpoint may omit block_count entirely.
    if upstream.block_count != 0 && upstream.block_count != recomputed.block_count {
        discrepancies.push(SummaryDiscrepancy::BlockCount {
            upstream: upstream.block_count,
            recomputed: recomputed.block_count,
        });
    }

    let upstream_keywords = keyword_counts(&upstream.keyword_summary);
    let recomputed_keywords = keyword_counts(&recomputed.keyword_summary);
    let keyword_keys = upstream_keywords
        .keys()
        .chain(recomputed_keywords.keys())
        .collect::<BTreeSet<&(String, String)>>();
    for key in keyword_keys {
        let upstream_count = upstream_keywords.get(key).copied().unwrap_or_default();
        let recomputed_count = recomputed_keywords.get(key).copied().unwrap_or_default();
        if upstream_count != recomputed_count {
            discrepancies.push(SummaryDiscrepancy::KeywordCount {
                category: key.0.clone(),
                keyword: key.1.clone(),
                upstream: upstream_count,
                recomputed: recomputed_count,
            });
        }
    }

    let labels = upstream
        .class_summary
        .keys()
        .chain(recomputed.class_summary.keys())
        .collect::<BTreeSet<&String>>();
    for label in labels {
        let upstream_count = upstream
            .class_summary
            .get(label)
            .map(|stat| stat.count)
            .unwrap_or_default();
        let recomputed_count = recomputed
            .class_summary
            .get(label)
            .map(|stat| stat.count)
            .unwrap_or_default();
        if upstream_count != recomputed_count {
            discrepancies.push(SummaryDiscrepancy::ClassCount {
                label: label.clone(),
                upstream: upstream_count,
                recomputed: recomputed_count,
            });
        }
    }

    discrepancies
}

fn keyword_counts(summary: &KeywordSummary) -> BTreeMap<(String, String), u64> {
    let mut counts = BTreeMap::new();
    for (category, stats) in summary {
        for stat in stats {
            *counts
                .entry((category.clone(), stat.keyword.clone()))
                .or_default() += stat.count;
        }
    }
    counts
}
