use std::collections::{BTreeMap, HashMap};

use crate::model::{ClassStat, ClassSummary, KeywordStat, KeywordSummary, MailResult, RunSummary};

mod ranking;
mod reconcile;
#[cfg(test)]
mod tests;

pub use ranking::*;
pub use reconcile::*;

pub const DEFAULT_TOP_N: usize = 10;

// Keyword counts for one category, in first-seen order.
#[derive(Default)]
struct CategoryTally {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl CategoryTally {
    fn add(&mut self, keyword: &str, count: u64) {
        match self.counts.get_mut(keyword) {
            Some(total) => *total += count,
            None => {
                self.order.push(keyword.to_string());
                self.counts.insert(keyword.to_string(), count);
            }
        }
    }

    fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

pub fn summarize(results: &[MailResult]) -> RunSummary {
    let block_count = results
        .iter()
        .map(|result| result.aggregation.block_count)
        .sum::<u64>();

    let mut class_counts = BTreeMap::<String, u64>::new();
    let mut keyword_tallies = BTreeMap::<String, CategoryTally>::new();

    for result in results {
        for (label, stat) in &result.aggregation.class_summary {
            *class_counts.entry(label.clone()).or_default() += stat.count;
        }

        for (category, stats) in &result.aggregation.keyword_summary {
            let tally = keyword_tallies.entry(category.clone()).or_default();
            for stat in stats {
                tally.add(&stat.keyword, stat.count);
            }
        }
    }

    let class_total = class_counts.values().sum::<u64>();
    let class_summary = class_counts
        .into_iter()
        .map(|(label, count)| {
            let ratio = scoped_ratio(count, class_total, block_count);
            (label, ClassStat { count, ratio })
        })
        .collect::<ClassSummary>();

    let keyword_summary = keyword_tallies
        .into_iter()
        .map(|(category, tally)| {
            let category_total = tally.total();
            let stats = tally
                .order
                .iter()
                .map(|keyword| {
                    let count = tally.counts.get(keyword).copied().unwrap_or_default();
                    KeywordStat {
                        keyword: keyword.clone(),
                        count,
                        ratio: scoped_ratio(count, category_total, block_count),
                    }
                })
                .collect::<Vec<KeywordStat>>();
            (category, stats)
        })
        .collect::<KeywordSummary>();

    RunSummary {
        message_count: results.len() as u64,
        block_count,
        keyword_summary,
        class_summary,
    }
}

pub fn ratio(count: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64
}

// A run without blocks reports no ratios even if per-document counts disagree.
fn scoped_ratio(count: u64, total: u64, block_count: u64) -> f64 {
    if block_count == 0 {
        return 0.0;
    }
    ratio(count, total)
}
