use crate::model::{ClassStat, ClassSummary, KeywordStat};

/// Highest counts first; equal counts keep their input order.
pub fn top_n(stats: &[KeywordStat], n: usize) -> Vec<KeywordStat> {
    let mut ranked = stats.to_vec();
    ranked.sort_by(|left, right| right.count.cmp(&left.count));
    ranked.truncate(n);
    ranked
}

pub fn ranked_classes(summary: &ClassSummary) -> Vec<(String, ClassStat)> {
    let mut ranked = summary
        .iter()
        .map(|(label, stat)| (label.clone(), stat.clone()))
        .collect::<Vec<(String, ClassStat)>>();
    ranked.sort_by(|left, right| right.1.count.cmp(&left.1.count).then(left.0.cmp(&right.0)));
    ranked
}

pub fn format_percentage(ratio: f64) -> String {
    let safe = if ratio.is_finite() { ratio } else { 0.0 };
    format!("{:.1}%", safe * 100.0)
}
