//! Summary report over the qualified leads table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use leadgen_core::LabelProvenance;
use leadgen_db::QualifiedLeadRow;

pub const HISTOGRAM_BUCKETS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreStats {
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LeadReport {
    pub total: usize,
    pub qualified: usize,
    pub stats: Option<ScoreStats>,
    /// Bucket `i` counts scores in `[10 * i, 10 * i + 9]`; the last bucket also holds 100.
    pub histogram: [usize; HISTOGRAM_BUCKETS],
    pub needs: BTreeMap<String, usize>,
    pub sources: BTreeMap<String, usize>,
    pub bootstrap_labeled: usize,
}

impl LeadReport {
    #[must_use]
    pub fn from_rows(rows: &[QualifiedLeadRow]) -> Self {
        let mut histogram = [0; HISTOGRAM_BUCKETS];
        let mut needs: BTreeMap<String, usize> = BTreeMap::new();
        let mut sources: BTreeMap<String, usize> = BTreeMap::new();

        for row in rows {
            let bucket = usize::try_from(row.intent_score.clamp(0, 100) / 10)
                .unwrap_or(0)
                .min(HISTOGRAM_BUCKETS - 1);
            histogram[bucket] += 1;
            *needs.entry(row.diagnosed_need.clone()).or_default() += 1;
            let source = row.source.clone().unwrap_or_else(|| "unknown".to_string());
            *sources.entry(source).or_default() += 1;
        }

        Self {
            total: rows.len(),
            qualified: rows.iter().filter(|r| r.qualified).count(),
            stats: score_stats(rows.iter().map(|r| r.intent_score).collect()),
            histogram,
            needs,
            sources,
            bootstrap_labeled: rows
                .iter()
                .filter(|r| r.label_confidence == LabelProvenance::Bootstrap.as_str())
                .count(),
        }
    }

    /// True when any row was scored by a model trained on heuristic labels.
    #[must_use]
    pub fn is_low_confidence(&self) -> bool {
        self.bootstrap_labeled > 0
    }

    #[must_use]
    pub fn render_markdown(&self, generated_at: DateTime<Utc>) -> String {
        let mut lines = vec![
            "# Qualified leads report".to_string(),
            String::new(),
            format!("Generated {}", generated_at.to_rfc3339()),
            String::new(),
        ];

        if self.total == 0 {
            lines.push("No qualified leads yet.".to_string());
            return finish(&lines);
        }

        if self.is_low_confidence() {
            lines.push(format!(
                "> **Lower confidence:** {} of {} scores come from a model trained on \
                 bootstrap labels (heuristics, not real outcomes).",
                self.bootstrap_labeled, self.total
            ));
            lines.push(String::new());
        }

        lines.push(format!("- Scored leads: {}", self.total));
        lines.push(format!("- Qualified: {}", self.qualified));
        if let Some(stats) = self.stats {
            lines.push(format!(
                "- Intent score: min {}, max {}, mean {:.1}, median {:.1}",
                stats.min, stats.max, stats.mean, stats.median
            ));
        }

        lines.extend([
            String::new(),
            "## Intent score distribution".to_string(),
            String::new(),
            "| Range | Leads |".to_string(),
            "|-------|-------|".to_string(),
        ]);
        for (i, count) in self.histogram.iter().enumerate() {
            let low = i * 10;
            let high = if i == HISTOGRAM_BUCKETS - 1 { 100 } else { low + 9 };
            lines.push(format!("| {low}-{high} | {count} |"));
        }

        push_counts(&mut lines, "Diagnosed needs", "Need", &self.needs);
        push_counts(&mut lines, "Sources", "Source", &self.sources);
        finish(&lines)
    }
}

fn finish(lines: &[String]) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Counts table, most frequent first, ties by name.
fn push_counts(
    lines: &mut Vec<String>,
    title: &str,
    column: &str,
    counts: &BTreeMap<String, usize>,
) {
    let mut ordered: Vec<(&String, &usize)> = counts.iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    lines.extend([
        String::new(),
        format!("## {title}"),
        String::new(),
        format!("| {column} | Leads |"),
        "|------|-------|".to_string(),
    ]);
    lines.extend(
        ordered
            .into_iter()
            .map(|(name, count)| format!("| {name} | {count} |")),
    );
}

fn score_stats(mut scores: Vec<i64>) -> Option<ScoreStats> {
    if scores.is_empty() {
        return None;
    }
    scores.sort_unstable();

    let len = scores.len();
    #[allow(clippy::cast_precision_loss)]
    let mean = scores.iter().sum::<i64>() as f64 / len as f64;
    #[allow(clippy::cast_precision_loss)]
    let median = if len % 2 == 0 {
        (scores[len / 2 - 1] + scores[len / 2]) as f64 / 2.0
    } else {
        scores[len / 2] as f64
    };

    Some(ScoreStats {
        min: scores[0],
        max: scores[len - 1],
        mean,
        median,
    })
}
