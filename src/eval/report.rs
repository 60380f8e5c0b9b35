

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::Result;
use crate::matching::{RunMetrics, StrategyReport};

pub const SUMMARY_FILE: &str = "summary.json";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub total_comparisons: usize,
    pub successful_pairs: usize,
    pub success_rate: f64,
    pub gini: f64,
    pub metric: f64,
}

impl From<&RunMetrics> for SummaryEntry {
    fn from(metrics: &RunMetrics) -> Self {
        Self {
            total_comparisons: metrics.total_comparisons,
            successful_pairs: metrics.accepted,
            success_rate: metrics.success_rate(),
            gini: metrics.gini,
            metric: metrics.combined_score,
        }
    }
}


pub fn summarize(reports: &[StrategyReport]) -> BTreeMap<String, SummaryEntry> {
    reports
        .iter()
        .map(|r| (r.metrics.strategy.to_string(), SummaryEntry::from(&r.metrics)))
        .collect()
}


pub fn results_path(dir: &Path, report: &StrategyReport) -> PathBuf {
    dir.join(format!("{}_results.json", report.metrics.strategy))
}

/// Writes one `<strategy>_results.json` per report and the shared `summary.json`.
pub fn write_reports(dir: &Path, reports: &[StrategyReport]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    for report in reports {
        let path = results_path(dir, report);
        fs::write(&path, serde_json::to_string_pretty(report)?)?;
        info!("Wrote {}", path.display());
    }

    let summary_path = dir.join(SUMMARY_FILE);
    fs::write(
        &summary_path,
        serde_json::to_string_pretty(&summarize(reports))?,
    )?;
    info!("Wrote {}", summary_path.display());
    Ok(summary_path)
}


pub fn format_table(reports: &[StrategyReport]) -> String {
    let mut out = format!(
        "{:<20} {:>11} {:>8} {:>8} {:>7} {:>7}\n",
        "strategy", "comparisons", "accepted", "success", "gini", "metric"
    );
    for report in reports {
        let m = &report.metrics;
        out.push_str(&format!(
            "{:<20} {:>11} {:>8} {:>8.3} {:>7.3} {:>7.3}{}\n",
            m.strategy.as_str(),
            m.total_comparisons,
            m.accepted,
            m.success_rate(),
            m.gini,
            m.combined_score,
            if m.budget_exhausted { "  (budget)" } else { "" }
        ));
    }
    out
}
