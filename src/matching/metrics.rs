

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::strategies::StrategyKind;
use crate::store::EntityId;

/// Gini coefficient of per-entity match counts; 0.0 for empty or all-zero input.
pub fn gini(counts: &[u32]) -> f64 {
    let total: u64 = counts.iter().map(|&c| u64::from(c)).sum();
    if counts.is_empty() || total == 0 {
        return 0.0;
    }

    let mut sorted = counts.to_vec();
    sorted.sort_unstable();

    let n = sorted.len() as f64;
    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, &count)| (i as f64 + 1.0) * f64::from(count))
        .sum();

    (2.0 * weighted) / (n * total as f64) - (n + 1.0) / n
}


pub fn combined_score(accepted: usize, total_comparisons: usize, gini: f64) -> f64 {
    if total_comparisons == 0 {
        return 0.0;
    }
    (accepted as f64 / total_comparisons as f64) * (1.0 - gini)
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub strategy: StrategyKind,
    pub total_comparisons: usize,
    pub accepted: usize,
    pub per_entity_counts: BTreeMap<EntityId, u32>,
    pub gini: f64,
    pub combined_score: f64,
    pub budget_exhausted: bool,
}

impl RunMetrics {
    pub fn new(
        strategy: StrategyKind,
        total_comparisons: usize,
        accepted: usize,
        per_entity_counts: BTreeMap<EntityId, u32>,
        budget_exhausted: bool,
    ) -> Self {
        let counts: Vec<u32> = per_entity_counts.values().copied().collect();
        let gini = gini(&counts);
        Self {
            strategy,
            total_comparisons,
            accepted,
            per_entity_counts,
            gini,
            combined_score: combined_score(accepted, total_comparisons, gini),
            budget_exhausted,
        }
    }

    pub fn empty(strategy: StrategyKind, entities: impl IntoIterator<Item = EntityId>) -> Self {
        Self::new(
            strategy,
            0,
            0,
            entities.into_iter().map(|id| (id, 0)).collect(),
            false,
        )
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_comparisons == 0 {
            0.0
        } else {
            self.accepted as f64 / self.total_comparisons as f64
        }
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRecord {
    pub entity_a: EntityId,
    pub entity_b: EntityId,
    pub message_a: String,
    pub message_b: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    pub relevant: bool,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyReport {
    pub metrics: RunMetrics,
    pub comparisons: Vec<ComparisonRecord>,
}


/// Accumulates comparisons during one strategy run.
#[derive(Debug, Clone)]
pub struct MatchTally {
    counts: BTreeMap<EntityId, u32>,
    comparisons: Vec<ComparisonRecord>,
    accepted: usize,
}

impl MatchTally {
    pub fn new(entities: impl IntoIterator<Item = EntityId>) -> Self {
        Self {
            counts: entities.into_iter().map(|id| (id, 0)).collect(),
            comparisons: Vec::new(),
            accepted: 0,
        }
    }

    /// Accepted pairs credit both sides.
    pub fn record(&mut self, record: ComparisonRecord) {
        if record.relevant {
            self.accepted += 1;
            *self.counts.entry(record.entity_a).or_insert(0) += 1;
            *self.counts.entry(record.entity_b).or_insert(0) += 1;
        }
        self.comparisons.push(record);
    }

    pub fn total(&self) -> usize {
        self.comparisons.len()
    }

    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn finish(self, strategy: StrategyKind, budget_exhausted: bool) -> StrategyReport {
        StrategyReport {
            metrics: RunMetrics::new(
                strategy,
                self.comparisons.len(),
                self.accepted,
                self.counts,
                budget_exhausted,
            ),
            comparisons: self.comparisons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gini_degenerate() {
        assert_eq!(gini(&[]), 0.0);
        assert_eq!(gini(&[0, 0, 0]), 0.0);
    }

    #[test]
    fn test_gini_even_is_zero() {
        assert!(gini(&[1, 1, 1, 1]).abs() < 1e-12);
        assert!(gini(&[7, 7]).abs() < 1e-12);
    }

    #[test]
    fn test_gini_concentrated_reaches_max() {
        let concentrated = gini(&[1, 0, 0, 0]);
        assert!((concentrated - 0.75).abs() < 1e-12);
        assert!(concentrated > gini(&[1, 1, 1, 1]));
        assert!(gini(&[2, 1, 0, 0]) < concentrated);
    }

    #[test]
    fn test_gini_order_independent() {
        assert_eq!(gini(&[3, 0, 1]), gini(&[0, 1, 3]));
    }

    #[test]
    fn test_combined_score() {
        assert_eq!(combined_score(0, 0, 0.0), 0.0);
        assert!((combined_score(1, 2, 0.5) - 0.25).abs() < 1e-12);
        assert!((combined_score(4, 4, 0.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tally_symmetric_credit() {
        let mut tally = MatchTally::new([1, 2, 3]);
        let pair = |a, b, relevant| ComparisonRecord {
            entity_a: a,
            entity_b: b,
            message_a: "m".to_string(),
            message_b: "n".to_string(),
            similarity: None,
            relevant,
        };
        tally.record(pair(1, 2, true));
        tally.record(pair(1, 3, false));

        let report = tally.finish(StrategyKind::BruteForce, false);
        let metrics = report.metrics;
        assert_eq!(metrics.total_comparisons, 2);
        assert_eq!(metrics.accepted, 1);
        assert_eq!(metrics.per_entity_counts[&1], 1);
        assert_eq!(metrics.per_entity_counts[&2], 1);
        assert_eq!(metrics.per_entity_counts[&3], 0);
        assert!((metrics.success_rate() - 0.5).abs() < 1e-12);
        let expected_gini = gini(&[1, 1, 0]);
        assert!((metrics.gini - expected_gini).abs() < 1e-12);
        assert!((metrics.combined_score - 0.5 * (1.0 - expected_gini)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = RunMetrics::empty(StrategyKind::Combined, [1, 2]);
        assert_eq!(metrics.total_comparisons, 0);
        assert_eq!(metrics.combined_score, 0.0);
        assert_eq!(metrics.per_entity_counts.len(), 2);
    }
}
