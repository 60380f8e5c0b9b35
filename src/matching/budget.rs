

use tracing::info;

/// Counter for relevance checks, threaded explicitly through a strategy run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonBudget {
    limit: usize,
    used: usize,
}

impl ComparisonBudget {
    pub fn new(limit: usize) -> Self {
        Self { limit, used: 0 }
    }

    /// Even share of `total` for one of `strategies` strategies run in the same session.
    pub fn share_of(total: usize, strategies: usize) -> Self {
        Self::new(total / strategies.max(1))
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.used)
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit
    }

    pub fn record(&mut self) {
        self.used += 1;
        if self.is_exhausted() {
            info!("Comparison budget reached ({})", self.limit);
        }
    }
}
