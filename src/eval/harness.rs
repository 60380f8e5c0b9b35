

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use super::chart::write_chart;
use super::dataset::Dataset;
use super::report::{format_table, write_reports};
use crate::core::error::Result;
use crate::core::{KindredConfig, Pacer};
use crate::llm::{EmbeddingProvider, EmbeddingProviderFactory, LlmProvider, LlmProviderFactory};
use crate::llm::judge::RelevanceJudge;
use crate::matching::{
    CacheStats, ComparisonBudget, EmbeddingAdapter, EmbeddingCache, FallbackPolicy, MatchContext,
    MatchingConfig, Population, RunMetrics, StrategyKind, StrategyReport,
};


#[derive(Debug, Clone)]
pub struct Evaluation {
    pub reports: Vec<StrategyReport>,
    pub cache: CacheStats,
}

impl Evaluation {
    pub fn metrics(&self) -> Vec<RunMetrics> {
        self.reports.iter().map(|r| r.metrics.clone()).collect()
    }

    /// Highest combined score; ties go to the earlier strategy.
    pub fn best(&self) -> Option<&RunMetrics> {
        self.reports
            .iter()
            .map(|r| &r.metrics)
            .reduce(|best, m| if m.combined_score > best.combined_score { m } else { best })
    }

    pub fn write(&self, dir: &Path) -> Result<()> {
        write_reports(dir, &self.reports)?;
        let chart = write_chart(dir, &self.metrics())?;
        info!("Wrote {}", chart.display());
        Ok(())
    }
}


/// Runs every matching strategy over one population under a shared comparison budget.
pub struct EvaluationHarness {
    matching: MatchingConfig,
    adapter: EmbeddingAdapter,
    judge: RelevanceJudge,
    cache_dir: PathBuf,
}

impl EvaluationHarness {
    pub fn new(
        config: &KindredConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let cache_dir = config.embeddings_dir();
        let policy = if config.matching.random_fallback {
            FallbackPolicy::RandomVector {
                dimensions: config.embedding_dimensions,
            }
        } else {
            FallbackPolicy::Skip
        };

        Self {
            matching: config.matching.clone(),
            adapter: EmbeddingAdapter::new(
                embedder,
                EmbeddingCache::load(&cache_dir),
                policy,
                Pacer::from_millis(config.pacing.embedding_delay_ms),
                config.matching.seed,
            ),
            judge: RelevanceJudge::new(llm, Pacer::from_millis(config.pacing.relevance_delay_ms)),
            cache_dir,
        }
    }

    pub fn from_config(config: &KindredConfig) -> Result<Self> {
        let embedder = EmbeddingProviderFactory::from_config(config)?;
        let llm = LlmProviderFactory::from_config(config)?;
        Ok(Self::new(config, embedder, llm))
    }

    pub async fn run(&self, population: &Population) -> Evaluation {
        let ctx = MatchContext {
            adapter: &self.adapter,
            judge: &self.judge,
            config: &self.matching,
        };
        info!(
            "Evaluating {} strategies over {} entities ({} messages), budget {}",
            StrategyKind::ALL.len(),
            population.len(),
            population.message_count(),
            self.matching.max_total_comparisons
        );

        let mut reports = Vec::with_capacity(StrategyKind::ALL.len());
        for kind in StrategyKind::ALL {
            let mut budget = ComparisonBudget::share_of(
                self.matching.max_total_comparisons,
                StrategyKind::ALL.len(),
            );
            info!("Running {} (budget {})", kind, budget.limit());

            let report = match kind.strategy().run(population, &ctx, &mut budget).await {
                Ok(report) => report,
                Err(e) => {
                    error!("Strategy {} failed: {}", kind, e);
                    StrategyReport {
                        metrics: RunMetrics::empty(kind, population.ids()),
                        comparisons: Vec::new(),
                    }
                }
            };

            if let Err(e) = self.adapter.flush(&self.cache_dir) {
                warn!("Failed to persist embedding cache: {}", e);
            }
            reports.push(report);
        }

        Evaluation {
            reports,
            cache: self.adapter.cache_stats(),
        }
    }
}


/// `analyze` mode: load the dataset, evaluate and write results.
pub async fn analyze(config: &KindredConfig) -> Result<Evaluation> {
    let dataset = Dataset::load(&config.data_dir, config.matching.max_entities)?;
    let population = dataset.population(config.matching.profile_includes_messages);

    let harness = EvaluationHarness::from_config(config)?;
    let evaluation = harness.run(&population).await;
    evaluation.write(&config.results_dir())?;

    info!("\n{}", format_table(&evaluation.reports));
    if let Some(best) = evaluation.best() {
        info!(
            "Best strategy: {} (metric {:.4})",
            best.strategy, best.combined_score
        );
    }
    Ok(evaluation)
}
