

pub mod chart;
pub mod dataset;
pub mod harness;
pub mod report;
pub mod synthetic;

pub use chart::{CHART_FILE, write_chart};
pub use dataset::{ChatMessage, ChatRecord, Dataset, ProfileRecord};
pub use harness::{Evaluation, EvaluationHarness, analyze};
pub use report::{SUMMARY_FILE, SummaryEntry, format_table, summarize, write_reports};
pub use synthetic::{SyntheticGenerator, generate};
