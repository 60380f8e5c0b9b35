

pub mod acceptance;
pub mod config;
pub mod explain;
pub mod interests;
pub mod service;

pub use acceptance::{Assessment, assess};
pub use config::RecommendConfig;
pub use explain::{Explainer, fallback_explanation};
pub use interests::{common_interests, parse_interests};
pub use service::{GenerationOutcome, RecommendationService};
