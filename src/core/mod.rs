

pub mod config;
pub mod error;
pub mod pacing;

pub use config::{KindredConfig, PacingConfig};
pub use error::{KindredError, Result};
pub use pacing::Pacer;
