pub mod cache;
pub mod classifier;
pub mod stats;
pub mod take_bet;

pub use cache::ClassificationCache;
pub use classifier::{classify, classify_trader, ScoreReasons, TraderClassification, TraderType};
pub use stats::{derive_metrics, TraderData, TraderMetrics};
pub use take_bet::TakeBetRules;
