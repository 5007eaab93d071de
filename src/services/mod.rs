pub mod auto_copy;
pub mod claim_sync;
pub mod classification;
pub mod classification_sync;
pub mod leaderboard_sync;
pub mod resolution_sync;
pub mod scheduler;
pub mod trade_sync;

pub use auto_copy::{copy_take_bets, CopyReport, OrderPlacer};
pub use classification::{ClassificationService, ClassifyReport};
pub use classification_sync::sync_classifications;
pub use leaderboard_sync::{sync_leaderboard, LeaderboardReport};
pub use resolution_sync::{sync_resolutions, ResolutionReport};
pub use scheduler::run_periodic;
pub use trade_sync::{sync_trades, TradeSyncReport};
