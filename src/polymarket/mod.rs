pub mod auth;
pub mod chain;
pub mod clob_client;
pub mod data_client;
pub mod gamma_client;
pub mod gateway;
pub mod http;
pub mod relayer;
pub mod trading;
pub mod types;

pub use auth::BuilderAuth;
pub use chain::{ChainClient, ChainError};
pub use clob_client::ClobClient;
pub use data_client::DataClient;
pub use gamma_client::GammaClient;
pub use gateway::{MarketDataGateway, PolymarketGateway};
pub use http::ApiError;
pub use relayer::{RelayerClient, RelayerError, SubmittedTransaction};
pub use trading::{PlacedOrder, TradingClient};
pub use types::{
    ApiActivity, ApiClosedPosition, ApiLeaderboardEntry, ApiMarket, ApiPosition, ApiProfile,
    ApiTrade, MarketStatus,
};
