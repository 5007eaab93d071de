pub mod api;
pub mod claims;
pub mod config;
pub mod db;
pub mod errors;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod polymarket;
pub mod services;
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

use std::sync::Arc;

use crate::claims::ClaimEngine;
use crate::config::AppConfig;
use crate::db::{ClaimLog, TopTraderStore, TradeStore};
use crate::services::ClassificationService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub trades: Arc<dyn TradeStore>,
    pub claim_log: Arc<dyn ClaimLog>,
    pub top_traders: Arc<dyn TopTraderStore>,
    pub classifier: Arc<ClassificationService>,
    pub claims: Arc<ClaimEngine>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
