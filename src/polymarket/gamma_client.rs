use reqwest::Client;

use super::http::{build_url, get_json_optional, ApiError};
use super::types::ApiProfile;

const GAMMA_API_BASE: &str = "https://gamma-api.polymarket.com";

#[derive(Debug, Clone)]
pub struct GammaClient {
    http: Client,
    base_url: String,
}

impl GammaClient {
    pub fn new(http: Client) -> Self {
        Self {
            http,
            base_url: GAMMA_API_BASE.into(),
        }
    }

    /// Fetch a wallet's public profile. Wallets that never created one 404.
    pub async fn get_public_profile(&self, wallet: &str) -> Result<Option<ApiProfile>, ApiError> {
        let url = build_url(
            &self.base_url,
            "/public-profile",
            &[("address", wallet.to_string())],
        )?;
        get_json_optional(&self.http, url).await
    }
}
