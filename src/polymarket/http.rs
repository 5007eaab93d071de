use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("malformed response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid request URL: {0}")]
    Url(String),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Status { status: 404, .. })
    }
}

/// Join `base` and `path` and append query parameters.
pub(crate) fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url, ApiError> {
    let raw = format!("{}{}", base.trim_end_matches('/'), path);
    Url::parse_with_params(&raw, params).map_err(|e| ApiError::Url(e.to_string()))
}

/// GET `url` and decode the body into `T`.
pub(crate) async fn get_json<T: DeserializeOwned>(http: &Client, url: Url) -> Result<T, ApiError> {
    match get_json_optional(http, url.clone()).await? {
        Some(v) => Ok(v),
        None => Err(ApiError::Status {
            endpoint: url.path().to_string(),
            status: StatusCode::NOT_FOUND.as_u16(),
        }),
    }
}

/// GET `url` and decode the body; a 404 yields `None`.
pub(crate) async fn get_json_optional<T: DeserializeOwned>(
    http: &Client,
    url: Url,
) -> Result<Option<T>, ApiError> {
    let endpoint = url.path().to_string();
    let resp = http.get(url).send().await?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(None);
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            endpoint,
            status: status.as_u16(),
        });
    }

    let body = resp.text().await?;
    serde_json::from_str(&body)
        .map(Some)
        .map_err(|source| ApiError::Decode { endpoint, source })
}
