use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Lenient numeric fields
// ---------------------------------------------------------------------------

/// Upstream feeds mix JSON numbers and numeric strings; accept both.
fn lenient_decimal<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    let text = match value {
        None | Some(Value::Null) => return Ok(Decimal::ZERO),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Decimal::ZERO),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(serde::de::Error::custom(format!(
                "expected number or numeric string, got {other}"
            )))
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(serde::de::Error::custom)
}

fn lenient_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    let value = Option::<Value>::deserialize(d)?;
    match value {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .ok_or_else(|| serde::de::Error::custom("integer out of range")),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected integer or numeric string, got {other}"
        ))),
    }
}

fn empty_as_none<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(d)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

// ---------------------------------------------------------------------------
// Trade (Data API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrade {
    pub proxy_wallet: String,
    pub side: String,
    #[serde(default)]
    pub asset: String,
    pub condition_id: String,
    #[serde(deserialize_with = "lenient_decimal")]
    pub size: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub price: Decimal,
    #[serde(deserialize_with = "lenient_i64")]
    pub timestamp: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub outcome: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub transaction_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// Positions (Data API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPosition {
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    #[serde(default)]
    pub asset: Option<String>,
    pub condition_id: String,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub size: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub avg_price: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub initial_value: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub current_value: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cash_pnl: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub realized_pnl: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub cur_price: Decimal,
    #[serde(default)]
    pub redeemable: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub negative_risk: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiClosedPosition {
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub avg_price: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub total_bought: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub realized_pnl: Decimal,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Activity (Data API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiActivity {
    #[serde(rename = "type")]
    pub activity_type: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub timestamp: i64,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub size: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub usdc_size: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub price: Decimal,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
}

impl ApiActivity {
    pub fn is_trade(&self) -> bool {
        self.activity_type.eq_ignore_ascii_case("TRADE")
    }
}

// ---------------------------------------------------------------------------
// Leaderboard / profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLeaderboardEntry {
    #[serde(deserialize_with = "lenient_i64")]
    pub rank: i64,
    pub proxy_wallet: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub vol: Decimal,
    #[serde(default, deserialize_with = "lenient_decimal")]
    pub pnl: Decimal,
    #[serde(default)]
    pub x_username: Option<String>,
    #[serde(default)]
    pub verified_badge: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub pseudonym: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub bio: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub profile_image: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub x_username: Option<String>,
    #[serde(default)]
    pub verified_badge: bool,
}

// ---------------------------------------------------------------------------
// Market / Token (CLOB API)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiToken {
    #[serde(default)]
    pub token_id: String,
    pub outcome: String,
    #[serde(default)]
    pub winner: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiMarket {
    pub condition_id: String,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub market_slug: Option<String>,
    #[serde(default)]
    pub tokens: Vec<ApiToken>,
    #[serde(default)]
    pub closed: Option<bool>,
    #[serde(default)]
    pub end_date_iso: Option<String>,
    #[serde(default)]
    pub neg_risk: Option<bool>,
}

/// Resolution state of a market, reduced from the CLOB market payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketStatus {
    pub resolved: bool,
    pub winning_outcome: Option<String>,
    pub end_date: Option<DateTime<Utc>>,
}

impl From<&ApiMarket> for MarketStatus {
    fn from(market: &ApiMarket) -> Self {
        let winning_outcome = market
            .tokens
            .iter()
            .find(|t| t.winner == Some(true))
            .map(|t| t.outcome.clone());

        Self {
            resolved: market.closed == Some(true) && winning_outcome.is_some(),
            winning_outcome,
            end_date: market.end_date_iso.as_deref().and_then(parse_end_date),
        }
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn parse_end_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_accepts_string_and_number_fields() {
        let json = r#"{
            "proxyWallet": "0xabc",
            "side": "BUY",
            "asset": "123",
            "conditionId": "0xcond",
            "size": "150.5",
            "price": 0.42,
            "timestamp": 1700000000,
            "outcome": "Yes",
            "transactionHash": "0xhash"
        }"#;
        let trade: ApiTrade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.size, Decimal::new(1505, 1));
        assert_eq!(trade.price, Decimal::new(42, 2));
        assert_eq!(trade.transaction_hash.as_deref(), Some("0xhash"));
    }

    #[test]
    fn trade_missing_condition_is_a_decode_error() {
        let json = r#"{"proxyWallet": "0xabc", "side": "BUY", "size": 1, "price": 1, "timestamp": 1}"#;
        assert!(serde_json::from_str::<ApiTrade>(json).is_err());
    }

    #[test]
    fn leaderboard_rank_as_string() {
        let json = r#"{"rank": "17", "proxyWallet": "0xabc", "vol": 1000, "pnl": "25.5"}"#;
        let entry: ApiLeaderboardEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.rank, 17);
        assert_eq!(entry.pnl, Decimal::new(255, 1));
        assert!(!entry.verified_badge);
    }

    #[test]
    fn market_status_requires_closed_and_winner() {
        let json = r#"{
            "condition_id": "0xcond",
            "closed": true,
            "end_date_iso": "2024-11-05",
            "tokens": [
                {"token_id": "1", "outcome": "Yes", "winner": false},
                {"token_id": "2", "outcome": "No", "winner": true}
            ]
        }"#;
        let market: ApiMarket = serde_json::from_str(json).unwrap();
        let status = MarketStatus::from(&market);
        assert!(status.resolved);
        assert_eq!(status.winning_outcome.as_deref(), Some("No"));
        assert!(status.end_date.is_some());

        let open = ApiMarket { closed: Some(false), ..market };
        assert!(!MarketStatus::from(&open).resolved);
    }

    #[test]
    fn empty_profile_fields_become_none() {
        let json = r#"{"bio": "", "profileImage": "  ", "xUsername": "trader"}"#;
        let profile: ApiProfile = serde_json::from_str(json).unwrap();
        assert!(profile.bio.is_none());
        assert!(profile.profile_image.is_none());
        assert_eq!(profile.x_username.as_deref(), Some("trader"));
    }
}
