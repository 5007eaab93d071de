use rust_decimal::Decimal;

use super::classifier::{TraderClassification, TraderType};
use crate::models::Side;

/// Thresholds a classified trade must clear to be flagged as a take bet.
#[derive(Debug, Clone)]
pub struct TakeBetRules {
    pub min_follow_score: i32,
    pub min_price: Decimal,
    pub max_price: Decimal,
}

impl Default for TakeBetRules {
    fn default() -> Self {
        Self {
            min_follow_score: 60,
            min_price: Decimal::new(5, 2),
            max_price: Decimal::new(95, 2),
        }
    }
}

impl TakeBetRules {
    /// Trader and trade checks. The one-per-(wallet, condition, outcome)
    /// check needs the store and is applied by the caller.
    pub fn qualifies(&self, classification: &TraderClassification, side: Side, price: Decimal) -> bool {
        classification.follow_worthy
            && classification.follow_score >= self.min_follow_score
            && side == Side::Buy
            && price >= self.min_price
            && price <= self.max_price
            && classification.trader_type != TraderType::Bot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intelligence::classifier::classify;
    use crate::intelligence::stats::TraderData;
    use chrono::Utc;

    fn follow_worthy(score: i32) -> TraderClassification {
        let mut c = classify(&TraderData::default(), Utc::now());
        c.follow_score = score;
        c.follow_worthy = score >= 50;
        c.trader_type = TraderType::Normal;
        c
    }

    #[test]
    fn qualifying_buy_in_band() {
        let rules = TakeBetRules::default();
        assert!(rules.qualifies(&follow_worthy(70), Side::Buy, Decimal::new(40, 2)));
        assert!(rules.qualifies(&follow_worthy(60), Side::Buy, Decimal::new(95, 2)));
    }

    #[test]
    fn rejects_each_failed_condition() {
        let rules = TakeBetRules::default();
        let price = Decimal::new(40, 2);

        assert!(!rules.qualifies(&follow_worthy(55), Side::Buy, price));
        assert!(!rules.qualifies(&follow_worthy(80), Side::Sell, price));
        assert!(!rules.qualifies(&follow_worthy(80), Side::Buy, Decimal::new(4, 2)));
        assert!(!rules.qualifies(&follow_worthy(80), Side::Buy, Decimal::new(96, 2)));

        let mut bot = follow_worthy(80);
        bot.trader_type = TraderType::Bot;
        assert!(!rules.qualifies(&bot, Side::Buy, price));
    }
}
