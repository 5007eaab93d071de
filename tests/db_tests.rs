mod common;

use rust_decimal_macros::dec;

use polydash::db::{BetLog, ClaimLog, PgStore, TopTraderStore, TradeStore};
use polydash::models::{
    BetStatus, ClaimStatus, NewBet, NewClaimLogEntry, Side, TopTraderTradeDelta,
    TradeClassification,
};
use polydash::testkit::fixtures;

use common::{new_trade, setup_test_db};

const WALLET: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

#[tokio::test]
async fn test_trade_insert_is_idempotent() {
    let Some(db) = setup_test_db().await else { return };
    let store = PgStore::new(db.pool.clone());
    let trade = new_trade("0xdb1", WALLET, &fixtures::condition_id(1), Side::Buy, dec!(0.5));

    assert!(store.insert_trade_if_new(&trade).await.unwrap());
    assert!(!store.insert_trade_if_new(&trade).await.unwrap());

    let stored = store.get_trade("0xdb1").await.unwrap().unwrap();
    assert_eq!(stored.usd_value, dec!(2500));
    assert_eq!(stored.side, "BUY");
    assert!(stored.take_bet.is_none());
}

#[tokio::test]
async fn test_classification_and_take_bet_roundtrip() {
    let Some(db) = setup_test_db().await else { return };
    let store = PgStore::new(db.pool.clone());
    let c = fixtures::condition_id(1);
    store
        .insert_trade_if_new(&new_trade("0xdb2", WALLET, &c, Side::Buy, dec!(0.5)))
        .await
        .unwrap();

    assert_eq!(store.unclassified_wallets(100).await.unwrap(), vec![WALLET.to_string()]);

    let updated = store
        .apply_classification(
            WALLET,
            &TradeClassification {
                good_trader: true,
                insider_score: 10,
                bot_score: 0,
                whale_score: 25,
                follow_score: 80,
                classification: "normal".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated, 1);
    assert!(store.unclassified_wallets(100).await.unwrap().is_empty());

    assert_eq!(store.undecided_take_bets(WALLET).await.unwrap().len(), 1);
    assert!(!store.has_take_bet(WALLET, &c, "Yes").await.unwrap());
    store.set_take_bet("0xdb2", true).await.unwrap();
    assert!(store.has_take_bet(WALLET, &c, "Yes").await.unwrap());
    assert!(store.undecided_take_bets(WALLET).await.unwrap().is_empty());

    let uncopied = store.uncopied_take_bets(10).await.unwrap();
    assert_eq!(uncopied.len(), 1);

    let bet = NewBet {
        transaction_hash: "0xdb2".into(),
        condition_id: c.clone(),
        outcome: "Yes".into(),
        price: dec!(0.5),
        size: dec!(20),
        status: BetStatus::DryRun,
        order_id: None,
        error: None,
    };
    assert!(store.record_bet(&bet).await.unwrap().is_some());
    assert!(store.record_bet(&bet).await.unwrap().is_none());
    assert!(store.uncopied_take_bets(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_claim_log_allows_one_claimed_row_per_condition() {
    let Some(db) = setup_test_db().await else { return };
    let store = PgStore::new(db.pool.clone());
    let position = fixtures::claimable(&fixtures::condition_id(9), dec!(12));

    let failed = NewClaimLogEntry::for_position(&position, ClaimStatus::Failed, None, Some("boom".into()));
    store.record_claim(&failed).await.unwrap();
    store.record_claim(&failed).await.unwrap();

    let claimed = NewClaimLogEntry::for_position(&position, ClaimStatus::Claimed, Some("0xtx".into()), None);
    store.record_claim(&claimed).await.unwrap();
    assert!(store.record_claim(&claimed).await.is_err());

    let ids = store
        .claimed_condition_ids(&[position.condition_id.clone(), fixtures::condition_id(10)])
        .await
        .unwrap();
    assert_eq!(ids.len(), 1);
    assert!(ids.contains(&position.condition_id));
    assert_eq!(store.recent_claims(10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_ledger_accumulates_per_key() {
    let Some(db) = setup_test_db().await else { return };
    let store = PgStore::new(db.pool.clone());

    let delta = |size, value, ts| TopTraderTradeDelta {
        proxy_wallet: WALLET.into(),
        slug: "will-it-rain".into(),
        title: Some("Will it rain?".into()),
        condition_id: Some(fixtures::condition_id(1)),
        side: "BUY".into(),
        outcome: "Yes".into(),
        size,
        value,
        trade_count: 1,
        first_timestamp: ts,
        last_timestamp: ts,
    };

    store.accumulate_trades(&delta(dec!(100), dec!(40), 10)).await.unwrap();
    store.accumulate_trades(&delta(dec!(100), dec!(60), 20)).await.unwrap();

    let rows = store.trader_ledger(WALLET).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].trade_count, 2);
    assert_eq!(rows[0].avg_price, dec!(0.5));
    assert_eq!((rows[0].first_timestamp, rows[0].last_timestamp), (10, 20));

    let last = store.ledger_last_timestamps(WALLET).await.unwrap();
    assert_eq!(
        last.get(&("will-it-rain".to_string(), "BUY".to_string(), "Yes".to_string())),
        Some(&20)
    );
}
