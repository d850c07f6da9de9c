/// HTTP API Contract Tests
///
/// Tests for the JSON shapes served and consumed by the backend:
/// - Screener records (GET /screener/stocks)
/// - Trade history (GET /portfolio/trade_history)
/// - Market summary and stock detail (GET /market/*)
/// - Broker payloads (fund limits, order acknowledgement, order detail)
/// - Error bodies
///
/// NOTE: These tests serialize and deserialize the crate's own types.
/// Full integration tests against a live database require running the server.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::NaiveDate;
use serde_json::{json, Value};
use stockfolio_backend::errors::AppError;
use stockfolio_backend::external::broker::{FundLimits, OrderAck, OrderDetail};
use stockfolio_backend::models::{
    round2, MarketOverview, MarketSummary, ScanRecord, StockDetail, StockProfile,
    StoredScanRecord, TradeAction, TradeFill, TradeStatus,
};
use stockfolio_backend::routes::portfolio::{history_range, CombinedTrades, TradeHistoryParams};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

// ---------------------------------------------------------------------------
// Screener records
// ---------------------------------------------------------------------------

#[cfg(test)]
mod screener_records {
    use super::*;

    fn stored(pk: i64) -> StoredScanRecord {
        StoredScanRecord {
            pk,
            record: ScanRecord::scanned(
                Some("Acme Ltd".into()),
                "ACME".into(),
                None,
                4.1,
                Some("210.5".into()),
                Some("120000".into()),
                day(3),
            ),
        }
    }

    #[test]
    fn test_record_has_all_fields() {
        let body = serde_json::to_value(stored(1)).unwrap();
        let fields = body.as_object().unwrap();
        for field in [
            "_id", "id", "stock_name", "symbol", "security_id", "change", "price", "volume",
            "quantity", "buy_price", "sell_price", "status", "state", "date",
        ] {
            assert!(fields.contains_key(field), "missing field {field}");
        }
        assert_eq!(fields.len(), 14);
    }

    #[test]
    fn test_scanned_record_values() {
        let body = serde_json::to_value(stored(7)).unwrap();
        assert_eq!(body["_id"], 7);
        assert_eq!(body["status"], "scanned");
        assert_eq!(body["state"], "inactive");
        assert_eq!(body["date"], "2024-06-03");
        assert_eq!(body["security_id"], Value::Null);
        assert_eq!(body["id"].as_str().map(str::len), Some(8));
    }

    #[test]
    fn test_state_tracks_status() {
        let mut record = stored(1);
        let fill = TradeFill {
            status: TradeAction::Buy.resulting_status(),
            quantity: 20,
            price: 2000.0,
        };
        fill.apply(&mut record.record);

        let body = serde_json::to_value(&record).unwrap();
        assert_eq!(body["status"], "bought");
        assert_eq!(body["state"], "active");
        assert_eq!(body["buy_price"], 2000.0);
    }

    #[test]
    fn test_status_wire_names() {
        let names: Vec<Value> = [TradeStatus::Scanned, TradeStatus::Bought, TradeStatus::Sold]
            .iter()
            .map(|s| serde_json::to_value(s).unwrap())
            .collect();
        assert_eq!(names, [json!("scanned"), json!("bought"), json!("sold")]);
    }
}

// ---------------------------------------------------------------------------
// Portfolio pass-through
// ---------------------------------------------------------------------------

#[cfg(test)]
mod portfolio {
    use super::*;

    fn params(from: Option<u32>, to: Option<u32>) -> TradeHistoryParams {
        TradeHistoryParams { from_date: from.map(day), to_date: to.map(day), page: None }
    }

    #[test]
    fn test_trade_history_keys() {
        let body = serde_json::to_value(CombinedTrades {
            trade_history: vec![],
            trade_book: vec![],
        })
        .unwrap();
        assert!(body["tradeHistory"].is_array());
        assert!(body["tradeBook"].is_array());
    }

    #[test]
    fn test_default_history_is_the_last_week() {
        assert_eq!(history_range(&params(None, None), day(10)).unwrap(), (day(4), day(10)));
        assert_eq!(history_range(&params(None, Some(8)), day(10)).unwrap(), (day(2), day(8)));
    }

    #[test]
    fn test_inverted_history_range_is_rejected() {
        let err = history_range(&params(Some(9), Some(3)), day(10)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_fund_limits_balance_field() {
        // The broker spells it this way on the wire.
        let limits: FundLimits = serde_json::from_value(
            json!({ "dhanClientId": "1000001", "availabelBalance": 84000.0 }),
        )
        .unwrap();
        assert_eq!(limits.available_balance, 84000.0);
        assert_eq!(limits.dhan_client_id.as_deref(), Some("1000001"));

        let corrected: FundLimits =
            serde_json::from_value(json!({ "availableBalance": 1200.5 })).unwrap();
        assert_eq!(corrected.available_balance, 1200.5);
    }

    #[test]
    fn test_order_ack() {
        let ack: OrderAck =
            serde_json::from_value(json!({ "orderId": "1001", "orderStatus": "TRANSIT" })).unwrap();
        assert!(!ack.is_rejected());

        let ack: OrderAck =
            serde_json::from_value(json!({ "orderId": "1002", "orderStatus": "Rejected" })).unwrap();
        assert!(ack.is_rejected());
    }

    #[test]
    fn test_order_detail_average_price() {
        let details: Vec<OrderDetail> = serde_json::from_value(json!([
            { "orderId": "1001", "orderStatus": "TRADED", "averageTradedPrice": 2001.5 }
        ]))
        .unwrap();
        assert_eq!(details[0].average_traded_price, 2001.5);

        let pending: OrderDetail =
            serde_json::from_value(json!({ "orderId": "1002", "orderStatus": "PENDING" })).unwrap();
        assert_eq!(pending.average_traded_price, 0.0);
    }
}

// ---------------------------------------------------------------------------
// Market data
// ---------------------------------------------------------------------------

#[cfg(test)]
mod market {
    use super::*;

    fn summary(index_name: &str) -> MarketSummary {
        MarketSummary {
            index_name: index_name.into(),
            current_price: round2(22_104.456),
            open_price: 22_050.0,
            high_price: 22_150.0,
            low_price: 21_990.0,
            previous_close: 22_000.12,
            volume: 312_000,
        }
    }

    #[test]
    fn test_summary_shape() {
        let body = serde_json::to_value(MarketOverview {
            nifty_50: summary("^NSEI"),
            sensex: summary("^BSESN"),
        })
        .unwrap();
        assert_eq!(body["nifty_50"]["current_price"].as_f64(), Some(22_104.46));
        assert_eq!(body["sensex"]["index_name"], "^BSESN");
        assert!(body["sensex"]["volume"].is_i64());
    }

    #[test]
    fn test_detail_shape() {
        let profile = StockProfile {
            long_name: Some("Acme Ltd".into()),
            current_price: Some(210.0),
            previous_close: Some(200.0),
            fifty_two_week_low: Some(150.5),
            fifty_two_week_high: Some(260.0),
            market_cap: Some(6.0e10),
            ..Default::default()
        };
        let body = serde_json::to_value(StockDetail::from_profile("ACME.NS", profile).unwrap())
            .unwrap();

        assert_eq!(body["percent_change"], 5.0);
        assert_eq!(body["52_week_range"], "150.5 - 260");
        assert_eq!(body["category"], "Mid-Cap");
        assert_eq!(body["sector"], "Unknown Sector");
    }

    #[test]
    fn test_detail_without_market_cap() {
        assert!(StockDetail::from_profile("ACME.NS", StockProfile::default()).is_none());
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[cfg(test)]
mod errors {
    use super::*;

    async fn error_body(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_error_body_carries_message() {
        let (status, body) =
            error_body(AppError::NotFound("Market cap not available for the given symbol".into()))
                .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Market cap not available for the given symbol");
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_validation_is_a_client_error() {
        let (status, body) = error_body(AppError::Validation("bad date".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Validation error: bad date");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_a_server_error() {
        let (status, _) = error_body(AppError::External("timeout".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
