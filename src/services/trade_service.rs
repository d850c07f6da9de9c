use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::TradingConfig;
use crate::errors::AppError;
use crate::external::broker::{
    Broker, OrderAck, OrderRequest, OrderSide, OrderType, ProductType,
};
use crate::external::quote_provider::{QuoteError, QuoteProvider};
use crate::models::{StoredScanRecord, TradeAction, TradeFill};
use crate::store::{RecordFilter, RecordStore};

pub const EXCHANGE_SEGMENT: &str = "NSE_EQ";

/// Result of one buy or sell run. Only `Bought` and `Sold` changed the store.
#[derive(Debug, Clone)]
pub enum TradeOutcome {
    Bought(StoredScanRecord),
    Sold(StoredScanRecord),
    /// No `scanned` record for today.
    NothingToBuy,
    /// No `bought` record on any date.
    NothingToSell,
    /// Funds do not cover a single share.
    InsufficientFunds { symbol: String, funds: f64, price: f64 },
    /// Another run moved the record on between read and write.
    Superseded { pk: i64 },
}

impl TradeOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TradeOutcome::Bought(_) => "bought",
            TradeOutcome::Sold(_) => "sold",
            TradeOutcome::NothingToBuy => "nothing_to_buy",
            TradeOutcome::NothingToSell => "nothing_to_sell",
            TradeOutcome::InsufficientFunds { .. } => "insufficient_funds",
            TradeOutcome::Superseded { .. } => "superseded",
        }
    }

    pub fn changed_store(&self) -> bool {
        matches!(self, TradeOutcome::Bought(_) | TradeOutcome::Sold(_))
    }
}

/// Live buying power less the safety margin; above `threshold` only half
/// of it is put into a single trade.
pub fn available_funds(balance: f64, safety_margin: f64, threshold: f64) -> f64 {
    let funds = balance - safety_margin;
    if funds > threshold {
        funds / 2.0
    } else {
        funds
    }
}

/// Whole shares affordable at `price`.
pub fn quantity_for(funds: f64, price: f64) -> i64 {
    if funds <= 0.0 || price <= 0.0 || !funds.is_finite() || !price.is_finite() {
        return 0;
    }
    (funds / price).floor() as i64
}

/// Drives the daily record through `scanned → bought → sold`.
///
/// Live mode places real market orders and records the broker's average
/// traded price; simulated mode skips the broker and records the quoted
/// price. A failure at any step leaves the record as it was.
pub struct TradeLifecycle {
    store: Arc<dyn RecordStore>,
    quotes: Arc<dyn QuoteProvider>,
    broker: Arc<dyn Broker>,
    config: TradingConfig,
}

impl TradeLifecycle {
    pub fn new(
        store: Arc<dyn RecordStore>,
        quotes: Arc<dyn QuoteProvider>,
        broker: Arc<dyn Broker>,
        config: TradingConfig,
    ) -> Self {
        Self { store, quotes, broker, config }
    }

    pub async fn execute(&self, action: TradeAction, today: NaiveDate) -> Result<TradeOutcome, AppError> {
        info!(
            "Running {} {} for {} on {}",
            self.config.mode,
            action,
            today,
            self.store.collection().table_name()
        );

        match action {
            TradeAction::Buy => self.buy(today).await,
            TradeAction::Sell => self.sell(today).await,
        }
    }

    async fn buy(&self, today: NaiveDate) -> Result<TradeOutcome, AppError> {
        let filter = RecordFilter::by_date_and_status(today, TradeAction::Buy.required_status());
        let Some(stored) = self.store.find_one(filter).await? else {
            warn!("No stock data available for {}.", today);
            return Ok(TradeOutcome::NothingToBuy);
        };

        let symbol = stored.record.symbol.clone();
        let price = self.current_price(&symbol).await?;
        let funds = self.buying_power().await?;
        let quantity = quantity_for(funds, price);

        if quantity == 0 {
            warn!("Funds {:.2} do not cover one share of {} at {:.2}", funds, symbol, price);
            return Ok(TradeOutcome::InsufficientFunds { symbol, funds, price });
        }

        let fill_price = if self.config.mode.is_live() {
            let ack = self.place(&stored, OrderSide::Buy, quantity, price).await?;
            self.traded_price(&ack, price).await?
        } else {
            info!("Simulated buy of {} x {} at {:.2}", quantity, symbol, price);
            price
        };

        self.commit(stored, TradeAction::Buy, quantity, fill_price).await
    }

    async fn sell(&self, today: NaiveDate) -> Result<TradeOutcome, AppError> {
        // Any held position qualifies, whatever day it was bought on.
        let filter = RecordFilter::by_status(TradeAction::Sell.required_status());
        let Some(stored) = self.store.find_one(filter).await? else {
            warn!("No stocks to sell.");
            return Ok(TradeOutcome::NothingToSell);
        };

        if stored.record.date != today {
            warn!(
                "Selling {} bought on {} (today is {})",
                stored.record.symbol, stored.record.date, today
            );
        }

        let quantity = stored.record.quantity;
        let fill_price = if self.config.mode.is_live() {
            // Market order; the exchange fills at the prevailing price.
            let ack = self.place(&stored, OrderSide::Sell, quantity, 0.0).await?;
            self.traded_price(&ack, 0.0).await?
        } else {
            let price = self.current_price(&stored.record.symbol).await?;
            info!("Simulated sell of {} x {} at {:.2}", quantity, stored.record.symbol, price);
            price
        };

        self.commit(stored, TradeAction::Sell, quantity, fill_price).await
    }

    async fn current_price(&self, symbol: &str) -> Result<f64, AppError> {
        let price = self.quotes.latest_price(symbol).await?;
        if !(price.is_finite() && price > 0.0) {
            return Err(QuoteError::BadResponse(format!("unusable price {} for {}", price, symbol)).into());
        }
        Ok(price)
    }

    async fn buying_power(&self) -> Result<f64, AppError> {
        if !self.config.mode.is_live() {
            return Ok(self.config.simulated_balance);
        }

        let limits = self.broker.fund_limits().await?;
        Ok(available_funds(
            limits.available_balance,
            self.config.safety_margin,
            self.config.large_balance_threshold,
        ))
    }

    async fn place(
        &self,
        stored: &StoredScanRecord,
        side: OrderSide,
        quantity: i64,
        price: f64,
    ) -> Result<OrderAck, AppError> {
        let record = &stored.record;
        if record.security_id.is_none() {
            warn!("Placing {:?} order for {} without a security id", side, record.symbol);
        }

        let order = OrderRequest {
            correlation_id: record.id.clone(),
            security_id: record.security_id.clone().unwrap_or_default(),
            exchange_segment: EXCHANGE_SEGMENT.to_string(),
            side,
            quantity,
            order_type: OrderType::Market,
            product_type: ProductType::Cnc,
            price,
        };

        let ack = self.broker.place_order(&order).await?;
        info!(
            "Order {} placed for {} ({:?} {}), status {}",
            ack.order_id, record.symbol, side, quantity, ack.order_status
        );
        Ok(ack)
    }

    async fn traded_price(&self, ack: &OrderAck, fallback: f64) -> Result<f64, AppError> {
        let detail = self.broker.order_by_id(&ack.order_id).await?;
        if detail.average_traded_price > 0.0 {
            return Ok(detail.average_traded_price);
        }
        warn!(
            "Order {} reports no average traded price yet, recording {:.2}",
            ack.order_id, fallback
        );
        Ok(fallback)
    }

    async fn commit(
        &self,
        mut stored: StoredScanRecord,
        action: TradeAction,
        quantity: i64,
        price: f64,
    ) -> Result<TradeOutcome, AppError> {
        let expected = action.required_status();
        let fill = TradeFill { status: action.resulting_status(), quantity, price };
        if !self.store.apply_fill(stored.pk, expected, &fill).await? {
            warn!(
                "Record {} is no longer {}; another run got there first",
                stored.record.id, expected
            );
            return Ok(TradeOutcome::Superseded { pk: stored.pk });
        }

        fill.apply(&mut stored.record);
        info!(
            "{} {} x {} at {:.2} (record {})",
            fill.status, fill.quantity, stored.record.symbol, fill.price, stored.record.id
        );

        Ok(match action {
            TradeAction::Buy => TradeOutcome::Bought(stored),
            TradeAction::Sell => TradeOutcome::Sold(stored),
        })
    }
}
