//! Dhan HQ v2 REST adapter.

use crate::config::DhanConfig;
use crate::external::broker::{
    Broker, BrokerError, BrokerPosition, FundLimits, Holding, OrderAck, OrderDetail,
    OrderRequest, OrderSide, OrderType, ProductType, TradeBookEntry, TradeHistoryEntry,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

pub struct DhanClient {
    client: reqwest::Client,
    base_url: String,
    client_id: String,
    access_token: String,
}

impl DhanClient {
    pub fn new(config: &DhanConfig) -> Result<Self, BrokerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client_id: config.client_id.clone().unwrap_or_default(),
            access_token: config.access_token.clone().unwrap_or_default(),
        })
    }

    fn ensure_configured(&self) -> Result<(), BrokerError> {
        if self.client_id.is_empty() || self.access_token.is_empty() {
            return Err(BrokerError::NotConfigured);
        }
        Ok(())
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);
        self.client
            .request(method, url)
            .header("access-token", &self.access_token)
            .header("client-id", &self.client_id)
            .header("Accept", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T, BrokerError> {
        self.ensure_configured()?;

        let resp = req
            .send()
            .await
            .map_err(|e| BrokerError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BrokerError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| BrokerError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_code: Option<String>,
    error_message: Option<String>,
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody { error_code, error_message: Some(msg) }) => match error_code {
            Some(code) => format!("{code}: {msg}"),
            None => msg,
        },
        _ if body.is_empty() => "Unknown error".to_string(),
        _ => body.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlaceOrderBody<'a> {
    dhan_client_id: &'a str,
    correlation_id: &'a str,
    transaction_type: OrderSide,
    exchange_segment: &'a str,
    product_type: ProductType,
    order_type: OrderType,
    validity: &'a str,
    security_id: &'a str,
    quantity: i64,
    price: f64,
}

// Order lookups have been seen both as a bare object and as a one-element list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OrderDetailBody {
    One(OrderDetail),
    Many(Vec<OrderDetail>),
}

impl OrderDetailBody {
    fn into_first(self) -> Option<OrderDetail> {
        match self {
            OrderDetailBody::One(d) => Some(d),
            OrderDetailBody::Many(v) => v.into_iter().next(),
        }
    }
}

#[async_trait]
impl Broker for DhanClient {
    async fn fund_limits(&self) -> Result<FundLimits, BrokerError> {
        self.send(self.request(reqwest::Method::GET, "/fundlimit")).await
    }

    async fn positions(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        self.send(self.request(reqwest::Method::GET, "/positions")).await
    }

    async fn holdings(&self) -> Result<Vec<Holding>, BrokerError> {
        self.send(self.request(reqwest::Method::GET, "/holdings")).await
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerError> {
        let body = PlaceOrderBody {
            dhan_client_id: &self.client_id,
            correlation_id: &order.correlation_id,
            transaction_type: order.side,
            exchange_segment: &order.exchange_segment,
            product_type: order.product_type,
            order_type: order.order_type,
            validity: "DAY",
            security_id: &order.security_id,
            quantity: order.quantity,
            price: order.price,
        };

        let ack: OrderAck = self
            .send(self.request(reqwest::Method::POST, "/orders").json(&body))
            .await?;

        if ack.is_rejected() {
            return Err(BrokerError::Rejected(format!(
                "order {} is {}",
                ack.order_id, ack.order_status
            )));
        }
        Ok(ack)
    }

    async fn order_by_id(&self, order_id: &str) -> Result<OrderDetail, BrokerError> {
        let body: OrderDetailBody = self
            .send(self.request(reqwest::Method::GET, &format!("/orders/{order_id}")))
            .await?;
        body.into_first()
            .ok_or_else(|| BrokerError::Parse(format!("empty order detail for {order_id}")))
    }

    async fn trade_history(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        page: u32,
    ) -> Result<Vec<TradeHistoryEntry>, BrokerError> {
        let path = format!(
            "/trades/{}/{}/{}",
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
            page
        );
        self.send(self.request(reqwest::Method::GET, &path)).await
    }

    async fn trade_book(&self) -> Result<Vec<TradeBookEntry>, BrokerError> {
        self.send(self.request(reqwest::Method::GET, "/trades")).await
    }
}
