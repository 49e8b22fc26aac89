use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::models::{InstrumentLimits, OrderRequest};
use hmac::{Hmac, Mac};
use reqwest::{Client, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, error};

use crate::{
    error::ExchangeError,
    remote::{InstrumentsResult, TickerResult},
    traits::{RemoteResponse, SpotExchange},
};

type HmacSha256 = Hmac<Sha256>;

const SPOT: &str = "spot";

#[derive(Debug, Clone)]
pub struct BybitConfig {
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub recv_window_ms: u64,
}

impl BybitConfig {
    pub const MAINNET_URL: &'static str = "https://api.bybit.com";
    pub const TESTNET_URL: &'static str = "https://api-testnet.bybit.com";
    pub const DEFAULT_RECV_WINDOW_MS: u64 = 5000;

    pub fn for_network(testnet: bool, api_key: String, api_secret: String) -> Self {
        let base_url = if testnet {
            Self::TESTNET_URL
        } else {
            Self::MAINNET_URL
        };

        Self {
            base_url: base_url.to_string(),
            api_key,
            api_secret,
            recv_window_ms: Self::DEFAULT_RECV_WINDOW_MS,
        }
    }
}

/// Common v5 response wrapper. `result` is decoded separately once `retCode`
/// says the call succeeded, since failed calls send `{}` there.
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename(deserialize = "retCode"))]
    ret_code: i64,
    #[serde(rename(deserialize = "retMsg"), default)]
    ret_msg: String,
    #[serde(default)]
    result: Value,
}

#[derive(Clone)]
pub struct BybitClient {
    client: Client,
    config: BybitConfig,
}

impl BybitClient {
    pub fn new(config: BybitConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .user_agent(concat!("signal_webhook/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn sign(&self, payload: &str) -> Result<String, ExchangeError> {
        let mut mac = HmacSha256::new_from_slice(self.config.api_secret.as_bytes())
            .map_err(|e| ExchangeError::Signing(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        symbol: &str,
    ) -> Result<T, ExchangeError> {
        let url = format!("{}{}", self.config.base_url, path);
        debug!("GET {} symbol={}", path, symbol);

        let resp = self
            .client
            .get(&url)
            .query(&[("category", SPOT), ("symbol", symbol)])
            .send()
            .await?;

        let (_, envelope) = Self::read_envelope(resp).await?;
        T::deserialize(envelope.result).map_err(|e| ExchangeError::Malformed(e.to_string()))
    }

    async fn post_signed(&self, path: &str, body: String) -> Result<Value, ExchangeError> {
        let timestamp = Utc::now().timestamp_millis().to_string();
        let recv_window = self.config.recv_window_ms.to_string();
        let signature = self.sign(&format!(
            "{}{}{}{}",
            timestamp, self.config.api_key, recv_window, body
        ))?;
        let url = format!("{}{}", self.config.base_url, path);

        let resp = self
            .client
            .post(&url)
            .header("X-BAPI-API-KEY", &self.config.api_key)
            .header("X-BAPI-TIMESTAMP", timestamp)
            .header("X-BAPI-RECV-WINDOW", recv_window)
            .header("X-BAPI-SIGN-TYPE", "2")
            .header("X-BAPI-SIGN", signature)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;

        let (raw, _) = Self::read_envelope(resp).await?;
        Ok(raw)
    }

    /// Returns the whole response object and its decoded envelope once HTTP
    /// status and `retCode` are both successful.
    async fn read_envelope(resp: Response) -> Result<(Value, Envelope), ExchangeError> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            error!("Bybit HTTP {}: {}", status, text);
            return Err(ExchangeError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw: Value = serde_json::from_str(&text)
            .map_err(|e| ExchangeError::Malformed(format!("{e}: {text}")))?;
        let envelope = Envelope::deserialize(&raw)
            .map_err(|e| ExchangeError::Malformed(format!("{e}: {text}")))?;

        if envelope.ret_code != 0 {
            error!(
                "Bybit rejected request: retCode={} retMsg={}",
                envelope.ret_code, envelope.ret_msg
            );
            return Err(ExchangeError::Api {
                code: envelope.ret_code,
                message: envelope.ret_msg,
            });
        }

        Ok((raw, envelope))
    }
}

#[async_trait]
impl SpotExchange for BybitClient {
    async fn last_price(&self, symbol: &str) -> Result<Decimal, ExchangeError> {
        let tickers: TickerResult = self.get_public("/v5/market/tickers", symbol).await?;
        tickers.to_model(symbol)
    }

    async fn instrument_limits(&self, symbol: &str) -> Result<InstrumentLimits, ExchangeError> {
        let instruments: InstrumentsResult = self
            .get_public("/v5/market/instruments-info", symbol)
            .await?;
        instruments.to_model(symbol)
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<Value, ExchangeError> {
        let body = serde_json::to_string(order)
            .map_err(|e| ExchangeError::Malformed(format!("order encoding: {e}")))?;
        debug!("POST /v5/order/create {}", body);

        self.post_signed("/v5/order/create", body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::models::Side;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, header, header_exists, method, path, query_param},
    };

    fn client_for(server: &MockServer) -> BybitClient {
        BybitClient::new(BybitConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            api_secret: "test-secret".to_string(),
            recv_window_ms: 5000,
        })
        .unwrap()
    }

    fn ok(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "retCode": 0,
            "retMsg": "OK",
            "result": result,
            "retExtInfo": {},
            "time": 1760000000000u64
        }))
    }

    #[test]
    fn test_network_selection() {
        let testnet = BybitConfig::for_network(true, "k".into(), "s".into());
        let mainnet = BybitConfig::for_network(false, "k".into(), "s".into());

        assert_eq!(testnet.base_url, BybitConfig::TESTNET_URL);
        assert_eq!(mainnet.base_url, BybitConfig::MAINNET_URL);
    }

    #[test]
    fn test_signature_is_hex_sha256() {
        let client = BybitClient::new(BybitConfig::for_network(true, "k".into(), "s".into())).unwrap();

        let a = client.sign("1700000000000k5000{}").unwrap();
        let b = client.sign("1700000000000k5000{}").unwrap();
        let c = client.sign("1700000000001k5000{}").unwrap();

        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_last_price() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/tickers"))
            .and(query_param("category", "spot"))
            .and(query_param("symbol", "BTCUSDT"))
            .respond_with(ok(json!({
                "category": "spot",
                "list": [{ "symbol": "BTCUSDT", "lastPrice": "50000" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let price = client_for(&server).last_price("BTCUSDT").await.unwrap();
        assert_eq!(price, dec!(50000));
    }

    #[tokio::test]
    async fn test_instrument_limits_unknown_symbol() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/instruments-info"))
            .and(query_param("symbol", "NOPEUSDT"))
            .respond_with(ok(json!({ "category": "spot", "list": [] })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .instrument_limits("NOPEUSDT")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_nonzero_ret_code_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v5/market/tickers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "retCode": 10001,
                "retMsg": "Not supported symbols",
                "result": {},
                "retExtInfo": {},
                "time": 1760000000000u64
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).last_price("XXXUSDT").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Api { code: 10001, .. }));
    }

    #[tokio::test]
    async fn test_http_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).last_price("BTCUSDT").await.unwrap_err();
        assert!(matches!(err, ExchangeError::Http { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_place_order_is_signed_and_returns_raw_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v5/order/create"))
            .and(header("X-BAPI-API-KEY", "test-key"))
            .and(header("X-BAPI-RECV-WINDOW", "5000"))
            .and(header("X-BAPI-SIGN-TYPE", "2"))
            .and(header_exists("X-BAPI-SIGN"))
            .and(header_exists("X-BAPI-TIMESTAMP"))
            .and(body_json(json!({
                "category": "spot",
                "symbol": "BTCUSDT",
                "side": "Buy",
                "orderType": "Market",
                "qty": "0.001",
                "marketUnit": "baseCoin"
            })))
            .respond_with(ok(json!({ "orderId": "1321003749386327552", "orderLinkId": "" })))
            .expect(1)
            .mount(&server)
            .await;

        let order = OrderRequest::market("BTCUSDT", Side::Buy, dec!(0.001));
        let response = client_for(&server).place_order(&order).await.unwrap();

        assert_eq!(response["retCode"], 0);
        assert_eq!(response["result"]["orderId"], "1321003749386327552");
    }
}
