//! Minimal JSON-RPC client for account balances and unlocked transfers.

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// Port of the root-chain simulator's RPC.
pub const ROOT_CHAIN_RPC_PORT: u16 = 9545;

/// HTTP RPC port of bor.
pub const BOR_RPC_PORT: u16 = 8545;

/// JSON-RPC client for one endpoint.
#[derive(Clone, Debug)]
pub struct ChainRpc {
    client: Client,
    url: Url,
}

impl ChainRpc {
    /// Client for `url`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if `url` does not parse.
    pub fn new(url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            url: Url::parse(url)?,
        })
    }

    /// Client for `http://{host}:{port}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the host is not valid in a URL.
    pub fn for_host(host: &str, port: u16) -> Result<Self> {
        Self::new(&format!("http://{host}:{port}"))
    }

    /// Issue a raw request and return its `result`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on transport failure, [`Error::Rpc`] if the
    /// node returned an error object, or [`Error::UnexpectedResponse`] if the
    /// response carries neither.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        debug!("rpc {} -> {method}", self.url);

        let response: Value = self
            .client
            .post(self.url.clone())
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": 1
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.get("error") {
            return Err(Error::Rpc {
                code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: error
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            });
        }

        response
            .get("result")
            .cloned()
            .ok_or_else(|| Error::UnexpectedResponse(response.to_string()))
    }

    /// Balance of `address` at the latest block, in wei.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the result is not a hex
    /// quantity.
    pub async fn get_balance(&self, address: &str) -> Result<u128> {
        let result = self
            .request("eth_getBalance", json!([address, "latest"]))
            .await?;
        parse_quantity(&result)
    }

    /// Send `value` wei from the node-managed account `from` to `to`.
    /// Returns the transaction hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the node rejects the transaction.
    pub async fn send_transaction(&self, from: &str, to: &str, value: u128) -> Result<String> {
        let result = self
            .request(
                "eth_sendTransaction",
                json!([{
                    "from": from,
                    "to": to,
                    "value": format!("0x{value:x}"),
                }]),
            )
            .await?;

        result
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| Error::UnexpectedResponse(result.to_string()))
    }
}

/// Decode a `0x`-prefixed hex quantity.
///
/// # Errors
///
/// Returns [`Error::UnexpectedResponse`] for anything else.
pub fn parse_quantity(value: &Value) -> Result<u128> {
    value
        .as_str()
        .and_then(|s| s.strip_prefix("0x"))
        .and_then(|digits| {
            let digits = if digits.is_empty() { "0" } else { digits };
            u128::from_str_radix(digits, 16).ok()
        })
        .ok_or_else(|| Error::UnexpectedResponse(format!("not a quantity: {value}")))
}

/// Render wei as whole ether with up to 18 decimals.
#[must_use]
pub fn format_ether(wei: u128) -> String {
    let whole = wei / crate::cast::WEI_PER_TOKEN;
    let fraction = wei % crate::cast::WEI_PER_TOKEN;

    if fraction == 0 {
        whole.to_string()
    } else {
        let fraction = format!("{fraction:018}");
        format!("{whole}.{}", fraction.trim_end_matches('0'))
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::{Json, Router, routing::post};

    use super::*;

    async fn serve() -> SocketAddr {
        async fn handle(Json(request): Json<Value>) -> Json<Value> {
            let result = match request["method"].as_str() {
                Some("eth_getBalance") => json!("0x6f05b59d3b20000"),
                Some("eth_sendTransaction") => {
                    let tx = &request["params"][0];
                    if tx["value"] == "0x8ac7230489e80000" {
                        json!("0xfeed")
                    } else {
                        return Json(json!({
                            "jsonrpc": "2.0",
                            "id": 1,
                            "error": {"code": -32000, "message": "bad value"}
                        }));
                    }
                }
                _ => Value::Null,
            };
            Json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, Router::new().route("/", post(handle)))
                .await
                .unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_balance_and_transfer() {
        let _ = tracing_subscriber::fmt::try_init();

        let addr = serve().await;
        let rpc = ChainRpc::new(&format!("http://{addr}")).unwrap();

        let balance = rpc.get_balance("0xaa").await.unwrap();
        assert_eq!(balance, 500_000_000_000_000_000);
        assert_eq!(format_ether(balance), "0.5");

        let hash = rpc
            .send_transaction("0xaa", "0xbb", crate::cast::tokens(10))
            .await
            .unwrap();
        assert_eq!(hash, "0xfeed");

        let err = rpc.send_transaction("0xaa", "0xbb", 1).await.unwrap_err();
        assert!(matches!(err, Error::Rpc { code: -32000, .. }));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity(&json!("0xff")).unwrap(), 255);
        assert!(parse_quantity(&json!(255)).is_err());
        assert!(parse_quantity(&json!("ff")).is_err());
    }

    #[test]
    fn test_format_ether() {
        assert_eq!(format_ether(crate::cast::tokens(10)), "10");
        assert_eq!(format_ether(1), "0.000000000000000001");
    }
}
