//! Alpaca REST client implementation.

use super::{Brokerage, BrokerageError, OrderAck, OrderRequest, Position, Quote};
use crate::domain::{dedupe_fills, Bar, Decimal, Fill, Side, Symbol, TimeNs};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use std::fmt;
use tracing::debug;

const KEY_ID_HEADER: &str = "APCA-API-KEY-ID";
const SECRET_KEY_HEADER: &str = "APCA-API-SECRET-KEY";
const FILL_PAGE_SIZE: usize = 100;

/// Alpaca trading and crypto market-data endpoints.
#[derive(Clone)]
pub struct AlpacaBrokerage {
    client: Client,
    trading_url: String,
    data_url: String,
    key_id: String,
    secret_key: String,
}

impl fmt::Debug for AlpacaBrokerage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlpacaBrokerage")
            .field("trading_url", &self.trading_url)
            .field("data_url", &self.data_url)
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl AlpacaBrokerage {
    pub fn new(trading_url: String, data_url: String, key_id: String, secret_key: String) -> Self {
        Self {
            client: Client::new(),
            trading_url: trading_url.trim_end_matches('/').to_string(),
            data_url: data_url.trim_end_matches('/').to_string(),
            key_id,
            secret_key,
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header(KEY_ID_HEADER, &self.key_id)
            .header(SECRET_KEY_HEADER, &self.secret_key)
    }

    async fn fetch_fill_page(
        &self,
        page_token: Option<String>,
    ) -> Result<serde_json::Value, BrokerageError> {
        let url = format!("{}/v2/account/activities/FILL", self.trading_url);
        let mut query = vec![
            ("direction", "desc".to_string()),
            ("page_size", FILL_PAGE_SIZE.to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("page_token", token));
        }
        self.send_json(self.request(Method::GET, &url).query(&query))
            .await
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<serde_json::Value, BrokerageError> {
        let response = request
            .send()
            .await
            .map_err(|e| BrokerageError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(BrokerageError::HttpError {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| BrokerageError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl Brokerage for AlpacaBrokerage {
    async fn get_bars(
        &self,
        symbol: &Symbol,
        timeframe: &str,
        since: TimeNs,
    ) -> Result<Vec<Bar>, BrokerageError> {
        debug!(
            "Fetching bars for symbol={}, timeframe={}, since={}",
            symbol, timeframe, since
        );

        let url = format!("{}/v1beta3/crypto/us/bars", self.data_url);
        let start = since.to_datetime().to_rfc3339();
        let response = self
            .send_json(self.request(Method::GET, &url).query(&[
                ("symbols", symbol.as_str()),
                ("timeframe", timeframe),
                ("start", start.as_str()),
                ("limit", "10000"),
            ]))
            .await?;

        parse_bars(&response, symbol)
    }

    async fn get_latest_quote(&self, symbol: &Symbol) -> Result<Quote, BrokerageError> {
        debug!("Fetching latest quote for symbol={}", symbol);

        let url = format!("{}/v1beta3/crypto/us/latest/quotes", self.data_url);
        let response = self
            .send_json(
                self.request(Method::GET, &url)
                    .query(&[("symbols", symbol.as_str())]),
            )
            .await?;

        parse_quote(&response, symbol)
    }

    async fn list_positions(&self) -> Result<Vec<Position>, BrokerageError> {
        debug!("Listing positions");

        let url = format!("{}/v2/positions", self.trading_url);
        let response = self.send_json(self.request(Method::GET, &url)).await?;

        let positions_json = response
            .as_array()
            .ok_or_else(|| BrokerageError::ParseError("Expected array response".to_string()))?;

        positions_json.iter().map(parse_position).collect()
    }

    async fn get_fills(&self) -> Result<Vec<Fill>, BrokerageError> {
        debug!("Fetching FILL activities");
        collect_fill_pages(move |page_token| self.fetch_fill_page(page_token)).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> Result<OrderAck, BrokerageError> {
        let client_order_id = uuid::Uuid::new_v4().to_string();
        debug!(
            "Submitting {} order for {} {} (client_order_id={})",
            order.side, order.quantity, order.symbol, client_order_id
        );

        let payload = serde_json::json!({
            "symbol": order.symbol.as_str(),
            "qty": order.quantity.to_canonical_string(),
            "side": order.side.as_str(),
            "type": "market",
            "time_in_force": order.time_in_force.as_str(),
            "client_order_id": client_order_id,
        });

        let url = format!("{}/v2/orders", self.trading_url);
        let response = self
            .send_json(self.request(Method::POST, &url).json(&payload))
            .await?;

        parse_order_ack(&response, client_order_id)
    }

    async fn get_equity(&self) -> Result<Decimal, BrokerageError> {
        debug!("Fetching account equity");

        let url = format!("{}/v2/account", self.trading_url);
        let response = self.send_json(self.request(Method::GET, &url)).await?;

        let equity_str = response
            .get("equity")
            .and_then(|v| v.as_str())
            .ok_or_else(|| BrokerageError::ParseError("Missing equity field".to_string()))?;
        Decimal::from_str_canonical(equity_str)
            .map_err(|e| BrokerageError::ParseError(format!("Invalid equity: {}", e)))
    }
}

fn decimal_field(json: &serde_json::Value, field: &str) -> Result<Decimal, BrokerageError> {
    let value = json
        .get(field)
        .ok_or_else(|| BrokerageError::ParseError(format!("Missing {} field", field)))?;

    // Trading API sends decimal strings, market data sends JSON numbers.
    let parsed = match value {
        serde_json::Value::String(s) => Decimal::from_str_canonical(s).ok(),
        serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
        _ => None,
    };
    parsed.ok_or_else(|| BrokerageError::ParseError(format!("Invalid {}: {}", field, value)))
}

fn time_field(json: &serde_json::Value, field: &str) -> Result<TimeNs, BrokerageError> {
    let s = json
        .get(field)
        .and_then(|v| v.as_str())
        .ok_or_else(|| BrokerageError::ParseError(format!("Missing {} field", field)))?;
    TimeNs::parse_rfc3339(s)
        .map_err(|e| BrokerageError::ParseError(format!("Invalid {}: {}", field, e)))
}

fn parse_bars(response: &serde_json::Value, symbol: &Symbol) -> Result<Vec<Bar>, BrokerageError> {
    let bars_json = match response
        .get("bars")
        .and_then(|b| b.get(symbol.as_str()))
    {
        Some(serde_json::Value::Array(bars)) => bars,
        // No bars in the window yet.
        Some(serde_json::Value::Null) | None => return Ok(Vec::new()),
        Some(_) => {
            return Err(BrokerageError::ParseError(
                "Expected bar array for symbol".to_string(),
            ))
        }
    };

    bars_json
        .iter()
        .map(|bar| {
            Ok(Bar {
                time: time_field(bar, "t")?,
                close: decimal_field(bar, "c")?,
            })
        })
        .collect()
}

fn parse_quote(response: &serde_json::Value, symbol: &Symbol) -> Result<Quote, BrokerageError> {
    let quote = response
        .get("quotes")
        .and_then(|q| q.get(symbol.as_str()))
        .ok_or_else(|| BrokerageError::ParseError(format!("No quote for {}", symbol)))?;

    Ok(Quote {
        ask_price: decimal_field(quote, "ap")?,
    })
}

fn parse_position(position_json: &serde_json::Value) -> Result<Position, BrokerageError> {
    let symbol = position_json
        .get("symbol")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BrokerageError::ParseError("Missing symbol field".to_string()))?
        .to_string();

    Ok(Position {
        symbol,
        quantity: decimal_field(position_json, "qty")?,
    })
}

fn parse_fill(fill_json: &serde_json::Value) -> Result<Fill, BrokerageError> {
    let side_str = fill_json
        .get("side")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BrokerageError::ParseError("Missing side field".to_string()))?;

    let side = match side_str {
        "buy" => Side::Buy,
        "sell" | "sell_short" => Side::Sell,
        _ => {
            return Err(BrokerageError::ParseError(format!(
                "Invalid side: {}",
                side_str
            )))
        }
    };

    let symbol = fill_json
        .get("symbol")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BrokerageError::ParseError("Missing symbol field".to_string()))?;
    let price = decimal_field(fill_json, "price")?;
    let quantity = decimal_field(fill_json, "qty")?;
    let time = time_field(fill_json, "transaction_time")?;

    let fill = Fill::new(symbol, price, side, quantity, time);
    Ok(match fill_json.get("id").and_then(|v| v.as_str()) {
        Some(id) => fill.with_activity_id(id),
        None => fill,
    })
}

/// Parse one page of FILL activities.
///
/// Returns the page's fills and, when the page is full, the token for the
/// next page (the id of its last record). Any unparseable record fails the
/// whole page.
fn parse_fill_page(
    response: &serde_json::Value,
) -> Result<(Vec<Fill>, Option<String>), BrokerageError> {
    let records = response
        .as_array()
        .ok_or_else(|| BrokerageError::ParseError("Expected array response".to_string()))?;

    let fills = records
        .iter()
        .map(parse_fill)
        .collect::<Result<Vec<_>, _>>()?;

    if records.len() < FILL_PAGE_SIZE {
        return Ok((fills, None));
    }
    let next = records
        .last()
        .and_then(|r| r.get("id"))
        .and_then(|v| v.as_str())
        .ok_or_else(|| {
            BrokerageError::ParseError("Missing id on last record of a full page".to_string())
        })?
        .to_string();
    Ok((fills, Some(next)))
}

/// Walk the activity feed page by page until a short page ends it.
async fn collect_fill_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Fill>, BrokerageError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<serde_json::Value, BrokerageError>>,
{
    let mut fills = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let response = fetch_page(page_token.clone()).await?;
        let (page, next) = parse_fill_page(&response)?;
        fills.extend(page);

        match next {
            Some(token) if page_token.as_deref() == Some(token.as_str()) => {
                return Err(BrokerageError::ParseError(format!(
                    "Activity paging did not advance past {}",
                    token
                )));
            }
            Some(token) => {
                debug!("Fetched {} fills so far, next page after {}", fills.len(), token);
                page_token = Some(token);
            }
            None => break,
        }
    }

    // Consecutive pages may share a boundary record.
    Ok(dedupe_fills(fills))
}

fn parse_order_ack(
    response: &serde_json::Value,
    client_order_id: String,
) -> Result<OrderAck, BrokerageError> {
    let order_id = response
        .get("id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| BrokerageError::ParseError("Missing order id".to_string()))?
        .to_string();
    let status = response
        .get("status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown")
        .to_string();

    Ok(OrderAck {
        order_id,
        client_order_id,
        status,
    })
}
