// Bybit spot connector
// v5 market endpoints; every response is wrapped in {retCode, retMsg, result}

use async_trait::async_trait;
use serde_json::Value;

use crate::core::types::{Candle, TradeEvent, VenueId};
use crate::layer1::rest_client::{RestClient, RestClientError};
use crate::layer2::orderbook::OrderBookSnapshot;
use crate::layer2::parser::{
    array_field, as_array, field, millis_to_secs, parse_levels, str_field, timeframe_seconds,
    value_f64, value_i64, ParseError,
};
use crate::layer2::symbols::{Market, MarketCatalog};

use super::{finish_candles, sort_trades, VenueClient, VenueError};

const CATEGORY: &str = "spot";
const MAX_BOOK_LIMIT: usize = 200;
const MAX_TRADE_LIMIT: usize = 60;
const MAX_KLINE_LIMIT: usize = 1000;

pub struct BybitClient {
    rest: RestClient,
}

impl BybitClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    async fn get_result(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, VenueError> {
        let data = self.rest.get(endpoint, params).await?;
        unwrap_envelope(data)
    }
}

#[async_trait]
impl VenueClient for BybitClient {
    fn venue(&self) -> VenueId {
        VenueId::Bybit
    }

    async fn load_markets(&self) -> Result<MarketCatalog, VenueError> {
        let result = self
            .get_result("/v5/market/instruments-info", &[("category", CATEGORY.to_string())])
            .await?;
        Ok(parse_markets(&result)?)
    }

    async fn fetch_order_book(&self, market: &Market, depth: usize) -> Result<OrderBookSnapshot, VenueError> {
        let params = [
            ("category", CATEGORY.to_string()),
            ("symbol", market.id.clone()),
            ("limit", depth.clamp(1, MAX_BOOK_LIMIT).to_string()),
        ];
        let result = self.get_result("/v5/market/orderbook", &params).await?;
        Ok(parse_order_book(&result, depth)?)
    }

    async fn fetch_trades(&self, market: &Market, limit: usize) -> Result<Vec<TradeEvent>, VenueError> {
        let params = [
            ("category", CATEGORY.to_string()),
            ("symbol", market.id.clone()),
            ("limit", limit.clamp(1, MAX_TRADE_LIMIT).to_string()),
        ];
        let result = self.get_result("/v5/market/recent-trade", &params).await?;
        Ok(parse_trades(&result)?)
    }

    async fn fetch_candles(&self, market: &Market, timeframe: &str, limit: usize) -> Result<Vec<Candle>, VenueError> {
        let interval = kline_interval(timeframe)
            .ok_or_else(|| VenueError::Unsupported(format!("bybit timeframe '{}'", timeframe)))?;
        let params = [
            ("category", CATEGORY.to_string()),
            ("symbol", market.id.clone()),
            ("interval", interval),
            ("limit", limit.clamp(1, MAX_KLINE_LIMIT).to_string()),
        ];
        let result = self.get_result("/v5/market/kline", &params).await?;
        Ok(finish_candles(parse_klines(&result)?, limit))
    }
}

// ============================================================================
// Parsers
// ============================================================================

/// Strip the v5 envelope, turning a non-zero retCode into an API error
fn unwrap_envelope(mut data: Value) -> Result<Value, VenueError> {
    let code = data.get("retCode").and_then(Value::as_i64).unwrap_or(0);
    if code != 0 {
        let message = data
            .get("retMsg")
            .and_then(Value::as_str)
            .unwrap_or("Unknown error")
            .to_string();
        return Err(RestClientError::Api { code, message }.into());
    }

    match data.get_mut("result").map(Value::take) {
        Some(result) if !result.is_null() => Ok(result),
        _ => Err(ParseError::MissingField("result".to_string()).into()),
    }
}

/// Map `1m`/`1h`/`1d`/`1w` onto Bybit's interval codes
fn kline_interval(timeframe: &str) -> Option<String> {
    let secs = timeframe_seconds(timeframe)?;
    match secs {
        604_800 => Some("W".to_string()),
        86_400 => Some("D".to_string()),
        s if s < 86_400 => {
            let minutes = s / 60;
            [1, 3, 5, 15, 30, 60, 120, 240, 360, 720]
                .contains(&minutes)
                .then(|| minutes.to_string())
        }
        _ => None,
    }
}

fn parse_markets(result: &Value) -> Result<MarketCatalog, ParseError> {
    let list = array_field(result, "list")?;
    let mut markets = Vec::with_capacity(list.len());

    for entry in list {
        if entry.get("status").and_then(Value::as_str).is_some_and(|s| s != "Trading") {
            continue;
        }
        markets.push(Market::new(
            str_field(entry, "baseCoin")?,
            str_field(entry, "quoteCoin")?,
            str_field(entry, "symbol")?,
        ));
    }

    Ok(MarketCatalog::new(markets))
}

fn parse_order_book(result: &Value, depth: usize) -> Result<OrderBookSnapshot, ParseError> {
    let bids = parse_levels(array_field(result, "b")?)?;
    let asks = parse_levels(array_field(result, "a")?)?;
    let book = OrderBookSnapshot::from_levels(bids, asks, depth);

    Ok(match result.get("ts").map(|ts| value_i64(ts, "ts")) {
        Some(Ok(ts)) => book.with_timestamp(ts),
        _ => book,
    })
}

fn parse_trades(result: &Value) -> Result<Vec<TradeEvent>, ParseError> {
    let list = array_field(result, "list")?;
    let mut trades = Vec::with_capacity(list.len());

    for row in list {
        let side_str = str_field(row, "side")?;
        trades.push(TradeEvent {
            id: Some(str_field(row, "execId")?.to_string()),
            timestamp: millis_to_secs(value_i64(field(row, "time")?, "time")?),
            side: side_str
                .parse()
                .map_err(|_| ParseError::InvalidJson(format!("Invalid side: '{}'", side_str)))?,
            amount: value_f64(field(row, "size")?, "size")?,
            price: value_f64(field(row, "price")?, "price")?,
        });
    }

    Ok(sort_trades(trades))
}

fn parse_klines(result: &Value) -> Result<Vec<Candle>, ParseError> {
    as_array(field(result, "list")?, "kline list")?
        .iter()
        .map(|row| {
            let k = row
                .as_array()
                .filter(|k| k.len() >= 6)
                .ok_or_else(|| ParseError::InvalidJson(format!("Invalid kline: {}", row)))?;
            Ok(Candle::new(
                value_i64(&k[0], "start_time")?,
                value_f64(&k[1], "open")?,
                value_f64(&k[2], "high")?,
                value_f64(&k[3], "low")?,
                value_f64(&k[4], "close")?,
                value_f64(&k[5], "volume")?,
            ))
        })
        .collect()
}
