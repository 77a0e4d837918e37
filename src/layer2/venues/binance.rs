// Binance spot connector
// exchangeInfo / depth / trades / klines on the public v3 REST API

use async_trait::async_trait;
use serde_json::Value;

use crate::core::types::{Candle, Side, TradeEvent, VenueId};
use crate::layer1::rest_client::RestClient;
use crate::layer2::orderbook::OrderBookSnapshot;
use crate::layer2::parser::{
    array_field, as_array, field, millis_to_secs, parse_levels, str_field, value_f64, value_i64,
    ParseError,
};
use crate::layer2::symbols::{Market, MarketCatalog};

use super::{finish_candles, sort_trades, VenueClient, VenueError};

pub struct BinanceClient {
    rest: RestClient,
}

impl BinanceClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

#[async_trait]
impl VenueClient for BinanceClient {
    fn venue(&self) -> VenueId {
        VenueId::Binance
    }

    async fn load_markets(&self) -> Result<MarketCatalog, VenueError> {
        let data = self.rest.get("/api/v3/exchangeInfo", &[]).await?;
        Ok(parse_markets(&data)?)
    }

    async fn fetch_order_book(&self, market: &Market, depth: usize) -> Result<OrderBookSnapshot, VenueError> {
        let params = [("symbol", market.id.clone()), ("limit", depth.to_string())];
        let data = self.rest.get("/api/v3/depth", &params).await?;
        Ok(parse_order_book(&data, depth)?)
    }

    async fn fetch_trades(&self, market: &Market, limit: usize) -> Result<Vec<TradeEvent>, VenueError> {
        let params = [("symbol", market.id.clone()), ("limit", limit.to_string())];
        let data = self.rest.get("/api/v3/trades", &params).await?;
        Ok(parse_trades(&data)?)
    }

    async fn fetch_candles(&self, market: &Market, timeframe: &str, limit: usize) -> Result<Vec<Candle>, VenueError> {
        let params = [
            ("symbol", market.id.clone()),
            ("interval", timeframe.to_string()),
            ("limit", limit.to_string()),
        ];
        let data = self.rest.get("/api/v3/klines", &params).await?;
        Ok(finish_candles(parse_klines(&data)?, limit))
    }
}

// ============================================================================
// Parsers
// ============================================================================

fn parse_markets(data: &Value) -> Result<MarketCatalog, ParseError> {
    let symbols = array_field(data, "symbols")?;
    let mut markets = Vec::with_capacity(symbols.len());

    for entry in symbols {
        if entry.get("status").and_then(Value::as_str).is_some_and(|s| s != "TRADING") {
            continue;
        }
        markets.push(Market::new(
            str_field(entry, "baseAsset")?,
            str_field(entry, "quoteAsset")?,
            str_field(entry, "symbol")?,
        ));
    }

    Ok(MarketCatalog::new(markets))
}

fn parse_order_book(data: &Value, depth: usize) -> Result<OrderBookSnapshot, ParseError> {
    let bids = parse_levels(array_field(data, "bids")?)?;
    let asks = parse_levels(array_field(data, "asks")?)?;
    Ok(OrderBookSnapshot::from_levels(bids, asks, depth))
}

fn parse_trades(data: &Value) -> Result<Vec<TradeEvent>, ParseError> {
    let rows = as_array(data, "trades")?;
    let mut trades = Vec::with_capacity(rows.len());

    for row in rows {
        let is_buyer_maker = field(row, "isBuyerMaker")?.as_bool().unwrap_or(false);
        trades.push(TradeEvent {
            id: Some(value_i64(field(row, "id")?, "id")?.to_string()),
            timestamp: millis_to_secs(value_i64(field(row, "time")?, "time")?),
            // Buyer is maker → taker sold
            side: if is_buyer_maker { Side::Sell } else { Side::Buy },
            amount: value_f64(field(row, "qty")?, "qty")?,
            price: value_f64(field(row, "price")?, "price")?,
        });
    }

    Ok(sort_trades(trades))
}

fn parse_klines(data: &Value) -> Result<Vec<Candle>, ParseError> {
    as_array(data, "klines")?
        .iter()
        .map(|row| {
            let k = row
                .as_array()
                .filter(|k| k.len() >= 6)
                .ok_or_else(|| ParseError::InvalidJson(format!("Invalid kline: {}", row)))?;
            Ok(Candle::new(
                value_i64(&k[0], "open_time")?,
                value_f64(&k[1], "open")?,
                value_f64(&k[2], "high")?,
                value_f64(&k[3], "low")?,
                value_f64(&k[4], "close")?,
                value_f64(&k[5], "volume")?,
            ))
        })
        .collect()
}
