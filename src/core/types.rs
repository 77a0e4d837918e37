// Core Type Definitions for Market Pulse
// Venue-agnostic market data shapes shared by every layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Venue Identity
// ============================================================================

/// Supported market venues. The string form is what appears in config rosters
/// and in the serialized output (`venues[].id`, `candles.venue`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueId {
    Binance,
    Bybit,
    Coinbase,
    Hyperliquid,
}

impl VenueId {
    pub const ALL: [VenueId; 4] = [
        VenueId::Binance,
        VenueId::Bybit,
        VenueId::Coinbase,
        VenueId::Hyperliquid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VenueId::Binance => "binance",
            VenueId::Bybit => "bybit",
            VenueId::Coinbase => "coinbase",
            VenueId::Hyperliquid => "hyperliquid",
        }
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VenueId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "binance" => Ok(VenueId::Binance),
            "bybit" => Ok(VenueId::Bybit),
            "coinbase" => Ok(VenueId::Coinbase),
            "hyperliquid" => Ok(VenueId::Hyperliquid),
            _ => Err(format!("Unknown venue: '{}'", s)),
        }
    }
}

// ============================================================================
// Trades
// ============================================================================

/// Taker side of a trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

impl FromStr for Side {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" | "b" => Ok(Side::Buy),
            "sell" | "s" => Ok(Side::Sell),
            _ => Err(format!("Invalid Side: '{}'. Expected 'buy' or 'sell'", s)),
        }
    }
}

/// A normalized public trade print.
///
/// `timestamp` is seconds since epoch. `id` is the venue trade id when the
/// venue provides one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub id: Option<String>,
    pub timestamp: f64,
    pub side: Side,
    pub amount: f64,
    pub price: f64,
}

impl TradeEvent {
    pub fn new(id: Option<String>, timestamp: f64, side: Side, amount: f64, price: f64) -> Self {
        Self { id, timestamp, side, amount, price }
    }

    /// Identifier used for deduplication.
    ///
    /// Falls back to `timestamp_amount_price` when the venue gave no id. Two
    /// distinct trades with the same price and size in the same instant collide
    /// under the fallback and the second is treated as a duplicate.
    pub fn dedup_key(&self) -> String {
        match &self.id {
            Some(id) if !id.is_empty() => id.clone(),
            _ => format!("{}_{}_{}", self.timestamp, self.amount, self.price),
        }
    }

    /// Signed size: buys positive, sells negative
    pub fn delta(&self) -> f64 {
        match self.side {
            Side::Buy => self.amount,
            Side::Sell => -self.amount,
        }
    }

    pub fn signed(&self) -> SignedTrade {
        SignedTrade { timestamp: self.timestamp, delta: self.delta() }
    }
}

impl fmt::Display for TradeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade({} {} @ {}, ts={:.3})",
            self.side, self.amount, self.price, self.timestamp
        )
    }
}

/// Stored form of a trade inside a CVD ledger
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedTrade {
    pub timestamp: f64,
    pub delta: f64,
}

// ============================================================================
// Order Book Levels
// ============================================================================

/// A single book level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthLevel {
    pub price: f64,
    pub volume: f64,
}

impl DepthLevel {
    pub fn new(price: f64, volume: f64) -> Self {
        Self { price, volume }
    }
}

impl fmt::Display for DepthLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.volume, self.price)
    }
}

// ============================================================================
// Candles
// ============================================================================

/// OHLCV candle. `t` is the open time in milliseconds since epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub t: i64,
    pub o: f64,
    pub h: f64,
    pub l: f64,
    pub c: f64,
    pub v: f64,
}

impl Candle {
    pub fn new(t: i64, o: f64, h: f64, l: f64, c: f64, v: f64) -> Self {
        Self { t, o, h, l, c, v }
    }
}
