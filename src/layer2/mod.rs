// Layer 2 - Venue connectors and normalization
// Turns venue REST payloads into catalogs, order book snapshots, trades and candles

pub mod orderbook;
pub mod parser;
pub mod symbols;
pub mod venues;

// Re-export commonly used items
pub use orderbook::OrderBookSnapshot;
pub use parser::ParseError;
pub use symbols::{Market, MarketCatalog};
pub use venues::{
    build_client, build_clients, BinanceClient, BybitClient, CoinbaseClient, HyperliquidClient,
    VenueClient, VenueError,
};
