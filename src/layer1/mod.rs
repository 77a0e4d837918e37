// Layer 1 - HTTP transport for public venue market data

pub mod rest_client;

pub use rest_client::{now_millis, now_secs, RateLimiter, RestClient, RestClientError, RestClientStats};
