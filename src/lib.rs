//! Multi-venue order book and CVD aggregator.
//!
//! Polls public REST market data from several venues for one instrument and
//! produces, once per refresh tick, a consolidated view: per-venue price,
//! depth imbalance and cumulative volume delta over 5m/1h/12h/24h, a merged
//! cross-venue book with its spread, and a candle series.
//!
//! Layers:
//! - `core`: shared types, configuration, logging
//! - `layer1`: rate-limited HTTP transport
//! - `layer2`: venue connectors, symbol resolution, book normalization
//! - `layer3`: CVD trackers, book merging, the aggregation engine and session
//!
//! ```no_run
//! use market_pulse::core::{setup_logging_from_config, ConfigManager};
//! use market_pulse::layer3::{DashboardSession, RefreshDriver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::new(None)?;
//! setup_logging_from_config(&config.monitoring());
//!
//! let mut session = DashboardSession::new(&config)?;
//! let (_stop, shutdown) = tokio::sync::watch::channel(false);
//! RefreshDriver::from_config(&config.engine())
//!     .run(&mut session, |view, _history| println!("{:?}", view.spread), shutdown)
//!     .await;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod layer1;
pub mod layer2;
pub mod layer3;

pub use crate::core::{ConfigManager, EngineConfig, MonitoringConfig, VenueConfig, VenueId};
pub use crate::layer2::{build_clients, VenueClient, VenueError};
pub use crate::layer3::{AggregatedView, AggregationEngine, DashboardSession, RefreshDriver};
