// Layer 3 - Aggregation
// Per-venue CVD tracking, cross-venue book merging and the refresh cycle

// Common utilities
pub mod common;

// Per-venue trade ledgers
pub mod trade;

// Cross-venue depth
pub mod orderbook;

// Cycle orchestration
pub mod engine;

// Host-facing session and refresh loop
pub mod session;

pub use common::{CvdWindow, TimeWindow};
pub use engine::{AggregatedView, AggregationEngine, CandleSeries, ExcludedVenue, VenueSnapshot};
pub use orderbook::{BookMerger, MergedBook};
pub use session::{DashboardSession, RefreshDriver, SignalHistory};
pub use trade::{CvdTracker, CvdValues, TrackerPhase};
