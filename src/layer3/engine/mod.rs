// Aggregation Engine - venue roster, per-venue adapters and cycle output
// Module structure:
// - adapter.rs: VenueSlot (one venue's catalog + tracker + fetch step)
// - aggregation_engine.rs: AggregationEngine (init, cycle, instrument change)
// - snapshot.rs: VenueSnapshot / AggregatedView output types

pub mod adapter;
pub mod aggregation_engine;
pub mod snapshot;

pub use adapter::{FetchLimits, VenueSlot};
pub use aggregation_engine::{AggregationEngine, EngineStats, ExcludedVenue};
pub use snapshot::{AggregatedView, CandleSeries, VenueSnapshot};
