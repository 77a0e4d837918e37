// Trade Trackers - per-venue trade ledgers
// Module structure:
// - cvd_tracker.rs: CvdTracker (dedup + rolling cumulative volume delta)

pub mod cvd_tracker;

// Re-exports
pub use cvd_tracker::{CvdTracker, CvdTrackerStats, CvdValues, TrackerPhase};
