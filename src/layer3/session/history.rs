// Signal History - rolling per-venue series for charting
// Bounded by point count, not by age

use std::collections::HashMap;

use crate::core::config::MonitoringConfig;
use crate::core::types::VenueId;
use crate::layer3::common::time_windows::{CvdWindow, TimeWindow};
use crate::layer3::engine::snapshot::AggregatedView;

/// One venue's chart series. Each point carries the tick time it was recorded at.
pub struct VenueHistory {
    pub prices: TimeWindow<f64>,
    pub imbalance: TimeWindow<f64>,
    cvd: [TimeWindow<f64>; 4],
}

impl VenueHistory {
    fn new(points: usize, imbalance_points: usize) -> Self {
        Self {
            prices: TimeWindow::bounded(points),
            imbalance: TimeWindow::bounded(imbalance_points),
            cvd: [
                TimeWindow::bounded(points),
                TimeWindow::bounded(points),
                TimeWindow::bounded(points),
                TimeWindow::bounded(points),
            ],
        }
    }

    pub fn cvd(&self, window: CvdWindow) -> &TimeWindow<f64> {
        &self.cvd[window.index()]
    }
}

pub struct SignalHistory {
    points: usize,
    imbalance_points: usize,
    timestamps: TimeWindow<()>,
    venues: HashMap<VenueId, VenueHistory>,
}

impl Default for SignalHistory {
    fn default() -> Self {
        Self::new(100, 20)
    }
}

impl SignalHistory {
    pub fn new(points: usize, imbalance_points: usize) -> Self {
        Self {
            points,
            imbalance_points,
            timestamps: TimeWindow::bounded(points),
            venues: HashMap::new(),
        }
    }

    pub fn from_config(config: &MonitoringConfig) -> Self {
        Self::new(config.history_points, config.imbalance_history_points)
    }

    /// Append one tick's view, recorded at wall-clock time `at` (seconds)
    pub fn record(&mut self, view: &AggregatedView, at: f64) {
        self.timestamps.add(at, ());

        for snapshot in &view.venues {
            let (points, imbalance_points) = (self.points, self.imbalance_points);
            let history = self
                .venues
                .entry(snapshot.id)
                .or_insert_with(|| VenueHistory::new(points, imbalance_points));

            if let Some(price) = snapshot.last_price {
                history.prices.add(at, price);
            }
            history.imbalance.add(at, snapshot.imbalance);
            for window in CvdWindow::ALL {
                if let Some(cvd) = snapshot.cvd(window) {
                    history.cvd[window.index()].add(at, cvd);
                }
            }
        }
    }

    /// Tick times, oldest first
    pub fn timestamps(&self) -> Vec<f64> {
        self.timestamps.iter().map(|(ts, _)| *ts).collect()
    }

    pub fn venue(&self, venue: VenueId) -> Option<&VenueHistory> {
        self.venues.get(&venue)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.venues.clear();
    }
}
