// Snapshot Types - what one refresh cycle produces
// Serialized with the camelCase field names renderers consume

use serde::Serialize;

use crate::core::types::{Candle, DepthLevel, VenueId};
use crate::layer3::common::time_windows::CvdWindow;
use crate::layer3::orderbook::book_merger::{DepthSource, MergedBook};
use crate::layer3::trade::cvd_tracker::CvdValues;

/// One venue's view for one cycle.
///
/// CVD fields are `None` (serialized `null`) for venues without a public
/// trade feed, which is distinct from a computed zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueSnapshot {
    pub id: VenueId,
    pub last_price: Option<f64>,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    pub imbalance: f64,
    #[serde(rename = "cvd5m")]
    pub cvd_5m: Option<f64>,
    #[serde(rename = "cvd1h")]
    pub cvd_1h: Option<f64>,
    #[serde(rename = "cvd12h")]
    pub cvd_12h: Option<f64>,
    #[serde(rename = "cvd24h")]
    pub cvd_24h: Option<f64>,
}

impl VenueSnapshot {
    pub fn set_cvd(&mut self, values: Option<CvdValues>) {
        self.cvd_5m = values.map(|v| v.cvd_5m);
        self.cvd_1h = values.map(|v| v.cvd_1h);
        self.cvd_12h = values.map(|v| v.cvd_12h);
        self.cvd_24h = values.map(|v| v.cvd_24h);
    }

    pub fn cvd(&self, window: CvdWindow) -> Option<f64> {
        match window {
            CvdWindow::FiveMinutes => self.cvd_5m,
            CvdWindow::OneHour => self.cvd_1h,
            CvdWindow::TwelveHours => self.cvd_12h,
            CvdWindow::TwentyFourHours => self.cvd_24h,
        }
    }
}

impl DepthSource for VenueSnapshot {
    fn bid_levels(&self) -> &[DepthLevel] {
        &self.bids
    }

    fn ask_levels(&self) -> &[DepthLevel] {
        &self.asks
    }
}

/// Candle series from the first venue in priority order that had one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleSeries {
    pub venue: VenueId,
    pub series: Vec<Candle>,
}

/// Consolidated cross-venue view for one cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedView {
    /// Successful venues only, in roster order
    pub venues: Vec<VenueSnapshot>,
    pub aggregated_bids: Vec<DepthLevel>,
    pub aggregated_asks: Vec<DepthLevel>,
    pub spread: Option<f64>,
    pub candles: Option<CandleSeries>,
}

impl AggregatedView {
    pub fn new(venues: Vec<VenueSnapshot>, merged: MergedBook, candles: Option<CandleSeries>) -> Self {
        Self {
            venues,
            aggregated_bids: merged.bids,
            aggregated_asks: merged.asks,
            spread: merged.spread,
            candles,
        }
    }

    pub fn venue(&self, id: VenueId) -> Option<&VenueSnapshot> {
        self.venues.iter().find(|v| v.id == id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
