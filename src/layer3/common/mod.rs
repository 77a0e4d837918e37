// Layer3 Common Module - Shared utilities for trackers and history

pub mod time_windows;

pub use time_windows::{CvdWindow, TimeWindow};
