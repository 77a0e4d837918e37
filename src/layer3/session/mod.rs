// Dashboard Session - long-lived engine handle, chart history and refresh loop

pub mod driver;
pub mod history;

pub use driver::{DashboardSession, RefreshDriver};
pub use history::{SignalHistory, VenueHistory};
