// Core Module - Foundational types, config, logging

pub mod types;
pub mod config;
pub mod logger;

// Re-export commonly used items for convenience
pub use types::*;
pub use config::{
    VenueConfig, EngineConfig, MonitoringConfig,
    ConfigManager, ConfigSummary, ConfigError,
};
pub use logger::{setup_logging, setup_logging_from_config};
