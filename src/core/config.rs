// Configuration Management for Market Pulse
// JSON file + environment overrides, grouped into venue/engine/monitoring sections

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::types::VenueId;
use crate::layer2::parser::timeframe_seconds;

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

// ============================================================================
// Configuration Structures
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    /// Ordered venue roster; unknown ids are excluded at engine init
    pub roster: Vec<String>,

    // REST endpoints
    pub binance_base_url: String,
    pub bybit_base_url: String,
    pub coinbase_base_url: String,
    pub hyperliquid_base_url: String,

    // Connection settings
    pub request_timeout_seconds: u32,
    pub requests_per_minute: u32,
    pub user_agent: String,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            roster: vec![
                "binance".to_string(),
                "coinbase".to_string(),
                "bybit".to_string(),
                "hyperliquid".to_string(),
            ],
            binance_base_url: "https://api.binance.com".to_string(),
            bybit_base_url: "https://api.bybit.com".to_string(),
            coinbase_base_url: "https://api.exchange.coinbase.com".to_string(),
            hyperliquid_base_url: "https://api.hyperliquid.xyz".to_string(),
            request_timeout_seconds: 10,
            requests_per_minute: 1200,
            user_agent: concat!("market-pulse/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl VenueConfig {
    pub fn base_url(&self, venue: VenueId) -> &str {
        match venue {
            VenueId::Binance => &self.binance_base_url,
            VenueId::Bybit => &self.bybit_base_url,
            VenueId::Coinbase => &self.coinbase_base_url,
            VenueId::Hyperliquid => &self.hyperliquid_base_url,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub symbol: String,

    // Order book
    pub depth: usize,                    // Levels per side fetched and used for imbalance
    pub merge_levels_per_venue: usize,   // Levels per venue fed into the merged book
    pub aggregated_levels: usize,        // Levels per side kept in the merged book

    // Trades
    pub seed_trade_limit: usize,         // Trades fetched per venue at init
    pub trade_limit: usize,              // Trades fetched per venue per cycle

    // Candles
    pub include_candles: bool,
    pub candle_timeframe: String,
    pub candle_limit: usize,
    pub candle_priority: Vec<String>,

    // Refresh cadence
    pub tick_interval_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbol: "BTC/USDT".to_string(),
            depth: 30,
            merge_levels_per_venue: 15,
            aggregated_levels: 10,
            seed_trade_limit: 100,
            trade_limit: 50,
            include_candles: true,
            candle_timeframe: "1m".to_string(),
            candle_limit: 100,
            candle_priority: vec![
                "binance".to_string(),
                "bybit".to_string(),
                "coinbase".to_string(),
                "hyperliquid".to_string(),
            ],
            tick_interval_secs: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub json_logs: bool,
    pub history_points: usize,
    pub imbalance_history_points: usize,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            log_level: "INFO".to_string(),
            json_logs: false,
            history_points: 100,
            imbalance_history_points: 20,
        }
    }
}

// ============================================================================
// Configuration Summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    pub symbol: String,
    pub roster: Vec<String>,
    pub depth: usize,
    pub tick_interval_secs: u64,
    pub include_candles: bool,
    pub log_level: String,
}

// ============================================================================
// Configuration Manager
// ============================================================================

pub struct ConfigManager {
    venues: Arc<RwLock<VenueConfig>>,
    engine: Arc<RwLock<EngineConfig>>,
    monitoring: Arc<RwLock<MonitoringConfig>>,
}

impl Default for ConfigManager {
    /// Built-in defaults only; no file and no environment
    fn default() -> Self {
        Self {
            venues: Arc::new(RwLock::new(VenueConfig::default())),
            engine: Arc::new(RwLock::new(EngineConfig::default())),
            monitoring: Arc::new(RwLock::new(MonitoringConfig::default())),
        }
    }
}

impl ConfigManager {
    pub fn new(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut manager = Self::default();

        if let Some(path) = config_path {
            manager.load_from_file(path)?;
        }

        manager.load_from_env();

        info!("Configuration initialized");
        Ok(manager)
    }

    /// Load configuration from JSON file
    pub fn load_from_file(&mut self, config_path: &str) -> Result<(), ConfigError> {
        let path = Path::new(config_path);
        if !path.exists() {
            warn!(path = config_path, "Config file not found");
            return Ok(());
        }

        let content = fs::read_to_string(path)?;
        self.load_from_str(&content)?;

        info!(path = config_path, "Configuration loaded");
        Ok(())
    }

    /// Apply sections from a JSON document. Missing sections keep their current
    /// values; missing fields inside a section take defaults.
    pub fn load_from_str(&mut self, content: &str) -> Result<(), ConfigError> {
        let config_data: HashMap<String, serde_json::Value> = serde_json::from_str(content)?;

        if let Some(venues_data) = config_data.get("venues") {
            *self.venues.write() = serde_json::from_value::<VenueConfig>(venues_data.clone())?;
        }

        if let Some(engine_data) = config_data.get("engine") {
            *self.engine.write() = serde_json::from_value::<EngineConfig>(engine_data.clone())?;
        }

        if let Some(monitoring_data) = config_data.get("monitoring") {
            *self.monitoring.write() = serde_json::from_value::<MonitoringConfig>(monitoring_data.clone())?;
        }

        Ok(())
    }

    /// Apply environment overrides
    pub fn load_from_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(symbol) = lookup("MARKET_PULSE_SYMBOL") {
            self.engine.write().symbol = symbol;
        }
        if let Some(venues) = lookup("MARKET_PULSE_VENUES") {
            self.venues.write().roster = venues
                .split(',')
                .map(|v| v.trim().to_lowercase())
                .filter(|v| !v.is_empty())
                .collect();
        }
        if let Some(depth) = lookup("MARKET_PULSE_DEPTH") {
            match depth.parse::<usize>() {
                Ok(d) => self.engine.write().depth = d,
                Err(_) => warn!(value = %depth, "Ignoring invalid MARKET_PULSE_DEPTH"),
            }
        }
        if let Some(tick) = lookup("MARKET_PULSE_TICK_SECS") {
            match tick.parse::<u64>() {
                Ok(t) => self.engine.write().tick_interval_secs = t,
                Err(_) => warn!(value = %tick, "Ignoring invalid MARKET_PULSE_TICK_SECS"),
            }
        }
        if let Some(level) = lookup("MARKET_PULSE_LOG_LEVEL") {
            self.monitoring.write().log_level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();
        let venues = self.venues.read();
        let engine = self.engine.read();

        if venues.roster.is_empty() {
            errors.push("venue roster is empty".to_string());
        }
        if !engine.symbol.contains('/') {
            errors.push(format!("symbol '{}' must be BASE/QUOTE", engine.symbol));
        }
        if engine.depth == 0 {
            errors.push("depth must be at least 1".to_string());
        }
        if engine.aggregated_levels == 0 || engine.merge_levels_per_venue == 0 {
            errors.push("merge level counts must be at least 1".to_string());
        }
        if engine.tick_interval_secs < 1 || engine.tick_interval_secs > 60 {
            errors.push("tick_interval_secs must be between 1 and 60".to_string());
        }
        if engine.include_candles && timeframe_seconds(&engine.candle_timeframe).is_none() {
            errors.push(format!("candle_timeframe '{}' is not a valid timeframe", engine.candle_timeframe));
        }
        if venues.request_timeout_seconds == 0 {
            errors.push("request_timeout_seconds must be at least 1".to_string());
        }

        if !errors.is_empty() {
            for error in &errors {
                warn!(error = %error, "Config validation error");
            }
            return Err(ConfigError::Validation(errors.join("; ")));
        }

        info!("Configuration validated successfully");
        Ok(())
    }

    /// Get configuration summary
    pub fn get_summary(&self) -> ConfigSummary {
        let venues = self.venues.read();
        let engine = self.engine.read();
        let monitoring = self.monitoring.read();

        ConfigSummary {
            symbol: engine.symbol.clone(),
            roster: venues.roster.clone(),
            depth: engine.depth,
            tick_interval_secs: engine.tick_interval_secs,
            include_candles: engine.include_candles,
            log_level: monitoring.log_level.clone(),
        }
    }

    pub fn venues(&self) -> VenueConfig {
        self.venues.read().clone()
    }

    pub fn engine(&self) -> EngineConfig {
        self.engine.read().clone()
    }

    pub fn monitoring(&self) -> MonitoringConfig {
        self.monitoring.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let venues = VenueConfig::default();
        assert_eq!(venues.roster, vec!["binance", "coinbase", "bybit", "hyperliquid"]);
        assert_eq!(venues.base_url(VenueId::Bybit), "https://api.bybit.com");
        assert_eq!(venues.requests_per_minute, 1200);

        let engine = EngineConfig::default();
        assert_eq!(engine.symbol, "BTC/USDT");
        assert_eq!(engine.depth, 30);
        assert_eq!(engine.merge_levels_per_venue, 15);
        assert_eq!(engine.aggregated_levels, 10);
        assert_eq!(engine.candle_priority[0], "binance");
    }

    #[test]
    fn test_config_manager_defaults_validate() {
        let manager = ConfigManager::default();
        assert!(manager.validate().is_ok());
    }

    #[test]
    fn test_partial_section_uses_defaults() {
        let mut manager = ConfigManager::default();
        manager
            .load_from_str(r#"{"engine": {"symbol": "ETH/USDT", "depth": 20}}"#)
            .unwrap();

        let engine = manager.engine();
        assert_eq!(engine.symbol, "ETH/USDT");
        assert_eq!(engine.depth, 20);
        assert_eq!(engine.trade_limit, 50);
        assert_eq!(manager.venues().roster.len(), 4);
    }

    #[test]
    fn test_env_overrides() {
        let mut manager = ConfigManager::default();
        let env: HashMap<&str, &str> = [
            ("MARKET_PULSE_SYMBOL", "SOL/USDT"),
            ("MARKET_PULSE_VENUES", "Bybit, binance,,"),
            ("MARKET_PULSE_DEPTH", "not-a-number"),
            ("MARKET_PULSE_TICK_SECS", "5"),
        ]
        .into_iter()
        .collect();

        manager.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        let summary = manager.get_summary();
        assert_eq!(summary.symbol, "SOL/USDT");
        assert_eq!(summary.roster, vec!["bybit", "binance"]);
        assert_eq!(summary.depth, 30);
        assert_eq!(summary.tick_interval_secs, 5);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut manager = ConfigManager::default();
        manager
            .load_from_str(r#"{"engine": {"symbol": "BTCUSDT", "depth": 0, "tick_interval_secs": 0}}"#)
            .unwrap();

        match manager.validate() {
            Err(ConfigError::Validation(msg)) => {
                assert!(msg.contains("BASE/QUOTE"));
                assert!(msg.contains("depth"));
                assert!(msg.contains("tick_interval_secs"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_section_is_an_error() {
        let mut manager = ConfigManager::default();
        let result = manager.load_from_str(r#"{"engine": {"depth": "thirty"}}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_validation_rejects_bad_candle_timeframe() {
        let mut manager = ConfigManager::default();
        manager.load_from_str(r#"{"engine": {"candle_timeframe": "1µ"}}"#).unwrap();
        match manager.validate() {
            Err(ConfigError::Validation(msg)) => assert!(msg.contains("candle_timeframe")),
            other => panic!("expected validation error, got {:?}", other),
        }

        manager
            .load_from_str(r#"{"engine": {"candle_timeframe": "1µ", "include_candles": false}}"#)
            .unwrap();
        assert!(manager.validate().is_ok());
    }
}
