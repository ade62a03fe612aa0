//! Simulation tuning.
//!
//! Every field has a default, so a partial JSON document (or `{}`) is a
//! valid configuration.

use cardshop_logic::grid::Tile;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Staff controller tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffConfig {
    pub speed_tiles_per_s: f32,
    pub scan_interval_s: f32,
    pub stock_time_s: f32,
    /// A shelf needs restock when `qty <= floor(max * ratio)`.
    pub restock_threshold_ratio: f32,
    pub restock_batch: u32,
    pub start_tile: Tile,
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            speed_tiles_per_s: 4.0,
            scan_interval_s: 0.8,
            stock_time_s: 0.8,
            restock_threshold_ratio: 0.999,
            restock_batch: 2,
            start_tile: Tile::new(1, 10),
        }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub grid_width: u32,
    pub grid_height: u32,
    pub day_duration_s: f64,
    pub night_duration_s: f64,
    pub delivery_delay_s: f64,
    pub seed: u64,
    pub start_money: u64,
    pub start_boosters: u32,
    pub max_customers_per_day: u32,
    pub shelf_capacity: u32,
    pub staff: StaffConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 12,
            day_duration_s: 300.0,
            night_duration_s: 60.0,
            delivery_delay_s: 30.0,
            seed: 1337,
            start_money: 1400,
            start_boosters: 3,
            max_customers_per_day: 14,
            shelf_capacity: 10,
            staff: StaffConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate a JSON config.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::Invalid {
                field,
                reason: reason.into(),
            }
        }

        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(invalid("grid_width", "grid must be at least 1x1"));
        }
        for (field, value) in [
            ("day_duration_s", self.day_duration_s),
            ("night_duration_s", self.night_duration_s),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, format!("must be positive, got {value}")));
            }
        }
        if !(self.delivery_delay_s.is_finite() && self.delivery_delay_s > 0.0) {
            return Err(invalid(
                "delivery_delay_s",
                format!("must be positive, got {}", self.delivery_delay_s),
            ));
        }
        if self.shelf_capacity == 0 {
            return Err(invalid("shelf_capacity", "must be at least 1"));
        }

        let staff = &self.staff;
        if !(staff.speed_tiles_per_s.is_finite() && staff.speed_tiles_per_s > 0.0) {
            return Err(invalid("staff.speed_tiles_per_s", "must be positive"));
        }
        if !(staff.scan_interval_s >= 0.0 && staff.stock_time_s >= 0.0) {
            return Err(invalid("staff.scan_interval_s", "timers cannot be negative"));
        }
        if !(0.0..=1.0).contains(&staff.restock_threshold_ratio) {
            return Err(invalid(
                "staff.restock_threshold_ratio",
                format!("must be within 0..=1, got {}", staff.restock_threshold_ratio),
            ));
        }
        if staff.restock_batch == 0 {
            return Err(invalid("staff.restock_batch", "must be at least 1"));
        }
        let t = staff.start_tile;
        if t.x < 0 || t.y < 0 || t.x as u32 >= self.grid_width || t.y as u32 >= self.grid_height {
            return Err(invalid("staff.start_tile", format!("{t} is outside the grid")));
        }
        Ok(())
    }
}
