//! Configuration for the load generator demo.

use serde::Deserialize;
use simstep::{ConcurrencyMode, ExecutionConfig, SimOptions, SimTime};
use std::path::Path;
use std::time::Duration;

/// Behaviour knobs for the synthetic shoppers
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShopperOptions {
    pub shopper_count: usize,
    /// Odds (1 in N) of adding an item on the first step. 0 disables it.
    pub initial_add_item_odds: u32,
    /// Max (inclusive) sleep time between shopper actions, in seconds
    pub max_sleep_time_seconds: u64,
    /// Cart size at which a shopper starts removing items
    pub remove_item_threshold: u32,
    /// Every Nth shopper prefers sale items
    pub sale_item_preference_odds: usize,
    /// Odds (1 in N) that a sale-preferring shopper picks a sale item
    pub sale_item_choice_odds: u32,
    /// Steps after which a shopper leaves. `None` keeps it shopping until the end time.
    pub max_steps: Option<u64>,
    pub catalog_size: usize,
    /// Every Nth catalog product is on sale
    pub sale_every: usize,
    pub random_seed: u64,
}

impl Default for ShopperOptions {
    fn default() -> Self {
        Self {
            shopper_count: 100,
            initial_add_item_odds: 5,
            max_sleep_time_seconds: 5,
            remove_item_threshold: 7,
            sale_item_preference_odds: 10,
            sale_item_choice_odds: 2,
            max_steps: None,
            catalog_size: 30,
            sale_every: 6,
            random_seed: 42,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadGeneratorConfig {
    pub simulation: SimOptions,
    pub shoppers: ShopperOptions,
    /// Factor by which simulated time runs faster than real time
    pub speedup: u32,
    pub parallel: bool,
    pub thread_pool_size: Option<usize>,
}

impl Default for LoadGeneratorConfig {
    fn default() -> Self {
        Self {
            simulation: SimOptions::new(SimTime::ZERO, SimTime::from_secs(60), Duration::from_secs(1)),
            shoppers: ShopperOptions::default(),
            speedup: 10,
            parallel: false,
            thread_pool_size: None,
        }
    }
}

impl LoadGeneratorConfig {
    /// Read the config from a JSON file; missing sections fall back to defaults
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn execution_config(&self) -> ExecutionConfig {
        let mode = if self.parallel {
            ConcurrencyMode::Rayon
        } else {
            ConcurrencyMode::Sequential
        };
        let config = ExecutionConfig::new().with_concurrency(mode);
        match self.thread_pool_size {
            Some(size) => config.with_thread_pool_size(size),
            None => config,
        }
    }
}
