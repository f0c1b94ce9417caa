//! Synthetic shoppers driven by the simulation runner.

use crate::config::ShopperOptions;
use crate::region::Region;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use simstep::{InstanceError, SimTime, SimulationInstance, PAUSE_INDEFINITELY};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Product {
    pub sku: String,
    pub on_sale: bool,
}

/// Products shared by every shopper
#[derive(Debug)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub sale_items: Vec<Product>,
}

impl Catalog {
    pub fn generate(size: usize, sale_every: usize) -> Self {
        let products: Vec<Product> = (0..size)
            .map(|n| Product {
                sku: format!("SKU-{:04}", n + 1),
                on_sale: sale_every > 0 && n % sale_every == 0,
            })
            .collect();
        let sale_items = products.iter().filter(|p| p.on_sale).cloned().collect();
        Self { products, sale_items }
    }
}

#[derive(Debug, Clone)]
struct CartItem {
    sku: String,
    quantity: u32,
}

/// Counters collected by a shopper over its lifetime
#[derive(Debug, Clone, Default)]
pub struct ShopperStats {
    pub steps: u64,
    pub items_added: u32,
    pub items_removed: u32,
}

pub struct SimulatedShopper {
    id: String,
    region: Region,
    prefers_sale_items: bool,
    cart: Vec<CartItem>,
    items_in_cart: u32,
    stats: ShopperStats,
    catalog: Arc<Catalog>,
    options: ShopperOptions,
    // RNG for reproducible simulations
    rng: StdRng,
}

impl SimulatedShopper {
    pub fn new(index: usize, catalog: Arc<Catalog>, options: ShopperOptions) -> Self {
        let mut rng = StdRng::seed_from_u64(options.random_seed.wrapping_add(index as u64));
        let region = Region::random(&mut rng);
        let prefers_sale_items =
            options.sale_item_preference_odds > 0 && index % options.sale_item_preference_odds == 0;
        Self {
            id: format!("shopper_{:05}", index),
            region,
            prefers_sale_items,
            cart: Vec::new(),
            items_in_cart: 0,
            stats: ShopperStats::default(),
            catalog,
            options,
            rng,
        }
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn stats(&self) -> &ShopperStats {
        &self.stats
    }

    fn one_in(&mut self, odds: u32) -> bool {
        odds > 0 && self.rng.gen_range(0..odds) == 0
    }

    fn choose_product(&mut self) -> (String, u32) {
        let quantity = self.rng.gen_range(1..=3);
        let choice_odds = self.options.sale_item_choice_odds;
        if self.prefers_sale_items && !self.catalog.sale_items.is_empty() && self.one_in(choice_odds) {
            let index = self.rng.gen_range(0..self.catalog.sale_items.len());
            return (self.catalog.sale_items[index].sku.clone(), quantity);
        }
        let index = self.rng.gen_range(0..self.catalog.products.len());
        (self.catalog.products[index].sku.clone(), quantity)
    }

    fn add_item(&mut self, simulation_time: SimTime) {
        if self.catalog.products.is_empty() {
            return;
        }
        let (sku, quantity) = self.choose_product();
        log::info!(
            "[Shopper {} {}] {} add {} x {}",
            self.id, self.region, simulation_time, quantity, sku
        );
        self.items_in_cart += quantity;
        self.stats.items_added += quantity;
        self.cart.push(CartItem { sku, quantity });
    }

    fn remove_item(&mut self, simulation_time: SimTime) {
        if self.cart.is_empty() {
            return;
        }
        let index = self.rng.gen_range(0..self.cart.len());
        let item = self.cart.swap_remove(index);
        log::info!(
            "[Shopper {} {}] {} remove {} x {}",
            self.id, self.region, simulation_time, item.quantity, item.sku
        );
        self.items_in_cart -= item.quantity;
        self.stats.items_removed += item.quantity;
    }

    fn think_time(&mut self) -> Duration {
        let max = self.options.max_sleep_time_seconds.max(1);
        Duration::from_secs(self.rng.gen_range(1..=max))
    }
}

impl SimulationInstance for SimulatedShopper {
    fn process_time_step(&mut self, simulation_time: SimTime) -> Result<Duration, InstanceError> {
        if self.stats.steps == 0 {
            if self.one_in(self.options.initial_add_item_odds) {
                self.add_item(simulation_time);
            }
        } else if self.items_in_cart >= self.options.remove_item_threshold {
            self.remove_item(simulation_time);
        } else {
            self.add_item(simulation_time);
        }
        self.stats.steps += 1;

        if self.options.max_steps.is_some_and(|max| self.stats.steps >= max) {
            log::debug!("[Shopper {}] done after {} steps", self.id, self.stats.steps);
            return Ok(PAUSE_INDEFINITELY);
        }
        Ok(self.think_time())
    }
}
