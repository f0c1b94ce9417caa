use simstep::SimulationRunner;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod region;
mod shopper;

use config::LoadGeneratorConfig;
use shopper::{Catalog, SimulatedShopper};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let config = match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => LoadGeneratorConfig::from_file(&path)?,
        None => LoadGeneratorConfig::default(),
    };

    println!("Starting load generator");
    println!("  Shoppers: {}", config.shoppers.shopper_count);
    println!(
        "  Simulated time: {} .. {}, interval {:?}",
        config.simulation.start_time, config.simulation.end_time, config.simulation.step_interval
    );
    println!("  Speedup: {}x, parallel: {}", config.speedup, config.parallel);

    let catalog = Arc::new(Catalog::generate(config.shoppers.catalog_size, config.shoppers.sale_every));
    let shoppers = (0..config.shoppers.shopper_count)
        .map(|index| SimulatedShopper::new(index, catalog.clone(), config.shoppers.clone()));

    let mut runner = SimulationRunner::builder(config.simulation.clone())
        .add_instances(shoppers)
        .with_execution_config(config.execution_config())
        .build()?;

    let result = runner.run(config.speedup)?;
    println!("Simulation finished: {:?} (next step {})", result.status, result.next_time);

    let mut per_region = BTreeMap::new();
    for shopper in runner.into_instances() {
        let entry = per_region.entry(shopper.region()).or_insert((0u32, 0u64, 0u32, 0u32));
        entry.0 += 1;
        entry.1 += shopper.stats().steps;
        entry.2 += shopper.stats().items_added;
        entry.3 += shopper.stats().items_removed;
    }
    println!("Region  shoppers  steps  added  removed");
    for (region, (shoppers, steps, added, removed)) in per_region {
        println!("{:<7} {:>8} {:>6} {:>6} {:>8}", region.to_string(), shoppers, steps, added, removed);
    }

    Ok(())
}
