use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;

mod data;
mod output;

use mrp_calc::MrpPlanner;
use mrp_core::repository::memory::{
    InMemoryBomRepository, InMemoryDemandRepository, InMemoryInventoryRepository,
    InMemoryItemRepository,
};
use mrp_core::{
    BomRepository, CancelToken, DemandRepository, InventoryRepository, ItemRepository,
};
use mrp_graph::{validate_bom, validate_bom_item_consistency, validate_part_number_uniqueness};

#[derive(Parser)]
#[command(name = "mrp")]
#[command(about = "MRP planning engine with serial-effectivity configuration management")]
#[command(version)]
struct Cli {
    /// Scenario directory holding items.csv, bom.csv, inventory.csv, demands.csv
    #[arg(long, value_name = "DIR", conflicts_with_all = ["bom", "items", "inventory", "demands"])]
    scenario: Option<PathBuf>,

    /// BOM lines file
    #[arg(long, value_name = "FILE")]
    bom: Option<PathBuf>,

    /// Item master file
    #[arg(long, value_name = "FILE")]
    items: Option<PathBuf>,

    /// Inventory file (lot and serial rows)
    #[arg(long, value_name = "FILE")]
    inventory: Option<PathBuf>,

    /// Independent demands file
    #[arg(long, value_name = "FILE")]
    demands: Option<PathBuf>,

    /// Output directory; reports go to stdout when omitted
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Report format: text, json, csv, html
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

struct InputPaths {
    items: PathBuf,
    bom: PathBuf,
    inventory: PathBuf,
    demands: PathBuf,
}

impl Cli {
    fn input_paths(&self) -> Result<InputPaths> {
        if let Some(dir) = &self.scenario {
            return Ok(InputPaths {
                items: dir.join("items.csv"),
                bom: dir.join("bom.csv"),
                inventory: dir.join("inventory.csv"),
                demands: dir.join("demands.csv"),
            });
        }

        match (&self.items, &self.bom, &self.inventory, &self.demands) {
            (Some(items), Some(bom), Some(inventory), Some(demands)) => Ok(InputPaths {
                items: items.clone(),
                bom: bom.clone(),
                inventory: inventory.clone(),
                demands: demands.clone(),
            }),
            _ => bail!("pass --scenario <dir>, or all of --items, --bom, --inventory, --demands"),
        }
    }
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let paths = cli.input_paths()?;

    if cli.verbose {
        eprintln!("{}", "loading input files".cyan());
    }
    let items = data::load_items(&paths.items)?;
    let bom_lines = data::load_bom(&paths.bom)?;
    let (lots, serialized) = data::load_inventory(&paths.inventory)?;
    let demand_rows = data::load_demands(&paths.demands)?;

    // Validate before planning
    validate_part_number_uniqueness(&items).context("item catalog validation failed")?;

    let bom_report = validate_bom(&bom_lines);
    if !bom_report.is_ok() {
        for error in &bom_report.errors {
            eprintln!("{} {error}", "validation:".red());
        }
        bail!("BOM validation failed with {} error(s)", bom_report.errors.len());
    }

    let consistency = validate_bom_item_consistency(&bom_lines, &items);
    if !consistency.is_ok() {
        for error in &consistency.errors {
            eprintln!("{} {error}", "validation:".red());
        }
        bail!(
            "BOM references {} part(s) missing from the item catalog",
            consistency.orphaned_parts.len()
        );
    }

    // Stage repositories
    let item_repo = InMemoryItemRepository::new();
    item_repo.load_items(items)?;

    let bom_repo = InMemoryBomRepository::new();
    bom_repo.load_bom_lines(bom_lines)?;

    let inventory_repo = InMemoryInventoryRepository::new();
    inventory_repo.load_inventory_lots(lots)?;
    inventory_repo.load_serialized_units(serialized)?;

    let demand_repo = InMemoryDemandRepository::new();
    demand_repo.load_demands(demand_rows)?;
    let demands = demand_repo.get_demands()?;

    if cli.verbose {
        eprintln!("{} {} demand(s)", "planning".cyan(), demands.len());
    }

    let planner = MrpPlanner::new();
    let result = planner
        .explode_demand(&CancelToken::new(), &demands, &bom_repo, &item_repo, &inventory_repo)
        .context("planning failed")?;

    output::render(&result, &cli.format, cli.output.as_deref())
}
