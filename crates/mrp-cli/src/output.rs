//! Report rendering: text, JSON, CSV, and a minimal HTML page.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use mrp_calc::MrpResult;
use mrp_core::{AllocationResult, PlannedOrder, Shortage};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct PlanReport<'a> {
    planned_orders: &'a [PlannedOrder],
    allocations: &'a [AllocationResult],
    shortages: &'a [Shortage],
    explosion_cache_entries: usize,
}

impl<'a> PlanReport<'a> {
    fn new(result: &'a MrpResult) -> Self {
        Self {
            planned_orders: &result.planned_orders,
            allocations: &result.allocations,
            shortages: &result.shortages,
            explosion_cache_entries: result.explosion_cache.len(),
        }
    }
}

pub fn render(result: &MrpResult, format: &str, output_dir: Option<&Path>) -> Result<()> {
    let report = PlanReport::new(result);
    match format {
        "text" => render_text(&report),
        "json" => emit(output_dir, "plan.json", serde_json::to_string_pretty(&report)?),
        "csv" => render_csv(&report, output_dir),
        "html" => emit(output_dir, "plan.html", render_html(&report)),
        other => bail!("unknown report format {other:?}, expected text, json, csv or html"),
    }
}

fn day(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn render_text(report: &PlanReport<'_>) -> Result<()> {
    println!("{}", "Planned Orders".bold().cyan());
    if report.planned_orders.is_empty() {
        println!("  (none)");
    }
    for order in report.planned_orders {
        println!(
            "  {:<20} qty {:>8}  {} -> {}  {:?}  {}",
            order.part_number.as_str(),
            order.quantity,
            day(&order.start_date),
            day(&order.due_date),
            order.order_type,
            order.demand_trace.dimmed(),
        );
    }

    println!();
    println!("{}", "Allocations".bold().cyan());
    if report.allocations.is_empty() {
        println!("  (none)");
    }
    for alloc in report.allocations {
        println!(
            "  {:<20} {:<12} allocated {:>8}  remaining {:>8}",
            alloc.part_number.as_str(),
            alloc.location,
            alloc.allocated_qty,
            alloc.remaining_demand,
        );
    }

    println!();
    if report.shortages.is_empty() {
        println!("{}", "No shortages".bold().green());
    } else {
        println!("{}", "Shortages".bold().red());
        for shortage in report.shortages {
            println!(
                "  {:<20} {:<12} short {:>8}  need {}  {}",
                shortage.part_number.as_str(),
                shortage.location,
                shortage.short_qty,
                day(&shortage.need_date),
                shortage.demand_trace.dimmed(),
            );
        }
    }

    println!();
    println!(
        "{} {} explosion cache entries",
        "Cache:".bold(),
        report.explosion_cache_entries
    );
    Ok(())
}

fn render_csv(report: &PlanReport<'_>, output_dir: Option<&Path>) -> Result<()> {
    let orders = {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "part_number",
            "quantity",
            "start_date",
            "due_date",
            "order_type",
            "location",
            "target_serial",
            "demand_trace",
        ])?;
        for order in report.planned_orders {
            wtr.write_record([
                order.part_number.as_str().to_string(),
                order.quantity.to_string(),
                day(&order.start_date),
                day(&order.due_date),
                format!("{:?}", order.order_type),
                order.location.clone(),
                order.target_serial.clone(),
                order.demand_trace.clone(),
            ])?;
        }
        String::from_utf8(wtr.into_inner()?)?
    };

    let allocations = {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(["part_number", "location", "allocated_qty", "remaining_demand"])?;
        for alloc in report.allocations {
            wtr.write_record([
                alloc.part_number.as_str().to_string(),
                alloc.location.clone(),
                alloc.allocated_qty.to_string(),
                alloc.remaining_demand.to_string(),
            ])?;
        }
        String::from_utf8(wtr.into_inner()?)?
    };

    let shortages = {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record([
            "part_number",
            "location",
            "short_qty",
            "need_date",
            "target_serial",
            "demand_trace",
        ])?;
        for shortage in report.shortages {
            wtr.write_record([
                shortage.part_number.as_str().to_string(),
                shortage.location.clone(),
                shortage.short_qty.to_string(),
                day(&shortage.need_date),
                shortage.target_serial.clone(),
                shortage.demand_trace.clone(),
            ])?;
        }
        String::from_utf8(wtr.into_inner()?)?
    };

    emit(output_dir, "planned_orders.csv", orders)?;
    emit(output_dir, "allocations.csv", allocations)?;
    emit(output_dir, "shortages.csv", shortages)?;
    Ok(())
}

fn render_html(report: &PlanReport<'_>) -> String {
    let mut html = String::from(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>MRP Plan</title>\n\
         <style>table{border-collapse:collapse}td,th{border:1px solid #999;padding:4px 8px}</style>\n\
         </head>\n<body>\n",
    );

    html.push_str("<h2>Planned Orders</h2>\n<table>\n<tr><th>Part</th><th>Qty</th><th>Start</th><th>Due</th><th>Type</th><th>Trace</th></tr>\n");
    for order in report.planned_orders {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:?}</td><td>{}</td></tr>\n",
            order.part_number.as_str(),
            order.quantity,
            day(&order.start_date),
            day(&order.due_date),
            order.order_type,
            order.demand_trace,
        ));
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Allocations</h2>\n<table>\n<tr><th>Part</th><th>Location</th><th>Allocated</th><th>Remaining</th></tr>\n");
    for alloc in report.allocations {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            alloc.part_number.as_str(),
            alloc.location,
            alloc.allocated_qty,
            alloc.remaining_demand,
        ));
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Shortages</h2>\n<table>\n<tr><th>Part</th><th>Location</th><th>Short</th><th>Need</th></tr>\n");
    for shortage in report.shortages {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            shortage.part_number.as_str(),
            shortage.location,
            shortage.short_qty,
            day(&shortage.need_date),
        ));
    }
    html.push_str("</table>\n</body>\n</html>\n");

    html
}

fn emit(output_dir: Option<&Path>, filename: &str, content: String) -> Result<()> {
    match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
            let path = dir.join(filename);
            std::fs::write(&path, content)
                .with_context(|| format!("cannot write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        None => println!("{content}"),
    }
    Ok(())
}
