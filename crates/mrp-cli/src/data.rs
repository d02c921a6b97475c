//! Delimited-file ingestion for the four scenario tables.
//! Headers are matched case-insensitively.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use mrp_core::{
    BomLine, DemandRequirement, InventoryLot, Item, PartNumber, SerialEffectivity,
    SerializedInventory,
};
use std::collections::HashMap;
use std::path::Path;

struct HeaderMap {
    indices: HashMap<String, usize>,
}

impl HeaderMap {
    fn new(headers: &csv::StringRecord, required: &[&str]) -> Result<Self> {
        let indices: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim().to_ascii_lowercase(), idx))
            .collect();

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|name| !indices.contains_key(*name))
            .collect();
        if !missing.is_empty() {
            bail!("missing required columns: {}", missing.join(", "));
        }

        Ok(Self { indices })
    }

    fn get<'a>(&self, record: &'a csv::StringRecord, name: &str) -> Result<&'a str> {
        self.indices
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
            .with_context(|| format!("missing value for column {name}"))
    }

    fn get_optional<'a>(&self, record: &'a csv::StringRecord, name: &str) -> Option<&'a str> {
        self.indices
            .get(name)
            .and_then(|&idx| record.get(idx))
            .map(str::trim)
    }
}

fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("invalid date {s:?}, expected YYYY-MM-DD"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

fn reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::Reader::from_path(path)
        .with_context(|| format!("cannot open {}", path.display()))
}

pub fn load_items(path: &Path) -> Result<Vec<Item>> {
    let mut rdr = reader(path)?;
    let map = HeaderMap::new(
        rdr.headers()?,
        &[
            "part_number",
            "description",
            "lead_time_days",
            "lot_size_rule",
            "min_order_qty",
            "max_order_qty",
            "safety_stock",
            "unit_of_measure",
            "make_buy_code",
        ],
    )
    .with_context(|| format!("items file {}", path.display()))?;

    let mut items = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let item = (|| -> Result<Item> {
            let item = Item::new(map.get(&record, "part_number")?, map.get(&record, "description")?)
                .with_lead_time(map.get(&record, "lead_time_days")?.parse()?)
                .with_lot_size_rule(map.get(&record, "lot_size_rule")?.parse()?)
                .with_min_order_qty(map.get(&record, "min_order_qty")?.parse()?)
                .with_max_order_qty(map.get(&record, "max_order_qty")?.parse()?)
                .with_safety_stock(map.get(&record, "safety_stock")?.parse()?)
                .with_unit_of_measure(map.get(&record, "unit_of_measure")?)
                .with_make_buy_code(map.get(&record, "make_buy_code")?.parse()?);
            item.validate()?;
            Ok(item)
        })()
        .with_context(|| format!("items row {}", row + 2))?;
        items.push(item);
    }
    Ok(items)
}

pub fn load_bom(path: &Path) -> Result<Vec<BomLine>> {
    let mut rdr = reader(path)?;
    let map = HeaderMap::new(
        rdr.headers()?,
        &[
            "parent_pn",
            "child_pn",
            "qty_per",
            "find_number",
            "from_serial",
            "to_serial",
        ],
    )
    .with_context(|| format!("BOM file {}", path.display()))?;

    let mut lines = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let line = (|| -> Result<BomLine> {
            let effectivity = SerialEffectivity::new(
                map.get(&record, "from_serial")?,
                map.get(&record, "to_serial")?,
            );
            let priority = match map.get_optional(&record, "priority") {
                Some(value) if !value.is_empty() => value.parse()?,
                _ => 0,
            };
            let line = BomLine::new(
                map.get(&record, "parent_pn")?,
                map.get(&record, "child_pn")?,
                map.get(&record, "qty_per")?.parse()?,
                map.get(&record, "find_number")?.parse()?,
                effectivity,
            )
            .with_priority(priority);
            line.validate()?;
            Ok(line)
        })()
        .with_context(|| format!("BOM row {}", row + 2))?;
        lines.push(line);
    }
    Ok(lines)
}

pub fn load_inventory(path: &Path) -> Result<(Vec<InventoryLot>, Vec<SerializedInventory>)> {
    let mut rdr = reader(path)?;
    let map = HeaderMap::new(
        rdr.headers()?,
        &[
            "part_number",
            "type",
            "identifier",
            "location",
            "quantity",
            "receipt_date",
            "status",
        ],
    )
    .with_context(|| format!("inventory file {}", path.display()))?;

    let mut lots = Vec::new();
    let mut units = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        (|| -> Result<()> {
            let part_number = PartNumber::new(map.get(&record, "part_number")?);
            let identifier = map.get(&record, "identifier")?.to_string();
            let location = map.get(&record, "location")?.to_string();
            let receipt_date = parse_date(map.get(&record, "receipt_date")?)?;
            let status = map.get(&record, "status")?.parse()?;

            match map.get(&record, "type")?.to_ascii_lowercase().as_str() {
                "lot" => lots.push(InventoryLot {
                    part_number,
                    lot_number: identifier,
                    location,
                    quantity: map.get(&record, "quantity")?.parse()?,
                    receipt_date,
                    status,
                }),
                // Serial rows are quantity 1 regardless of the column
                "serial" => units.push(SerializedInventory {
                    part_number,
                    serial_number: identifier,
                    location,
                    status,
                    receipt_date,
                }),
                other => bail!("unknown inventory type {other:?}, expected lot or serial"),
            }
            Ok(())
        })()
        .with_context(|| format!("inventory row {}", row + 2))?;
    }
    Ok((lots, units))
}

pub fn load_demands(path: &Path) -> Result<Vec<DemandRequirement>> {
    let mut rdr = reader(path)?;
    let map = HeaderMap::new(
        rdr.headers()?,
        &[
            "part_number",
            "quantity",
            "need_date",
            "demand_source",
            "location",
            "target_serial",
        ],
    )
    .with_context(|| format!("demands file {}", path.display()))?;

    let mut demands = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let demand = (|| -> Result<DemandRequirement> {
            Ok(DemandRequirement {
                part_number: PartNumber::new(map.get(&record, "part_number")?),
                quantity: map.get(&record, "quantity")?.parse()?,
                need_date: parse_date(map.get(&record, "need_date")?)?,
                demand_source: map.get(&record, "demand_source")?.to_string(),
                location: map.get(&record, "location")?.to_string(),
                target_serial: map.get(&record, "target_serial")?.to_string(),
            })
        })()
        .with_context(|| format!("demands row {}", row + 2))?;
        demands.push(demand);
    }
    Ok(demands)
}
