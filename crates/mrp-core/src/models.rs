use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::{MrpError, Result};

/// Unique identifier for parts
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartNumber(pub String);

impl PartNumber {
    pub fn new(pn: impl Into<String>) -> Self {
        Self(pn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quantity in the item's unit of measure.
/// Non-negative in every externally observable field.
pub type Quantity = i64;

/// End-item serial range over which a BOM line applies.
///
/// Serials compare in lexicographic byte order ("AS501" < "AS506"). An empty
/// `to_serial` means the range is open ended.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SerialEffectivity {
    pub from_serial: String,
    pub to_serial: String,
}

impl SerialEffectivity {
    pub fn new(from_serial: impl Into<String>, to_serial: impl Into<String>) -> Self {
        Self {
            from_serial: from_serial.into(),
            to_serial: to_serial.into(),
        }
    }

    /// Range covering every serial from `from_serial` onward.
    pub fn open_ended(from_serial: impl Into<String>) -> Self {
        Self::new(from_serial, "")
    }

    /// Degenerate range `[serial, serial]`, used as an explosion cache key.
    pub fn point(serial: impl Into<String>) -> Self {
        let serial = serial.into();
        Self {
            from_serial: serial.clone(),
            to_serial: serial,
        }
    }

    pub fn is_open_ended(&self) -> bool {
        self.to_serial.is_empty()
    }

    /// Whether `serial` falls inside this range.
    pub fn includes(&self, serial: &str) -> bool {
        self.from_serial.as_str() <= serial
            && (self.is_open_ended() || serial <= self.to_serial.as_str())
    }

    pub fn validate(&self) -> Result<()> {
        if self.from_serial.is_empty() {
            return Err(MrpError::InvalidEffectivity(
                "from_serial must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Lot sizing policy applied when planned orders are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotSizeRule {
    /// Order exactly the net quantity
    LotForLot,

    /// Order at least the minimum order quantity
    MinimumQty,

    /// Round up to a whole number of packs (min order qty is the pack size)
    StandardPack,
}

impl FromStr for LotSizeRule {
    type Err = MrpError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "lotforlot" => Ok(Self::LotForLot),
            "minimumqty" => Ok(Self::MinimumQty),
            "standardpack" => Ok(Self::StandardPack),
            _ => Err(MrpError::InvalidLotSizeRule(s.to_string())),
        }
    }
}

/// Whether a part is produced in-house or procured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MakeBuyCode {
    Make,
    Buy,
}

impl FromStr for MakeBuyCode {
    type Err = MrpError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "make" => Ok(Self::Make),
            "buy" => Ok(Self::Buy),
            _ => Err(MrpError::InvalidMakeBuyCode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryStatus {
    /// On hand and allocatable
    Available,

    /// Reserved against a demand
    Allocated,

    /// Held out of planning
    Quarantine,
}

impl FromStr for InventoryStatus {
    type Err = MrpError;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_token(s).as_str() {
            "available" => Ok(Self::Available),
            "allocated" => Ok(Self::Allocated),
            "quarantine" => Ok(Self::Quarantine),
            _ => Err(MrpError::InvalidInventoryStatus(s.to_string())),
        }
    }
}

fn normalize_token(s: &str) -> String {
    s.chars()
        .filter(|c| *c != '_' && *c != '-' && *c != ' ')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Item master record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub part_number: PartNumber,
    pub description: String,

    /// Lead time in calendar days
    pub lead_time_days: u32,

    pub lot_size_rule: LotSizeRule,

    /// Minimum order quantity; doubles as pack size under `StandardPack`
    pub min_order_qty: Quantity,

    /// Maximum quantity per order; 0 means uncapped
    pub max_order_qty: Quantity,

    pub safety_stock: Quantity,
    pub unit_of_measure: String,
    pub make_buy_code: MakeBuyCode,
}

impl Item {
    pub fn new(part_number: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            part_number: PartNumber::new(part_number),
            description: description.into(),
            lead_time_days: 0,
            lot_size_rule: LotSizeRule::LotForLot,
            min_order_qty: 0,
            max_order_qty: 0,
            safety_stock: 0,
            unit_of_measure: "EA".to_string(),
            make_buy_code: MakeBuyCode::Make,
        }
    }

    pub fn with_lead_time(mut self, days: u32) -> Self {
        self.lead_time_days = days;
        self
    }

    pub fn with_lot_size_rule(mut self, rule: LotSizeRule) -> Self {
        self.lot_size_rule = rule;
        self
    }

    pub fn with_min_order_qty(mut self, qty: Quantity) -> Self {
        self.min_order_qty = qty;
        self
    }

    pub fn with_max_order_qty(mut self, qty: Quantity) -> Self {
        self.max_order_qty = qty;
        self
    }

    pub fn with_safety_stock(mut self, qty: Quantity) -> Self {
        self.safety_stock = qty;
        self
    }

    pub fn with_unit_of_measure(mut self, uom: impl Into<String>) -> Self {
        self.unit_of_measure = uom.into();
        self
    }

    pub fn with_make_buy_code(mut self, code: MakeBuyCode) -> Self {
        self.make_buy_code = code;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.part_number.as_str().is_empty() {
            return Err(MrpError::InvalidPartNumber(
                "item part number must not be empty".to_string(),
            ));
        }
        if self.min_order_qty < 0 {
            return Err(MrpError::InvalidQuantity(format!(
                "{}: min_order_qty must not be negative",
                self.part_number
            )));
        }
        if self.max_order_qty > 0 && self.min_order_qty > self.max_order_qty {
            return Err(MrpError::InvalidQuantity(format!(
                "{}: min_order_qty {} exceeds max_order_qty {}",
                self.part_number, self.min_order_qty, self.max_order_qty
            )));
        }
        Ok(())
    }
}

/// BOM line - one parent-child usage at a find number.
///
/// Lines sharing `(parent_pn, find_number)` are mutually exclusive
/// alternates; the selector picks the lowest `priority` (0 = primary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BomLine {
    pub parent_pn: PartNumber,
    pub child_pn: PartNumber,

    /// Units of child per unit of parent
    pub qty_per: Quantity,

    /// Material slot in the parent; alternates share it
    pub find_number: u32,

    pub effectivity: SerialEffectivity,

    /// Preference among alternates; lower wins
    pub priority: u32,
}

impl BomLine {
    pub fn new(
        parent_pn: impl Into<String>,
        child_pn: impl Into<String>,
        qty_per: Quantity,
        find_number: u32,
        effectivity: SerialEffectivity,
    ) -> Self {
        Self {
            parent_pn: PartNumber::new(parent_pn),
            child_pn: PartNumber::new(child_pn),
            qty_per,
            find_number,
            effectivity,
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Whether this line applies when building the given end-item serial.
    pub fn is_effective_for(&self, target_serial: &str) -> bool {
        self.effectivity.includes(target_serial)
    }

    pub fn validate(&self) -> Result<()> {
        if self.qty_per < 1 {
            return Err(MrpError::InvalidQuantity(format!(
                "{} -> {}: qty_per must be at least 1",
                self.parent_pn, self.child_pn
            )));
        }
        self.effectivity.validate()
    }
}

/// On-hand inventory tracked by lot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryLot {
    pub part_number: PartNumber,
    pub lot_number: String,
    pub location: String,
    pub quantity: Quantity,
    pub receipt_date: DateTime<Utc>,
    pub status: InventoryStatus,
}

/// On-hand inventory tracked by unit serial number; quantity is implicitly 1
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedInventory {
    pub part_number: PartNumber,
    pub serial_number: String,
    pub location: String,
    pub status: InventoryStatus,
    pub receipt_date: DateTime<Utc>,
}

/// Independent top-level demand against the plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandRequirement {
    pub part_number: PartNumber,
    pub quantity: Quantity,
    pub need_date: DateTime<Utc>,
    pub demand_source: String,
    pub location: String,

    /// End-item serial the demand builds; drives alternate selection
    pub target_serial: String,
}

/// Requirement produced by BOM explosion, before netting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrossRequirement {
    pub part_number: PartNumber,
    pub quantity: Quantity,
    pub need_date: DateTime<Utc>,
    pub demand_trace: String,
    pub location: String,
    pub target_serial: String,
}

/// Requirement remaining after inventory allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetRequirement {
    pub part_number: PartNumber,
    pub quantity: Quantity,
    pub need_date: DateTime<Utc>,
    pub demand_trace: String,
    pub location: String,
    pub target_serial: String,
}

/// Outcome of netting one (part, location) group against on-hand stock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub part_number: PartNumber,
    pub location: String,
    pub allocated_qty: Quantity,
    pub remaining_demand: Quantity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Make,
    Buy,
}

impl From<MakeBuyCode> for OrderType {
    fn from(code: MakeBuyCode) -> Self {
        match code {
            MakeBuyCode::Make => Self::Make,
            MakeBuyCode::Buy => Self::Buy,
        }
    }
}

/// Proposed make or buy action covering net demand
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedOrder {
    pub id: Uuid,
    pub part_number: PartNumber,
    pub quantity: Quantity,
    pub start_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub demand_trace: String,
    pub location: String,
    pub order_type: OrderType,
    pub target_serial: String,
}

impl PlannedOrder {
    pub fn new(
        part_number: PartNumber,
        quantity: Quantity,
        start_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
        order_type: OrderType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            part_number,
            quantity,
            start_date,
            due_date,
            demand_trace: String::new(),
            location: String::new(),
            order_type,
            target_serial: String::new(),
        }
    }

    pub fn with_demand_trace(mut self, trace: impl Into<String>) -> Self {
        self.demand_trace = trace.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_target_serial(mut self, serial: impl Into<String>) -> Self {
        self.target_serial = serial.into();
        self
    }

    /// Span between start and due in whole days
    pub fn lead_time_days(&self) -> i64 {
        (self.due_date - self.start_date).num_days()
    }
}

/// Net demand left uncovered after allocation and order planning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortage {
    pub part_number: PartNumber,
    pub location: String,
    pub short_qty: Quantity,
    pub need_date: DateTime<Utc>,
    pub demand_trace: String,
    pub target_serial: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effectivity_closed_range() {
        let eff = SerialEffectivity::new("AS501", "AS506");

        assert!(eff.includes("AS501"));
        assert!(eff.includes("AS505"));
        assert!(eff.includes("AS506"));
        assert!(!eff.includes("AS500"));
        assert!(!eff.includes("AS507"));
    }

    #[test]
    fn test_effectivity_open_ended() {
        let eff = SerialEffectivity::open_ended("AS507");

        assert!(eff.is_open_ended());
        assert!(eff.includes("AS507"));
        assert!(eff.includes("ZZ999"));
        assert!(!eff.includes("AS506"));
    }

    #[test]
    fn test_effectivity_is_lexicographic() {
        // Byte-order comparison, not numeric
        let eff = SerialEffectivity::new("AS5", "AS50");
        assert!(eff.includes("AS5"));
        assert!(eff.includes("AS50"));
        assert!(!eff.includes("AS501"));
    }

    #[test]
    fn test_effectivity_point_range() {
        let point = SerialEffectivity::point("AS505");
        assert!(point.includes("AS505"));
        assert!(!point.includes("AS504"));
        assert!(!point.includes("AS506"));
    }

    #[test]
    fn test_effectivity_requires_from_serial() {
        assert!(SerialEffectivity::new("", "AS506").validate().is_err());
        assert!(SerialEffectivity::open_ended("AS501").validate().is_ok());
    }

    #[test]
    fn test_item_order_qty_invariant() {
        let ok = Item::new("P-1", "part")
            .with_min_order_qty(10)
            .with_max_order_qty(25);
        assert!(ok.validate().is_ok());

        // max 0 disables the cap, so any minimum is fine
        let uncapped = Item::new("P-2", "part").with_min_order_qty(100);
        assert!(uncapped.validate().is_ok());

        let bad = Item::new("P-3", "part")
            .with_min_order_qty(50)
            .with_max_order_qty(25);
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_lot_size_rule_parsing() {
        assert_eq!(
            "LotForLot".parse::<LotSizeRule>().unwrap(),
            LotSizeRule::LotForLot
        );
        assert_eq!(
            "standard_pack".parse::<LotSizeRule>().unwrap(),
            LotSizeRule::StandardPack
        );
        assert_eq!(
            "MINIMUMQTY".parse::<LotSizeRule>().unwrap(),
            LotSizeRule::MinimumQty
        );
        assert!("EOQ".parse::<LotSizeRule>().is_err());
    }

    #[test]
    fn test_status_and_make_buy_parsing() {
        assert_eq!(
            "Available".parse::<InventoryStatus>().unwrap(),
            InventoryStatus::Available
        );
        assert_eq!("buy".parse::<MakeBuyCode>().unwrap(), MakeBuyCode::Buy);
        assert!("scrap".parse::<InventoryStatus>().is_err());
        assert!("transfer".parse::<MakeBuyCode>().is_err());
    }

    #[test]
    fn test_bom_line_validation() {
        let line = BomLine::new("A", "B", 0, 10, SerialEffectivity::open_ended("S1"));
        assert!(line.validate().is_err());

        let line = BomLine::new("A", "B", 2, 10, SerialEffectivity::open_ended("S1"));
        assert!(line.validate().is_ok());
    }
}
