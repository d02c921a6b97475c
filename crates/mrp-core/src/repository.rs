use crate::models::*;
use crate::Result;

/// Item master access. ERP systems implement this to feed the planner.
pub trait ItemRepository: Send + Sync {
    fn get_item(&self, part: &PartNumber) -> Result<Item>;

    fn save_item(&self, item: Item) -> Result<()>;

    /// Bulk load for fixtures and file ingestion
    fn load_items(&self, items: Vec<Item>) -> Result<()>;
}

/// BOM structure access, organized by alternate group.
pub trait BomRepository: Send + Sync {
    /// Distinct find numbers under a parent, ascending.
    fn get_alternate_groups(&self, parent: &PartNumber) -> Result<Vec<u32>>;

    /// Lines of one `(parent, find_number)` group whose effectivity covers
    /// `target_serial`, ordered by priority (stable for ties).
    fn get_effective_alternates(
        &self,
        parent: &PartNumber,
        find_number: u32,
        target_serial: &str,
    ) -> Result<Vec<BomLine>>;

    /// Every line regardless of effectivity; validator input.
    fn get_all_bom_lines(&self) -> Result<Vec<BomLine>>;

    fn save_bom_line(&self, line: BomLine) -> Result<()>;

    fn load_bom_lines(&self, lines: Vec<BomLine>) -> Result<()>;
}

/// On-hand inventory access. `allocate_inventory` consumes Available stock,
/// so a repository instance must not be shared across concurrent runs.
pub trait InventoryRepository: Send + Sync {
    /// Allocate up to `quantity` from Available stock at `location`.
    /// Never allocates more than is on hand.
    fn allocate_inventory(
        &self,
        part: &PartNumber,
        location: &str,
        quantity: Quantity,
    ) -> Result<AllocationResult>;

    fn get_inventory_lots(&self, part: &PartNumber, location: &str) -> Result<Vec<InventoryLot>>;

    /// Summed Available quantity for a part across all locations,
    /// counting serialized units as one each.
    fn available_quantity(&self, part: &PartNumber) -> Result<Quantity>;

    fn save_inventory_lot(&self, lot: InventoryLot) -> Result<()>;

    fn save_serialized_unit(&self, unit: SerializedInventory) -> Result<()>;

    fn load_inventory_lots(&self, lots: Vec<InventoryLot>) -> Result<()>;

    fn load_serialized_units(&self, units: Vec<SerializedInventory>) -> Result<()>;
}

/// Independent demand access.
pub trait DemandRepository: Send + Sync {
    fn get_demands(&self) -> Result<Vec<DemandRequirement>>;

    fn load_demands(&self, demands: Vec<DemandRequirement>) -> Result<()>;
}

/// In-memory repositories for testing and single-process planning runs
pub mod memory {
    use super::*;
    use crate::MrpError;
    use std::collections::{BTreeSet, HashMap};
    use std::sync::{Arc, RwLock};

    #[derive(Clone, Default)]
    pub struct InMemoryItemRepository {
        items: Arc<RwLock<HashMap<PartNumber, Item>>>,
    }

    impl InMemoryItemRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl ItemRepository for InMemoryItemRepository {
        fn get_item(&self, part: &PartNumber) -> Result<Item> {
            let items = self.items.read().unwrap();
            items
                .get(part)
                .cloned()
                .ok_or_else(|| MrpError::ItemNotFound(part.as_str().to_string()))
        }

        fn save_item(&self, item: Item) -> Result<()> {
            item.validate()?;
            let mut items = self.items.write().unwrap();
            items.insert(item.part_number.clone(), item);
            Ok(())
        }

        fn load_items(&self, batch: Vec<Item>) -> Result<()> {
            for item in batch {
                self.save_item(item)?;
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemoryBomRepository {
        lines: Arc<RwLock<Vec<BomLine>>>,
    }

    impl InMemoryBomRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl BomRepository for InMemoryBomRepository {
        fn get_alternate_groups(&self, parent: &PartNumber) -> Result<Vec<u32>> {
            let lines = self.lines.read().unwrap();
            let groups: BTreeSet<u32> = lines
                .iter()
                .filter(|line| line.parent_pn == *parent)
                .map(|line| line.find_number)
                .collect();
            Ok(groups.into_iter().collect())
        }

        fn get_effective_alternates(
            &self,
            parent: &PartNumber,
            find_number: u32,
            target_serial: &str,
        ) -> Result<Vec<BomLine>> {
            let lines = self.lines.read().unwrap();
            let mut effective: Vec<BomLine> = lines
                .iter()
                .filter(|line| {
                    line.parent_pn == *parent
                        && line.find_number == find_number
                        && line.is_effective_for(target_serial)
                })
                .cloned()
                .collect();
            effective.sort_by_key(|line| line.priority);
            Ok(effective)
        }

        fn get_all_bom_lines(&self) -> Result<Vec<BomLine>> {
            let lines = self.lines.read().unwrap();
            Ok(lines.clone())
        }

        fn save_bom_line(&self, line: BomLine) -> Result<()> {
            line.validate()?;
            let mut lines = self.lines.write().unwrap();
            lines.push(line);
            Ok(())
        }

        fn load_bom_lines(&self, batch: Vec<BomLine>) -> Result<()> {
            for line in batch {
                self.save_bom_line(line)?;
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemoryInventoryRepository {
        lots: Arc<RwLock<Vec<InventoryLot>>>,
        serialized: Arc<RwLock<Vec<SerializedInventory>>>,
    }

    impl InMemoryInventoryRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl InventoryRepository for InMemoryInventoryRepository {
        fn allocate_inventory(
            &self,
            part: &PartNumber,
            location: &str,
            quantity: Quantity,
        ) -> Result<AllocationResult> {
            if quantity < 0 {
                return Err(MrpError::AllocationFailed {
                    part: part.as_str().to_string(),
                    location: location.to_string(),
                    reason: "requested quantity is negative".to_string(),
                });
            }

            let mut remaining = quantity;

            // Consume lot stock FIFO by receipt date
            {
                let mut lots = self.lots.write().unwrap();
                let mut indices: Vec<usize> = lots
                    .iter()
                    .enumerate()
                    .filter(|(_, lot)| {
                        lot.part_number == *part
                            && lot.location == location
                            && lot.status == InventoryStatus::Available
                            && lot.quantity > 0
                    })
                    .map(|(idx, _)| idx)
                    .collect();
                indices.sort_by_key(|&idx| lots[idx].receipt_date);

                for idx in indices {
                    if remaining == 0 {
                        break;
                    }
                    let take = remaining.min(lots[idx].quantity);
                    lots[idx].quantity -= take;
                    remaining -= take;
                }
            }

            // Then serialized units, one each
            {
                let mut units = self.serialized.write().unwrap();
                let mut indices: Vec<usize> = units
                    .iter()
                    .enumerate()
                    .filter(|(_, unit)| {
                        unit.part_number == *part
                            && unit.location == location
                            && unit.status == InventoryStatus::Available
                    })
                    .map(|(idx, _)| idx)
                    .collect();
                indices.sort_by_key(|&idx| units[idx].receipt_date);

                for idx in indices {
                    if remaining == 0 {
                        break;
                    }
                    units[idx].status = InventoryStatus::Allocated;
                    remaining -= 1;
                }
            }

            Ok(AllocationResult {
                part_number: part.clone(),
                location: location.to_string(),
                allocated_qty: quantity - remaining,
                remaining_demand: remaining,
            })
        }

        fn get_inventory_lots(
            &self,
            part: &PartNumber,
            location: &str,
        ) -> Result<Vec<InventoryLot>> {
            let lots = self.lots.read().unwrap();
            Ok(lots
                .iter()
                .filter(|lot| lot.part_number == *part && lot.location == location)
                .cloned()
                .collect())
        }

        fn available_quantity(&self, part: &PartNumber) -> Result<Quantity> {
            let lots = self.lots.read().unwrap();
            let lot_total: Quantity = lots
                .iter()
                .filter(|lot| {
                    lot.part_number == *part && lot.status == InventoryStatus::Available
                })
                .map(|lot| lot.quantity)
                .sum();

            let units = self.serialized.read().unwrap();
            let unit_total = units
                .iter()
                .filter(|unit| {
                    unit.part_number == *part && unit.status == InventoryStatus::Available
                })
                .count() as Quantity;

            Ok(lot_total + unit_total)
        }

        fn save_inventory_lot(&self, lot: InventoryLot) -> Result<()> {
            let mut lots = self.lots.write().unwrap();
            lots.push(lot);
            Ok(())
        }

        fn save_serialized_unit(&self, unit: SerializedInventory) -> Result<()> {
            let mut units = self.serialized.write().unwrap();
            units.push(unit);
            Ok(())
        }

        fn load_inventory_lots(&self, batch: Vec<InventoryLot>) -> Result<()> {
            for lot in batch {
                self.save_inventory_lot(lot)?;
            }
            Ok(())
        }

        fn load_serialized_units(&self, batch: Vec<SerializedInventory>) -> Result<()> {
            for unit in batch {
                self.save_serialized_unit(unit)?;
            }
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    pub struct InMemoryDemandRepository {
        demands: Arc<RwLock<Vec<DemandRequirement>>>,
    }

    impl InMemoryDemandRepository {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl DemandRepository for InMemoryDemandRepository {
        fn get_demands(&self) -> Result<Vec<DemandRequirement>> {
            let demands = self.demands.read().unwrap();
            Ok(demands.clone())
        }

        fn load_demands(&self, batch: Vec<DemandRequirement>) -> Result<()> {
            let mut demands = self.demands.write().unwrap();
            demands.extend(batch);
            Ok(())
        }
    }

}
