//! End-to-end planning scenarios over in-memory repositories.

use chrono::{DateTime, Duration, Utc};
use mrp_calc::{MrpPlanner, PlannerConfig};
use mrp_core::repository::memory::{
    InMemoryBomRepository, InMemoryInventoryRepository, InMemoryItemRepository,
};
use mrp_core::{
    BomLine, BomRepository, CancelToken, DemandRequirement, InventoryLot, InventoryRepository,
    InventoryStatus, Item, ItemRepository, LotSizeRule, PartNumber, PlannedOrder, Quantity,
    SerialEffectivity,
};

fn demand(part: &str, qty: Quantity, target_serial: &str) -> DemandRequirement {
    DemandRequirement {
        part_number: PartNumber::new(part),
        quantity: qty,
        need_date: Utc::now() + Duration::days(30),
        demand_source: "SO-1001".to_string(),
        location: "FACTORY".to_string(),
        target_serial: target_serial.to_string(),
    }
}

fn lot(part: &str, qty: Quantity) -> InventoryLot {
    InventoryLot {
        part_number: PartNumber::new(part),
        lot_number: format!("LOT-{part}"),
        location: "FACTORY".to_string(),
        quantity: qty,
        receipt_date: Utc::now() - Duration::days(10),
        status: InventoryStatus::Available,
    }
}

fn order_for<'a>(orders: &'a [PlannedOrder], part: &str) -> Option<&'a PlannedOrder> {
    orders.iter().find(|o| o.part_number.as_str() == part)
}

fn plan(
    items: &InMemoryItemRepository,
    bom: &InMemoryBomRepository,
    inventory: &InMemoryInventoryRepository,
    demands: &[DemandRequirement],
) -> mrp_calc::MrpResult {
    MrpPlanner::new()
        .explode_demand(&CancelToken::new(), demands, bom, items, inventory)
        .unwrap()
}

fn saturn_fixture() -> (InMemoryItemRepository, InMemoryBomRepository) {
    let items = InMemoryItemRepository::new();
    items.load_items(vec![
        Item::new("SATURN_V", "Launch vehicle").with_lead_time(10),
        Item::new("J2_ENGINE_V1", "J-2 engine, early block").with_lead_time(20),
        Item::new("J2_ENGINE_V2", "J-2 engine, uprated").with_lead_time(20),
    ])
    .unwrap();

    let bom = InMemoryBomRepository::new();
    bom.load_bom_lines(vec![
        BomLine::new("SATURN_V", "J2_ENGINE_V1", 5, 100, SerialEffectivity::new("AS501", "AS506")),
        BomLine::new("SATURN_V", "J2_ENGINE_V2", 5, 100, SerialEffectivity::open_ended("AS507")),
    ])
    .unwrap();

    (items, bom)
}

#[test]
fn test_single_level_explosion() {
    let items = InMemoryItemRepository::new();
    items.load_items(vec![
        Item::new("ASSEMBLY_A", "Assembly"),
        Item::new("COMPONENT_A", "Component"),
    ])
    .unwrap();

    let bom = InMemoryBomRepository::new();
    bom.save_bom_line(BomLine::new(
        "ASSEMBLY_A",
        "COMPONENT_A",
        2,
        10,
        SerialEffectivity::open_ended("SN001"),
    ))
    .unwrap();

    let inventory = InMemoryInventoryRepository::new();
    let result = plan(&items, &bom, &inventory, &[demand("ASSEMBLY_A", 1, "SN001")]);

    assert_eq!(result.planned_orders.len(), 2);
    assert_eq!(order_for(&result.planned_orders, "ASSEMBLY_A").unwrap().quantity, 1);
    assert_eq!(order_for(&result.planned_orders, "COMPONENT_A").unwrap().quantity, 2);
    assert!(result.shortages.is_empty());
}

#[test]
fn test_serial_effectivity_selects_engine_block() {
    let (items, bom) = saturn_fixture();
    let inventory = InMemoryInventoryRepository::new();

    let result = plan(&items, &bom, &inventory, &[demand("SATURN_V", 1, "AS505")]);
    assert!(order_for(&result.planned_orders, "J2_ENGINE_V1").is_some());
    assert!(order_for(&result.planned_orders, "J2_ENGINE_V2").is_none());

    let result = plan(&items, &bom, &inventory, &[demand("SATURN_V", 1, "AS507")]);
    assert!(order_for(&result.planned_orders, "J2_ENGINE_V1").is_none());
    assert!(order_for(&result.planned_orders, "J2_ENGINE_V2").is_some());
}

#[test]
fn test_inventory_partial_netting() {
    let items = InMemoryItemRepository::new();
    items.save_item(Item::new("COMPONENT_A", "Component")).unwrap();

    let bom = InMemoryBomRepository::new();
    let inventory = InMemoryInventoryRepository::new();
    inventory.save_inventory_lot(lot("COMPONENT_A", 5)).unwrap();

    let result = plan(&items, &bom, &inventory, &[demand("COMPONENT_A", 3, "SN001")]);

    assert_eq!(result.allocations.len(), 1);
    assert_eq!(result.allocations[0].allocated_qty, 3);
    assert_eq!(result.allocations[0].remaining_demand, 0);
    assert!(order_for(&result.planned_orders, "COMPONENT_A").is_none());
    assert!(result.shortages.is_empty());
}

#[test]
fn test_memoized_explosion_scales_quantities() {
    let items = InMemoryItemRepository::new();
    items.load_items(vec![
        Item::new("LEVEL_0", "Top").with_lead_time(1),
        Item::new("LEVEL_1", "Mid").with_lead_time(2),
        Item::new("LEVEL_2", "Leaf").with_lead_time(3),
    ])
    .unwrap();

    let bom = InMemoryBomRepository::new();
    bom.load_bom_lines(vec![
        BomLine::new("LEVEL_0", "LEVEL_1", 2, 10, SerialEffectivity::open_ended("SN001")),
        BomLine::new("LEVEL_1", "LEVEL_2", 3, 10, SerialEffectivity::open_ended("SN001")),
    ])
    .unwrap();

    let inventory = InMemoryInventoryRepository::new();
    let result = plan(&items, &bom, &inventory, &[demand("LEVEL_0", 1, "SN001")]);

    assert_eq!(order_for(&result.planned_orders, "LEVEL_2").unwrap().quantity, 6);
    assert!(!result.explosion_cache.is_empty());
}

#[test]
fn test_two_target_serials_in_one_run() {
    let (items, bom) = saturn_fixture();
    let inventory = InMemoryInventoryRepository::new();

    let result = plan(
        &items,
        &bom,
        &inventory,
        &[demand("SATURN_V", 1, "AS505"), demand("SATURN_V", 1, "AS507")],
    );

    assert!(order_for(&result.planned_orders, "J2_ENGINE_V1").is_some());
    assert!(order_for(&result.planned_orders, "J2_ENGINE_V2").is_some());
    // One vehicle order per demand slice
    let saturn_qty: Quantity = result
        .planned_orders
        .iter()
        .filter(|o| o.part_number.as_str() == "SATURN_V")
        .map(|o| o.quantity)
        .sum();
    assert_eq!(saturn_qty, 2);
}

#[test]
fn test_order_splitting_and_lot_sizing() {
    let items = InMemoryItemRepository::new();
    items
        .save_item(
            Item::new("SPLIT_PART", "Packed part")
                .with_lead_time(5)
                .with_lot_size_rule(LotSizeRule::StandardPack)
                .with_min_order_qty(10)
                .with_max_order_qty(25),
        )
        .unwrap();

    let bom = InMemoryBomRepository::new();
    let inventory = InMemoryInventoryRepository::new();
    let result = plan(&items, &bom, &inventory, &[demand("SPLIT_PART", 47, "SN001")]);

    // 47 lot-sizes to 50 and splits at the cap of 25
    assert_eq!(result.planned_orders.len(), 2);
    assert!(result.planned_orders.iter().all(|o| o.quantity == 25));

    let first = result
        .planned_orders
        .iter()
        .find(|o| !o.demand_trace.contains("Split"))
        .unwrap();
    let second = result
        .planned_orders
        .iter()
        .find(|o| o.demand_trace.ends_with("(Split 2)"))
        .unwrap();
    assert_eq!(second.start_date, first.due_date);
}

#[test]
fn test_lead_time_spans_and_child_before_parent() {
    // P2 and P3 over a three-level build
    let items = InMemoryItemRepository::new();
    items.load_items(vec![
        Item::new("TOP", "Top").with_lead_time(4),
        Item::new("MID", "Mid").with_lead_time(6),
        Item::new("LEAF", "Leaf").with_lead_time(9),
    ])
    .unwrap();

    let bom = InMemoryBomRepository::new();
    bom.load_bom_lines(vec![
        BomLine::new("TOP", "MID", 1, 10, SerialEffectivity::open_ended("SN001")),
        BomLine::new("MID", "LEAF", 2, 10, SerialEffectivity::open_ended("SN001")),
    ])
    .unwrap();

    let inventory = InMemoryInventoryRepository::new();
    let result = plan(&items, &bom, &inventory, &[demand("TOP", 3, "SN001")]);

    let expected_leads = [("TOP", 4i64), ("MID", 6), ("LEAF", 9)];
    for (part, lead) in expected_leads {
        let order = order_for(&result.planned_orders, part).unwrap();
        assert_eq!(order.lead_time_days(), lead, "lead time span for {part}");
    }

    let top = order_for(&result.planned_orders, "TOP").unwrap();
    let mid = order_for(&result.planned_orders, "MID").unwrap();
    let leaf = order_for(&result.planned_orders, "LEAF").unwrap();
    assert!(mid.start_date >= leaf.due_date);
    assert!(top.start_date >= mid.due_date);
}

#[test]
fn test_allocated_plus_planned_covers_gross() {
    // P1: allocated + planned + short >= gross for each part
    let items = InMemoryItemRepository::new();
    items.load_items(vec![
        Item::new("ASSEMBLY", "Assembly").with_lead_time(2),
        Item::new("PART", "Part").with_lead_time(3),
    ])
    .unwrap();

    let bom = InMemoryBomRepository::new();
    bom.save_bom_line(BomLine::new(
        "ASSEMBLY",
        "PART",
        4,
        10,
        SerialEffectivity::open_ended("SN001"),
    ))
    .unwrap();

    let inventory = InMemoryInventoryRepository::new();
    inventory.save_inventory_lot(lot("PART", 11)).unwrap();

    let result = plan(&items, &bom, &inventory, &[demand("ASSEMBLY", 10, "SN001")]);

    // Gross: ASSEMBLY 10, PART 40
    for (part, gross) in [("ASSEMBLY", 10i64), ("PART", 40)] {
        let allocated: Quantity = result
            .allocations
            .iter()
            .filter(|a| a.part_number.as_str() == part)
            .map(|a| a.allocated_qty)
            .sum();
        let planned: Quantity = result
            .planned_orders
            .iter()
            .filter(|o| o.part_number.as_str() == part)
            .map(|o| o.quantity)
            .sum();
        let short: Quantity = result
            .shortages
            .iter()
            .filter(|s| s.part_number.as_str() == part)
            .map(|s| s.short_qty)
            .sum();
        assert!(
            allocated + planned + short >= gross,
            "{part}: {allocated} + {planned} + {short} < {gross}"
        );
    }

    let part_alloc = result
        .allocations
        .iter()
        .find(|a| a.part_number.as_str() == "PART")
        .unwrap();
    assert_eq!(part_alloc.allocated_qty, 11);
    assert_eq!(part_alloc.remaining_demand, 29);
}

#[test]
fn test_memoization_equivalence() {
    // P4: identical runs with and without the cache plan the same orders
    fn run(memoize: bool) -> mrp_calc::MrpResult {
        let items = InMemoryItemRepository::new();
        items.load_items(vec![
            Item::new("LEVEL_0", "Top").with_lead_time(1),
            Item::new("LEVEL_1", "Mid").with_lead_time(2),
            Item::new("LEVEL_2", "Leaf").with_lead_time(3),
        ])
        .unwrap();

        let bom = InMemoryBomRepository::new();
        bom.load_bom_lines(vec![
            BomLine::new("LEVEL_0", "LEVEL_1", 2, 10, SerialEffectivity::open_ended("SN001")),
            BomLine::new("LEVEL_1", "LEVEL_2", 3, 10, SerialEffectivity::open_ended("SN001")),
        ])
        .unwrap();

        let planner = MrpPlanner::with_config(PlannerConfig::new().with_memoize(memoize));
        planner
            .explode_demand(
                &CancelToken::new(),
                &[demand("LEVEL_0", 2, "SN001"), demand("LEVEL_0", 3, "SN001")],
                &bom,
                &items,
                &InMemoryInventoryRepository::new(),
            )
            .unwrap()
    }

    // Date origins differ between the runs, so compare shapes relative to
    // each run's earliest start
    fn shape(result: &mrp_calc::MrpResult) -> Vec<(String, Quantity, i64, i64)> {
        let t0: DateTime<Utc> = result
            .planned_orders
            .iter()
            .map(|o| o.start_date)
            .min()
            .unwrap();
        let mut shape: Vec<_> = result
            .planned_orders
            .iter()
            .map(|o| {
                (
                    o.part_number.as_str().to_string(),
                    o.quantity,
                    (o.start_date - t0).num_days(),
                    (o.due_date - t0).num_days(),
                )
            })
            .collect();
        shape.sort();
        shape
    }

    let memoized = run(true);
    let direct = run(false);

    assert!(!memoized.explosion_cache.is_empty());
    assert!(direct.explosion_cache.is_empty());
    assert_eq!(shape(&memoized), shape(&direct));
}

#[test]
fn test_alternates_prefer_lowest_priority() {
    let items = InMemoryItemRepository::new();
    items.load_items(vec![
        Item::new("PUMP", "Pump assembly"),
        Item::new("SEAL_STD", "Standard seal"),
        Item::new("SEAL_ALT", "Approved alternate seal"),
    ])
    .unwrap();

    let bom = InMemoryBomRepository::new();
    bom.load_bom_lines(vec![
        BomLine::new("PUMP", "SEAL_ALT", 1, 10, SerialEffectivity::open_ended("SN001"))
            .with_priority(1),
        BomLine::new("PUMP", "SEAL_STD", 1, 10, SerialEffectivity::open_ended("SN001")),
    ])
    .unwrap();

    let inventory = InMemoryInventoryRepository::new();
    let result = plan(&items, &bom, &inventory, &[demand("PUMP", 1, "SN001")]);

    assert!(order_for(&result.planned_orders, "SEAL_STD").is_some());
    assert!(order_for(&result.planned_orders, "SEAL_ALT").is_none());
}
