use mrp_core::{
    AllocationResult, GrossRequirement, InventoryRepository, NetRequirement, PartNumber, Quantity,
    Result,
};
use std::collections::HashMap;

/// Net gross requirements against on-hand inventory.
///
/// Requirements are grouped by `(part, location)` and the group total is
/// allocated through the repository, which never hands out more than is on
/// hand. Whatever demand remains is distributed back over the group's
/// requirements in input order, clipping each at its own quantity, and
/// emitted as net requirements with their original need date, trace, and
/// target serial.
pub fn allocate_inventory<R: InventoryRepository>(
    gross_requirements: &[GrossRequirement],
    inventory_repo: &R,
) -> Result<(Vec<AllocationResult>, Vec<NetRequirement>)> {
    // Group indices by (part, location), preserving first appearance order
    let mut group_order: Vec<(PartNumber, String)> = Vec::new();
    let mut groups: HashMap<(PartNumber, String), Vec<usize>> = HashMap::new();

    for (idx, req) in gross_requirements.iter().enumerate() {
        let key = (req.part_number.clone(), req.location.clone());
        let members = groups.entry(key.clone()).or_insert_with(|| {
            group_order.push(key);
            Vec::new()
        });
        members.push(idx);
    }

    let mut allocations = Vec::with_capacity(group_order.len());
    let mut net_requirements = Vec::with_capacity(gross_requirements.len());

    for key in &group_order {
        let members = &groups[key];
        let total: Quantity = members
            .iter()
            .map(|&idx| gross_requirements[idx].quantity)
            .sum();

        let allocation = inventory_repo.allocate_inventory(&key.0, &key.1, total)?;
        let mut remaining = allocation.remaining_demand;
        allocations.push(allocation);

        for &idx in members {
            if remaining == 0 {
                break;
            }
            let req = &gross_requirements[idx];
            let slice = remaining.min(req.quantity);
            if slice > 0 {
                net_requirements.push(NetRequirement {
                    part_number: req.part_number.clone(),
                    quantity: slice,
                    need_date: req.need_date,
                    demand_trace: req.demand_trace.clone(),
                    location: req.location.clone(),
                    target_serial: req.target_serial.clone(),
                });
                remaining -= slice;
            }
        }
    }

    Ok((allocations, net_requirements))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mrp_core::repository::memory::InMemoryInventoryRepository;
    use mrp_core::{InventoryLot, InventoryStatus};

    fn gross(part: &str, location: &str, qty: Quantity, trace: &str) -> GrossRequirement {
        GrossRequirement {
            part_number: PartNumber::new(part),
            quantity: qty,
            need_date: Utc::now(),
            demand_trace: trace.to_string(),
            location: location.to_string(),
            target_serial: "SN001".to_string(),
        }
    }

    fn stocked(part: &str, location: &str, qty: Quantity) -> InMemoryInventoryRepository {
        let repo = InMemoryInventoryRepository::new();
        repo.save_inventory_lot(InventoryLot {
            part_number: PartNumber::new(part),
            lot_number: "L1".to_string(),
            location: location.to_string(),
            quantity: qty,
            receipt_date: Utc::now(),
            status: InventoryStatus::Available,
        })
        .unwrap();
        repo
    }

    #[test]
    fn test_fully_covered_demand_produces_no_net() {
        let repo = stocked("COMPONENT_A", "FACTORY", 5);
        let reqs = vec![gross("COMPONENT_A", "FACTORY", 3, "SO-1")];

        let (allocations, nets) = allocate_inventory(&reqs, &repo).unwrap();

        assert_eq!(allocations.len(), 1);
        assert_eq!(allocations[0].allocated_qty, 3);
        assert_eq!(allocations[0].remaining_demand, 0);
        assert!(nets.is_empty());
    }

    #[test]
    fn test_uncovered_remainder_becomes_net() {
        let repo = stocked("P", "FACTORY", 4);
        let reqs = vec![gross("P", "FACTORY", 10, "SO-1")];

        let (allocations, nets) = allocate_inventory(&reqs, &repo).unwrap();

        assert_eq!(allocations[0].allocated_qty, 4);
        assert_eq!(allocations[0].remaining_demand, 6);
        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].quantity, 6);
        assert_eq!(nets[0].demand_trace, "SO-1");
    }

    #[test]
    fn test_remainder_clips_front_first() {
        // 12 on hand against 5 + 5 + 5: the shortfall of 3 lands on the
        // front of the list, so the first requirement is fully un-netted
        // before later ones take partial slices
        let repo = stocked("P", "FACTORY", 12);
        let reqs = vec![
            gross("P", "FACTORY", 5, "SO-1"),
            gross("P", "FACTORY", 5, "SO-2"),
            gross("P", "FACTORY", 5, "SO-3"),
        ];

        let (_, nets) = allocate_inventory(&reqs, &repo).unwrap();

        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].demand_trace, "SO-1");
        assert_eq!(nets[0].quantity, 3);
    }

    #[test]
    fn test_remainder_spans_requirements() {
        let repo = stocked("P", "FACTORY", 2);
        let reqs = vec![
            gross("P", "FACTORY", 5, "SO-1"),
            gross("P", "FACTORY", 5, "SO-2"),
        ];

        let (_, nets) = allocate_inventory(&reqs, &repo).unwrap();

        assert_eq!(nets.len(), 2);
        assert_eq!(nets[0].quantity, 5);
        assert_eq!(nets[0].demand_trace, "SO-1");
        assert_eq!(nets[1].quantity, 3);
        assert_eq!(nets[1].demand_trace, "SO-2");
    }

    #[test]
    fn test_locations_are_independent_groups() {
        let repo = stocked("P", "FACTORY", 100);
        let reqs = vec![
            gross("P", "FACTORY", 10, "SO-1"),
            gross("P", "DEPOT", 10, "SO-2"),
        ];

        let (allocations, nets) = allocate_inventory(&reqs, &repo).unwrap();

        // FACTORY is covered; DEPOT has no stock at all
        assert_eq!(allocations.len(), 2);
        assert_eq!(allocations[0].location, "FACTORY");
        assert_eq!(allocations[0].allocated_qty, 10);
        assert_eq!(allocations[1].location, "DEPOT");
        assert_eq!(allocations[1].allocated_qty, 0);

        assert_eq!(nets.len(), 1);
        assert_eq!(nets[0].location, "DEPOT");
        assert_eq!(nets[0].quantity, 10);
    }
}
