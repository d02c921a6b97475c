use mrp_core::{NetRequirement, PartNumber, PlannedOrder, Quantity, Shortage};
use std::collections::HashMap;

/// Report net demand that planning failed to cover.
///
/// Net and planned quantities are summed per `(part, location)`; a key
/// whose net exceeds its planned total produces one shortage carrying the
/// fields of the first matching net requirement. Lot sizing normally plans
/// at or above net, so shortages surface parts the scheduler skipped
/// (typically cycle-stuck nodes in a partial topological order).
pub fn identify_shortages(
    net_requirements: &[NetRequirement],
    planned_orders: &[PlannedOrder],
) -> Vec<Shortage> {
    let mut planned: HashMap<(&PartNumber, &str), Quantity> = HashMap::new();
    for order in planned_orders {
        *planned
            .entry((&order.part_number, order.location.as_str()))
            .or_insert(0) += order.quantity;
    }

    let mut net_order: Vec<(&PartNumber, &str)> = Vec::new();
    let mut net_totals: HashMap<(&PartNumber, &str), Quantity> = HashMap::new();
    let mut representative: HashMap<(&PartNumber, &str), &NetRequirement> = HashMap::new();

    for req in net_requirements {
        let key = (&req.part_number, req.location.as_str());
        let total = net_totals.entry(key).or_insert_with(|| {
            net_order.push(key);
            0
        });
        *total += req.quantity;
        representative.entry(key).or_insert(req);
    }

    let mut shortages = Vec::new();
    for key in net_order {
        let net = net_totals[&key];
        let covered = planned.get(&key).copied().unwrap_or(0);
        if net > covered {
            let req = representative[&key];
            shortages.push(Shortage {
                part_number: req.part_number.clone(),
                location: req.location.clone(),
                short_qty: net - covered,
                need_date: req.need_date,
                demand_trace: req.demand_trace.clone(),
                target_serial: req.target_serial.clone(),
            });
        }
    }

    shortages
}
