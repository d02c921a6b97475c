use chrono::{DateTime, Duration, Utc};
use mrp_core::{
    ItemRepository, MrpError, NetRequirement, OrderType, PartNumber, PlannedOrder, Quantity,
    Result,
};
use mrp_graph::PlanningGraph;
use std::collections::HashMap;

use crate::lot_sizing::apply_lot_size;

/// Forward-schedule planned orders over the topological order.
///
/// Children are scheduled before parents; a parent's earliest start is the
/// latest completion among its direct children, falling back to the run
/// timestamp `now` for leaves and for children without a completion entry.
/// Order quantities are lot-sized, then split so no single order exceeds
/// the item's `max_order_qty`; splits run back to back, each starting when
/// the previous one falls due.
pub fn schedule_forward<I: ItemRepository>(
    sorted: &[PartNumber],
    graph: &PlanningGraph,
    net_requirements: &[NetRequirement],
    item_repo: &I,
    now: DateTime<Utc>,
) -> Result<Vec<PlannedOrder>> {
    // Net requirements per part, input order preserved
    let mut net_by_part: HashMap<&PartNumber, Vec<&NetRequirement>> = HashMap::new();
    for req in net_requirements {
        net_by_part.entry(&req.part_number).or_default().push(req);
    }

    let mut completion: HashMap<PartNumber, DateTime<Utc>> = HashMap::with_capacity(sorted.len());
    let mut orders = Vec::with_capacity(net_requirements.len());

    for part in sorted {
        let Some(node) = graph.node(part) else {
            continue;
        };

        let earliest_start = node
            .direct_children
            .iter()
            .filter_map(|child| completion.get(child))
            .max()
            .copied()
            .unwrap_or(now);

        let reqs = net_by_part.get(part).map(Vec::as_slice).unwrap_or(&[]);
        let total: Quantity = reqs.iter().map(|req| req.quantity).sum();
        if total == 0 {
            // Fully covered by inventory: nothing to order, available now
            completion.insert(part.clone(), now);
            continue;
        }

        let item = item_repo.get_item(part).map_err(|err| {
            MrpError::Planning(format!("scheduling {part}: {err}"))
        })?;
        let order_type = OrderType::from(item.make_buy_code);
        let lead_time = Duration::days(i64::from(item.lead_time_days));

        let mut last_due = earliest_start;
        for req in reqs {
            let order_qty = apply_lot_size(&item, req.quantity);

            let mut remaining = order_qty;
            let mut start = earliest_start;
            let mut split = 0u32;
            while remaining > 0 {
                split += 1;
                let quantity = if item.max_order_qty > 0 {
                    remaining.min(item.max_order_qty)
                } else {
                    remaining
                };
                let due = start + lead_time;

                let trace = if split >= 2 {
                    format!("{} (Split {split})", req.demand_trace)
                } else {
                    req.demand_trace.clone()
                };

                orders.push(
                    PlannedOrder::new(part.clone(), quantity, start, due, order_type)
                        .with_demand_trace(trace)
                        .with_location(req.location.clone())
                        .with_target_serial(req.target_serial.clone()),
                );

                last_due = last_due.max(due);
                start = due;
                remaining -= quantity;
            }
        }

        completion.insert(part.clone(), last_due);
    }

    Ok(orders)
}
