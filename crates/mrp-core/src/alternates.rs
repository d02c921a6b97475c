use crate::{BomLine, InventoryRepository, Quantity, Result};

/// Pick one line out of an alternate group.
///
/// Lines are expected to share `(parent_pn, find_number)` and to already be
/// filtered for effectivity. The lowest `priority` wins; on a priority tie
/// the earliest line in input order is kept.
pub fn select_alternate(lines: &[BomLine]) -> Option<&BomLine> {
    lines.iter().min_by_key(|line| line.priority)
}

/// Pick the first alternate, in priority order, whose child part has enough
/// Available inventory to cover `required_qty` parents.
///
/// Falls back to the highest-priority line when no alternate is covered;
/// downstream planning then raises orders or shortages for it.
pub fn select_alternate_with_inventory<'a, R: InventoryRepository>(
    lines: &'a [BomLine],
    required_qty: Quantity,
    inventory: &R,
) -> Result<Option<&'a BomLine>> {
    if lines.is_empty() {
        return Ok(None);
    }

    let mut ordered: Vec<&BomLine> = lines.iter().collect();
    ordered.sort_by_key(|line| line.priority);

    for line in &ordered {
        let needed = required_qty.saturating_mul(line.qty_per);
        if inventory.available_quantity(&line.child_pn)? >= needed {
            return Ok(Some(line));
        }
    }

    Ok(Some(ordered[0]))
}
