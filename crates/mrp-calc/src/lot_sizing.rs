use mrp_core::{Item, LotSizeRule, Quantity};

/// Apply the item's lot sizing rule to a net order quantity.
///
/// Under `StandardPack` the minimum order quantity acts as the pack size;
/// a pack size of zero degrades to lot-for-lot.
pub fn apply_lot_size(item: &Item, net_qty: Quantity) -> Quantity {
    match item.lot_size_rule {
        LotSizeRule::LotForLot => net_qty,
        LotSizeRule::MinimumQty => net_qty.max(item.min_order_qty),
        LotSizeRule::StandardPack => {
            let pack = item.min_order_qty;
            if pack <= 0 {
                net_qty
            } else {
                ((net_qty + pack - 1) / pack) * pack
            }
        }
    }
}
