use chrono::{DateTime, Utc};
use mrp_core::{
    alternates, BomRepository, GrossRequirement, Item, ItemRepository, PartNumber, Quantity,
    Result,
};

/// Context handed to the visitor at every node of the walk
pub struct NodeContext<'a> {
    pub part_number: &'a PartNumber,
    pub item: &'a Item,
    pub target_serial: &'a str,
    pub location: &'a str,

    /// Cumulative quantity at this node (demand quantity times the
    /// `qty_per` of every edge on the path down)
    pub quantity: Quantity,

    /// Depth below the demanded part, 0 at the root
    pub level: u32,
}

/// Capability set driving the generic BOM walk.
///
/// `Node` is the opaque per-node value produced before descending; `Output`
/// is whatever the visitor assembles per subtree. Keeping both as associated
/// types lets each analysis carry its own data without dynamic typing.
pub trait BomVisitor {
    type Node;
    type Output;

    /// Produce node data; the second element of the pair controls descent.
    /// Returning `false` prunes the subtree below this node.
    fn visit_node(&mut self, ctx: &NodeContext<'_>) -> Result<(Self::Node, bool)>;

    /// Combine the node data with the outputs of its selected children.
    /// Called with an empty child list for leaves and pruned nodes.
    fn process_children(
        &mut self,
        ctx: &NodeContext<'_>,
        node: Self::Node,
        children: Vec<Self::Output>,
    ) -> Result<Self::Output>;
}

/// Recursive BOM walk with effectivity and alternate resolution.
///
/// For every find-number group under the current part, lines effective for
/// `target_serial` are narrowed to one selected alternate; groups with no
/// effective line are skipped without error. Recursion multiplies the
/// running quantity by the line's `qty_per`.
#[allow(clippy::too_many_arguments)]
pub fn traverse_bom<I, B, V>(
    item_repo: &I,
    bom_repo: &B,
    part_number: &PartNumber,
    target_serial: &str,
    location: &str,
    quantity: Quantity,
    level: u32,
    visitor: &mut V,
) -> Result<V::Output>
where
    I: ItemRepository,
    B: BomRepository,
    V: BomVisitor,
{
    let item = item_repo.get_item(part_number)?;
    let ctx = NodeContext {
        part_number,
        item: &item,
        target_serial,
        location,
        quantity,
        level,
    };

    let (node, descend) = visitor.visit_node(&ctx)?;
    if !descend {
        return visitor.process_children(&ctx, node, Vec::new());
    }

    let groups = bom_repo.get_alternate_groups(part_number)?;
    if groups.is_empty() {
        return visitor.process_children(&ctx, node, Vec::new());
    }

    let mut children = Vec::with_capacity(groups.len());
    for find_number in groups {
        let effective =
            bom_repo.get_effective_alternates(part_number, find_number, target_serial)?;
        let Some(line) = alternates::select_alternate(&effective) else {
            continue;
        };

        let child_output = traverse_bom(
            item_repo,
            bom_repo,
            &line.child_pn,
            target_serial,
            location,
            line.qty_per * quantity,
            level + 1,
            visitor,
        )?;
        children.push(child_output);
    }

    visitor.process_children(&ctx, node, children)
}

/// Planner visitor: every visited node contributes one gross requirement
/// carrying the demand's need date and trace.
pub struct MrpVisitor {
    need_date: DateTime<Utc>,
    demand_trace: String,
}

impl MrpVisitor {
    pub fn new(need_date: DateTime<Utc>, demand_trace: impl Into<String>) -> Self {
        Self {
            need_date,
            demand_trace: demand_trace.into(),
        }
    }
}

impl BomVisitor for MrpVisitor {
    type Node = GrossRequirement;
    type Output = Vec<GrossRequirement>;

    fn visit_node(&mut self, ctx: &NodeContext<'_>) -> Result<(Self::Node, bool)> {
        let requirement = GrossRequirement {
            part_number: ctx.part_number.clone(),
            quantity: ctx.quantity,
            need_date: self.need_date,
            demand_trace: self.demand_trace.clone(),
            location: ctx.location.to_string(),
            target_serial: ctx.target_serial.to_string(),
        };
        Ok((requirement, true))
    }

    fn process_children(
        &mut self,
        _ctx: &NodeContext<'_>,
        node: Self::Node,
        children: Vec<Self::Output>,
    ) -> Result<Self::Output> {
        // Depth-first pre-order: the part itself, then its subtrees
        let mut requirements =
            Vec::with_capacity(1 + children.iter().map(Vec::len).sum::<usize>());
        requirements.push(node);
        for child in children {
            requirements.extend(child);
        }
        Ok(requirements)
    }
}
