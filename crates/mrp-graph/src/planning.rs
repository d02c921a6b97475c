use mrp_core::{alternates, BomRepository, GrossRequirement, PartNumber, Quantity, Result};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};

/// One part in the planning dependency graph
#[derive(Debug, Clone)]
pub struct PartNode {
    pub part_number: PartNumber,

    /// Accumulated gross requirement across all demands
    pub gross_quantity: Quantity,

    /// Selected-alternate children, one per effective find-number group
    pub direct_children: Vec<PartNumber>,

    /// Parents whose selected alternate points at this part
    pub direct_parents: Vec<PartNumber>,

    /// BOM level: leaves 0, parents above their deepest child.
    /// Informational; the scheduler runs on the topological order.
    pub level: u32,
}

impl PartNode {
    fn new(part_number: PartNumber) -> Self {
        Self {
            part_number,
            gross_quantity: 0,
            direct_children: Vec::new(),
            direct_parents: Vec::new(),
            level: 0,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.direct_children.is_empty()
    }
}

/// Directed graph over the parts of one planning run.
///
/// Nodes are seeded from the gross requirement list in first-appearance
/// order; edges follow the alternates selected under a single target serial.
pub struct PlanningGraph {
    nodes: HashMap<PartNumber, PartNode>,
    order: Vec<PartNumber>,
}

impl PlanningGraph {
    /// Build the graph for one run.
    ///
    /// `target_serial` is applied to every part's alternate resolution, so
    /// edges valid only under another demand's serial are not represented.
    /// Explosion has already produced serial-correct requirements; only the
    /// edge-driven start-time ordering can be affected.
    pub fn build<B: BomRepository>(
        gross_requirements: &[GrossRequirement],
        target_serial: &str,
        bom_repo: &B,
    ) -> Result<Self> {
        let mut nodes: HashMap<PartNumber, PartNode> =
            HashMap::with_capacity(gross_requirements.len());
        let mut order: Vec<PartNumber> = Vec::with_capacity(gross_requirements.len());

        for req in gross_requirements {
            match nodes.entry(req.part_number.clone()) {
                Entry::Occupied(mut entry) => {
                    entry.get_mut().gross_quantity += req.quantity;
                }
                Entry::Vacant(entry) => {
                    let mut node = PartNode::new(req.part_number.clone());
                    node.gross_quantity = req.quantity;
                    entry.insert(node);
                    order.push(req.part_number.clone());
                }
            }
        }

        for parent in &order {
            for find_number in bom_repo.get_alternate_groups(parent)? {
                let effective =
                    bom_repo.get_effective_alternates(parent, find_number, target_serial)?;
                let Some(line) = alternates::select_alternate(&effective) else {
                    continue;
                };

                let child = line.child_pn.clone();
                if let Some(node) = nodes.get_mut(parent) {
                    node.direct_children.push(child.clone());
                }
                // Back-link only when the child itself was seeded
                if let Some(child_node) = nodes.get_mut(&child) {
                    child_node.direct_parents.push(parent.clone());
                }
            }
        }

        Ok(Self { nodes, order })
    }

    pub fn node(&self, part: &PartNumber) -> Option<&PartNode> {
        self.nodes.get(part)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Parts in seed order
    pub fn parts(&self) -> impl Iterator<Item = &PartNumber> {
        self.order.iter()
    }

    /// Assign BOM levels: leaves at 0, each parent at least one above its
    /// deepest child. BFS outward along parent links.
    pub fn calculate_levels(&mut self) {
        let cap = self.nodes.len() as u32;
        let mut queue: VecDeque<PartNumber> = self
            .order
            .iter()
            .filter(|part| self.nodes[*part].is_leaf())
            .cloned()
            .collect();

        while let Some(part) = queue.pop_front() {
            let child_level = self.nodes[&part].level;
            let parents = self.nodes[&part].direct_parents.clone();
            for parent in parents {
                if let Some(node) = self.nodes.get_mut(&parent) {
                    // The cap stops runaway relaxation if a cycle slipped
                    // past validation
                    if node.level < child_level + 1 && child_level + 1 <= cap {
                        node.level = child_level + 1;
                        queue.push_back(parent);
                    }
                }
            }
        }
    }

    /// Kahn's algorithm, children before parents.
    ///
    /// In-degree is the number of direct children: a part becomes ready once
    /// everything it consumes has been emitted. If the result is shorter
    /// than the node count a cycle was present and the partial order is
    /// returned; validation is the place where cycles are rejected.
    pub fn topological_sort(&self) -> Vec<PartNumber> {
        let mut in_degree: HashMap<&PartNumber, usize> = self
            .nodes
            .iter()
            .map(|(part, node)| (part, node.direct_children.len()))
            .collect();

        let mut queue: VecDeque<&PartNumber> = self
            .order
            .iter()
            .filter(|part| in_degree[*part] == 0)
            .collect();

        let mut sorted = Vec::with_capacity(self.nodes.len());
        while let Some(part) = queue.pop_front() {
            sorted.push(part.clone());

            for parent in &self.nodes[part].direct_parents {
                if let Some(degree) = in_degree.get_mut(parent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(parent);
                    }
                }
            }
        }

        sorted
    }
}
