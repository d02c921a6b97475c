use mrp_core::{BomLine, Item, MrpError, PartNumber, Result};
use std::collections::{HashMap, HashSet};

/// Outcome of static BOM validation
#[derive(Debug, Clone, Default)]
pub struct BomValidation {
    pub has_cycles: bool,
    pub cycle_paths: Vec<Vec<PartNumber>>,
    pub duplicate_lines: Vec<DuplicateLine>,
    pub errors: Vec<String>,
}

impl BomValidation {
    pub fn is_ok(&self) -> bool {
        !self.has_cycles && self.duplicate_lines.is_empty() && self.errors.is_empty()
    }
}

/// Two or more lines with the same `(parent, child, find_number)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateLine {
    pub parent_pn: PartNumber,
    pub child_pn: PartNumber,
    pub find_number: u32,
    pub occurrences: usize,
}

/// Parts referenced by the BOM but missing from the item catalog
#[derive(Debug, Clone, Default)]
pub struct ConsistencyReport {
    pub orphaned_parts: Vec<PartNumber>,
    pub errors: Vec<String>,
}

impl ConsistencyReport {
    pub fn is_ok(&self) -> bool {
        self.orphaned_parts.is_empty() && self.errors.is_empty()
    }
}

/// Validate a static BOM: cycles, duplicate lines, malformed lines.
///
/// Cycle detection runs over every line regardless of effectivity; a cycle
/// through any effectivity window is rejected. Alternates (same parent and
/// find number, different child) are not duplicates.
pub fn validate_bom(lines: &[BomLine]) -> BomValidation {
    let mut result = BomValidation::default();

    for line in lines {
        if let Err(err) = line.validate() {
            result.errors.push(err.to_string());
        }
    }

    result.duplicate_lines = find_duplicates(lines);
    for dup in &result.duplicate_lines {
        result.errors.push(format!(
            "duplicate BOM line {} -> {} at find number {} ({} occurrences)",
            dup.parent_pn, dup.child_pn, dup.find_number, dup.occurrences
        ));
    }

    result.cycle_paths = find_cycles(lines);
    result.has_cycles = !result.cycle_paths.is_empty();
    for cycle in &result.cycle_paths {
        let path: Vec<&str> = cycle.iter().map(|p| p.as_str()).collect();
        result.errors.push(format!("cycle: {}", path.join(" -> ")));
    }

    result
}

/// Reject an item catalog containing the same part number twice.
pub fn validate_part_number_uniqueness(items: &[Item]) -> Result<()> {
    let mut seen: HashSet<&PartNumber> = HashSet::with_capacity(items.len());
    for item in items {
        if !seen.insert(&item.part_number) {
            return Err(MrpError::DuplicatePartNumber(
                item.part_number.as_str().to_string(),
            ));
        }
    }
    Ok(())
}

/// Check that every part referenced by the BOM exists in the item catalog.
pub fn validate_bom_item_consistency(lines: &[BomLine], items: &[Item]) -> ConsistencyReport {
    let catalog: HashSet<&PartNumber> = items.iter().map(|item| &item.part_number).collect();

    let mut report = ConsistencyReport::default();
    let mut reported: HashSet<&PartNumber> = HashSet::new();

    for line in lines {
        for part in [&line.parent_pn, &line.child_pn] {
            if !catalog.contains(part) && reported.insert(part) {
                report.orphaned_parts.push(part.clone());
                report
                    .errors
                    .push(format!("part {part} is not in the item catalog"));
            }
        }
    }

    report
}

fn find_duplicates(lines: &[BomLine]) -> Vec<DuplicateLine> {
    let mut counts: HashMap<(&PartNumber, &PartNumber, u32), usize> = HashMap::new();
    for line in lines {
        *counts
            .entry((&line.parent_pn, &line.child_pn, line.find_number))
            .or_insert(0) += 1;
    }

    // Report in first-appearance order
    let mut reported: HashSet<(&PartNumber, &PartNumber, u32)> = HashSet::new();
    let mut duplicates = Vec::new();
    for line in lines {
        let key = (&line.parent_pn, &line.child_pn, line.find_number);
        let occurrences = counts[&key];
        if occurrences > 1 && reported.insert(key) {
            duplicates.push(DuplicateLine {
                parent_pn: line.parent_pn.clone(),
                child_pn: line.child_pn.clone(),
                find_number: line.find_number,
                occurrences,
            });
        }
    }
    duplicates
}

fn find_cycles(lines: &[BomLine]) -> Vec<Vec<PartNumber>> {
    // Adjacency over unique children; duplicate child entries coalesce
    let mut adjacency: HashMap<&PartNumber, Vec<&PartNumber>> = HashMap::new();
    let mut nodes: Vec<&PartNumber> = Vec::new();
    let mut known: HashSet<&PartNumber> = HashSet::new();

    for line in lines {
        for part in [&line.parent_pn, &line.child_pn] {
            if known.insert(part) {
                nodes.push(part);
            }
        }
        let children = adjacency.entry(&line.parent_pn).or_default();
        if !children.contains(&&line.child_pn) {
            children.push(&line.child_pn);
        }
    }

    let mut cycles = Vec::new();
    let mut visited: HashSet<&PartNumber> = HashSet::new();
    let mut on_stack: HashSet<&PartNumber> = HashSet::new();
    let mut path: Vec<&PartNumber> = Vec::new();

    for &node in &nodes {
        if !visited.contains(node) {
            dfs_cycles(
                node,
                &adjacency,
                &mut visited,
                &mut on_stack,
                &mut path,
                &mut cycles,
            );
        }
    }

    cycles
}

fn dfs_cycles<'a>(
    node: &'a PartNumber,
    adjacency: &HashMap<&'a PartNumber, Vec<&'a PartNumber>>,
    visited: &mut HashSet<&'a PartNumber>,
    on_stack: &mut HashSet<&'a PartNumber>,
    path: &mut Vec<&'a PartNumber>,
    cycles: &mut Vec<Vec<PartNumber>>,
) {
    visited.insert(node);
    on_stack.insert(node);
    path.push(node);

    if let Some(children) = adjacency.get(node) {
        for &child in children {
            if !visited.contains(child) {
                dfs_cycles(child, adjacency, visited, on_stack, path, cycles);
            } else if on_stack.contains(child) {
                // Back edge: slice the stack from the repeated node and
                // close the loop by appending it again
                if let Some(start) = path.iter().position(|&p| p == child) {
                    let mut cycle: Vec<PartNumber> =
                        path[start..].iter().map(|&p| p.clone()).collect();
                    cycle.push(child.clone());
                    cycles.push(cycle);
                }
            }
        }
    }

    path.pop();
    on_stack.remove(node);
}
