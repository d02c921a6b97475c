use chrono::{Duration, Utc};
use mrp_cache::{CacheKey, CachedExplosion, ExplosionCache};
use mrp_core::{
    AllocationResult, BomRepository, CancelToken, DemandRequirement, GrossRequirement,
    InventoryRepository, ItemRepository, PlannedOrder, Result, Shortage,
};
use mrp_graph::PlanningGraph;
use serde::Serialize;

use crate::config::PlannerConfig;
use crate::traverse::{traverse_bom, MrpVisitor};
use crate::{netting, scheduler, shortage};

/// Full output of one planning run
#[derive(Debug, Clone, Serialize)]
pub struct MrpResult {
    pub planned_orders: Vec<PlannedOrder>,
    pub allocations: Vec<AllocationResult>,
    pub shortages: Vec<Shortage>,

    /// Explosion cache contents at the end of the run
    pub explosion_cache: Vec<(CacheKey, CachedExplosion)>,
}

/// The planning engine: explosion, netting, graph ordering, scheduling.
///
/// A planner owns its explosion cache; the cache survives across the
/// demands of a run (and across runs on the same instance). Input
/// repositories are read-only during a run except for inventory, which is
/// consumed by allocation.
pub struct MrpPlanner {
    config: PlannerConfig,
    cache: ExplosionCache,
}

impl MrpPlanner {
    pub fn new() -> Self {
        Self::with_config(PlannerConfig::default())
    }

    pub fn with_config(config: PlannerConfig) -> Self {
        let cache = ExplosionCache::with_max_entries(config.max_cache_entries);
        Self { config, cache }
    }

    pub fn cache(&self) -> &ExplosionCache {
        &self.cache
    }

    /// Run the full planning pipeline over a demand set.
    ///
    /// The cancellation token is checked between passes and between
    /// demands; a cancelled run returns `MrpError::Cancelled` and no
    /// partial result crosses this boundary.
    pub fn explode_demand<B, I, N>(
        &self,
        cancel: &CancelToken,
        demands: &[DemandRequirement],
        bom_repo: &B,
        item_repo: &I,
        inventory_repo: &N,
    ) -> Result<MrpResult>
    where
        B: BomRepository,
        I: ItemRepository,
        N: InventoryRepository,
    {
        let run_started = Utc::now();
        tracing::info!(demands = demands.len(), "starting planning run");

        if demands.is_empty() {
            return Ok(MrpResult {
                planned_orders: Vec::new(),
                allocations: Vec::new(),
                shortages: Vec::new(),
                explosion_cache: self.cache.snapshot(),
            });
        }

        // Pass 1: explode every demand to gross requirements
        let mut gross_requirements: Vec<GrossRequirement> =
            Vec::with_capacity(demands.len() * 8);
        for demand in demands {
            cancel.check()?;
            tracing::debug!(
                part = %demand.part_number,
                quantity = demand.quantity,
                target_serial = %demand.target_serial,
                "exploding demand"
            );
            let requirements = self.explode_requirements(demand, bom_repo, item_repo)?;
            gross_requirements.extend(requirements);
        }
        tracing::debug!(gross = gross_requirements.len(), "explosion complete");
        cancel.check()?;

        // Pass 2: net against on-hand inventory
        let (allocations, net_requirements) =
            netting::allocate_inventory(&gross_requirements, inventory_repo)?;
        tracing::debug!(
            allocations = allocations.len(),
            net = net_requirements.len(),
            "netting complete"
        );
        cancel.check()?;

        // Passes 3-5: dependency graph, levels, topological order.
        // Alternate edges resolve under the first demand's target serial.
        let mut graph = PlanningGraph::build(
            &gross_requirements,
            &demands[0].target_serial,
            bom_repo,
        )?;
        graph.calculate_levels();
        let sorted = graph.topological_sort();
        if sorted.len() < graph.node_count() {
            // Validation is where cycles get rejected; here we schedule
            // what the partial order covers and let shortages flag the rest
            tracing::warn!(
                emitted = sorted.len(),
                nodes = graph.node_count(),
                "topological sort returned a partial order"
            );
        }
        cancel.check()?;

        // Pass 6: forward scheduling
        let planned_orders = scheduler::schedule_forward(
            &sorted,
            &graph,
            &net_requirements,
            item_repo,
            run_started,
        )?;
        cancel.check()?;

        let shortages = shortage::identify_shortages(&net_requirements, &planned_orders);

        tracing::info!(
            orders = planned_orders.len(),
            allocations = allocations.len(),
            shortages = shortages.len(),
            "planning run complete"
        );

        Ok(MrpResult {
            planned_orders,
            allocations,
            shortages,
            explosion_cache: self.cache.snapshot(),
        })
    }

    /// Cache wrapper around the traversal.
    ///
    /// A hit scales the memoized unit subtree by the demand quantity,
    /// shifts need dates backward by the cached lead time, rebases the
    /// location, and prefixes the demand trace. A miss traverses, then
    /// stores a unit-scaled copy with traces normalized to part numbers.
    fn explode_requirements<B, I>(
        &self,
        demand: &DemandRequirement,
        bom_repo: &B,
        item_repo: &I,
    ) -> Result<Vec<GrossRequirement>>
    where
        B: BomRepository,
        I: ItemRepository,
    {
        if !self.config.memoize {
            return self.traverse_demand(demand, bom_repo, item_repo);
        }

        if let Some(cached) = self.cache.get(&demand.part_number, &demand.target_serial) {
            tracing::debug!(part = %demand.part_number, "explosion cache hit");
            let shifted_need =
                demand.need_date - Duration::days(i64::from(cached.lead_time_days));
            let requirements = cached
                .requirements
                .iter()
                .map(|req| GrossRequirement {
                    part_number: req.part_number.clone(),
                    quantity: req.quantity * demand.quantity,
                    need_date: shifted_need,
                    demand_trace: format!("{} -> {}", demand.demand_source, req.demand_trace),
                    location: demand.location.clone(),
                    target_serial: req.target_serial.clone(),
                })
                .collect();
            return Ok(requirements);
        }

        let requirements = self.traverse_demand(demand, bom_repo, item_repo)?;

        let item = item_repo.get_item(&demand.part_number)?;
        let unit_scaled: Vec<GrossRequirement> = requirements
            .iter()
            .map(|req| GrossRequirement {
                part_number: req.part_number.clone(),
                quantity: if demand.quantity != 0 {
                    req.quantity / demand.quantity
                } else {
                    req.quantity
                },
                need_date: req.need_date,
                demand_trace: req.part_number.as_str().to_string(),
                location: req.location.clone(),
                target_serial: req.target_serial.clone(),
            })
            .collect();
        self.cache.insert(
            &demand.part_number,
            &demand.target_serial,
            unit_scaled,
            item.lead_time_days,
        );

        Ok(requirements)
    }

    fn traverse_demand<B, I>(
        &self,
        demand: &DemandRequirement,
        bom_repo: &B,
        item_repo: &I,
    ) -> Result<Vec<GrossRequirement>>
    where
        B: BomRepository,
        I: ItemRepository,
    {
        let mut visitor = MrpVisitor::new(demand.need_date, demand.demand_source.clone());
        traverse_bom(
            item_repo,
            bom_repo,
            &demand.part_number,
            &demand.target_serial,
            &demand.location,
            demand.quantity,
            0,
            &mut visitor,
        )
    }
}

impl Default for MrpPlanner {
    fn default() -> Self {
        Self::new()
    }
}
