/// Planner tuning knobs
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Reuse explosion subtrees across the demands of a run
    pub memoize: bool,

    /// Explosion cache cap; 0 leaves it unbounded
    pub max_cache_entries: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            memoize: true,
            max_cache_entries: 0,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn with_max_cache_entries(mut self, max_cache_entries: usize) -> Self {
        self.max_cache_entries = max_cache_entries;
        self
    }
}
