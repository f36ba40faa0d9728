//! Adaptive eviction of low-frequency k-mers
//!
//! When the table reaches its capacity limit, a pass removes entries judged
//! to be rare. Two heuristics exist:
//!
//! 1. **Fair**: compares a global baseline, the fairness factor
//!    `floor(lines_seen / running_max) * fairness_const`, against each
//!    entry's x-factor `floor(capacity_limit / count)`. An entry is evicted
//!    when its x-factor exceeds the baseline, i.e. when its share of the
//!    traffic is below what the current memory pressure allows. While
//!    `lines_seen >= capacity_limit` this never removes an entry holding the
//!    running maximum, as long as `fairness_const >= 1`.
//!
//! 2. **Harsh**: evicts every entry with `count <= running_max / 20 + 1`.
//!    Coarse and cheap; it may discard k-mers the fair cut would keep.
//!
//! A pass that removes no more than a tenth of the table raises the
//! capacity limit by [`CAPACITY_INCREMENT`]. Once the limit reaches
//! [`HARSH_MODE_CAPACITY`] the controller switches to harsh mode for good.

use crate::table::FrequencyTable;

/// Capacity limit at which the controller switches to harsh mode
pub const HARSH_MODE_CAPACITY: usize = 15_000;

/// Amount added to the capacity limit after an ineffective pass
pub const CAPACITY_INCREMENT: usize = 1_000;

/// Divisor of the running maximum in the harsh threshold
pub const HARSH_DIVISOR: u64 = 20;

/// A pass must remove more than `1 / EFFECTIVE_EVICTION_DIVISOR` of the table
pub const EFFECTIVE_EVICTION_DIVISOR: usize = 10;

/// Eviction heuristic
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EvictionMode {
    /// Fairness-factor comparison (initial)
    #[default]
    Fair,
    /// Fixed fraction of the running maximum
    Harsh,
}

/// Eviction decision for one pass, computed before anything is removed
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EvictionPlan {
    /// Evict when `fairness_factor < floor(capacity_limit / count)`
    Fair {
        fairness_factor: f64,
        capacity_limit: u64,
    },
    /// Evict when `count <= threshold`
    Harsh { threshold: u64 },
}

impl EvictionPlan {
    /// Plan a fair-mode pass
    pub fn fair(
        lines_seen: u64,
        running_max: u64,
        capacity_limit: usize,
        fairness_const: f64,
    ) -> Self {
        let running_max = running_max.max(1);
        Self::Fair {
            fairness_factor: (lines_seen / running_max) as f64 * fairness_const,
            capacity_limit: capacity_limit as u64,
        }
    }

    /// Plan a harsh-mode pass
    pub fn harsh(running_max: u64) -> Self {
        Self::Harsh {
            threshold: running_max / HARSH_DIVISOR + 1,
        }
    }

    /// Whether an entry with `count` occurrences is removed by this plan
    #[inline]
    pub fn evicts(&self, count: u64) -> bool {
        match *self {
            Self::Fair {
                fairness_factor,
                capacity_limit,
            } => {
                let x_factor = capacity_limit / count.max(1);
                fairness_factor < x_factor as f64
            }
            Self::Harsh { threshold } => count <= threshold,
        }
    }

    /// Heuristic this plan belongs to
    pub fn mode(&self) -> EvictionMode {
        match self {
            Self::Fair { .. } => EvictionMode::Fair,
            Self::Harsh { .. } => EvictionMode::Harsh,
        }
    }
}

/// Outcome of one eviction pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvictionReport {
    /// Table size before the pass
    pub before: usize,
    /// Entries removed
    pub removed: usize,
    /// Heuristic used by the pass
    pub mode: EvictionMode,
    /// Capacity limit after the pass
    pub capacity_limit: usize,
    /// Whether the pass was ineffective and raised the limit
    pub capacity_raised: bool,
    /// Whether this pass moved the controller from fair to harsh
    pub mode_switched: bool,
}

impl EvictionReport {
    /// Table size after the pass
    pub fn after(&self) -> usize {
        self.before - self.removed
    }
}

/// Owns the capacity limit and heuristic mode of a run
#[derive(Clone, Debug)]
pub struct EvictionController {
    capacity_limit: usize,
    initial_capacity_limit: usize,
    mode: EvictionMode,
    fairness_const: f64,
    passes: u64,
}

impl EvictionController {
    /// Create a controller in fair mode
    ///
    /// # Panics
    ///
    /// Panics if `capacity_limit` is zero.
    pub fn new(capacity_limit: usize, fairness_const: f64) -> Self {
        assert!(capacity_limit > 0, "capacity limit must be positive");

        Self {
            capacity_limit,
            initial_capacity_limit: capacity_limit,
            mode: EvictionMode::Fair,
            fairness_const,
            passes: 0,
        }
    }

    /// Current capacity limit
    pub fn capacity_limit(&self) -> usize {
        self.capacity_limit
    }

    /// Current heuristic
    pub fn mode(&self) -> EvictionMode {
        self.mode
    }

    /// Fairness constant fixed at construction
    pub fn fairness_const(&self) -> f64 {
        self.fairness_const
    }

    /// Number of passes run so far
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Whether a table of `len` entries has reached the capacity limit
    #[inline]
    pub fn should_run(&self, len: usize) -> bool {
        len >= self.capacity_limit
    }

    /// Plan the next pass without touching the table
    pub fn plan(&self, running_max: u64, lines_seen: u64) -> EvictionPlan {
        match self.mode {
            EvictionMode::Fair => EvictionPlan::fair(
                lines_seen,
                running_max,
                self.capacity_limit,
                self.fairness_const,
            ),
            EvictionMode::Harsh => EvictionPlan::harsh(running_max),
        }
    }

    /// Run one eviction pass and adapt the limit and mode
    pub fn run(
        &mut self,
        table: &mut FrequencyTable,
        running_max: u64,
        lines_seen: u64,
    ) -> EvictionReport {
        let before = table.len();
        let plan = self.plan(running_max, lines_seen);

        if before == 0 {
            return EvictionReport {
                before,
                removed: 0,
                mode: plan.mode(),
                capacity_limit: self.capacity_limit,
                capacity_raised: false,
                mode_switched: false,
            };
        }

        self.passes += 1;
        let removed = table.retain_counts(|count| !plan.evicts(count));

        let mut capacity_raised = false;
        let mut mode_switched = false;
        if removed <= before / EFFECTIVE_EVICTION_DIVISOR {
            self.capacity_limit += CAPACITY_INCREMENT;
            capacity_raised = true;

            if self.capacity_limit >= HARSH_MODE_CAPACITY && self.mode == EvictionMode::Fair {
                self.mode = EvictionMode::Harsh;
                mode_switched = true;
            }
        }

        EvictionReport {
            before,
            removed,
            mode: plan.mode(),
            capacity_limit: self.capacity_limit,
            capacity_raised,
            mode_switched,
        }
    }

    /// Return to the construction-time limit and fair mode
    pub fn reset(&mut self) {
        *self = Self::new(self.initial_capacity_limit, self.fairness_const);
    }
}
