//! Strategy registry and route finding

use std::collections::{HashMap, HashSet, VecDeque};

use cvdata_meta::SchemaVersion;

use super::builtin;
use super::transform::{MigrationStrategy, StepKey};
use crate::{Error, Result};

/// Immutable set of strategies keyed by edge.
///
/// Versions are nodes and strategies are directed edges; routes are found
/// by breadth-first search, so the supported-version list does not need to
/// be ordered.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    strategies: HashMap<StepKey, MigrationStrategy>,
}

impl MigrationRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The CV document chain with its single rollback edge.
    pub fn with_builtins() -> Self {
        let registry = Self::new()
            .with(builtin::v3_0_to_v3_1())
            .with(builtin::v3_1_to_v4_0())
            .with(builtin::v4_0_to_v3_1());

        for gap in registry.missing_rollbacks() {
            tracing::debug!(step = %gap, "no rollback strategy; restore from backup instead");
        }
        registry
    }

    /// Add or replace a strategy.
    pub fn with(mut self, strategy: MigrationStrategy) -> Self {
        self.strategies.insert(strategy.key.clone(), strategy);
        self
    }

    pub fn get(&self, key: &StepKey) -> Option<&MigrationStrategy> {
        self.strategies.get(key)
    }

    /// Strategy for `key`, or a migration error naming the missing step.
    pub fn require(&self, key: &StepKey) -> Result<&MigrationStrategy> {
        self.get(key)
            .ok_or_else(|| Error::migration(key.to_string(), "no strategy registered"))
    }

    /// All registered edges, sorted.
    pub fn steps(&self) -> Vec<&StepKey> {
        let mut steps: Vec<&StepKey> = self.strategies.keys().collect();
        steps.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        steps
    }

    /// Forward edges whose inverse is not registered.
    pub fn missing_rollbacks(&self) -> Vec<StepKey> {
        self.steps()
            .into_iter()
            .filter(|k| !k.is_rollback() && !self.strategies.contains_key(&k.reversed()))
            .cloned()
            .collect()
    }

    /// Shortest sequence of edges from `from` to `to`.
    ///
    /// Equal versions yield an empty route.
    pub fn calculate_migration_path(
        &self,
        from: &SchemaVersion,
        to: &SchemaVersion,
    ) -> Result<Vec<StepKey>> {
        if from == to {
            return Ok(Vec::new());
        }

        let mut came_from: HashMap<&SchemaVersion, &StepKey> = HashMap::new();
        let mut seen: HashSet<&SchemaVersion> = HashSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            // Sorted so ties resolve the same way every run
            for edge in self.steps().into_iter().filter(|k| &k.from == current) {
                if !seen.insert(&edge.to) {
                    continue;
                }
                came_from.insert(&edge.to, edge);
                if &edge.to == to {
                    let mut path = Vec::new();
                    let mut node = to;
                    while let Some(step) = came_from.get(node) {
                        path.push((*step).clone());
                        node = &step.from;
                    }
                    path.reverse();
                    return Ok(path);
                }
                queue.push_back(&edge.to);
            }
        }

        Err(Error::NoMigrationPath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }
}
