//! Derived-file dependencies and the hooks fired on change

use std::collections::HashMap;

/// Static map from a source document to the files derived from it.
#[derive(Debug, Clone, Default)]
pub struct DependencyMap {
    map: HashMap<String, Vec<String>>,
}

impl DependencyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derived artifacts of the site build.
    pub fn builtin() -> Self {
        Self::new()
            .with(
                "base-cv.json",
                &[
                    "optimized/base-cv-optimized.json",
                    "cache/base-cv.cache.json",
                    "exports/cv-summary.json",
                ],
            )
            .with(
                "activity-summary.json",
                &[
                    "cache/activity.cache.json",
                    "optimized/activity-optimized.json",
                ],
            )
            .with("ai-enhancements.json", &["cache/enhancements.cache.json"])
    }

    pub fn with(mut self, source: &str, derived: &[&str]) -> Self {
        self.map.insert(
            source.to_string(),
            derived.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Files derived from `source`; empty for unknown sources.
    pub fn for_source(&self, source: &str) -> &[String] {
        self.map.get(source).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Side effects of synchronization. The site build implements these; the
/// toolkit only decides when they fire.
pub trait SyncHooks {
    fn invalidate_cache(&mut self, path: &str);
    fn recache(&mut self, path: &str);
    /// Regenerate optimized output for a source document
    fn trigger_optimization(&mut self, source: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookEvent {
    InvalidateCache(String),
    Recache(String),
    Optimize(String),
}

/// Hooks that log each event and remember it.
#[derive(Debug, Clone, Default)]
pub struct HookLog {
    pub events: Vec<HookEvent>,
}

impl HookLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sources optimization was requested for, in order.
    pub fn optimized(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                HookEvent::Optimize(source) => Some(source.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl SyncHooks for HookLog {
    fn invalidate_cache(&mut self, path: &str) {
        tracing::info!(path, "cache invalidated");
        self.events.push(HookEvent::InvalidateCache(path.to_string()));
    }

    fn recache(&mut self, path: &str) {
        tracing::info!(path, "recache requested");
        self.events.push(HookEvent::Recache(path.to_string()));
    }

    fn trigger_optimization(&mut self, source: &str) {
        tracing::info!(source, "optimization triggered");
        self.events.push(HookEvent::Optimize(source.to_string()));
    }
}
