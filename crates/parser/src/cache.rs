use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use debug_print::debug_eprintln;
use sliderule_common::error::Result;

use crate::grammar::parse_aggregator_spec;
use crate::spec::AggregatorSpec;

/// Memoises parsed specification strings. Safe to share across threads.
#[derive(Debug, Default)]
pub struct SpecCache {
    entries: DashMap<String, AggregatorSpec>,
    hits: AtomicU64,
    misses: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecCacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

impl SpecCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl SpecCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_parse(&self, spec: &str) -> Result<AggregatorSpec> {
        let key = spec.trim();
        if let Some(cached) = self.entries.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let parsed = parse_aggregator_spec(key)?;
        debug_eprintln!("[parser::cache] cached spec '{}'", key);
        self.entries.insert(key.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> SpecCacheStats {
        SpecCacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
