use std::env;

use debug_print::debug_eprintln;
use sliderule_functions::pool::DEFAULT_POOL_CAPACITY;

pub const REUSE_SORTED_VIEWS_ENV: &str = "SLIDERULE_REUSE_SORTED_VIEWS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyticConfig {
    /// Serve a comparator from an already sorted view that covers it
    /// instead of sorting again. Output is identical either way.
    pub reuse_sorted_views: bool,
    pub pool_capacity: usize,
}

impl Default for AnalyticConfig {
    fn default() -> Self {
        Self {
            reuse_sorted_views: true,
            pool_capacity: DEFAULT_POOL_CAPACITY,
        }
    }
}

impl AnalyticConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = env::var(REUSE_SORTED_VIEWS_ENV) {
            match parse_flag(&raw) {
                Some(flag) => config.reuse_sorted_views = flag,
                None => {
                    debug_eprintln!(
                        "[executor::config] ignoring {}={:?}",
                        REUSE_SORTED_VIEWS_ENV,
                        raw
                    );
                }
            }
        }
        config
    }

    pub fn with_reuse_sorted_views(mut self, reuse: bool) -> Self {
        self.reuse_sorted_views = reuse;
        self
    }

    pub fn with_pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = capacity;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupByConfig {
    /// Build super-aggregate rows by merging the finest groups'
    /// accumulators; `false` re-iterates the records instead.
    pub use_merge: bool,
}

impl Default for GroupByConfig {
    fn default() -> Self {
        Self { use_merge: true }
    }
}

impl GroupByConfig {
    pub fn with_merge(mut self, use_merge: bool) -> Self {
        self.use_merge = use_merge;
        self
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalyticConfig::default();
        assert!(config.reuse_sorted_views);
        assert_eq!(config.pool_capacity, DEFAULT_POOL_CAPACITY);
        assert!(GroupByConfig::default().use_merge);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" Yes "), Some(true));
        assert_eq!(parse_flag("OFF"), Some(false));
        assert_eq!(parse_flag("false"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_builders() {
        let config = AnalyticConfig::default()
            .with_reuse_sorted_views(false)
            .with_pool_capacity(4);
        assert!(!config.reuse_sorted_views);
        assert_eq!(config.pool_capacity, 4);
        assert!(!GroupByConfig::default().with_merge(false).use_merge);
    }
}
