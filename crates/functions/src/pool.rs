use std::collections::HashMap;

use debug_print::debug_eprintln;
use parking_lot::Mutex;

use crate::aggregate::{AnalyticFunction, FunctionKey};

pub const DEFAULT_POOL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub hits: u64,
    pub misses: u64,
    pub idle: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    idle: HashMap<FunctionKey, Vec<Box<dyn AnalyticFunction>>>,
    hits: u64,
    misses: u64,
}

/// Caller-owned cache of idle function instances, keyed by function and
/// arguments. Only lookup and return take the lock; instances are used
/// outside it.
#[derive(Debug)]
pub struct FunctionPool {
    state: Mutex<PoolState>,
    capacity: usize,
}

impl Default for FunctionPool {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_POOL_CAPACITY)
    }
}

impl FunctionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// `capacity` bounds the idle instances kept per key.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(PoolState::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// An idle instance equivalent to `prototype`, reset with `init`, or a
    /// fresh replica when none is idle.
    pub fn acquire(&self, prototype: &dyn AnalyticFunction) -> Box<dyn AnalyticFunction> {
        let key = prototype.key();
        let pooled = {
            let mut state = self.state.lock();
            let pooled = state.idle.get_mut(&key).and_then(Vec::pop);
            if pooled.is_some() {
                state.hits += 1;
            } else {
                state.misses += 1;
            }
            pooled
        };

        match pooled {
            Some(mut function) => {
                debug_eprintln!("[functions::pool] reusing {}", key);
                function.init();
                function
            }
            None => {
                debug_eprintln!("[functions::pool] replicating {}", key);
                prototype.replicate()
            }
        }
    }

    pub fn release(&self, function: Box<dyn AnalyticFunction>) {
        let key = function.key();
        let mut state = self.state.lock();
        let idle = state.idle.entry(key).or_default();
        if idle.len() < self.capacity {
            idle.push(function);
        }
    }

    pub fn release_all(&self, functions: impl IntoIterator<Item = Box<dyn AnalyticFunction>>) {
        for function in functions {
            self.release(function);
        }
    }

    pub fn clear(&self) {
        self.state.lock().idle.clear();
    }

    pub fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            hits: state.hits,
            misses: state.misses,
            idle: state.idle.values().map(Vec::len).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use sliderule_common::types::Value;

    use super::*;
    use crate::aggregate::basic::{CountFunction, SumFunction};

    #[test]
    fn test_acquire_replicates_then_reuses() {
        let pool = FunctionPool::new();
        let prototype = SumFunction::field("v");

        let mut first = pool.acquire(&prototype);
        first.iterate(&[Value::int64(5)]).unwrap();
        pool.release(first);

        let mut second = pool.acquire(&prototype);
        // State from the previous use is gone.
        assert_eq!(second.terminate().unwrap(), Value::null());

        let stats = pool.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn test_keys_distinguish_arguments() {
        let pool = FunctionPool::new();
        pool.release(Box::new(SumFunction::field("a")));
        let _ = pool.acquire(&SumFunction::field("b"));
        let _ = pool.acquire(&CountFunction::field("a"));
        assert_eq!(pool.stats().hits, 0);
        assert_eq!(pool.stats().idle, 1);
    }

    #[test]
    fn test_capacity_bounds_idle_instances() {
        let pool = FunctionPool::with_capacity(2);
        for _ in 0..5 {
            pool.release(Box::new(CountFunction::all()));
        }
        assert_eq!(pool.stats().idle, 2);
        pool.clear();
        assert_eq!(pool.stats().idle, 0);
    }

    #[test]
    fn test_shared_across_threads() {
        let pool = Arc::new(FunctionPool::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = Arc::clone(&pool);
                thread::spawn(move || {
                    let prototype = CountFunction::all();
                    for _ in 0..25 {
                        let mut f = pool.acquire(&prototype);
                        f.iterate(&[Value::int64(1)]).unwrap();
                        assert_eq!(f.terminate().unwrap(), Value::int64(1));
                        pool.release(f);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let stats = pool.stats();
        assert_eq!(stats.hits + stats.misses, 100);
    }
}
