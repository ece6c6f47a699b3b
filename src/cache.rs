// SPDX-License-Identifier: MIT OR Apache-2.0

//! Function cache: a bounded, insertion-ordered cache of a property's last
//! computed results.
//!
//! This is deliberately **not** an LRU-by-access cache: `get` never
//! promotes a key, and eviction always removes the oldest *inserted*
//! entry. Callers that expect access-refreshed eviction (the `lru` crate's
//! `get()`) will be surprised; this "LRU-by-age" semantics is load-bearing
//! and preserved from the source system.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use std::time::Instant;
use sysinfo::{Pid, System};

/// Tunables for a single property's cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub maxsize: usize,
    pub enabled: bool,
    pub sample_time: bool,
    pub sample_mem: bool,
    pub track_time: bool,
    pub track_mem: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            maxsize: 1,
            enabled: true,
            sample_time: true,
            sample_mem: true,
            track_time: false,
            track_mem: false,
        }
    }
}

/// Accumulated counters and samples exposed by [`FunctionCache::state`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheState {
    pub accesses: u64,
    pub accesses_weighted: f64,
    pub mean_time: f64,
    pub mean_mem: f64,
}

pub struct FunctionCache<K, V> {
    entries: IndexMap<K, V>,
    config: CacheConfig,
    accesses: u64,
    accesses_weighted: f64,
    time_samples: Vec<f64>,
    mem_samples: Vec<f64>,
    process_id: Pid,
}

impl<K: Eq + Hash + Clone, V: Clone> FunctionCache<K, V> {
    pub fn new(config: CacheConfig) -> Self {
        FunctionCache {
            entries: IndexMap::new(),
            config,
            accesses: 0,
            accesses_weighted: 0.0,
            time_samples: Vec::new(),
            mem_samples: Vec::new(),
            process_id: sysinfo::get_current_pid().unwrap_or(Pid::from(0)),
        }
    }

    pub fn enable(&mut self) {
        self.config.enabled = true;
    }

    pub fn disable(&mut self) {
        self.config.enabled = false;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.accesses = 0;
        self.accesses_weighted = 0.0;
    }

    fn evict_to_capacity(&mut self) {
        while self.entries.len() >= self.config.maxsize.max(1) {
            self.entries.shift_remove_index(0);
        }
    }

    pub fn set_size(&mut self, size: usize) {
        self.config.maxsize = size;
        self.evict_to_capacity();
    }

    pub fn state(&self) -> CacheState {
        let mean = |samples: &[f64]| {
            if samples.is_empty() {
                0.0
            } else {
                samples.iter().sum::<f64>() / samples.len() as f64
            }
        };
        CacheState {
            accesses: self.accesses,
            accesses_weighted: self.accesses_weighted,
            mean_time: mean(&self.time_samples),
            mean_mem: mean(&self.mem_samples),
        }
    }

    fn sample_memory(&self) -> f64 {
        let mut system = System::new();
        system.refresh_processes(sysinfo::ProcessesToUpdate::Some(&[self.process_id]), true);
        system
            .process(self.process_id)
            .map(|p| p.memory() as f64)
            .unwrap_or(0.0)
    }

    /// Look up `key`, computing and inserting via `compute` on a miss.
    /// `compute` only runs on a miss, so a fallible argument-gathering step
    /// (recursive property resolution) never runs on a hit. Mirrors the
    /// source's `function_cache.__getitem__`: never reorders existing
    /// entries, evicts the oldest insertion when full, and records
    /// timing/memory samples according to `self.config`.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: K,
        compute: impl FnOnce() -> std::result::Result<V, E>,
    ) -> std::result::Result<V, E> {
        self.accesses += 1;
        self.accesses_weighted += 1.0 / self.config.maxsize.max(1) as f64;

        if let Some(value) = self.entries.get(&key) {
            tracing::trace!("cache hit");
            return Ok(value.clone());
        }

        self.evict_to_capacity();

        let time_sample = (self.time_samples.is_empty() && self.config.sample_time)
            || self.config.track_time;
        let mem_sample =
            (self.mem_samples.is_empty() && self.config.sample_mem) || self.config.track_mem;

        let value = match (time_sample, mem_sample) {
            (false, false) => compute()?,
            (true, false) => {
                let start = Instant::now();
                let value = compute()?;
                self.time_samples.push(start.elapsed().as_secs_f64());
                value
            }
            (false, true) => {
                let before = self.sample_memory();
                let value = compute()?;
                let after = self.sample_memory();
                self.mem_samples.push(after - before);
                value
            }
            (true, true) => {
                let before = self.sample_memory();
                let start = Instant::now();
                let value = compute()?;
                self.time_samples.push(start.elapsed().as_secs_f64());
                let after = self.sample_memory();
                self.mem_samples.push(after - before);
                value
            }
        };

        tracing::trace!("cache miss");
        if self.config.enabled && self.entries.len() < self.config.maxsize.max(1) {
            self.entries.insert(key, value.clone());
        }
        Ok(value)
    }
}
