// SPDX-License-Identifier: MIT OR Apache-2.0

use propgrad::cache::{CacheConfig, FunctionCache};

#[test]
fn eviction_is_by_insertion_age_not_by_access() {
    let config = CacheConfig {
        maxsize: 2,
        sample_time: false,
        sample_mem: false,
        ..CacheConfig::default()
    };
    let mut cache: FunctionCache<i32, i32> = FunctionCache::new(config);

    let ok: Result<i32, ()> = Ok(10);
    cache.get_or_try_insert_with(1, || ok).unwrap();
    let ok: Result<i32, ()> = Ok(20);
    cache.get_or_try_insert_with(2, || ok).unwrap();

    // Repeatedly re-accessing key 1 must NOT protect it from eviction: a
    // true-LRU cache would keep 1 and evict 2 here, but this cache evicts
    // strictly by insertion order.
    for _ in 0..5 {
        let v = cache.get_or_try_insert_with(1, || -> Result<i32, ()> { panic!("should be a hit") });
        assert_eq!(v.unwrap(), 10);
    }

    let ok: Result<i32, ()> = Ok(30);
    cache.get_or_try_insert_with(3, || ok).unwrap();

    // Key 1 was inserted first and must be evicted despite being accessed
    // most recently, since this cache is insertion-ordered, not access-ordered.
    let mut recomputed = false;
    let v = cache.get_or_try_insert_with(1, || -> Result<i32, ()> {
        recomputed = true;
        Ok(99)
    });
    assert!(recomputed, "key 1 should have been evicted and recomputed");
    assert_eq!(v.unwrap(), 99);
}

#[test]
fn disabled_cache_never_stores_results() {
    let config = CacheConfig {
        maxsize: 4,
        enabled: false,
        sample_time: false,
        sample_mem: false,
        ..CacheConfig::default()
    };
    let mut cache: FunctionCache<i32, i32> = FunctionCache::new(config);
    let mut calls = 0;
    for _ in 0..3 {
        let v = cache.get_or_try_insert_with(1, || -> Result<i32, ()> {
            calls += 1;
            Ok(42)
        });
        assert_eq!(v.unwrap(), 42);
    }
    assert_eq!(calls, 3);
}

#[test]
fn state_reports_accesses_and_weighted_accesses() {
    let config = CacheConfig {
        maxsize: 2,
        sample_time: false,
        sample_mem: false,
        ..CacheConfig::default()
    };
    let mut cache: FunctionCache<i32, i32> = FunctionCache::new(config);
    let ok: Result<i32, ()> = Ok(1);
    cache.get_or_try_insert_with(1, || ok).unwrap();
    let ok: Result<i32, ()> = Ok(1);
    cache.get_or_try_insert_with(1, || ok).unwrap();
    let state = cache.state();
    assert_eq!(state.accesses, 2);
    assert!((state.accesses_weighted - 1.0).abs() < 1e-9);
}
