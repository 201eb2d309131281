//! Unit tests for the metadata cache

use super::*;

fn sample_entry(name: &str) -> PackageEntry {
    serde_json::from_value(serde_json::json!({
        "name": name,
        "dist-tags": { "latest": "1.0.0" },
        "versions": {
            "1.0.0": { "version": "1.0.0" }
        }
    }))
    .unwrap()
}

#[test]
fn test_insert_and_get() {
    let cache = MetadataCache::new();
    cache.insert("logger".to_string(), sample_entry("logger"));

    let fetched = cache.get("logger").unwrap();
    assert_eq!(fetched.name, "logger");
    assert!(cache.contains_fresh("logger"));
}

#[test]
fn test_get_missing() {
    let cache = MetadataCache::new();
    assert!(cache.get("nonexistent").is_none());
    assert!(!cache.contains_fresh("nonexistent"));
}

#[test]
fn test_expired_entry_is_evicted_on_get() {
    let cache = MetadataCache::new();
    cache.insert_with_ttl(
        "logger".to_string(),
        sample_entry("logger"),
        Duration::from_secs(0),
    );

    assert!(cache.get("logger").is_none());
    assert_eq!(cache.stats().total_entries, 0);
}

#[test]
fn test_stats_counts_fresh_and_stale() {
    let cache = MetadataCache::new();
    cache.insert("fresh".to_string(), sample_entry("fresh"));
    cache.insert_with_ttl(
        "stale".to_string(),
        sample_entry("stale"),
        Duration::from_secs(0),
    );

    let stats = cache.stats();
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.fresh_entries, 1);
    assert_eq!(stats.stale_entries, 1);
}

#[test]
fn test_cleanup_removes_only_stale() {
    let cache = MetadataCache::new();
    cache.insert("fresh".to_string(), sample_entry("fresh"));
    cache.insert_with_ttl(
        "stale".to_string(),
        sample_entry("stale"),
        Duration::from_secs(0),
    );

    let removed = cache.cleanup();
    assert_eq!(removed, 1);
    assert!(cache.contains_fresh("fresh"));
    assert!(!cache.contains_fresh("stale"));
}

#[test]
fn test_clear() {
    let cache = MetadataCache::new();
    cache.insert("a".to_string(), sample_entry("a"));
    cache.insert("b".to_string(), sample_entry("b"));

    cache.clear();
    assert_eq!(cache.stats().total_entries, 0);
}
