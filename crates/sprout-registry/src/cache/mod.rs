//! Metadata caching with TTL support

use std::time::{Duration, SystemTime};

use dashmap::DashMap;

use crate::api::PackageEntry;

/// Cache entry with TTL
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Cached package metadata
    pub entry: PackageEntry,
    /// When the entry was stored
    pub stored_at: SystemTime,
    /// Time-to-live duration
    pub ttl: Duration,
}

impl CacheEntry {
    /// Create new cache entry with default TTL (1 hour)
    pub fn new(entry: PackageEntry) -> Self {
        Self::with_ttl(entry, Duration::from_secs(3600))
    }

    /// Create cache entry with custom TTL
    pub fn with_ttl(entry: PackageEntry, ttl: Duration) -> Self {
        Self {
            entry,
            stored_at: SystemTime::now(),
            ttl,
        }
    }

    /// Check if cache entry is still fresh
    pub fn is_fresh(&self) -> bool {
        match self.stored_at.elapsed() {
            Ok(elapsed) => elapsed < self.ttl,
            Err(_) => false, // Clock went backwards, consider stale
        }
    }
}

/// In-memory package metadata cache with TTL
#[derive(Debug, Default)]
pub struct MetadataCache {
    cache: DashMap<String, CacheEntry>,
}

impl MetadataCache {
    /// Create new metadata cache
    pub fn new() -> Self {
        Self {
            cache: DashMap::new(),
        }
    }

    /// Get cached metadata if fresh
    pub fn get(&self, package_name: &str) -> Option<PackageEntry> {
        let entry = self.cache.get(package_name)?;
        if entry.is_fresh() {
            Some(entry.entry.clone())
        } else {
            drop(entry);
            self.cache.remove(package_name);
            None
        }
    }

    /// Store metadata with default TTL
    pub fn insert(&self, package_name: String, entry: PackageEntry) {
        self.cache.insert(package_name, CacheEntry::new(entry));
    }

    /// Store metadata with custom TTL
    pub fn insert_with_ttl(&self, package_name: String, entry: PackageEntry, ttl: Duration) {
        self.cache
            .insert(package_name, CacheEntry::with_ttl(entry, ttl));
    }

    /// Check if package is cached and fresh
    pub fn contains_fresh(&self, package_name: &str) -> bool {
        self.cache
            .get(package_name)
            .map(|entry| entry.is_fresh())
            .unwrap_or(false)
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut fresh_entries = 0;
        let mut stale_entries = 0;

        for entry in self.cache.iter() {
            if entry.is_fresh() {
                fresh_entries += 1;
            } else {
                stale_entries += 1;
            }
        }

        CacheStats {
            total_entries: self.cache.len(),
            fresh_entries,
            stale_entries,
        }
    }

    /// Clear all cached entries
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Remove stale entries, returning how many were dropped
    pub fn cleanup(&self) -> usize {
        let mut removed = 0;
        self.cache.retain(|_, entry| {
            if entry.is_fresh() {
                true
            } else {
                removed += 1;
                false
            }
        });
        removed
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
    pub stale_entries: usize,
}

#[cfg(test)]
mod tests;
