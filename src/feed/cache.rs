use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use super::types::{GameLog, GameLogRequest, PlayerSeasonLine};
use super::GameLogProvider;

/// Game logs are cached per (entity id, season, as-of date).
pub type CacheKey = GameLogRequest;

#[derive(Debug)]
struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// Fixed-TTL cache. Callers own it and pass it where needed.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: HashMap<K, Entry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Fresh value for `key`, if any. Expired entries are dropped on read.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) => now.duration_since(entry.stored_at) >= self.ttl,
            None => return None,
        };
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|e| e.value.clone())
    }

    /// Store `value`, dropping anything already expired at `now`.
    pub fn insert(&mut self, key: K, value: V, now: Instant) {
        self.evict_expired(now);
        self.entries.insert(
            key,
            Entry {
                value,
                stored_at: now,
            },
        );
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|_, entry| now.duration_since(entry.stored_at) < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub type GameLogCache = TtlCache<CacheKey, GameLog>;

/// Wraps a provider with TTL caches for game logs and league lines.
pub struct CachedProvider<P> {
    inner: P,
    logs: GameLogCache,
    league: TtlCache<String, Vec<PlayerSeasonLine>>,
}

impl<P: GameLogProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            logs: TtlCache::new(ttl),
            league: TtlCache::new(ttl),
        }
    }

    pub fn cached_logs(&self) -> usize {
        self.logs.len()
    }
}

#[async_trait]
impl<P: GameLogProvider> GameLogProvider for CachedProvider<P> {
    async fn fetch_game_log(&mut self, request: &GameLogRequest) -> Result<GameLog> {
        let now = Instant::now();
        if let Some(log) = self.logs.get(request, now) {
            tracing::debug!(
                entity = %request.entity_id,
                season = %request.season,
                "game log cache hit"
            );
            return Ok(log);
        }
        tracing::debug!(
            entity = %request.entity_id,
            season = %request.season,
            "game log cache miss"
        );
        let log = self.inner.fetch_game_log(request).await?;
        self.logs.insert(request.clone(), log.clone(), now);
        Ok(log)
    }

    async fn fetch_league_stats(&mut self, season: &str) -> Result<Vec<PlayerSeasonLine>> {
        let now = Instant::now();
        let key = season.to_string();
        if let Some(lines) = self.league.get(&key, now) {
            tracing::debug!(season, "league stats cache hit");
            return Ok(lines);
        }
        tracing::debug!(season, "league stats cache miss");
        let lines = self.inner.fetch_league_stats(season).await?;
        self.league.insert(key, lines.clone(), now);
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn key(entity: &str) -> CacheKey {
        GameLogRequest {
            entity_id: entity.to_string(),
            season: "2023-24".to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        }
    }

    #[test]
    fn test_fresh_entry_is_returned() {
        let mut cache = GameLogCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert(key("1"), GameLog::default(), t0);
        assert!(cache.get(&key("1"), t0 + Duration::from_secs(59)).is_some());
    }

    #[test]
    fn test_expired_entry_is_dropped() {
        let mut cache = GameLogCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert(key("1"), GameLog::default(), t0);
        assert!(cache.get(&key("1"), t0 + Duration::from_secs(60)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_as_of_is_part_of_key() {
        let mut cache = GameLogCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert(key("1"), GameLog::default(), t0);
        let mut later = key("1");
        later.as_of = NaiveDate::from_ymd_opt(2024, 4, 2).unwrap();
        assert!(cache.get(&later, t0).is_none());
    }

    #[test]
    fn test_evict_expired() {
        let mut cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.insert("old".to_string(), 1, t0);
        cache.insert("new".to_string(), 2, t0 + Duration::from_secs(8));
        assert_eq!(cache.evict_expired(t0 + Duration::from_secs(12)), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_evicts_stale_keys() {
        // Each day's as-of date is a new key; old days must not pile up.
        let mut cache = GameLogCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        let mut yesterday = key("1");
        yesterday.as_of = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        cache.insert(yesterday, GameLog::default(), t0);
        cache.insert(key("2"), GameLog::default(), t0 + Duration::from_secs(30));
        cache.insert(key("1"), GameLog::default(), t0 + Duration::from_secs(61));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("2"), t0 + Duration::from_secs(61)).is_some());
    }
}
