use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use pubdisk_lib::filter::FilterSelector;
use pubdisk_lib::fs::FileRecord;

pub type Records = Arc<Vec<FileRecord>>;

/// listing cache key made of the public link and the selector fragment.
/// the two parts are compared separately, `Display` gives the
/// `files_{link}_{filter}` form for logs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    public_link: String,
    fragment: String,
}

impl CacheKey {
    pub fn new(public_link: &str, selector: &FilterSelector) -> Self {
        CacheKey {
            public_link: public_link.to_owned(),
            fragment: selector.key_fragment(),
        }
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "files_{}_{}", self.public_link, self.fragment)
    }
}

/// storage for filtered listings
///
/// an expired entry and a missing one look the same to callers.
pub trait FileCache: Send + Sync + Debug {
    fn get(&self, key: &CacheKey) -> Option<Records>;

    fn put(&self, key: CacheKey, records: Records, ttl: Duration);
}

#[derive(Debug)]
pub struct CacheEntry {
    records: Records,
    created: Instant,
    ttl: Duration,
}

impl CacheEntry {
    pub fn new(records: Records, ttl: Duration) -> Self {
        CacheEntry {
            records,
            created: Instant::now(),
            ttl,
        }
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= self.ttl
    }
}

struct EntryExpiry;

impl Expiry<CacheKey, Arc<CacheEntry>> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _created_at: Instant
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Arc<CacheEntry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// in process cache. moka evicts entries once their ttl passes and reads
/// check the ttl again so a stale entry is never returned
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry)
            .build();

        MemoryCache { inner }
    }

    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<Records> {
        let entry = self.inner.get(key)?;

        if entry.is_expired(now) {
            self.inner.invalidate(key);

            return None;
        }

        Some(entry.records().clone())
    }
}

impl FileCache for MemoryCache {
    fn get(&self, key: &CacheKey) -> Option<Records> {
        self.get_at(key, Instant::now())
    }

    fn put(&self, key: CacheKey, records: Records, ttl: Duration) {
        self.inner.insert(key, Arc::new(CacheEntry::new(records, ttl)));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const LINK: &str = "https://disk.yandex.ru/d/abc";
    const TTL: Duration = Duration::from_secs(300);

    fn records() -> Records {
        Arc::new(vec![
            FileRecord::new("/a.txt"),
            FileRecord::new("/b.txt"),
        ])
    }

    #[test]
    fn key_shape() {
        let cases = [
            (FilterSelector::All, "files_https://disk.yandex.ru/d/abc_"),
            (FilterSelector::media("image"), "files_https://disk.yandex.ru/d/abc_image"),
            (FilterSelector::group("images"), "files_https://disk.yandex.ru/d/abc_group:images"),
        ];

        for (selector, expected) in cases {
            assert_eq!(CacheKey::new(LINK, &selector).to_string(), expected, "selector {:?}", selector);
        }

        assert_ne!(
            CacheKey::new(LINK, &FilterSelector::media("documents")),
            CacheKey::new(LINK, &FilterSelector::group("documents"))
        );
    }

    #[test]
    fn link_and_filter_do_not_run_together() {
        let first = CacheKey::new("https://disk.yandex.ru/d/L", &FilterSelector::media("x_b"));
        let second = CacheKey::new("https://disk.yandex.ru/d/L_x", &FilterSelector::media("b"));

        assert_eq!(first.to_string(), second.to_string());
        assert_ne!(first, second);

        let cache = MemoryCache::new(100);
        cache.put(first.clone(), records(), TTL);

        assert!(cache.get(&second).is_none(), "listing served for a different link");
        assert!(cache.get(&first).is_some());
    }

    #[test]
    fn put_then_get() {
        let cache = MemoryCache::new(100);
        let key = CacheKey::new(LINK, &FilterSelector::All);

        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), records(), TTL);

        assert_eq!(cache.get(&key), Some(records()));
    }

    #[test]
    fn expires_after_ttl() {
        let cache = MemoryCache::new(100);
        let key = CacheKey::new(LINK, &FilterSelector::media("image"));

        cache.put(key.clone(), records(), TTL);

        let now = Instant::now();

        assert!(cache.get_at(&key, now).is_some());
        assert!(cache.get_at(&key, now + TTL).is_none(), "entry served past its ttl");
        assert!(cache.get(&key).is_none(), "expired entry should be dropped");
    }

    #[test]
    fn empty_listing_is_a_hit() {
        let cache = MemoryCache::new(100);
        let key = CacheKey::new(LINK, &FilterSelector::All);

        cache.put(key.clone(), Arc::new(Vec::new()), TTL);

        let found = cache.get(&key).expect("empty listing should be cached");

        assert!(found.is_empty());
    }

    #[test]
    fn put_overwrites() {
        let cache = MemoryCache::new(100);
        let key = CacheKey::new(LINK, &FilterSelector::All);

        cache.put(key.clone(), records(), TTL);
        cache.put(key.clone(), Arc::new(vec![FileRecord::new("/c.txt")]), TTL);

        let found = cache.get(&key).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "c.txt");
    }

    #[test]
    fn entry_expiry_check() {
        let entry = CacheEntry::new(records(), Duration::from_secs(5));
        let start = entry.created;

        assert!(!entry.is_expired(start));
        assert!(!entry.is_expired(start + Duration::from_secs(4)));
        assert!(entry.is_expired(start + Duration::from_secs(5)));
    }
}
