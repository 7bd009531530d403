//! Symbol resolution over ordered chains of class pools.
//!
//! Resolution is deterministic and side-effect-free for a fixed chain:
//! the first source to contain a name wins, and caching may only change
//! latency, never the answer.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};

use cached::{Cached, SizedCache};

use crate::model::BinaryClass;
use crate::pool::ClassPool;

/// Maps binary names to parsed classes across potentially many sources.
pub trait Resolver: Send + Sync {
    fn find_class(&self, name: &str) -> Option<Arc<BinaryClass>>;

    /// Origin moniker of the source that would serve `name`, diagnostics only.
    fn location_of(&self, name: &str) -> Option<String>;

    fn is_empty(&self) -> bool;
}

/// Resolver over no classes at all.
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn find_class(&self, _name: &str) -> Option<Arc<BinaryClass>> {
        None
    }

    fn location_of(&self, _name: &str) -> Option<String> {
        None
    }

    fn is_empty(&self) -> bool {
        true
    }
}

/// Resolver backed by a single pool.
pub struct PoolResolver {
    pool: Arc<dyn ClassPool>,
}

impl PoolResolver {
    pub fn new(pool: Arc<dyn ClassPool>) -> PoolResolver {
        PoolResolver { pool }
    }
}

impl Resolver for PoolResolver {
    fn find_class(&self, name: &str) -> Option<Arc<BinaryClass>> {
        self.pool.find(name)
    }

    fn location_of(&self, name: &str) -> Option<String> {
        self.pool
            .contains(name)
            .then(|| self.pool.origin().to_string())
    }

    fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }
}

/// Ordered composition of child resolvers, first hit wins.
pub struct UnionResolver {
    children: Vec<Arc<dyn Resolver>>,
}

impl UnionResolver {
    /// Compose child resolvers, skipping empty children to keep the chain
    /// shallow. Degenerates to the single non-empty child, or to
    /// [`EmptyResolver`] when nothing is left.
    pub fn compose(children: Vec<Arc<dyn Resolver>>) -> Arc<dyn Resolver> {
        let mut children: Vec<Arc<dyn Resolver>> = children
            .into_iter()
            .filter(|child| !child.is_empty())
            .collect();
        match children.len() {
            0 => Arc::new(EmptyResolver),
            1 => children.remove(0),
            _ => Arc::new(UnionResolver { children }),
        }
    }
}

impl Resolver for UnionResolver {
    fn find_class(&self, name: &str) -> Option<Arc<BinaryClass>> {
        self.children.iter().find_map(|child| child.find_class(name))
    }

    fn location_of(&self, name: &str) -> Option<String> {
        self.children.iter().find_map(|child| child.location_of(name))
    }

    fn is_empty(&self) -> bool {
        self.children.iter().all(|child| child.is_empty())
    }
}

const STRIPE_COUNT: usize = 16;
const CACHE_CAPACITY: usize = 1024;

type CacheStripe = Mutex<SizedCache<String, Option<Arc<BinaryClass>>>>;

/// Memoizing wrapper around a delegate resolver.
///
/// The cache is a bounded LRU with deterministic eviction, partitioned into
/// a fixed number of lock stripes selected by key hash. Lookups for
/// different names proceed in parallel on distinct stripes; lookups for the
/// same name coalesce behind that name's stripe. Negative results are
/// cached too, so a missing symbol is not re-resolved at every use site.
pub struct CachingResolver {
    delegate: Arc<dyn Resolver>,
    stripes: Vec<CacheStripe>,
}

impl CachingResolver {
    pub fn new(delegate: Arc<dyn Resolver>) -> CachingResolver {
        let stripes = (0..STRIPE_COUNT)
            .map(|_| Mutex::new(SizedCache::with_size(CACHE_CAPACITY / STRIPE_COUNT)))
            .collect();
        CachingResolver { delegate, stripes }
    }

    fn stripe(&self, name: &str) -> &CacheStripe {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        &self.stripes[hasher.finish() as usize % STRIPE_COUNT]
    }
}

impl Resolver for CachingResolver {
    fn find_class(&self, name: &str) -> Option<Arc<BinaryClass>> {
        let stripe = self.stripe(name);
        let mut cache = stripe.lock().unwrap_or_else(|poison| poison.into_inner());
        let key = name.to_string();
        if let Some(cached) = cache.cache_get(&key) {
            return cached.clone();
        }
        // The stripe lock is held across the delegate lookup, coalescing
        // concurrent misses for the same name into one resolution.
        let resolved = self.delegate.find_class(name);
        cache.cache_set(key, resolved.clone());
        resolved
    }

    fn location_of(&self, name: &str) -> Option<String> {
        self.delegate.location_of(name)
    }

    fn is_empty(&self) -> bool {
        self.delegate.is_empty()
    }
}
