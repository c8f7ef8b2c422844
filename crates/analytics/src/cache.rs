use core_types::PeriodSeries;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// The computation a cached series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    MonthlyAverage,
    MonthOverMonth,
    ForwardReturn,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::MonthlyAverage => "monthly_avg",
            Operation::MonthOverMonth => "mom_returns",
            Operation::ForwardReturn => "forward_returns",
        }
    }
}

/// `(index, operation, extra args)`, e.g. `("NIFTY 50", ForwardReturn, ["1Y"])`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub index: String,
    pub operation: Operation,
    pub args: Vec<String>,
}

impl CacheKey {
    pub fn new(index: &str, operation: Operation) -> Self {
        Self {
            index: index.to_string(),
            operation,
            args: Vec::new(),
        }
    }

    pub fn with_arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.index, self.operation.as_str(), self.args.join(":"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Memoized bucket series for one dataset.
///
/// Entries are never evicted; the key space is bounded by indices times operations.
/// Values are computed outside the lock, so a computation may itself go through the
/// cache. When two callers race on the same key both compute, the first insert wins
/// and both receive the stored value.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: RwLock<HashMap<CacheKey, Arc<PeriodSeries<f64>>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<PeriodSeries<f64>>> {
        // Entries are immutable once inserted, so a poisoned map is still consistent.
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).cloned()
    }

    /// Returns the cached series for `key`, computing and storing it on a miss.
    /// Errors from `compute` are returned as is and nothing is stored.
    pub fn get_or_try_insert_with<E, F>(
        &self,
        key: CacheKey,
        compute: F,
    ) -> Result<Arc<PeriodSeries<f64>>, E>
    where
        F: FnOnce() -> Result<PeriodSeries<f64>, E>,
    {
        if let Some(hit) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(key = %key, "Cache hit.");
            return Ok(hit);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(key = %key, "Cache miss, computing.");
        let computed = Arc::new(compute()?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.entry(key).or_insert(computed).clone())
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
