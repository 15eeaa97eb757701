//! Stable item keys for array entries

use std::sync::atomic::{AtomicUsize, Ordering};

/// Source of stable per-item keys
///
/// Keys only need to be unique within one array; no coordination between
/// generators is implied.
pub trait KeyGenerator: Send + Sync {
    /// Produce a new, non-empty key
    fn next_key(&self) -> String;
}

/// Random 12-character keys drawn from UUIDv4
///
/// # Examples
///
/// ```
/// use scrivener_domain::{KeyGenerator, RandomKeys};
///
/// let key = RandomKeys.next_key();
/// assert_eq!(key.len(), 12);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeys;

impl KeyGenerator for RandomKeys {
    fn next_key(&self) -> String {
        let mut key = uuid::Uuid::new_v4().simple().to_string();
        key.truncate(12);
        key
    }
}

/// Deterministic keys (`k0`, `k1`, ...) for tests and reproducible output
#[derive(Debug, Default)]
pub struct SequentialKeys {
    prefix: String,
    next: AtomicUsize,
}

impl SequentialKeys {
    /// Keys of the form `{prefix}{n}`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicUsize::new(0),
        }
    }
}

impl KeyGenerator for SequentialKeys {
    fn next_key(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        let prefix = if self.prefix.is_empty() { "k" } else { &self.prefix };
        format!("{}{}", prefix, n)
    }
}

impl<K: KeyGenerator + ?Sized> KeyGenerator for &K {
    fn next_key(&self) -> String {
        (**self).next_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_keys_differ() {
        let a = RandomKeys.next_key();
        let b = RandomKeys.next_key();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sequential_keys() {
        let keys = SequentialKeys::new("item");
        assert_eq!(keys.next_key(), "item0");
        assert_eq!(keys.next_key(), "item1");

        let default = SequentialKeys::default();
        assert_eq!(default.next_key(), "k0");
    }
}
