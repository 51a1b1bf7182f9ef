use std::{hash::Hash, marker::PhantomData};

/// Trait for keys used by a [`BigMap`]. Keys are plain `u64` indices wrapped
/// in a newtype per collection, so a key from one map cannot be used with
/// another by accident.
pub trait BigMapKey: Clone + Copy + Eq + Hash {
    fn to_u64(&self) -> u64;
    fn from_u64(value: u64) -> Self;
}

/// A map that generates its own keys on insertion and never reuses a slot.
/// Looking up a key whose value has been removed returns `None` forever,
/// which makes stale handles (use-after-destroy) harmless.
pub struct BigMap<K: BigMapKey, V> {
    inner: Vec<Option<V>>,
    phantom_k: PhantomData<K>,
}

impl<K: BigMapKey, V> BigMap<K, V> {
    pub fn new() -> Self {
        Self {
            inner: Vec::new(),
            phantom_k: PhantomData,
        }
    }

    /// Insert a value, returning the newly generated key for it.
    pub fn insert(&mut self, value: V) -> K {
        let key = K::from_u64(self.inner.len() as u64);
        self.inner.push(Some(value));
        key
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let index = key.to_u64() as usize;
        self.inner.get(index)?.as_ref()
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = key.to_u64() as usize;
        self.inner.get_mut(index)?.as_mut()
    }

    /// Remove a value, leaving a permanent hole. The key is retired and will
    /// never be handed out again by this map.
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = key.to_u64() as usize;
        self.inner.get_mut(index)?.take()
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.iter().all(|slot| slot.is_none())
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.inner.iter().enumerate().filter_map(|(index, slot)| {
            slot.as_ref()
                .map(|value| (K::from_u64(index as u64), value))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut V)> {
        self.inner
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                slot.as_mut()
                    .map(|value| (K::from_u64(index as u64), value))
            })
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.inner.iter().enumerate().filter_map(|(index, slot)| {
            if slot.is_some() {
                Some(K::from_u64(index as u64))
            } else {
                None
            }
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.iter().filter_map(|slot| slot.as_ref())
    }
}

impl<K: BigMapKey, V> Default for BigMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    struct TestKey(u64);

    impl BigMapKey for TestKey {
        fn to_u64(&self) -> u64 {
            self.0
        }
        fn from_u64(value: u64) -> Self {
            TestKey(value)
        }
    }

    #[test]
    fn insert_and_get() {
        let mut map: BigMap<TestKey, &str> = BigMap::new();
        let a = map.insert("a");
        let b = map.insert("b");

        assert_eq!(map.get(&a), Some(&"a"));
        assert_eq!(map.get(&b), Some(&"b"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn removed_keys_stay_invalid() {
        let mut map: BigMap<TestKey, u32> = BigMap::new();
        let key = map.insert(7);

        assert_eq!(map.remove(&key), Some(7));
        assert_eq!(map.get(&key), None);
        assert_eq!(map.remove(&key), None);

        // new insertions never resurrect the old key
        let next = map.insert(8);
        assert_ne!(key, next);
        assert_eq!(map.get(&key), None);
    }

    #[test]
    fn iteration_skips_holes() {
        let mut map: BigMap<TestKey, u32> = BigMap::new();
        let a = map.insert(1);
        let _b = map.insert(2);
        let c = map.insert(3);
        map.remove(&a);

        let collected: Vec<(TestKey, u32)> = map.iter().map(|(k, v)| (k, *v)).collect();
        assert_eq!(collected.len(), 2);
        assert!(collected.contains(&(c, 3)));
    }
}
