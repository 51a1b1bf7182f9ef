use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use crate::BigMapKey;

/// Generates unique keys and recycles returned ones after a configurable
/// delay, so that a key cannot be handed out again while stale references to
/// it may still be in flight.
pub struct KeyGenerator<K: BigMapKey> {
    recycled_keys: VecDeque<(K, Instant)>,
    recycle_delay: Duration,
    next_key: u64,
}

impl<K: BigMapKey> KeyGenerator<K> {
    pub fn new(recycle_delay: Duration) -> Self {
        Self {
            recycled_keys: VecDeque::new(),
            recycle_delay,
            next_key: 0,
        }
    }

    /// Get a new, unique key.
    pub fn generate(&mut self) -> K {
        if let Some((key, returned_at)) = self.recycled_keys.front() {
            if returned_at.elapsed() >= self.recycle_delay {
                let key = *key;
                self.recycled_keys.pop_front();
                return key;
            }
        }

        let key = K::from_u64(self.next_key);
        self.next_key = self.next_key.wrapping_add(1);
        key
    }

    /// Return a key to the generator, to be reused after the recycle delay.
    pub fn recycle_key(&mut self, key: &K) {
        self.recycled_keys.push_back((*key, Instant::now()));
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
    fn generates_sequential_keys() {
        let mut generator: KeyGenerator<TestKey> = KeyGenerator::new(Duration::from_secs(1));
        assert_eq!(generator.generate(), TestKey(0));
        assert_eq!(generator.generate(), TestKey(1));
        assert_eq!(generator.generate(), TestKey(2));
    }

    #[test]
    fn recycled_key_is_withheld_until_delay_passes() {
        let mut generator: KeyGenerator<TestKey> = KeyGenerator::new(Duration::from_secs(60));
        let key = generator.generate();
        generator.recycle_key(&key);

        // delay has not elapsed, so a fresh key is produced instead
        assert_eq!(generator.generate(), TestKey(1));
    }

    #[test]
    fn recycled_key_is_reused_after_delay() {
        let mut generator: KeyGenerator<TestKey> = KeyGenerator::new(Duration::ZERO);
        let key = generator.generate();
        generator.recycle_key(&key);

        assert_eq!(generator.generate(), key);
    }
}
