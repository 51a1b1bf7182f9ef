use std::collections::BTreeMap;

use meridian_shared::{Tick, Value};

use crate::world::ElementKey;

/// Handle to a scheduled timer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct TimerKey(u64);

struct Timer {
    event_name: String,
    anchor: ElementKey,
    interval: u64,
    next_due: Tick,
    /// `None` repeats forever.
    remaining: Option<u32>,
    args: Vec<Value>,
}

/// Tick-driven timers that fire named events on the bus.
///
/// Keys are handed out in creation order and stored in a `BTreeMap`, so
/// timers due on the same tick fire oldest first.
pub struct TimerSet {
    timers: BTreeMap<TimerKey, Timer>,
    next_key: u64,
}

impl TimerSet {
    pub fn new() -> Self {
        Self {
            timers: BTreeMap::new(),
            next_key: 0,
        }
    }

    /// Schedule an event to fire on `anchor` every `interval` ticks,
    /// `repeats` times (`None` for forever). An interval of zero is rounded
    /// up to one tick.
    pub fn set_timer(
        &mut self,
        event_name: &str,
        anchor: ElementKey,
        interval: u64,
        repeats: Option<u32>,
        args: Vec<Value>,
        now: Tick,
    ) -> TimerKey {
        let key = TimerKey(self.next_key);
        self.next_key += 1;
        // a timer asked to run zero times is already exhausted
        if repeats == Some(0) {
            return key;
        }
        let interval = interval.max(1);
        self.timers.insert(
            key,
            Timer {
                event_name: event_name.to_string(),
                anchor,
                interval,
                next_due: now + interval,
                remaining: repeats,
                args,
            },
        );
        key
    }

    /// Cancel a timer. Returns whether it was still live.
    pub fn kill(&mut self, key: &TimerKey) -> bool {
        self.timers.remove(key).is_some()
    }

    /// Cancel every timer anchored on an element, typically because it is
    /// being destroyed.
    pub fn kill_anchored(&mut self, anchor: &ElementKey) {
        self.timers.retain(|_, timer| timer.anchor != *anchor);
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Collect every firing due at `now`, advancing repeat schedules and
    /// retiring exhausted timers.
    pub fn due(&mut self, now: Tick) -> Vec<(String, ElementKey, Vec<Value>)> {
        let mut fired = Vec::new();
        let mut exhausted = Vec::new();
        for (key, timer) in self.timers.iter_mut() {
            if timer.next_due > now {
                continue;
            }
            fired.push((timer.event_name.clone(), timer.anchor, timer.args.clone()));
            timer.next_due = now + timer.interval;
            if let Some(remaining) = timer.remaining.as_mut() {
                *remaining -= 1;
                if *remaining == 0 {
                    exhausted.push(*key);
                }
            }
        }
        for key in exhausted {
            self.timers.remove(&key);
        }
        fired
    }
}

impl Default for TimerSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_shared::BigMapKey;

    fn anchor() -> ElementKey {
        ElementKey::from_u64(1)
    }

    #[test]
    fn timer_fires_on_its_interval_and_repeats() {
        let mut timers = TimerSet::new();
        timers.set_timer("on_pulse", anchor(), 2, Some(2), Vec::new(), 0);

        assert!(timers.due(1).is_empty());
        assert_eq!(timers.due(2).len(), 1);
        assert!(timers.due(3).is_empty());
        assert_eq!(timers.due(4).len(), 1);

        // two repeats spent
        assert!(timers.is_empty());
        assert!(timers.due(6).is_empty());
    }

    #[test]
    fn zero_repeat_timer_never_fires() {
        let mut timers = TimerSet::new();
        let key = timers.set_timer("on_pulse", anchor(), 1, Some(0), Vec::new(), 0);

        assert!(timers.is_empty());
        for now in 1..=3 {
            assert!(timers.due(now).is_empty());
        }
        assert!(!timers.kill(&key));
    }

    #[test]
    fn unlimited_timer_keeps_firing_until_killed() {
        let mut timers = TimerSet::new();
        let key = timers.set_timer("on_pulse", anchor(), 1, None, Vec::new(), 0);

        for now in 1..=5 {
            assert_eq!(timers.due(now).len(), 1);
        }
        assert!(timers.kill(&key));
        assert!(timers.due(6).is_empty());
    }

    #[test]
    fn same_tick_timers_fire_in_creation_order() {
        let mut timers = TimerSet::new();
        timers.set_timer("first", anchor(), 1, Some(1), Vec::new(), 0);
        timers.set_timer("second", anchor(), 1, Some(1), Vec::new(), 0);

        let fired = timers.due(1);
        let names: Vec<_> = fired.iter().map(|(name, _, _)| name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn killing_by_anchor_removes_all_of_its_timers() {
        let mut timers = TimerSet::new();
        let other = ElementKey::from_u64(2);
        timers.set_timer("a", anchor(), 1, None, Vec::new(), 0);
        timers.set_timer("b", anchor(), 1, None, Vec::new(), 0);
        timers.set_timer("c", other, 1, None, Vec::new(), 0);

        timers.kill_anchored(&anchor());
        assert_eq!(timers.len(), 1);
    }
}
