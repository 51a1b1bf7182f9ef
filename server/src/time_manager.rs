use meridian_shared::Tick;

/// Owns the server's logical clock. Ticks only move forward, one at a time,
/// when the owning server advances.
pub struct TimeManager {
    current_tick: Tick,
}

impl TimeManager {
    pub fn new() -> Self {
        Self { current_tick: 0 }
    }

    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    pub(crate) fn advance(&mut self) -> Tick {
        self.current_tick += 1;
        self.current_tick
    }
}

impl Default for TimeManager {
    fn default() -> Self {
        Self::new()
    }
}
