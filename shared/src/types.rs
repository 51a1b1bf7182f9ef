/// A frame index on the server's single-threaded tick loop. Starts at 0 and
/// increments once per `advance_tick`.
pub type Tick = u64;
