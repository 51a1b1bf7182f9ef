mod syncer_map;

pub use syncer_map::{SyncerChoice, SyncerMap, SyncerState};
