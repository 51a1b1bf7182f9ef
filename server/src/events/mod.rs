mod bus;
mod world_events;

pub use bus::{DispatchOutcome, EventBus, EventContext, EventPriority, HandlerId};
pub use world_events::{
    AttachEvent, ConnectEvent, DespawnElementEvent, DetachEvent, DisconnectEvent, ErrorEvent,
    RemoteResponseEvent, ReparentElementEvent, ResourceStartEvent, ResourceStopEvent,
    SpawnElementEvent, SyncerChangeEvent, TickEvent, WorldEvent, WorldEvents,
};
