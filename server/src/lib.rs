//! # Meridian Server
//! A game world server built around a single-rooted element tree: elements
//! can follow each other through attachments, hand their simulation to
//! connected players through syncer assignment, react to named events on a
//! propagating bus, and live under the resources that brought them into the
//! world.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

pub mod shared {
    pub use meridian_shared::{
        is_valid_data_key, resolve_attachment, BigMap, BigMapKey, KeyGenerator, Tick, Transform,
        Value, MAX_DATA_KEY_LEN,
    };
}

mod error;
mod events;
mod request;
mod resource;
mod server;
mod sync;
mod time_manager;
mod timer;
mod user;
mod world;

pub use error::WorldError;
pub use events::{
    AttachEvent, ConnectEvent, DespawnElementEvent, DetachEvent, DisconnectEvent, DispatchOutcome,
    ErrorEvent, EventContext, EventPriority, HandlerId, RemoteResponseEvent, ReparentElementEvent,
    ResourceStartEvent, ResourceStopEvent, SpawnElementEvent, SyncerChangeEvent, TickEvent,
    WorldEvent, WorldEvents,
};
pub use request::{RemoteOutcome, RequestKey, RequestOptions};
pub use resource::{AclRequest, Resource, ResourceKey, ResourceState, StartFlags};
pub use server::{Server, ServerConfig};
pub use sync::{SyncerChoice, SyncerState};
pub use timer::TimerKey;
pub use user::{
    MainUser, MainUserMut, MainUserRef, UserKey, UserMut, UserRef, WorldUser, WorldUserMut,
    WorldUserRef,
};
pub use world::{
    Attachment, DestroyOutcome, Element, ElementKey, ElementKind, ElementMut, ElementRef,
    MarkerData, PedData, VehicleData, Visibility,
};
