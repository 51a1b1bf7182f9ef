use std::{mem, vec::IntoIter};

use meridian_shared::Tick;

use crate::{
    error::WorldError,
    request::{RemoteOutcome, RequestKey},
    resource::ResourceKey,
    sync::SyncerState,
    user::UserKey,
    world::ElementKey,
};

/// Typed queues of everything observable that happened on the server since
/// the last tick. Returned by `Server::advance_tick` and consumed with
/// `events.read::<SomeEvent>()`.
pub struct WorldEvents {
    ticks: Vec<Tick>,
    connections: Vec<UserKey>,
    disconnections: Vec<UserKey>,
    spawns: Vec<ElementKey>,
    despawns: Vec<ElementKey>,
    reparents: Vec<(ElementKey, ElementKey)>,
    attachments: Vec<(ElementKey, ElementKey)>,
    detachments: Vec<(ElementKey, ElementKey)>,
    syncer_changes: Vec<(ElementKey, SyncerState)>,
    resource_starts: Vec<ResourceKey>,
    resource_stops: Vec<ResourceKey>,
    remote_responses: Vec<(RequestKey, RemoteOutcome)>,
    errors: Vec<WorldError>,
    empty: bool,
}

impl WorldEvents {
    pub(crate) fn new() -> Self {
        Self {
            ticks: Vec::new(),
            connections: Vec::new(),
            disconnections: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
            reparents: Vec::new(),
            attachments: Vec::new(),
            detachments: Vec::new(),
            syncer_changes: Vec::new(),
            resource_starts: Vec::new(),
            resource_stops: Vec::new(),
            remote_responses: Vec::new(),
            errors: Vec::new(),
            empty: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: WorldEvent>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: WorldEvent>(&self) -> bool {
        V::has(self)
    }

    // Crate-internal push methods

    pub(crate) fn push_tick(&mut self, tick: Tick) {
        self.ticks.push(tick);
        self.empty = false;
    }

    pub(crate) fn push_connection(&mut self, user: UserKey) {
        self.connections.push(user);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, user: UserKey) {
        self.disconnections.push(user);
        self.empty = false;
    }

    pub(crate) fn push_spawn(&mut self, element: ElementKey) {
        self.spawns.push(element);
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, element: ElementKey) {
        self.despawns.push(element);
        self.empty = false;
    }

    pub(crate) fn push_reparent(&mut self, element: ElementKey, new_parent: ElementKey) {
        self.reparents.push((element, new_parent));
        self.empty = false;
    }

    pub(crate) fn push_attach(&mut self, child: ElementKey, target: ElementKey) {
        self.attachments.push((child, target));
        self.empty = false;
    }

    pub(crate) fn push_detach(&mut self, child: ElementKey, target: ElementKey) {
        self.detachments.push((child, target));
        self.empty = false;
    }

    pub(crate) fn push_syncer_change(&mut self, element: ElementKey, state: SyncerState) {
        self.syncer_changes.push((element, state));
        self.empty = false;
    }

    pub(crate) fn push_resource_start(&mut self, resource: ResourceKey) {
        self.resource_starts.push(resource);
        self.empty = false;
    }

    pub(crate) fn push_resource_stop(&mut self, resource: ResourceKey) {
        self.resource_stops.push(resource);
        self.empty = false;
    }

    pub(crate) fn push_remote_response(&mut self, request: RequestKey, outcome: RemoteOutcome) {
        self.remote_responses.push((request, outcome));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: WorldError) {
        self.errors.push(error);
        self.empty = false;
    }
}

/// One category of observable server happening. Implemented by marker types
/// so call sites read as `events.read::<SpawnElementEvent>()`.
pub trait WorldEvent {
    type Iter;

    fn iter(events: &mut WorldEvents) -> Self::Iter;

    fn has(events: &WorldEvents) -> bool;
}

// Tick Event
pub struct TickEvent;
impl WorldEvent for TickEvent {
    type Iter = IntoIter<Tick>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.ticks).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.ticks.is_empty()
    }
}

// Connect Event
pub struct ConnectEvent;
impl WorldEvent for ConnectEvent {
    type Iter = IntoIter<UserKey>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.connections).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.connections.is_empty()
    }
}

// Disconnect Event
pub struct DisconnectEvent;
impl WorldEvent for DisconnectEvent {
    type Iter = IntoIter<UserKey>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.disconnections).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.disconnections.is_empty()
    }
}

// Spawn Element Event
pub struct SpawnElementEvent;
impl WorldEvent for SpawnElementEvent {
    type Iter = IntoIter<ElementKey>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.spawns).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.spawns.is_empty()
    }
}

// Despawn Element Event
pub struct DespawnElementEvent;
impl WorldEvent for DespawnElementEvent {
    type Iter = IntoIter<ElementKey>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.despawns).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.despawns.is_empty()
    }
}

// Reparent Element Event
pub struct ReparentElementEvent;
impl WorldEvent for ReparentElementEvent {
    type Iter = IntoIter<(ElementKey, ElementKey)>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.reparents).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.reparents.is_empty()
    }
}

// Attach Event
pub struct AttachEvent;
impl WorldEvent for AttachEvent {
    type Iter = IntoIter<(ElementKey, ElementKey)>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.attachments).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.attachments.is_empty()
    }
}

// Detach Event
pub struct DetachEvent;
impl WorldEvent for DetachEvent {
    type Iter = IntoIter<(ElementKey, ElementKey)>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.detachments).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.detachments.is_empty()
    }
}

// Syncer Change Event
pub struct SyncerChangeEvent;
impl WorldEvent for SyncerChangeEvent {
    type Iter = IntoIter<(ElementKey, SyncerState)>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.syncer_changes).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.syncer_changes.is_empty()
    }
}

// Resource Start Event
pub struct ResourceStartEvent;
impl WorldEvent for ResourceStartEvent {
    type Iter = IntoIter<ResourceKey>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.resource_starts).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.resource_starts.is_empty()
    }
}

// Resource Stop Event
pub struct ResourceStopEvent;
impl WorldEvent for ResourceStopEvent {
    type Iter = IntoIter<ResourceKey>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.resource_stops).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.resource_stops.is_empty()
    }
}

// Remote Response Event
pub struct RemoteResponseEvent;
impl WorldEvent for RemoteResponseEvent {
    type Iter = IntoIter<(RequestKey, RemoteOutcome)>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.remote_responses).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.remote_responses.is_empty()
    }
}

// Error Event
pub struct ErrorEvent;
impl WorldEvent for ErrorEvent {
    type Iter = IntoIter<WorldError>;

    fn iter(events: &mut WorldEvents) -> Self::Iter {
        mem::take(&mut events.errors).into_iter()
    }

    fn has(events: &WorldEvents) -> bool {
        !events.errors.is_empty()
    }
}
