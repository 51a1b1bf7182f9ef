use std::net::SocketAddr;

use glam::Vec3;

use meridian_shared::{Tick, Transform, Value};

use crate::{
    error::WorldError,
    events::{DispatchOutcome, EventContext, EventPriority, HandlerId, WorldEvents},
    request::{RequestKey, RequestOptions},
    resource::{Resource, ResourceKey, StartFlags},
    server::{main_server::MainServer, world_server::WorldServer},
    sync::{SyncerChoice, SyncerState},
    timer::TimerKey,
    world::{DestroyOutcome, ElementKey, ElementKind, ElementMut, ElementRef},
    ServerConfig, UserKey, UserMut, UserRef,
};

/// A game server that owns a single world: the element tree, the attachment
/// graph, syncer assignments, the event bus and the resources that populate
/// it. Drive it by mutating the world between ticks and calling
/// [`advance_tick`](Self::advance_tick) regularly.
pub struct Server {
    main_server: MainServer,
    world_server: WorldServer,
}

impl Server {
    /// Create a new Server
    pub fn new(server_config: ServerConfig) -> Self {
        Self {
            main_server: MainServer::new(),
            world_server: WorldServer::new(server_config),
        }
    }

    // Ticks

    /// Gets the current tick of the Server
    pub fn current_tick(&self) -> Tick {
        self.world_server.current_tick()
    }

    /// Advance the world by one tick: apply queued resource transitions,
    /// fire due timers, time out remote calls and run the syncer range pass.
    /// Returns everything observable that happened since the last call.
    pub fn advance_tick(&mut self) -> WorldEvents {
        self.world_server.advance_tick()
    }

    // Users

    /// Register a newly connected user and create the player element that
    /// represents them in the world.
    pub fn connect_user(&mut self, name: &str, address: SocketAddr) -> UserKey {
        let user_key = self.main_server.connect_user(name, address);
        self.world_server.user_connected(user_key, name);
        user_key
    }

    /// Remove a user: their player element is destroyed and every syncer
    /// assignment they held is dropped. Returns whether the key was live.
    pub fn disconnect_user(&mut self, user_key: &UserKey) -> bool {
        if self.main_server.disconnect_user(user_key).is_none() {
            return false;
        }
        self.world_server.user_disconnected(user_key);
        true
    }

    /// Returns whether or not a User exists for the given UserKey
    pub fn user_exists(&self, user_key: &UserKey) -> bool {
        self.main_server.user_exists(user_key)
    }

    /// Retrieves an UserRef that exposes read-only operations for the User
    /// associated with the given UserKey.
    /// Panics if the user does not exist.
    pub fn user(&self, user_key: &UserKey) -> UserRef {
        if self.user_exists(user_key) {
            return UserRef::new(&self.main_server, &self.world_server, user_key);
        }
        panic!("No User exists for given Key!");
    }

    /// Retrieves an UserMut that exposes read and write operations for the
    /// User associated with the given UserKey.
    /// Panics if the user does not exist.
    pub fn user_mut(&mut self, user_key: &UserKey) -> UserMut {
        if self.user_exists(user_key) {
            return UserMut::new(&mut self.main_server, &mut self.world_server, user_key);
        }
        panic!("No User exists for given Key!");
    }

    /// Return a list of all currently connected Users' keys
    pub fn user_keys(&self) -> Vec<UserKey> {
        self.main_server.user_keys()
    }

    /// Get the number of Users currently connected
    pub fn users_count(&self) -> usize {
        self.main_server.users_count()
    }

    // Elements

    /// The world root element.
    pub fn root(&self) -> ElementKey {
        self.world_server.root()
    }

    pub fn element_exists(&self, key: &ElementKey) -> bool {
        self.world_server.element_exists(key)
    }

    pub fn elements_count(&self) -> usize {
        self.world_server.elements_count()
    }

    /// Create a new element under the given parent and return its key.
    pub fn spawn_element(
        &mut self,
        kind: ElementKind,
        id: &str,
        parent: &ElementKey,
    ) -> Result<ElementKey, WorldError> {
        self.world_server.create_element(kind, id, parent)
    }

    /// Create a new element owned by a running resource, parented under the
    /// resource's dynamic root.
    pub fn spawn_element_in_resource(
        &mut self,
        resource_key: &ResourceKey,
        kind: ElementKind,
        id: &str,
    ) -> Result<ElementKey, WorldError> {
        self.world_server
            .create_element_in_resource(resource_key, kind, id)
    }

    /// Destroy an element and its subtree. Protected descendants (players,
    /// consoles) are rescued to root instead and reported in the outcome.
    pub fn destroy_element(&mut self, key: &ElementKey) -> Result<DestroyOutcome, WorldError> {
        self.world_server.destroy_element(key)
    }

    /// Retrieves an ElementRef that exposes read-only operations for the
    /// Element.
    /// Panics if the Element does not exist.
    pub fn element(&self, key: &ElementKey) -> ElementRef {
        if self.element_exists(key) {
            return ElementRef::new(&self.world_server, key);
        }
        panic!("No Element exists for given Key!");
    }

    /// Retrieves an ElementMut that exposes read and write operations for
    /// the Element.
    /// Panics if the Element does not exist.
    pub fn element_mut(&mut self, key: &ElementKey) -> ElementMut {
        if self.element_exists(key) {
            return ElementMut::new(&mut self.world_server, key);
        }
        panic!("No Element exists for given Key!");
    }

    pub fn set_element_parent(
        &mut self,
        key: &ElementKey,
        new_parent: &ElementKey,
    ) -> Result<(), WorldError> {
        self.world_server.set_element_parent(key, new_parent)
    }

    /// First element with the given script id, if any.
    pub fn find_element_by_id(&self, id: &str) -> Option<ElementKey> {
        self.world_server.find_element_by_id(id)
    }

    pub fn element_children(&self, key: &ElementKey) -> &[ElementKey] {
        self.world_server.element_children(key)
    }

    /// Effective world transform: follows the attachment chain when the
    /// element is attached.
    pub fn element_world_transform(&self, key: &ElementKey) -> Option<Transform> {
        self.world_server.element_world_transform(key)
    }

    // Attachments

    /// Attach `child` to `target` with the given offsets in `target`'s
    /// object space.
    pub fn attach_element(
        &mut self,
        child: &ElementKey,
        target: &ElementKey,
        pos_offset: Vec3,
        rot_offset: Vec3,
    ) -> Result<(), WorldError> {
        self.world_server
            .attach_element(child, target, pos_offset, rot_offset)
    }

    /// Detach `child`. When `target` is given, only an edge pointing at that
    /// element is removed.
    pub fn detach_element(
        &mut self,
        child: &ElementKey,
        target: Option<&ElementKey>,
    ) -> Result<(), WorldError> {
        self.world_server.detach_element(child, target)
    }

    // Sync

    pub fn element_syncer(&self, key: &ElementKey) -> Option<UserKey> {
        self.world_server.element_syncer(key)
    }

    pub fn element_syncer_state(&self, key: &ElementKey) -> Option<SyncerState> {
        self.world_server.element_syncer_state(key)
    }

    pub fn set_element_syncer(
        &mut self,
        key: &ElementKey,
        choice: SyncerChoice,
    ) -> Result<SyncerState, WorldError> {
        self.world_server.set_element_syncer(key, choice)
    }

    // Vehicle occupancy

    /// Put a ped (or player) into a vehicle seat, evicting whoever held the
    /// seat before.
    pub fn warp_ped_into_vehicle(
        &mut self,
        ped: &ElementKey,
        vehicle: &ElementKey,
        seat: u8,
    ) -> Result<(), WorldError> {
        self.world_server.warp_ped_into_vehicle(ped, vehicle, seat)
    }

    /// Take a ped out of its vehicle. The last player out becomes the
    /// vehicle's syncer.
    pub fn remove_ped_from_vehicle(&mut self, ped: &ElementKey) -> Result<(), WorldError> {
        self.world_server.remove_ped_from_vehicle(ped)
    }

    // Events

    /// Register a handler for a named event, anchored on an element. The
    /// returned id can be used to remove it later.
    pub fn add_event_handler(
        &mut self,
        name: &str,
        anchor: &ElementKey,
        priority: EventPriority,
        propagated: bool,
        func: impl FnMut(&mut EventContext) + 'static,
    ) -> Result<HandlerId, WorldError> {
        self.world_server
            .add_event_handler(name, anchor, priority, propagated, func)
    }

    pub fn remove_event_handler(&mut self, id: HandlerId) -> bool {
        self.world_server.remove_event_handler(id)
    }

    /// Fire a named event on an element and run every eligible handler.
    pub fn trigger_event(
        &mut self,
        name: &str,
        source: &ElementKey,
        args: Vec<Value>,
    ) -> Result<DispatchOutcome, WorldError> {
        self.world_server.trigger_event(name, source, args)
    }

    // Timers

    /// Schedule a named event to fire on `anchor` every `interval` ticks,
    /// `repeats` times (`None` for forever).
    pub fn set_timer(
        &mut self,
        event_name: &str,
        anchor: &ElementKey,
        interval: u64,
        repeats: Option<u32>,
        args: Vec<Value>,
    ) -> Result<TimerKey, WorldError> {
        self.world_server
            .set_timer(event_name, anchor, interval, repeats, args)
    }

    pub fn kill_timer(&mut self, key: &TimerKey) -> bool {
        self.world_server.kill_timer(key)
    }

    // Remote requests

    /// Begin a remote call. The outcome arrives through the event queues as
    /// a [`RemoteResponseEvent`](crate::RemoteResponseEvent).
    pub fn start_remote_request(
        &mut self,
        target: &str,
        options: Option<RequestOptions>,
    ) -> RequestKey {
        self.world_server.start_remote_request(target, options)
    }

    pub fn abort_remote_request(&mut self, key: &RequestKey) -> bool {
        self.world_server.abort_remote_request(key)
    }

    pub fn remote_request_pending(&self, key: &RequestKey) -> bool {
        self.world_server.remote_request_pending(key)
    }

    /// Feed a remote response back in, as the transport layer would.
    pub fn complete_remote_request(&mut self, key: &RequestKey, value: Value) -> bool {
        self.world_server.complete_remote_request(key, value)
    }

    pub fn fail_remote_request(&mut self, key: &RequestKey, reason: &str) -> bool {
        self.world_server.fail_remote_request(key, reason)
    }

    // Resources

    /// Register a resource by name. A bad or duplicate name produces a
    /// resource parked in `FailedToLoad` with the reason recorded on it.
    pub fn load_resource(&mut self, name: &str) -> ResourceKey {
        self.world_server.load_resource(name)
    }

    pub fn resource(&self, key: &ResourceKey) -> Option<&Resource> {
        self.world_server.resource(key)
    }

    /// Key of the loaded (non-failed) resource with the given name.
    pub fn find_resource(&self, name: &str) -> Option<ResourceKey> {
        self.world_server.find_resource(name)
    }

    pub fn resource_keys(&self) -> Vec<ResourceKey> {
        self.world_server.resource_keys()
    }

    /// Start a resource: its map and dynamic roots exist when the call
    /// returns.
    pub fn start_resource(
        &mut self,
        key: &ResourceKey,
        persistent: bool,
        flags: StartFlags,
    ) -> Result<(), WorldError> {
        self.world_server.start_resource(key, persistent, flags)
    }

    /// Queue a resource stop for the end of the current tick. The resource's
    /// elements stay in the world until the tick is advanced.
    pub fn stop_resource(&mut self, key: &ResourceKey) -> Result<(), WorldError> {
        self.world_server.stop_resource(key)
    }

    /// Queue a stop followed by a start, in that order.
    pub fn restart_resource(&mut self, key: &ResourceKey) -> Result<(), WorldError> {
        self.world_server.restart_resource(key)
    }

    /// Record an access-right request for a resource. Returns whether the
    /// request is pending an admin decision.
    pub fn request_acl_right(
        &mut self,
        key: &ResourceKey,
        right: &str,
        access: bool,
    ) -> Result<bool, WorldError> {
        self.world_server.request_acl_right(key, right, access)
    }
}
