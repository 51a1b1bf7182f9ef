use std::{
    collections::{HashMap, HashSet, VecDeque},
    mem,
};

use glam::Vec3;
use log::{info, warn};

use meridian_shared::{BigMap, Tick, Transform, Value};

use crate::{
    error::WorldError,
    events::{EventBus, EventContext, EventPriority, HandlerId, WorldEvents},
    request::{RequestKey, RequestManager, RequestOptions},
    resource::{Resource, ResourceKey, ResourceOp, ResourceState, StartFlags},
    sync::{SyncerChoice, SyncerMap, SyncerState},
    time_manager::TimeManager,
    timer::{TimerKey, TimerSet},
    user::{UserKey, WorldUser},
    world::{DestroyOutcome, Element, ElementKey, ElementKind, ElementTree},
    ServerConfig,
};

fn is_valid_resource_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// World-side half of the server: the element tree and everything layered
/// over it. The connection-side half in [`super::MainServer`] only knows who
/// is connected.
pub struct WorldServer {
    server_config: ServerConfig,
    // World
    tree: ElementTree,
    attachments: crate::world::AttachmentGraph,
    syncers: SyncerMap,
    bus: EventBus,
    // Users
    users: HashMap<UserKey, WorldUser>,
    // Resources
    resources: BigMap<ResourceKey, Resource>,
    resource_ops: VecDeque<ResourceOp>,
    // Scheduling
    timers: TimerSet,
    requests: RequestManager,
    time_manager: TimeManager,
    // Events
    incoming_events: WorldEvents,
}

impl WorldServer {
    pub fn new(server_config: ServerConfig) -> Self {
        Self {
            server_config,
            tree: ElementTree::new(),
            attachments: crate::world::AttachmentGraph::new(),
            syncers: SyncerMap::new(),
            bus: EventBus::new(),
            users: HashMap::new(),
            resources: BigMap::new(),
            resource_ops: VecDeque::new(),
            timers: TimerSet::new(),
            requests: RequestManager::new(),
            time_manager: TimeManager::new(),
            incoming_events: WorldEvents::new(),
        }
    }

    // Ticks

    pub fn current_tick(&self) -> Tick {
        self.time_manager.current_tick()
    }

    /// Advance the logical clock by one tick and run everything scheduled on
    /// it: queued resource transitions, due timers, remote call timeouts and
    /// the syncer range pass. Returns the batch of events produced since the
    /// last call.
    pub fn advance_tick(&mut self) -> WorldEvents {
        let tick = self.time_manager.advance();
        self.incoming_events.push_tick(tick);

        // resource transitions queued since the last tick, oldest first
        let ops: Vec<ResourceOp> = self.resource_ops.drain(..).collect();
        for op in ops {
            match op {
                ResourceOp::Start {
                    key,
                    persistent,
                    flags,
                } => self.apply_resource_start(key, persistent, flags),
                ResourceOp::Stop(key) => self.apply_resource_stop(key),
            }
        }

        for (name, anchor, args) in self.timers.due(tick) {
            // the anchor may have been destroyed since the timer fired last
            if !self.tree.contains(&anchor) {
                continue;
            }
            self.bus.dispatch(&name, anchor, args, &self.tree);
        }

        self.requests.tick(&mut self.incoming_events);

        self.run_syncer_pass();

        mem::replace(&mut self.incoming_events, WorldEvents::new())
    }

    // Elements

    pub fn root(&self) -> ElementKey {
        self.tree.root()
    }

    pub fn element_exists(&self, key: &ElementKey) -> bool {
        self.tree.contains(key)
    }

    pub fn elements_count(&self) -> usize {
        self.tree.len()
    }

    pub(crate) fn get_element(&self, key: &ElementKey) -> Option<&Element> {
        self.tree.get(key)
    }

    pub(crate) fn get_element_mut(&mut self, key: &ElementKey) -> Option<&mut Element> {
        self.tree.get_mut(key)
    }

    pub(crate) fn tree(&self) -> &ElementTree {
        &self.tree
    }

    pub(crate) fn attachments(&self) -> &crate::world::AttachmentGraph {
        &self.attachments
    }

    pub fn create_element(
        &mut self,
        kind: ElementKind,
        id: &str,
        parent: &ElementKey,
    ) -> Result<ElementKey, WorldError> {
        if kind == ElementKind::Player {
            // player elements exist only as the world half of a connection
            return Err(WorldError::Protected);
        }
        let key = self.tree.create(kind.clone(), id, *parent, None)?;
        if kind.is_syncable() {
            self.syncers.register(key);
        }
        self.incoming_events.push_spawn(key);
        Ok(key)
    }

    /// Create an element owned by a running resource, parented under its
    /// dynamic root.
    pub fn create_element_in_resource(
        &mut self,
        resource_key: &ResourceKey,
        kind: ElementKind,
        id: &str,
    ) -> Result<ElementKey, WorldError> {
        let resource = self
            .resources
            .get(resource_key)
            .ok_or(WorldError::NoSuchResource)?;
        let parent = resource
            .dynamic_root()
            .ok_or(WorldError::InvalidState(resource.state()))?;
        self.create_element(kind, id, &parent)
    }

    pub fn destroy_element(&mut self, key: &ElementKey) -> Result<DestroyOutcome, WorldError> {
        let outcome = self.tree.destroy(*key)?;
        self.cleanup_destroyed(&outcome);
        Ok(outcome)
    }

    pub fn set_element_parent(
        &mut self,
        key: &ElementKey,
        new_parent: &ElementKey,
    ) -> Result<(), WorldError> {
        self.tree.set_parent(*key, *new_parent)?;
        self.incoming_events.push_reparent(*key, *new_parent);
        Ok(())
    }

    pub fn find_element_by_id(&self, id: &str) -> Option<ElementKey> {
        self.tree.find_by_id(id)
    }

    pub fn element_children(&self, key: &ElementKey) -> &[ElementKey] {
        self.tree.children(key)
    }

    pub fn element_world_transform(&self, key: &ElementKey) -> Option<Transform> {
        self.attachments.world_transform(key, &self.tree)
    }

    // Attachments

    pub fn attach_element(
        &mut self,
        child: &ElementKey,
        target: &ElementKey,
        pos_offset: Vec3,
        rot_offset: Vec3,
    ) -> Result<(), WorldError> {
        self.attachments
            .attach(*child, *target, pos_offset, rot_offset, &self.tree)?;
        self.incoming_events.push_attach(*child, *target);
        Ok(())
    }

    pub fn detach_element(
        &mut self,
        child: &ElementKey,
        target: Option<&ElementKey>,
    ) -> Result<(), WorldError> {
        let attached_to = self
            .attachments
            .attached_to(child)
            .map(|attachment| attachment.target);
        self.attachments.detach(*child, target.copied())?;
        if let Some(former_target) = attached_to {
            self.incoming_events.push_detach(*child, former_target);
        }
        Ok(())
    }

    // Sync

    pub fn element_syncer(&self, key: &ElementKey) -> Option<UserKey> {
        self.syncers.syncer_of(key)
    }

    pub fn element_syncer_state(&self, key: &ElementKey) -> Option<SyncerState> {
        self.syncers.state(key)
    }

    pub fn set_element_syncer(
        &mut self,
        key: &ElementKey,
        choice: SyncerChoice,
    ) -> Result<SyncerState, WorldError> {
        let element = self.tree.get(key).ok_or(WorldError::NotFound)?;
        if !element.kind().is_syncable() {
            return Err(WorldError::NotSyncable);
        }
        if let SyncerChoice::User(user) = choice {
            if !self.users.contains_key(&user) {
                return Err(WorldError::NoSuchUser);
            }
        }
        let state = self
            .syncers
            .set(*key, choice)
            .ok_or(WorldError::NotSyncable)?;
        self.incoming_events.push_syncer_change(*key, state);
        Ok(state)
    }

    fn run_syncer_pass(&mut self) {
        let mut elements: Vec<(ElementKey, Vec3, f32)> = Vec::new();
        for (key, element) in self.tree.iter() {
            let range = match element.kind() {
                ElementKind::Vehicle => self.server_config.vehicle_sync_range,
                // peds riding in a vehicle are covered by its syncer
                ElementKind::Ped => match element.as_ped() {
                    Some(ped) if ped.vehicle.is_some() => continue,
                    _ => self.server_config.ped_sync_range,
                },
                _ => continue,
            };
            let Some(transform) = self.attachments.world_transform(&key, &self.tree) else {
                continue;
            };
            elements.push((key, transform.position, range));
        }

        let mut user_positions: Vec<(UserKey, Vec3)> = Vec::new();
        for (user_key, world_user) in &self.users {
            if let Some(element) = self.tree.get(&world_user.element()) {
                user_positions.push((*user_key, element.transform.position));
            }
        }

        for (element, state) in self.syncers.range_pass(&elements, &user_positions) {
            self.incoming_events.push_syncer_change(element, state);
        }
    }

    // Vehicle occupancy

    /// Put a ped (or player) into a vehicle seat, evicting whoever held the
    /// seat before.
    pub fn warp_ped_into_vehicle(
        &mut self,
        ped_key: &ElementKey,
        vehicle_key: &ElementKey,
        seat: u8,
    ) -> Result<(), WorldError> {
        if !self.tree.contains(ped_key) || !self.tree.contains(vehicle_key) {
            return Err(WorldError::NotFound);
        }
        let is_ped = self
            .tree
            .get(ped_key)
            .is_some_and(|element| element.as_ped().is_some());
        let is_vehicle = self
            .tree
            .get(vehicle_key)
            .is_some_and(|element| element.as_vehicle().is_some());
        if !is_ped || !is_vehicle {
            return Err(WorldError::IncompatibleTypes);
        }

        // leave the current vehicle first, so occupancy stays consistent
        if self
            .tree
            .get(ped_key)
            .and_then(|element| element.as_ped())
            .is_some_and(|ped| ped.vehicle.is_some())
        {
            self.remove_ped_from_vehicle(ped_key)?;
        }

        let evicted = self
            .tree
            .get_mut(vehicle_key)
            .and_then(|element| element.as_vehicle_mut())
            .and_then(|vehicle| vehicle.occupants.insert(seat, *ped_key));
        if let Some(evicted) = evicted {
            if let Some(ped) = self
                .tree
                .get_mut(&evicted)
                .and_then(|element| element.as_ped_mut())
            {
                ped.vehicle = None;
                ped.seat = 0;
            }
        }

        if let Some(ped) = self
            .tree
            .get_mut(ped_key)
            .and_then(|element| element.as_ped_mut())
        {
            ped.vehicle = Some(*vehicle_key);
            ped.seat = seat;
        }
        Ok(())
    }

    /// Take a ped out of its vehicle. When the last occupant leaving is a
    /// player, that player becomes the vehicle's syncer regardless of any
    /// explicit assignment.
    pub fn remove_ped_from_vehicle(&mut self, ped_key: &ElementKey) -> Result<(), WorldError> {
        let vehicle_key = self
            .tree
            .get(ped_key)
            .ok_or(WorldError::NotFound)?
            .as_ped()
            .ok_or(WorldError::IncompatibleTypes)?
            .vehicle
            .ok_or(WorldError::NotFound)?;

        if let Some(ped) = self
            .tree
            .get_mut(ped_key)
            .and_then(|element| element.as_ped_mut())
        {
            ped.vehicle = None;
            ped.seat = 0;
        }

        let now_empty = match self
            .tree
            .get_mut(&vehicle_key)
            .and_then(|element| element.as_vehicle_mut())
        {
            Some(vehicle) => {
                vehicle.occupants.retain(|_, occupant| occupant != ped_key);
                vehicle.occupants.is_empty()
            }
            None => false,
        };

        if now_empty {
            let exiting_user = self.tree.get(ped_key).and_then(|element| element.user());
            if let Some(user) = exiting_user {
                if let Some(state) = self.syncers.assign_auto(vehicle_key, user) {
                    self.incoming_events.push_syncer_change(vehicle_key, state);
                }
            }
        }
        Ok(())
    }

    // Events

    pub fn add_event_handler(
        &mut self,
        name: &str,
        anchor: &ElementKey,
        priority: EventPriority,
        propagated: bool,
        func: impl FnMut(&mut EventContext) + 'static,
    ) -> Result<HandlerId, WorldError> {
        if !self.tree.contains(anchor) {
            return Err(WorldError::NotFound);
        }
        Ok(self
            .bus
            .add_handler(name, *anchor, priority, propagated, Box::new(func)))
    }

    pub fn remove_event_handler(&mut self, id: HandlerId) -> bool {
        self.bus.remove_handler(id)
    }

    pub fn trigger_event(
        &mut self,
        name: &str,
        source: &ElementKey,
        args: Vec<Value>,
    ) -> Result<crate::events::DispatchOutcome, WorldError> {
        if !self.tree.contains(source) {
            return Err(WorldError::NotFound);
        }
        Ok(self.bus.dispatch(name, *source, args, &self.tree))
    }

    // Timers

    pub fn set_timer(
        &mut self,
        event_name: &str,
        anchor: &ElementKey,
        interval: u64,
        repeats: Option<u32>,
        args: Vec<Value>,
    ) -> Result<TimerKey, WorldError> {
        if !self.tree.contains(anchor) {
            return Err(WorldError::NotFound);
        }
        Ok(self.timers.set_timer(
            event_name,
            *anchor,
            interval,
            repeats,
            args,
            self.time_manager.current_tick(),
        ))
    }

    pub fn kill_timer(&mut self, key: &TimerKey) -> bool {
        self.timers.kill(key)
    }

    // Remote requests

    pub fn start_remote_request(
        &mut self,
        target: &str,
        options: Option<RequestOptions>,
    ) -> RequestKey {
        let options = options.unwrap_or(self.server_config.request_options);
        self.requests.queue(target, options)
    }

    pub fn abort_remote_request(&mut self, key: &RequestKey) -> bool {
        self.requests.abort(key)
    }

    pub fn remote_request_pending(&self, key: &RequestKey) -> bool {
        self.requests.is_pending(key)
    }

    /// Feed a remote response back in, as the transport layer would.
    pub fn complete_remote_request(&mut self, key: &RequestKey, value: Value) -> bool {
        self.requests.complete(key, value)
    }

    pub fn fail_remote_request(&mut self, key: &RequestKey, reason: &str) -> bool {
        self.requests.fail(key, reason)
    }

    // Resources

    /// Register a resource by name. Registration never fails outright: a bad
    /// or duplicate name produces a resource parked in `FailedToLoad` with
    /// the reason recorded on it.
    pub fn load_resource(&mut self, name: &str) -> ResourceKey {
        if !is_valid_resource_name(name) {
            warn!("resource name {:?} is invalid", name);
            self.incoming_events
                .push_error(WorldError::InvalidName(name.to_string()));
            return self.resources.insert(Resource::failed(name, "invalid resource name"));
        }
        if self.find_resource(name).is_some() {
            warn!("resource {:?} is already loaded", name);
            self.incoming_events
                .push_error(WorldError::InvalidName(name.to_string()));
            return self
                .resources
                .insert(Resource::failed(name, "duplicate resource name"));
        }
        info!("resource {} loaded", name);
        self.resources.insert(Resource::new(name))
    }

    pub fn resource(&self, key: &ResourceKey) -> Option<&Resource> {
        self.resources.get(key)
    }

    pub fn find_resource(&self, name: &str) -> Option<ResourceKey> {
        self.resources
            .iter()
            .find(|(_, resource)| {
                resource.name() == name && resource.state() != ResourceState::FailedToLoad
            })
            .map(|(key, _)| key)
    }

    pub fn resource_keys(&self) -> Vec<ResourceKey> {
        self.resources.keys().collect()
    }

    /// Start a resource within the call: Loaded -> Starting -> Running, with
    /// its scaffold roots created under the world root.
    pub fn start_resource(
        &mut self,
        key: &ResourceKey,
        persistent: bool,
        flags: StartFlags,
    ) -> Result<(), WorldError> {
        let resource = self
            .resources
            .get_mut(key)
            .ok_or(WorldError::NoSuchResource)?;
        if resource.state != ResourceState::Loaded {
            return Err(WorldError::InvalidState(resource.state));
        }
        resource.state = ResourceState::Starting;
        self.apply_resource_start(*key, persistent, flags);
        Ok(())
    }

    /// Queue a resource stop for the end of the current tick. The resource's
    /// elements stay in the world until the tick is advanced.
    pub fn stop_resource(&mut self, key: &ResourceKey) -> Result<(), WorldError> {
        let resource = self
            .resources
            .get_mut(key)
            .ok_or(WorldError::NoSuchResource)?;
        if resource.state != ResourceState::Running {
            return Err(WorldError::InvalidState(resource.state));
        }
        resource.state = ResourceState::Stopping;
        self.resource_ops.push_back(ResourceOp::Stop(*key));
        Ok(())
    }

    /// Queue a stop followed by a start, in that order, for the end of the
    /// current tick.
    pub fn restart_resource(&mut self, key: &ResourceKey) -> Result<(), WorldError> {
        let resource = self
            .resources
            .get_mut(key)
            .ok_or(WorldError::NoSuchResource)?;
        if resource.state != ResourceState::Running {
            return Err(WorldError::InvalidState(resource.state));
        }
        let persistent = resource.persistent;
        let flags = resource.flags;
        resource.state = ResourceState::Stopping;
        self.resource_ops.push_back(ResourceOp::Stop(*key));
        self.resource_ops.push_back(ResourceOp::Start {
            key: *key,
            persistent,
            flags,
        });
        Ok(())
    }

    /// Record an access-right request for a resource. Returns whether the
    /// request is pending an admin decision.
    pub fn request_acl_right(
        &mut self,
        key: &ResourceKey,
        right: &str,
        access: bool,
    ) -> Result<bool, WorldError> {
        let resource = self
            .resources
            .get_mut(key)
            .ok_or(WorldError::NoSuchResource)?;
        Ok(resource.request_acl_right(right, access))
    }

    fn apply_resource_start(&mut self, key: ResourceKey, persistent: bool, flags: StartFlags) {
        let Some(resource) = self.resources.get(&key) else {
            return;
        };
        if !matches!(
            resource.state(),
            ResourceState::Starting | ResourceState::Loaded
        ) {
            return;
        }
        let name = resource.name().to_string();
        let root = self.tree.root();

        let map_root = match self
            .tree
            .create(ElementKind::MapRoot, &format!("{}:map", name), root, None)
        {
            Ok(key) => key,
            Err(err) => {
                warn!("resource {} failed to start: {}", name, err);
                return;
            }
        };
        let dynamic_root = match self.tree.create(
            ElementKind::DynamicRoot,
            &format!("{}:dynamic", name),
            root,
            None,
        ) {
            Ok(key) => key,
            Err(err) => {
                warn!("resource {} failed to start: {}", name, err);
                return;
            }
        };

        if let Some(resource) = self.resources.get_mut(&key) {
            resource.state = ResourceState::Running;
            resource.persistent = persistent;
            resource.flags = flags;
            resource.map_root = Some(map_root);
            resource.dynamic_root = Some(dynamic_root);
        }

        info!("resource {} started", name);
        self.incoming_events.push_spawn(map_root);
        self.incoming_events.push_spawn(dynamic_root);
        self.incoming_events.push_resource_start(key);
        self.bus.dispatch(
            "on_resource_start",
            map_root,
            vec![Value::from(name.as_str())],
            &self.tree,
        );
    }

    fn apply_resource_stop(&mut self, key: ResourceKey) {
        let Some(resource) = self.resources.get(&key) else {
            return;
        };
        if resource.state() != ResourceState::Stopping {
            return;
        }
        let name = resource.name().to_string();
        let map_root = resource.map_root;
        let dynamic_root = resource.dynamic_root;

        // fired while the resource's elements are still in the world
        if let Some(map_root) = map_root {
            self.bus.dispatch(
                "on_resource_stop",
                map_root,
                vec![Value::from(name.as_str())],
                &self.tree,
            );
        }

        for scaffold in [map_root, dynamic_root].into_iter().flatten() {
            let outcome = self.tree.destroy_subtree(scaffold);
            self.cleanup_destroyed(&outcome);
        }

        if let Some(resource) = self.resources.get_mut(&key) {
            resource.state = ResourceState::Loaded;
            resource.map_root = None;
            resource.dynamic_root = None;
        }
        info!("resource {} stopped", name);
        self.incoming_events.push_resource_stop(key);
    }

    // Users

    pub(crate) fn user_connected(&mut self, user_key: UserKey, name: &str) -> Option<ElementKey> {
        let root = self.tree.root();
        let element = match self
            .tree
            .create(ElementKind::Player, name, root, Some(user_key))
        {
            Ok(element) => element,
            Err(err) => {
                warn!("could not create player element for {}: {}", name, err);
                return None;
            }
        };
        self.users.insert(user_key, WorldUser::new(element));
        self.incoming_events.push_spawn(element);
        self.incoming_events.push_connection(user_key);
        Some(element)
    }

    pub(crate) fn user_disconnected(&mut self, user_key: &UserKey) {
        let Some(world_user) = self.users.remove(user_key) else {
            return;
        };
        let outcome = self.tree.destroy_subtree(world_user.element());
        self.cleanup_destroyed(&outcome);

        for element in self.syncers.clear_user(user_key) {
            self.incoming_events
                .push_syncer_change(element, SyncerState::Unassigned { pinned: false });
        }
        for (_, element) in self.tree.iter_mut() {
            element.forget_user(user_key);
        }
        self.incoming_events.push_disconnection(*user_key);
    }

    pub(crate) fn user_element(&self, user_key: &UserKey) -> Option<ElementKey> {
        self.users.get(user_key).map(|user| user.element())
    }

    // Cleanup shared by every path that removes elements from the tree.
    fn cleanup_destroyed(&mut self, outcome: &DestroyOutcome) {
        let destroyed: HashSet<ElementKey> = outcome.destroyed.iter().copied().collect();
        for key in &outcome.destroyed {
            self.attachments.sever_all(*key);
            self.syncers.deregister(key);
            self.bus.remove_anchored(key);
            self.timers.kill_anchored(key);
            self.incoming_events.push_despawn(*key);
        }
        for key in &outcome.rescued {
            self.incoming_events.push_reparent(*key, self.tree.root());
        }
        // occupancy references into the destroyed set are now dangling
        for (_, element) in self.tree.iter_mut() {
            if let Some(ped) = element.as_ped_mut() {
                if ped.vehicle.is_some_and(|vehicle| destroyed.contains(&vehicle)) {
                    ped.vehicle = None;
                    ped.seat = 0;
                }
            }
            if let Some(vehicle) = element.as_vehicle_mut() {
                vehicle
                    .occupants
                    .retain(|_, occupant| !destroyed.contains(occupant));
            }
        }
    }
}
