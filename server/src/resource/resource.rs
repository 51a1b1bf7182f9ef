use meridian_shared::BigMapKey;

use crate::world::ElementKey;

// The Resource Key

/// Handle to a loaded resource on the server.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ResourceKey(u64);

impl BigMapKey for ResourceKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        ResourceKey(value)
    }
}

/// Lifecycle state of a resource.
///
/// `Starting` and `Stopping` are only observable from inside handlers that
/// run during the transition; by the time a tick's events are handed back to
/// the caller the resource has settled into `Running` or `Loaded`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceState {
    /// Known to the server, not running. Also the state a stopped resource
    /// returns to.
    Loaded,
    /// Start transition in progress.
    Starting,
    Running,
    /// Stop transition in progress.
    Stopping,
    /// Load was attempted and rejected. The reason is kept on the resource.
    FailedToLoad,
}

impl std::fmt::Display for ResourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ResourceState::Loaded => "loaded",
            ResourceState::Starting => "starting",
            ResourceState::Running => "running",
            ResourceState::Stopping => "stopping",
            ResourceState::FailedToLoad => "failed to load",
        };
        write!(f, "{}", name)
    }
}

/// Which parts of a resource a start request brings up. Defaults to all of
/// them; partial starts are for tooling that reloads one facet in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StartFlags {
    pub config: bool,
    pub maps: bool,
    pub scripts: bool,
    pub html: bool,
    pub client_configs: bool,
    pub client_scripts: bool,
    pub client_files: bool,
}

impl Default for StartFlags {
    fn default() -> Self {
        Self {
            config: true,
            maps: true,
            scripts: true,
            html: true,
            client_configs: true,
            client_scripts: true,
            client_files: true,
        }
    }
}

/// An access right a resource has asked for. Granting is an admin decision
/// that happens out of band; until then the request sits pending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AclRequest {
    pub right: String,
    pub access: bool,
    pub pending: bool,
}

/// A unit of server content: scripts, maps, and the elements they own.
///
/// Every running resource gets two scaffold elements under the world root, a
/// map root for map-file content and a dynamic root that adopts elements the
/// resource creates at runtime. Both are torn down with the resource.
pub struct Resource {
    name: String,
    pub(crate) state: ResourceState,
    pub(crate) failure_reason: Option<String>,
    /// Survives stop requests issued as part of a server-wide shutdown.
    pub persistent: bool,
    pub(crate) flags: StartFlags,
    pub(crate) map_root: Option<ElementKey>,
    pub(crate) dynamic_root: Option<ElementKey>,
    pub(crate) acl_requests: Vec<AclRequest>,
}

impl Resource {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: ResourceState::Loaded,
            failure_reason: None,
            persistent: false,
            flags: StartFlags::default(),
            map_root: None,
            dynamic_root: None,
            acl_requests: Vec::new(),
        }
    }

    pub(crate) fn failed(name: &str, reason: &str) -> Self {
        let mut resource = Self::new(name);
        resource.state = ResourceState::FailedToLoad;
        resource.failure_reason = Some(reason.to_string());
        resource
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn flags(&self) -> StartFlags {
        self.flags
    }

    pub fn map_root(&self) -> Option<ElementKey> {
        self.map_root
    }

    pub fn dynamic_root(&self) -> Option<ElementKey> {
        self.dynamic_root
    }

    pub fn acl_requests(&self) -> &[AclRequest] {
        &self.acl_requests
    }

    /// Record an access-right request, or refresh an existing one. Returns
    /// whether the request is still pending afterwards.
    pub(crate) fn request_acl_right(&mut self, right: &str, access: bool) -> bool {
        if let Some(existing) = self
            .acl_requests
            .iter_mut()
            .find(|request| request.right == right)
        {
            existing.access = access;
            return existing.pending;
        }
        self.acl_requests.push(AclRequest {
            right: right.to_string(),
            access,
            pending: true,
        });
        true
    }
}

/// A lifecycle transition queued for the end of the current tick. Stops are
/// always queued so code running inside the current tick still sees the
/// resource's elements; a queued start only arises from a restart, where it
/// must run after the paired stop.
pub(crate) enum ResourceOp {
    Start {
        key: ResourceKey,
        persistent: bool,
        flags: StartFlags,
    },
    Stop(ResourceKey),
}
