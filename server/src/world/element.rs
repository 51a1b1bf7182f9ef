use std::collections::{HashMap, HashSet};

use meridian_shared::{is_valid_data_key, BigMapKey, Transform, Value};

use crate::{error::WorldError, user::UserKey, world::element_kind::ElementKind};

// ElementKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct ElementKey(u64);

impl ElementKey {
    /// Raw value, as embedded in [`Value::Element`].
    pub fn to_raw(&self) -> u64 {
        self.0
    }
}

impl BigMapKey for ElementKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        ElementKey(value)
    }
}

/// Ped state shared by peds and players.
#[derive(Clone, Debug, Default)]
pub struct PedData {
    pub vehicle: Option<ElementKey>,
    pub seat: u8,
}

/// Vehicle state: seat index to occupant element.
#[derive(Clone, Debug, Default)]
pub struct VehicleData {
    pub occupants: HashMap<u8, ElementKey>,
}

#[derive(Clone, Debug)]
pub struct MarkerData {
    pub size: f32,
    pub color: [u8; 4],
}

impl Default for MarkerData {
    fn default() -> Self {
        Self {
            size: 4.0,
            color: [0, 0, 255, 255],
        }
    }
}

/// Kind-specific payload. This is a capability-tagged variant, not an
/// inheritance hierarchy: a `Player` is a ped with a user attached, and
/// `as_ped` works on both.
#[derive(Clone, Debug)]
pub enum ElementData {
    None,
    Ped(PedData),
    Player { ped: PedData, user: UserKey },
    Vehicle(VehicleData),
    Marker(MarkerData),
}

impl ElementData {
    pub(crate) fn for_kind(kind: &ElementKind, user: Option<UserKey>) -> Self {
        match kind {
            ElementKind::Ped => ElementData::Ped(PedData::default()),
            ElementKind::Player => ElementData::Player {
                ped: PedData::default(),
                user: user.expect("player elements require a user"),
            },
            ElementKind::Vehicle => ElementData::Vehicle(VehicleData::default()),
            ElementKind::Marker => ElementData::Marker(MarkerData::default()),
            _ => ElementData::None,
        }
    }
}

/// Per-element visibility override. `Everyone` is the default; the first
/// `set_visible_to(user, true)` call switches the element to a subscriber
/// set.
#[derive(Clone, Debug, Default)]
pub enum Visibility {
    #[default]
    Everyone,
    Restricted(HashSet<UserKey>),
}

/// A node in the element tree. Structural relationships (parent/children) are
/// only ever mutated through [`ElementTree`](crate::world::ElementTree), which
/// maintains the tree invariants.
#[derive(Clone, Debug)]
pub struct Element {
    id: String,
    kind: ElementKind,
    pub(crate) parent: Option<ElementKey>,
    pub(crate) children: Vec<ElementKey>,
    data_bag: HashMap<String, Value>,
    payload: ElementData,
    visibility: Visibility,

    pub transform: Transform,
    pub dimension: u16,
    pub interior: u8,
    pub frozen: bool,
    pub collidable: bool,
    pub double_sided: bool,
    pub call_propagation_enabled: bool,
    pub alpha: u8,
    pub health: f32,
    pub model: u16,
}

impl Element {
    pub(crate) fn new(kind: ElementKind, id: &str, user: Option<UserKey>) -> Self {
        let payload = ElementData::for_kind(&kind, user);
        Self {
            id: id.to_string(),
            kind,
            parent: None,
            children: Vec::new(),
            data_bag: HashMap::new(),
            payload,
            visibility: Visibility::Everyone,
            transform: Transform::default(),
            dimension: 0,
            interior: 0,
            frozen: false,
            collidable: true,
            double_sided: false,
            call_propagation_enabled: true,
            alpha: 255,
            health: 100.0,
            model: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: &str) {
        self.id = id.to_string();
    }

    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<ElementKey> {
        self.parent
    }

    pub fn children(&self) -> &[ElementKey] {
        &self.children
    }

    // Data bag

    pub fn set_data(&mut self, key: &str, value: Value) -> Result<(), WorldError> {
        if !is_valid_data_key(key) {
            return Err(WorldError::InvalidDataKey);
        }
        self.data_bag.insert(key.to_string(), value);
        Ok(())
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data_bag.get(key)
    }

    pub fn remove_data(&mut self, key: &str) -> Option<Value> {
        self.data_bag.remove(key)
    }

    // Capability accessors

    pub fn as_ped(&self) -> Option<&PedData> {
        match &self.payload {
            ElementData::Ped(ped) => Some(ped),
            ElementData::Player { ped, .. } => Some(ped),
            _ => None,
        }
    }

    pub fn as_ped_mut(&mut self) -> Option<&mut PedData> {
        match &mut self.payload {
            ElementData::Ped(ped) => Some(ped),
            ElementData::Player { ped, .. } => Some(ped),
            _ => None,
        }
    }

    pub fn as_vehicle(&self) -> Option<&VehicleData> {
        match &self.payload {
            ElementData::Vehicle(vehicle) => Some(vehicle),
            _ => None,
        }
    }

    pub fn as_vehicle_mut(&mut self) -> Option<&mut VehicleData> {
        match &mut self.payload {
            ElementData::Vehicle(vehicle) => Some(vehicle),
            _ => None,
        }
    }

    pub fn as_marker(&self) -> Option<&MarkerData> {
        match &self.payload {
            ElementData::Marker(marker) => Some(marker),
            _ => None,
        }
    }

    /// For player elements, the user this element belongs to.
    pub fn user(&self) -> Option<UserKey> {
        match &self.payload {
            ElementData::Player { user, .. } => Some(*user),
            _ => None,
        }
    }

    // Visibility

    pub fn set_visible_to(&mut self, user: UserKey, visible: bool) {
        match (&mut self.visibility, visible) {
            (Visibility::Everyone, true) => {
                let mut subscribers = HashSet::new();
                subscribers.insert(user);
                self.visibility = Visibility::Restricted(subscribers);
            }
            (Visibility::Everyone, false) => {
                self.visibility = Visibility::Restricted(HashSet::new());
            }
            (Visibility::Restricted(subscribers), true) => {
                subscribers.insert(user);
            }
            (Visibility::Restricted(subscribers), false) => {
                subscribers.remove(&user);
            }
        }
    }

    /// Drop any per-user override, making the element visible to everyone.
    pub fn clear_visible_to(&mut self) {
        self.visibility = Visibility::Everyone;
    }

    pub fn is_visible_to(&self, user: &UserKey) -> bool {
        match &self.visibility {
            Visibility::Everyone => true,
            Visibility::Restricted(subscribers) => subscribers.contains(user),
        }
    }

    pub(crate) fn forget_user(&mut self, user: &UserKey) {
        if let Visibility::Restricted(subscribers) = &mut self.visibility {
            subscribers.remove(user);
        }
    }
}
