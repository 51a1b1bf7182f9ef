use std::fmt;

/// The type tag of an element. Structural kinds (`Root`, `MapRoot`,
/// `DynamicRoot`) are created by the server itself; everything else is
/// created by resources or on user connect. `Dummy` carries a custom tag so
/// scripts can invent their own element types.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Root,
    MapRoot,
    DynamicRoot,
    Player,
    Ped,
    Vehicle,
    Marker,
    Console,
    Dummy(String),
}

impl ElementKind {
    /// The type name as seen by scripts, e.g. for child filtering.
    pub fn name(&self) -> &str {
        match self {
            ElementKind::Root => "root",
            ElementKind::MapRoot => "map",
            ElementKind::DynamicRoot => "dynamic",
            ElementKind::Player => "player",
            ElementKind::Ped => "ped",
            ElementKind::Vehicle => "vehicle",
            ElementKind::Marker => "marker",
            ElementKind::Console => "console",
            ElementKind::Dummy(tag) => tag,
        }
    }

    /// Kinds that `destroy` refuses to touch directly. Players and consoles
    /// are owned by the connection layer; root is the tree itself.
    pub fn is_protected(&self) -> bool {
        matches!(
            self,
            ElementKind::Root | ElementKind::Player | ElementKind::Console
        )
    }

    /// Kinds that form the backbone of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ElementKind::Root | ElementKind::MapRoot | ElementKind::DynamicRoot
        )
    }

    /// Only peds and vehicles have their physical state reported by a client
    /// syncer. Players are authoritative for themselves and never syncable.
    pub fn is_syncable(&self) -> bool {
        matches!(self, ElementKind::Ped | ElementKind::Vehicle)
    }

    /// Whether an element of this kind may be attached to another element.
    pub fn can_be_attached(&self) -> bool {
        !self.is_structural() && !matches!(self, ElementKind::Player | ElementKind::Console)
    }

    /// Whether an element of this kind may serve as an attachment target.
    pub fn can_be_attachment_target(&self) -> bool {
        !self.is_structural() && !matches!(self, ElementKind::Console)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
