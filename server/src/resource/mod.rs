mod resource;

pub use resource::{AclRequest, Resource, ResourceKey, ResourceState, StartFlags};
pub(crate) use resource::ResourceOp;
