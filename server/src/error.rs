use thiserror::Error;

use crate::resource::ResourceState;

/// Errors produced by world operations. Every operation fails locally and
/// leaves prior state intact; nothing in this crate signals failure by
/// panicking outside of the `Ref`/`Mut` accessor constructors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorldError {
    #[error("element does not exist")]
    NotFound,
    #[error("operation is structurally disallowed for this element")]
    Protected,
    #[error("parent target must be root, a map root, or a dynamic root")]
    InvalidParent,
    #[error("elements of these kinds cannot be attached to each other")]
    IncompatibleTypes,
    #[error("attachment would form a cycle")]
    WouldCycle,
    #[error("only peds and vehicles can be assigned a syncer")]
    NotSyncable,
    #[error("element data key is empty or longer than {} bytes", meridian_shared::MAX_DATA_KEY_LEN)]
    InvalidDataKey,
    #[error("invalid name: {0:?}")]
    InvalidName(String),
    #[error("resource is in state {0:?}, which does not permit this operation")]
    InvalidState(ResourceState),
    #[error("user does not exist")]
    NoSuchUser,
    #[error("resource does not exist")]
    NoSuchResource,
}
