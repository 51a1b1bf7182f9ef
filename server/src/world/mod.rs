pub(crate) mod attachments;
pub(crate) mod element;
pub(crate) mod element_kind;
pub(crate) mod element_mut;
pub(crate) mod element_ref;
pub(crate) mod tree;

#[cfg(test)]
mod tests;

pub use attachments::{Attachment, AttachmentGraph};
pub use element::{Element, ElementKey, MarkerData, PedData, VehicleData, Visibility};
pub use element_kind::ElementKind;
pub use element_mut::ElementMut;
pub use element_ref::ElementRef;
pub use tree::{DestroyOutcome, ElementTree};
