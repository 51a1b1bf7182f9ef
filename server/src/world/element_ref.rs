use glam::Vec3;
use meridian_shared::{Transform, Value};

use crate::{
    server::WorldServer,
    sync::SyncerState,
    world::{Element, ElementKey, ElementKind},
    UserKey,
};

// ElementRef

/// Read-only view of one element, created through
/// [`Server::element`](crate::Server::element). Constructed only for keys
/// known to be live.
pub struct ElementRef<'s> {
    server: &'s WorldServer,
    key: ElementKey,
}

impl<'s> ElementRef<'s> {
    pub(crate) fn new(server: &'s WorldServer, key: &ElementKey) -> Self {
        Self { server, key: *key }
    }

    fn element(&self) -> &Element {
        self.server.get_element(&self.key).unwrap()
    }

    pub fn key(&self) -> ElementKey {
        self.key
    }

    pub fn id(&self) -> &str {
        self.element().id()
    }

    pub fn kind(&self) -> &ElementKind {
        self.element().kind()
    }

    pub fn parent(&self) -> Option<ElementKey> {
        self.element().parent()
    }

    pub fn children(&self) -> &[ElementKey] {
        self.server.get_element(&self.key).unwrap().children()
    }

    /// Local transform, ignoring any attachment.
    pub fn transform(&self) -> Transform {
        self.element().transform
    }

    /// Effective transform: follows the attachment chain when the element is
    /// attached, falls back to the local transform otherwise.
    pub fn world_transform(&self) -> Transform {
        self.server.element_world_transform(&self.key).unwrap()
    }

    pub fn position(&self) -> Vec3 {
        self.world_transform().position
    }

    pub fn attached_to(&self) -> Option<ElementKey> {
        self.server
            .attachments()
            .attached_to(&self.key)
            .map(|attachment| attachment.target)
    }

    pub fn attached_children(&self) -> &[ElementKey] {
        self.server.attachments().attached_children(&self.key)
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.element().data(key)
    }

    pub fn is_visible_to(&self, user: &UserKey) -> bool {
        self.element().is_visible_to(user)
    }

    pub fn syncer(&self) -> Option<UserKey> {
        self.server.element_syncer(&self.key)
    }

    pub fn syncer_state(&self) -> Option<SyncerState> {
        self.server.element_syncer_state(&self.key)
    }

    /// The connected user behind a player element.
    pub fn user(&self) -> Option<UserKey> {
        self.element().user()
    }

    pub fn dimension(&self) -> u16 {
        self.element().dimension
    }

    pub fn interior(&self) -> u8 {
        self.element().interior
    }

    pub fn is_frozen(&self) -> bool {
        self.element().frozen
    }

    pub fn alpha(&self) -> u8 {
        self.element().alpha
    }

    pub fn health(&self) -> f32 {
        self.element().health
    }

    pub fn model(&self) -> u16 {
        self.element().model
    }
}
