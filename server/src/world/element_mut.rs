use glam::Vec3;
use meridian_shared::Value;

use crate::{
    error::WorldError,
    server::WorldServer,
    sync::SyncerChoice,
    world::{DestroyOutcome, Element, ElementKey},
    UserKey,
};

// ElementMut

/// Read/write view of one element, created through
/// [`Server::element_mut`](crate::Server::element_mut). Mutators that cannot
/// fail chain; mutators that enforce tree or attachment rules return
/// `Result` instead.
pub struct ElementMut<'s> {
    server: &'s mut WorldServer,
    key: ElementKey,
}

impl<'s> ElementMut<'s> {
    pub(crate) fn new(server: &'s mut WorldServer, key: &ElementKey) -> Self {
        Self { server, key: *key }
    }

    fn element_mut(&mut self) -> &mut Element {
        self.server.get_element_mut(&self.key).unwrap()
    }

    pub fn key(&self) -> ElementKey {
        self.key
    }

    pub fn set_id(&mut self, id: &str) -> &mut Self {
        self.element_mut().set_id(id);

        self
    }

    // Transform

    pub fn set_position(&mut self, position: Vec3) -> &mut Self {
        self.element_mut().transform.position = position;

        self
    }

    pub fn set_rotation(&mut self, rotation: Vec3) -> &mut Self {
        self.element_mut().transform.rotation = rotation;

        self
    }

    pub fn set_velocity(&mut self, velocity: Vec3) -> &mut Self {
        self.element_mut().transform.velocity = velocity;

        self
    }

    pub fn set_dimension(&mut self, dimension: u16) -> &mut Self {
        self.element_mut().dimension = dimension;

        self
    }

    pub fn set_interior(&mut self, interior: u8) -> &mut Self {
        self.element_mut().interior = interior;

        self
    }

    pub fn set_frozen(&mut self, frozen: bool) -> &mut Self {
        self.element_mut().frozen = frozen;

        self
    }

    pub fn set_alpha(&mut self, alpha: u8) -> &mut Self {
        self.element_mut().alpha = alpha;

        self
    }

    pub fn set_health(&mut self, health: f32) -> &mut Self {
        self.element_mut().health = health;

        self
    }

    pub fn set_model(&mut self, model: u16) -> &mut Self {
        self.element_mut().model = model;

        self
    }

    // Custom data

    pub fn set_data(&mut self, key: &str, value: Value) -> Result<&mut Self, WorldError> {
        self.element_mut().set_data(key, value)?;

        Ok(self)
    }

    pub fn remove_data(&mut self, key: &str) -> Option<Value> {
        self.element_mut().remove_data(key)
    }

    // Visibility

    pub fn set_visible_to(&mut self, user: UserKey, visible: bool) -> &mut Self {
        self.element_mut().set_visible_to(user, visible);

        self
    }

    pub fn clear_visible_to(&mut self) -> &mut Self {
        self.element_mut().clear_visible_to();

        self
    }

    // Tree and attachments

    pub fn set_parent(&mut self, parent: &ElementKey) -> Result<&mut Self, WorldError> {
        self.server.set_element_parent(&self.key, parent)?;

        Ok(self)
    }

    pub fn attach_to(
        &mut self,
        target: &ElementKey,
        pos_offset: Vec3,
        rot_offset: Vec3,
    ) -> Result<&mut Self, WorldError> {
        self.server
            .attach_element(&self.key, target, pos_offset, rot_offset)?;

        Ok(self)
    }

    pub fn detach(&mut self) -> Result<&mut Self, WorldError> {
        self.server.detach_element(&self.key, None)?;

        Ok(self)
    }

    // Sync

    pub fn set_syncer(&mut self, choice: SyncerChoice) -> Result<&mut Self, WorldError> {
        self.server.set_element_syncer(&self.key, choice)?;

        Ok(self)
    }

    /// Destroy the element (and its subtree), consuming this handle.
    pub fn destroy(self) -> Result<DestroyOutcome, WorldError> {
        self.server.destroy_element(&self.key)
    }
}
