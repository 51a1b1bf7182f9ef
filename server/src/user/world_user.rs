use crate::{server::WorldServer, world::ElementKey, UserKey};

// WorldUser

/// World-side record of a connected player, pointing at the player element
/// that represents them in the tree.
#[derive(Clone)]
pub struct WorldUser {
    element: ElementKey,
}

impl WorldUser {
    pub fn new(element: ElementKey) -> Self {
        Self { element }
    }

    pub fn element(&self) -> ElementKey {
        self.element
    }
}

// WorldUserRef

pub struct WorldUserRef<'s> {
    server: &'s WorldServer,
    key: UserKey,
}

impl<'s> WorldUserRef<'s> {
    pub(crate) fn new(server: &'s WorldServer, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    pub fn element(&self) -> ElementKey {
        self.server.user_element(&self.key).unwrap()
    }

    pub fn syncs_element(&self, element: &ElementKey) -> bool {
        self.server.element_syncer(element) == Some(self.key)
    }
}

// WorldUserMut

pub struct WorldUserMut<'s> {
    server: &'s mut WorldServer,
    key: UserKey,
}

impl<'s> WorldUserMut<'s> {
    pub(crate) fn new(server: &'s mut WorldServer, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    pub fn element(&self) -> ElementKey {
        self.server.user_element(&self.key).unwrap()
    }
}
