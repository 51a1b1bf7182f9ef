use std::net::SocketAddr;

use meridian_shared::BigMapKey;

use crate::{
    server::{MainServer, WorldServer},
    world::ElementKey,
    MainUserMut, MainUserRef, WorldUserMut, WorldUserRef,
};

// UserKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug)]
pub struct UserKey(u64);

impl BigMapKey for UserKey {
    fn to_u64(&self) -> u64 {
        self.0
    }

    fn from_u64(value: u64) -> Self {
        UserKey(value)
    }
}

// UserRef

pub struct UserRef<'s> {
    main_user_ref: MainUserRef<'s>,
    world_user_ref: WorldUserRef<'s>,
}

impl<'s> UserRef<'s> {
    pub(crate) fn new(main: &'s MainServer, world: &'s WorldServer, key: &UserKey) -> Self {
        let main_user_ref = MainUserRef::new(main, key);
        let world_user_ref = WorldUserRef::new(world, key);

        Self {
            main_user_ref,
            world_user_ref,
        }
    }

    pub fn key(&self) -> UserKey {
        self.main_user_ref.key()
    }

    pub fn name(&self) -> &str {
        self.main_user_ref.name()
    }

    pub fn address(&self) -> SocketAddr {
        self.main_user_ref.address()
    }

    /// The player element representing this user in the tree.
    pub fn element(&self) -> ElementKey {
        self.world_user_ref.element()
    }

    pub fn syncs_element(&self, element: &ElementKey) -> bool {
        self.world_user_ref.syncs_element(element)
    }
}

// UserMut

pub struct UserMut<'s> {
    main_user_mut: MainUserMut<'s>,
    world_user_mut: WorldUserMut<'s>,
}

impl<'s> UserMut<'s> {
    pub(crate) fn new(main: &'s mut MainServer, world: &'s mut WorldServer, key: &UserKey) -> Self {
        let main_user_mut = MainUserMut::new(main, key);
        let world_user_mut = WorldUserMut::new(world, key);

        Self {
            main_user_mut,
            world_user_mut,
        }
    }

    pub fn key(&self) -> UserKey {
        self.main_user_mut.key()
    }

    pub fn name(&self) -> &str {
        self.main_user_mut.name()
    }

    pub fn address(&self) -> SocketAddr {
        self.main_user_mut.address()
    }

    pub fn element(&self) -> ElementKey {
        self.world_user_mut.element()
    }

    pub fn set_name(&mut self, name: &str) -> &mut Self {
        self.main_user_mut.set_name(name);

        self
    }
}
