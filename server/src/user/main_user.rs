use std::net::SocketAddr;

use crate::{server::MainServer, UserKey};

// MainUser

/// Connection-side record of a player: who they are and where they connect
/// from. The world side keeps its own record in [`crate::WorldUser`].
#[derive(Clone)]
pub struct MainUser {
    name: String,
    address: SocketAddr,
}

impl MainUser {
    pub fn new(name: &str, address: SocketAddr) -> Self {
        Self {
            name: name.to_string(),
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub(crate) fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }
}

// MainUserRef

pub struct MainUserRef<'s> {
    server: &'s MainServer,
    key: UserKey,
}

impl<'s> MainUserRef<'s> {
    pub(crate) fn new(server: &'s MainServer, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> UserKey {
        self.key
    }

    pub fn name(&self) -> &str {
        self.server.user_name(&self.key).unwrap()
    }

    pub fn address(&self) -> SocketAddr {
        self.server.user_address(&self.key).unwrap()
    }
}

// MainUserMut

pub struct MainUserMut<'s> {
    server: &'s mut MainServer,
    key: UserKey,
}

impl<'s> MainUserMut<'s> {
    pub(crate) fn new(server: &'s mut MainServer, key: &UserKey) -> Self {
        Self { server, key: *key }
    }

    pub fn key(&self) -> UserKey {
        self.key
    }

    pub fn name(&self) -> &str {
        self.server.user_name(&self.key).unwrap()
    }

    pub fn address(&self) -> SocketAddr {
        self.server.user_address(&self.key).unwrap()
    }

    pub fn set_name(&mut self, name: &str) {
        self.server.set_user_name(&self.key, name);
    }
}
