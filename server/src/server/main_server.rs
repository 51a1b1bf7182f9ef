use std::net::SocketAddr;

use log::info;

use meridian_shared::BigMap;

use crate::{MainUser, UserKey};

/// Connection-side half of the server: the registry of who is connected.
/// The world-side half in [`super::WorldServer`] owns everything those users
/// do in the world.
pub struct MainServer {
    users: BigMap<UserKey, MainUser>,
}

impl MainServer {
    pub fn new() -> Self {
        Self {
            users: BigMap::new(),
        }
    }

    pub fn connect_user(&mut self, name: &str, address: SocketAddr) -> UserKey {
        let user_key = self.users.insert(MainUser::new(name, address));
        info!("user {} connected from {}", name, address);
        user_key
    }

    pub fn disconnect_user(&mut self, user_key: &UserKey) -> Option<MainUser> {
        let user = self.users.remove(user_key)?;
        info!("user {} disconnected", user.name());
        Some(user)
    }

    pub fn user_exists(&self, user_key: &UserKey) -> bool {
        self.users.contains_key(user_key)
    }

    pub fn user_name(&self, user_key: &UserKey) -> Option<&str> {
        self.users.get(user_key).map(|user| user.name())
    }

    pub fn user_address(&self, user_key: &UserKey) -> Option<SocketAddr> {
        self.users.get(user_key).map(|user| user.address())
    }

    pub fn set_user_name(&mut self, user_key: &UserKey, name: &str) {
        if let Some(user) = self.users.get_mut(user_key) {
            user.set_name(name);
        }
    }

    pub fn user_keys(&self) -> Vec<UserKey> {
        self.users.keys().collect()
    }

    pub fn users_count(&self) -> usize {
        self.users.len()
    }
}
