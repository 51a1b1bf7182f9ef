use std::default::Default;

use crate::request::RequestOptions;

/// Contains Config properties which will be used by the Server
#[derive(Clone)]
pub struct ServerConfig {
    /// Distance within which a player is eligible to sync a vehicle.
    pub vehicle_sync_range: f32,
    /// Distance within which a player is eligible to sync a ped.
    pub ped_sync_range: f32,
    /// Retry policy applied to remote calls that don't specify their own.
    pub request_options: RequestOptions,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            vehicle_sync_range: 140.0,
            ped_sync_range: 100.0,
            request_options: RequestOptions::default(),
        }
    }
}
