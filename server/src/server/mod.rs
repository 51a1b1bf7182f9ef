mod server;
pub use server::Server;

mod server_config;
pub use server_config::ServerConfig;

mod main_server;
pub(crate) use main_server::MainServer;
mod world_server;
pub(crate) use world_server::WorldServer;
