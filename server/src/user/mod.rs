pub(crate) mod user;
pub(crate) mod main_user;
pub(crate) mod world_user;

pub use user::*;
pub use main_user::*;
pub use world_user::*;
