mod room_registry;
mod room_routes;

pub use room_registry::*;
pub use room_routes::*;
