mod app;
mod config;
mod rooms;
mod roster;
mod signaling;

pub use app::*;
pub use config::*;
pub use rooms::*;
pub use roster::*;
pub use signaling::*;
