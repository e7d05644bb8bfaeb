mod peer_session;
mod session_command;
mod session_manager;
mod session_registry;
mod session_state;

pub use peer_session::*;
pub use session_command::*;
pub use session_manager::*;
pub use session_registry::*;
pub use session_state::*;
