mod config;
mod error;
mod media;
mod participant;
mod rooms;
mod session;
mod signaling;
mod transport;

pub use config::*;
pub use error::*;
pub use media::*;
pub use participant::*;
pub use rooms::*;
pub use session::*;
pub use signaling::*;
pub use transport::*;
