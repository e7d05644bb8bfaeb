mod connection;
mod connection_event;
mod connection_worker;
mod rtc_connection;
mod transport_config;

pub use connection::*;
pub use connection_event::*;
pub use connection_worker::*;
pub use rtc_connection::*;
pub use transport_config::*;
