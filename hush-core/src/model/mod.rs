mod peer;
mod roster;
mod room;
mod signaling;

pub use peer::PeerId;
pub use roster::{Participant, RosterSnapshot};
pub use room::RoomCode;
pub use signaling::{ClientSignal, IceCandidate, IceServerConfig, RelaySignal, SessionDescription};
