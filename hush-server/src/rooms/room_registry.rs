use dashmap::DashSet;
use hush_core::RoomCode;
use std::sync::Arc;
use tracing::info;

/// In-memory store of issued room codes. Lives as long as the process.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    issued: Arc<DashSet<RoomCode>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a code that has not been handed out before.
    pub fn issue(&self) -> RoomCode {
        loop {
            let code = RoomCode::generate();
            if self.issued.insert(code.clone()) {
                info!("Issued room code {}", code);
                return code;
            }
        }
    }

    pub fn contains(&self, code: &RoomCode) -> bool {
        self.issued.contains(code)
    }

    pub fn len(&self) -> usize {
        self.issued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issued.is_empty()
    }
}
