use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("invalid peer id '{0}'")]
    PeerId(String),

    #[error("room code must be {expected} characters, got {actual}")]
    RoomCodeLength { expected: usize, actual: usize },

    #[error("room code contains invalid character '{0}'")]
    RoomCodeCharacter(char),
}
