/// Rejections of a participant command.
///
/// None of these change any state, and they are only reported back to the
/// participant who sent the command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    NotYourTurn,
    /// The placement would not flip a single stone
    IllegalMove,
    RoomFull,
    NoActiveSession,
    /// Requested room id is longer than the server accepts
    InvalidRoomId,
}

impl GameError {
    /// Reason string sent to the client in an `Invalid` packet
    pub fn reason(&self) -> &'static str {
        match self {
            GameError::NotYourTurn => "Not your turn",
            GameError::IllegalMove => "Invalid move",
            GameError::RoomFull => "Room is full",
            GameError::NoActiveSession => "Not in a room",
            GameError::InvalidRoomId => "Invalid room id",
        }
    }
}

impl std::fmt::Display for GameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

impl std::error::Error for GameError {}
