//! Shared value objects used across the meeting context

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Meeting identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeetingId(Uuid);

impl MeetingId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for MeetingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MeetingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Letters used in room codes (no `l` or `o`)
const ROOM_CODE_ALPHABET: &[u8] = b"abcdefghijkmnpqrstuvwxyz";

/// Group sizes of a room code, e.g. `abc-defg-hij`
const ROOM_CODE_GROUPS: [usize; 3] = [3, 4, 3];

/// Short code used in external join links
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Generate a random room code
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let groups: Vec<String> = ROOM_CODE_GROUPS
            .iter()
            .map(|len| {
                (0..*len)
                    .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
                    .collect()
            })
            .collect();

        Self(groups.join("-"))
    }

    /// Wrap a code read back from storage or typed in by a user
    pub fn new(code: impl Into<String>) -> Self {
        Self(normalize(&code.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against user input, ignoring case and surrounding whitespace
    pub fn matches(&self, input: &str) -> bool {
        self.0 == normalize(input)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}
