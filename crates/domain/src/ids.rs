use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator between a room's display name and its random suffix.
pub const ROOM_ID_SEPARATOR: char = '#';

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Opaque per-connection identity
define_id!(UserId);

// `<name>#<suffix>`, e.g. "lobby#334288"
define_id!(RoomId);

impl RoomId {
    /// Build a room id from a display name and a random suffix.
    pub fn compose(name: &str, suffix: impl fmt::Display) -> Self {
        Self(format!("{name}{ROOM_ID_SEPARATOR}{suffix}"))
    }

    /// The display name part (everything before the last `#`).
    ///
    /// Ids without a separator are returned whole.
    pub fn room_name(&self) -> &str {
        match self.0.rfind(ROOM_ID_SEPARATOR) {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }
}
