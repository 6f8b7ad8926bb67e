//! Newtypes for the snowflake ids that cross crate boundaries.

use {
    serde::{Deserialize, Serialize},
    std::fmt,
};

macro_rules! snowflake {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                Self(v)
            }
        }
    };
}

snowflake!(UserId, "A Discord user id.");
snowflake!(GuildId, "A Discord guild (server) id.");
snowflake!(ChannelId, "A Discord channel id.");

/// Id assigned by the remote command catalog when a command is created.
/// Opaque; only ever echoed back for deletion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteCommandId(pub String);

impl fmt::Display for RemoteCommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for RemoteCommandId {
    fn from(v: &str) -> Self {
        Self(v.to_string())
    }
}
