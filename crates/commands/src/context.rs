//! Per-invocation context and the response port.

use {
    async_trait::async_trait,
    herald_common::{ChannelId, GuildId, UserId},
    std::sync::Arc,
};

use crate::spec::OptionChoice;

/// Administrator bit of the Discord permission set.
pub const PERMISSION_ADMINISTRATOR: u64 = 1 << 3;

/// A decoded option value from the invocation payload.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    User(UserId),
    Channel(ChannelId),
}

/// A resolved attachment reference from the invocation payload.
#[derive(Debug, Clone)]
pub struct AttachmentRef {
    pub filename: String,
    pub url: String,
    pub content_type: Option<String>,
    pub size: u64,
}

/// One outbound response (initial, or an edit of a deferred one).
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub content: Option<String>,
    pub ephemeral: bool,
    pub file: Option<ReplyFile>,
}

/// A file attached to a reply.
#[derive(Debug, Clone)]
pub struct ReplyFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Visible only to the invoking user.
    pub fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ephemeral: true,
            file: None,
        }
    }

    pub fn with_file(mut self, file: ReplyFile) -> Self {
        self.file = Some(file);
        self
    }
}

/// Response channel for one invocation. The token behind it has a bounded
/// validity window; a late call fails and is the caller's to swallow.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Send the initial response.
    async fn respond(&self, reply: Reply) -> anyhow::Result<()>;

    /// Acknowledge now, edit later. Buys the 15-minute followup window.
    async fn defer(&self, ephemeral: bool) -> anyhow::Result<()>;

    /// Edit a previously deferred (or sent) response.
    async fn edit(&self, reply: Reply) -> anyhow::Result<()>;

    /// Answer an autocomplete interaction with a choice list.
    async fn suggest(&self, choices: Vec<OptionChoice>) -> anyhow::Result<()>;
}

/// Ephemeral per-invocation context handed to `Command::run`.
/// Created on receipt, discarded on terminal response or timeout.
#[derive(Clone)]
pub struct Invocation {
    pub user_id: UserId,
    pub guild_id: Option<GuildId>,
    pub channel_id: Option<ChannelId>,
    /// Permission bits of the invoking member; `None` outside guilds.
    pub member_permissions: Option<u64>,
    /// Shard the event arrived on.
    pub shard: u32,
    pub options: Vec<(String, OptionValue)>,
    pub attachments: Vec<AttachmentRef>,
    pub responder: Arc<dyn Responder>,
}

impl Invocation {
    pub fn str_option(&self, name: &str) -> Option<&str> {
        self.options.iter().find_map(|(n, v)| match v {
            OptionValue::String(s) if n == name => Some(s.as_str()),
            _ => None,
        })
    }

    pub fn int_option(&self, name: &str) -> Option<i64> {
        self.options.iter().find_map(|(n, v)| match v {
            OptionValue::Integer(i) if n == name => Some(*i),
            _ => None,
        })
    }

    pub fn bool_option(&self, name: &str) -> Option<bool> {
        self.options.iter().find_map(|(n, v)| match v {
            OptionValue::Boolean(b) if n == name => Some(*b),
            _ => None,
        })
    }

    /// Whether the invoking member carries the administrator bit.
    pub fn is_admin(&self) -> bool {
        self.member_permissions
            .is_some_and(|p| p & PERMISSION_ADMINISTRATOR != 0)
    }
}

/// Ephemeral context for one autocomplete interaction.
#[derive(Clone)]
pub struct AutocompleteRequest {
    pub user_id: UserId,
    /// Name of the option currently being typed.
    pub focused_option: String,
    /// Text typed so far.
    pub partial: String,
    pub responder: Arc<dyn Responder>,
}
