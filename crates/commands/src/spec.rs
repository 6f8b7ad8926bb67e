//! Immutable command descriptors, mirrored to the remote catalog at startup.

use std::time::Duration;

/// Option value type, as understood by the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    String,
    Integer,
    Boolean,
    User,
    Channel,
    Attachment,
}

/// A fixed or autocomplete-provided choice for a string option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionChoice {
    pub name: String,
    pub value: String,
}

impl OptionChoice {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One ordered option of a command.
#[derive(Debug, Clone)]
pub struct CommandOption {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    pub choices: Vec<OptionChoice>,
    /// Marks this option as autocomplete-driven in the remote catalog.
    /// Mutually exclusive with static `choices`.
    pub autocomplete: bool,
}

impl CommandOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            choices: Vec::new(),
            autocomplete: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choice(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.choices.push(OptionChoice::new(name, value));
        self
    }

    pub fn autocomplete(mut self) -> Self {
        self.autocomplete = true;
        self
    }
}

/// Metadata half of a command descriptor. Immutable after construction.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Unique identity within the registry.
    pub name: String,
    pub description: String,
    pub category: String,
    /// Minimum interval between a user's successive invocations; `None`
    /// falls back to the configured dispatch default.
    pub cooldown: Option<Duration>,
    pub dev_only: bool,
    pub admin_only: bool,
    pub options: Vec<CommandOption>,
    /// Per-invocation run deadline; `None` falls back to the configured
    /// dispatch default.
    pub run_timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
            cooldown: None,
            dev_only: false,
            admin_only: false,
            options: Vec::new(),
            run_timeout: None,
        }
    }

    pub fn cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = Some(cooldown);
        self
    }

    pub fn dev_only(mut self) -> Self {
        self.dev_only = true;
        self
    }

    pub fn admin_only(mut self) -> Self {
        self.admin_only = true;
        self
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    pub fn run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }
}
