//! Command model: descriptors, the `Command` trait, invocation context,
//! the response port, and the immutable registry.
//!
//! Command business logic lives in `builtin/`; everything reaching Discord
//! goes through the [`context::Responder`] port so commands stay testable
//! without a gateway.

pub mod builtin;
pub mod command;
pub mod context;
pub mod registry;
pub mod spec;

pub use {
    command::Command,
    context::{AttachmentRef, AutocompleteRequest, Invocation, OptionValue, Reply, ReplyFile, Responder},
    registry::{CommandRegistry, RegistryError},
    spec::{CommandOption, CommandSpec, OptionChoice, OptionKind},
};
