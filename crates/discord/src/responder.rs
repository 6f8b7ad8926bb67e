//! Responder bound to one interaction. Owns the interaction token for its
//! lifetime; the core never sees serenity types.

use {
    anyhow::Context as _,
    async_trait::async_trait,
    herald_commands::{OptionChoice, Reply, Responder},
    serenity::{
        builder::{
            CreateAttachment, CreateAutocompleteResponse, CreateInteractionResponse,
            CreateInteractionResponseMessage, EditInteractionResponse,
        },
        http::Http,
        model::application::CommandInteraction,
    },
    std::sync::Arc,
};

pub(crate) struct InteractionResponder {
    http: Arc<Http>,
    interaction: CommandInteraction,
}

impl InteractionResponder {
    pub(crate) fn new(http: Arc<Http>, interaction: CommandInteraction) -> Self {
        Self { http, interaction }
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn respond(&self, reply: Reply) -> anyhow::Result<()> {
        let mut message = CreateInteractionResponseMessage::new().ephemeral(reply.ephemeral);
        if let Some(content) = reply.content {
            message = message.content(content);
        }
        if let Some(file) = reply.file {
            message = message.add_file(CreateAttachment::bytes(file.data, file.name));
        }
        self.interaction
            .create_response(&*self.http, CreateInteractionResponse::Message(message))
            .await
            .context("send interaction response")
    }

    async fn defer(&self, ephemeral: bool) -> anyhow::Result<()> {
        let message = CreateInteractionResponseMessage::new().ephemeral(ephemeral);
        self.interaction
            .create_response(&*self.http, CreateInteractionResponse::Defer(message))
            .await
            .context("defer interaction")
    }

    async fn edit(&self, reply: Reply) -> anyhow::Result<()> {
        let mut builder = EditInteractionResponse::new();
        if let Some(content) = reply.content {
            builder = builder.content(content);
        }
        if let Some(file) = reply.file {
            builder = builder.new_attachment(CreateAttachment::bytes(file.data, file.name));
        }
        self.interaction
            .edit_response(&*self.http, builder)
            .await
            .context("edit interaction response")?;
        Ok(())
    }

    async fn suggest(&self, choices: Vec<OptionChoice>) -> anyhow::Result<()> {
        let mut response = CreateAutocompleteResponse::new();
        for choice in choices {
            response = response.add_string_choice(choice.name, choice.value);
        }
        self.interaction
            .create_response(
                &*self.http,
                CreateInteractionResponse::Autocomplete(response),
            )
            .await
            .context("send autocomplete choices")
    }
}
