//! REST application-command catalog. Registers against one guild when a
//! dev guild is configured, otherwise globally.

use {
    anyhow::Context as _,
    async_trait::async_trait,
    herald_commands::{CommandSpec, OptionKind},
    herald_common::RemoteCommandId,
    herald_gateway::{CommandCatalog, RemoteCommand},
    serenity::{
        builder::{CreateCommand, CreateCommandOption},
        http::Http,
        model::{
            application::{Command, CommandOptionType},
            id::{CommandId, GuildId},
        },
    },
    std::sync::Arc,
};

pub struct RestCatalog {
    http: Arc<Http>,
    guild: Option<GuildId>,
}

impl RestCatalog {
    pub fn new(http: Arc<Http>, guild_id: Option<u64>) -> Self {
        Self {
            http,
            guild: guild_id.map(GuildId::new),
        }
    }
}

#[async_trait]
impl CommandCatalog for RestCatalog {
    async fn list(&self) -> anyhow::Result<Vec<RemoteCommand>> {
        let commands = match self.guild {
            Some(guild) => guild
                .get_commands(&*self.http)
                .await
                .context("list guild commands")?,
            None => Command::get_global_commands(&*self.http)
                .await
                .context("list global commands")?,
        };
        Ok(commands
            .into_iter()
            .map(|c| RemoteCommand {
                id: RemoteCommandId(c.id.get().to_string()),
                name: c.name,
            })
            .collect())
    }

    async fn create(&self, spec: &CommandSpec) -> anyhow::Result<RemoteCommandId> {
        let builder = build_command(spec);
        let created = match self.guild {
            Some(guild) => guild
                .create_command(&*self.http, builder)
                .await
                .with_context(|| format!("create guild command {}", spec.name))?,
            None => Command::create_global_command(&*self.http, builder)
                .await
                .with_context(|| format!("create global command {}", spec.name))?,
        };
        Ok(RemoteCommandId(created.id.get().to_string()))
    }

    async fn delete(&self, id: &RemoteCommandId) -> anyhow::Result<()> {
        let command_id = CommandId::new(
            id.0.parse::<u64>()
                .with_context(|| format!("malformed remote command id {id}"))?,
        );
        match self.guild {
            Some(guild) => guild
                .delete_command(&*self.http, command_id)
                .await
                .with_context(|| format!("delete guild command {id}"))?,
            None => Command::delete_global_command(&*self.http, command_id)
                .await
                .with_context(|| format!("delete global command {id}"))?,
        }
        Ok(())
    }
}

fn build_command(spec: &CommandSpec) -> CreateCommand {
    let mut builder = CreateCommand::new(&spec.name).description(&spec.description);
    for option in &spec.options {
        let mut opt = CreateCommandOption::new(
            option_type(option.kind),
            &option.name,
            &option.description,
        )
        .required(option.required);
        for choice in &option.choices {
            opt = opt.add_string_choice(&choice.name, &choice.value);
        }
        if option.autocomplete {
            opt = opt.set_autocomplete(true);
        }
        builder = builder.add_option(opt);
    }
    builder
}

fn option_type(kind: OptionKind) -> CommandOptionType {
    match kind {
        OptionKind::String => CommandOptionType::String,
        OptionKind::Integer => CommandOptionType::Integer,
        OptionKind::Boolean => CommandOptionType::Boolean,
        OptionKind::User => CommandOptionType::User,
        OptionKind::Channel => CommandOptionType::Channel,
        OptionKind::Attachment => CommandOptionType::Attachment,
    }
}
