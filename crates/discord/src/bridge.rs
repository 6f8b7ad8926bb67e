//! serenity event handler: decodes gateway payloads into core events and
//! forwards them to the `EventRouter`. Decode only; every decision about
//! cooldowns, access, and persistence lives behind the router.

use {
    async_trait::async_trait,
    herald_commands::{AttachmentRef, OptionValue},
    herald_common::{ChannelId, GuildId, GuildProfile, UserId},
    herald_gateway::{AutocompleteEvent, EventRouter, GatewayEvent, InvocationEvent},
    serenity::{
        client::{Context, EventHandler},
        gateway::ActivityData,
        model::{
            application::{CommandDataOptionValue, CommandInteraction, Interaction},
            gateway::Ready,
            guild::{Guild, Member, UnavailableGuild},
            user::User,
        },
    },
    std::sync::Arc,
    tracing::warn,
};

use crate::responder::InteractionResponder;

pub(crate) struct BridgeHandler {
    router: Arc<EventRouter>,
    status: String,
}

impl BridgeHandler {
    pub(crate) fn new(router: Arc<EventRouter>, status: String) -> Self {
        Self { router, status }
    }
}

#[async_trait]
impl EventHandler for BridgeHandler {
    async fn ready(&self, ctx: Context, data: Ready) {
        // The gateway drops presence on resume; re-apply it on every ready.
        ctx.set_activity(Some(ActivityData::playing(self.status.clone())));
        self.router.handle(GatewayEvent::Ready {
            shard: data.shard.map(|s| s.id.0).unwrap_or(0),
            username: data.user.name.clone(),
            guild_count: data.guilds.len(),
        });
    }

    async fn guild_create(&self, _ctx: Context, guild: Guild, _is_new: Option<bool>) {
        self.router
            .handle(GatewayEvent::GuildCreate(GuildProfile::joined(
                GuildId(guild.id.get()),
                guild.name.clone(),
                UserId(guild.owner_id.get()),
                i64::try_from(guild.member_count).unwrap_or(i64::MAX),
            )));
    }

    async fn guild_delete(&self, _ctx: Context, incomplete: UnavailableGuild, _full: Option<Guild>) {
        // `unavailable` means an outage, not a removal; nothing to record.
        if incomplete.unavailable {
            return;
        }
        self.router.handle(GatewayEvent::GuildDelete {
            guild_id: GuildId(incomplete.id.get()),
        });
    }

    async fn guild_member_addition(&self, _ctx: Context, member: Member) {
        self.router.handle(GatewayEvent::MemberAdd {
            guild_id: GuildId(member.guild_id.get()),
        });
    }

    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: serenity::model::id::GuildId,
        _user: User,
        _member: Option<Member>,
    ) {
        self.router.handle(GatewayEvent::MemberRemove {
            guild_id: GuildId(guild_id.get()),
        });
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                self.router.handle(GatewayEvent::Invocation(invocation_event(
                    &ctx, command,
                )));
            },
            Interaction::Autocomplete(command) => {
                match autocomplete_event(&ctx, command) {
                    Some(event) => self.router.handle(GatewayEvent::Autocomplete(event)),
                    None => warn!("autocomplete interaction without a focused option"),
                }
            },
            _ => {},
        }
    }
}

fn invocation_event(ctx: &Context, interaction: CommandInteraction) -> InvocationEvent {
    let options = interaction
        .data
        .options
        .iter()
        .filter_map(|opt| decode_option(&opt.name, &opt.value))
        .collect();
    let attachments = interaction
        .data
        .resolved
        .attachments
        .values()
        .map(|att| AttachmentRef {
            filename: att.filename.clone(),
            url: att.url.clone(),
            content_type: att.content_type.clone(),
            size: u64::from(att.size),
        })
        .collect();
    InvocationEvent {
        command: interaction.data.name.clone(),
        member_user: interaction.member.as_ref().map(|m| UserId(m.user.id.get())),
        user: Some(UserId(interaction.user.id.get())),
        guild_id: interaction.guild_id.map(|g| GuildId(g.get())),
        channel_id: Some(ChannelId(interaction.channel_id.get())),
        member_permissions: interaction
            .member
            .as_ref()
            .and_then(|m| m.permissions)
            .map(|p| p.bits()),
        shard: ctx.shard_id.0,
        options,
        attachments,
        responder: Arc::new(InteractionResponder::new(ctx.http.clone(), interaction)),
    }
}

fn autocomplete_event(ctx: &Context, interaction: CommandInteraction) -> Option<AutocompleteEvent> {
    let (focused_option, partial) = {
        let focused = interaction.data.autocomplete()?;
        (focused.name.to_string(), focused.value.to_string())
    };
    Some(AutocompleteEvent {
        command: interaction.data.name.clone(),
        user: Some(UserId(interaction.user.id.get())),
        focused_option,
        partial,
        responder: Arc::new(InteractionResponder::new(ctx.http.clone(), interaction)),
    })
}

fn decode_option(name: &str, value: &CommandDataOptionValue) -> Option<(String, OptionValue)> {
    let decoded = match value {
        CommandDataOptionValue::String(s) => OptionValue::String(s.clone()),
        CommandDataOptionValue::Integer(i) => OptionValue::Integer(*i),
        CommandDataOptionValue::Boolean(b) => OptionValue::Boolean(*b),
        CommandDataOptionValue::User(id) => OptionValue::User(UserId(id.get())),
        CommandDataOptionValue::Channel(id) => OptionValue::Channel(ChannelId(id.get())),
        // Attachments arrive through the resolved map, subcommands are
        // not part of the command surface.
        _ => return None,
    };
    Some((name.to_string(), decoded))
}
