//! Immutable command registry and the composition root that fills it.

use {
    std::{collections::HashMap, sync::Arc, time::Instant},
    thiserror::Error,
};

use crate::{builtin, command::Command, spec::CommandSpec};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate command name: {0}")]
    DuplicateName(String),
}

/// Write-once-at-startup, read-only-thereafter command list.
pub struct CommandRegistry {
    commands: Vec<Arc<dyn Command>>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.by_name.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl CommandRegistry {
    /// Build a registry from an explicit command list. Duplicate names are
    /// rejected — a silently shadowed command is a deployment mistake.
    pub fn from_commands(commands: Vec<Arc<dyn Command>>) -> Result<Self, RegistryError> {
        let mut by_name = HashMap::with_capacity(commands.len());
        for (idx, cmd) in commands.iter().enumerate() {
            let name = cmd.spec().name.clone();
            if by_name.insert(name.clone(), idx).is_some() {
                return Err(RegistryError::DuplicateName(name));
            }
        }
        Ok(Self { commands, by_name })
    }

    /// Composition root: collect every built-in command into one registry.
    ///
    /// `started_at` is the process start instant, consumed by `uptime`.
    pub fn builtin(started_at: Instant) -> Result<Self, RegistryError> {
        let mut commands: Vec<Arc<dyn Command>> = vec![
            Arc::new(builtin::ping::PingCommand::new()),
            Arc::new(builtin::uptime::UptimeCommand::new(started_at)),
            Arc::new(builtin::qrcode::QrCodeCommand::new()),
        ];

        // `help` describes every command including itself, so its summary
        // list is assembled before it is constructed.
        let mut summaries: Vec<_> = commands
            .iter()
            .map(|c| builtin::help::CommandSummary::from_spec(c.spec()))
            .collect();
        let help = builtin::help::HelpCommand::new({
            summaries.push(builtin::help::CommandSummary::from_spec(
                &builtin::help::HelpCommand::spec_template(),
            ));
            summaries.sort_by(|a, b| a.name.cmp(&b.name));
            summaries
        });
        commands.push(Arc::new(help));

        Self::from_commands(commands)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Command>> {
        self.by_name.get(name).map(|&i| &self.commands[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Command>> {
        self.commands.iter()
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.commands.iter().map(|c| c.spec())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            context::{AutocompleteRequest, Invocation},
            spec::OptionChoice,
        },
        async_trait::async_trait,
        herald_config::HeraldConfig,
    };

    struct Named(CommandSpec);

    #[async_trait]
    impl Command for Named {
        fn spec(&self) -> &CommandSpec {
            &self.0
        }
        async fn run(&self, _inv: &Invocation, _cfg: &HeraldConfig) -> anyhow::Result<()> {
            Ok(())
        }
        async fn autocomplete(
            &self,
            _req: &AutocompleteRequest,
        ) -> anyhow::Result<Vec<OptionChoice>> {
            Ok(Vec::new())
        }
    }

    fn named(name: &str) -> Arc<dyn Command> {
        Arc::new(Named(CommandSpec::new(name, "d", "c")))
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = CommandRegistry::from_commands(vec![named("a"), named("a")]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateName(n) if n == "a"));
    }

    #[test]
    fn lookup_by_name() {
        let reg = CommandRegistry::from_commands(vec![named("a"), named("b")]).unwrap();
        assert_eq!(reg.len(), 2);
        assert!(reg.get("a").is_some());
        assert!(reg.get("c").is_none());
    }

    #[test]
    fn builtin_registry_has_unique_names_and_help() {
        let reg = CommandRegistry::builtin(Instant::now()).unwrap();
        assert!(reg.get("ping").is_some());
        assert!(reg.get("uptime").is_some());
        assert!(reg.get("qrcode").is_some());
        let help = reg.get("help").unwrap();
        assert!(help.supports_autocomplete());
    }
}
