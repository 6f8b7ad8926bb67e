use {
    async_trait::async_trait,
    herald_config::HeraldConfig,
    std::{collections::BTreeMap, fmt::Write as _},
};

use crate::{
    command::Command,
    context::{AutocompleteRequest, Invocation, Reply},
    spec::{CommandOption, CommandSpec, OptionChoice, OptionKind},
};

/// What `help` knows about one registered command.
#[derive(Debug, Clone)]
pub struct CommandSummary {
    pub name: String,
    pub description: String,
    pub category: String,
}

impl CommandSummary {
    pub fn from_spec(spec: &CommandSpec) -> Self {
        Self {
            name: spec.name.clone(),
            description: spec.description.clone(),
            category: spec.category.clone(),
        }
    }
}

/// `/help` — lists registered commands grouped by category, with
/// autocomplete over command names.
pub struct HelpCommand {
    spec: CommandSpec,
    entries: Vec<CommandSummary>,
}

impl HelpCommand {
    /// The descriptor `help` registers under, exposed separately so the
    /// composition root can include `help` in its own listing.
    pub fn spec_template() -> CommandSpec {
        CommandSpec::new("help", "List available commands", "utility").option(
            CommandOption::new("command", "Show details for one command", OptionKind::String)
                .autocomplete(),
        )
    }

    pub fn new(entries: Vec<CommandSummary>) -> Self {
        Self {
            spec: Self::spec_template(),
            entries,
        }
    }

    fn overview(&self) -> String {
        let mut by_category: BTreeMap<&str, Vec<&CommandSummary>> = BTreeMap::new();
        for entry in &self.entries {
            by_category.entry(&entry.category).or_default().push(entry);
        }

        let mut out = String::from("Available commands:\n");
        for (category, entries) in by_category {
            let _ = writeln!(out, "\n**{category}**");
            for e in entries {
                let _ = writeln!(out, "`/{}` — {}", e.name, e.description);
            }
        }
        out
    }

    fn detail(&self, name: &str) -> Option<String> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| format!("`/{}` ({}) — {}", e.name, e.category, e.description))
    }
}

#[async_trait]
impl Command for HelpCommand {
    fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    async fn run(&self, invocation: &Invocation, _config: &HeraldConfig) -> anyhow::Result<()> {
        let reply = match invocation.str_option("command") {
            Some(name) => match self.detail(name) {
                Some(text) => Reply::ephemeral(text),
                None => Reply::ephemeral(format!("No command named `{name}`.")),
            },
            None => Reply::ephemeral(self.overview()),
        };
        invocation.responder.respond(reply).await
    }

    fn supports_autocomplete(&self) -> bool {
        true
    }

    async fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> anyhow::Result<Vec<OptionChoice>> {
        let needle = request.partial.to_lowercase();
        Ok(self
            .entries
            .iter()
            .filter(|e| e.name.to_lowercase().contains(&needle))
            .take(25)
            .map(|e| OptionChoice::new(&e.name, &e.name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::context::{Reply, Responder},
        std::sync::Arc,
    };

    struct NoopResponder;

    #[async_trait]
    impl Responder for NoopResponder {
        async fn respond(&self, _reply: Reply) -> anyhow::Result<()> {
            Ok(())
        }
        async fn defer(&self, _ephemeral: bool) -> anyhow::Result<()> {
            Ok(())
        }
        async fn edit(&self, _reply: Reply) -> anyhow::Result<()> {
            Ok(())
        }
        async fn suggest(&self, _choices: Vec<OptionChoice>) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn help_with(names: &[&str]) -> HelpCommand {
        HelpCommand::new(
            names
                .iter()
                .map(|n| CommandSummary {
                    name: n.to_string(),
                    description: "d".into(),
                    category: "utility".into(),
                })
                .collect(),
        )
    }

    fn request(partial: &str) -> AutocompleteRequest {
        AutocompleteRequest {
            user_id: herald_common::UserId(1),
            focused_option: "command".into(),
            partial: partial.into(),
            responder: Arc::new(NoopResponder),
        }
    }

    #[tokio::test]
    async fn autocomplete_filters_case_insensitively() {
        let help = help_with(&["ping", "uptime", "qrcode"]);
        let choices = help.autocomplete(&request("PI")).await.unwrap();
        assert_eq!(choices.len(), 1);
        assert_eq!(choices[0].value, "ping");
    }

    #[tokio::test]
    async fn autocomplete_caps_at_25() {
        let names: Vec<String> = (0..40).map(|i| format!("cmd{i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let help = help_with(&refs);
        let choices = help.autocomplete(&request("cmd")).await.unwrap();
        assert_eq!(choices.len(), 25);
    }

    #[test]
    fn overview_groups_by_category() {
        let help = HelpCommand::new(vec![
            CommandSummary {
                name: "a".into(),
                description: "first".into(),
                category: "one".into(),
            },
            CommandSummary {
                name: "b".into(),
                description: "second".into(),
                category: "two".into(),
            },
        ]);
        let text = help.overview();
        assert!(text.contains("**one**"));
        assert!(text.contains("**two**"));
        assert!(text.contains("`/a` — first"));
    }
}
