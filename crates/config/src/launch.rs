//! External process launch templates.

use serde::{Deserialize, Serialize};

/// Default launcher program.
pub const DEFAULT_PROGRAM: &str = "mvn";

/// Default entry point for a consensus participant.
pub const DEFAULT_PARTICIPANT_ENTRY: &str = "consensus.Main";

/// Default entry point for the ledger access service.
pub const DEFAULT_SERVICE_ENTRY: &str = "client.ClientLibrary";

/// Default entry point for the interactive client.
pub const DEFAULT_CLIENT_ENTRY: &str = "client.Client";

/// A fully rendered launch command: program plus argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    /// Program to execute.
    pub program: String,
    /// Positional arguments, in order.
    pub args: Vec<String>,
}

impl std::fmt::Display for LaunchCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Launch command template for the external system's processes.
///
/// The template consists of an interpreter/build invocation (`program` and
/// `args`), a fully-qualified entry point identifier substituted for
/// `{entry}`, and a positional argument list substituted, space-joined, for
/// `{args}`. The defaults render the reference deployment's
/// `mvn exec:java -Dexec.mainClass=<entry> -Dexec.args="<args>"` shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Launcher program.
    #[serde(default = "default_program")]
    pub program: String,

    /// Argument template; `{entry}` and `{args}` are substituted.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Entry point for consensus participants.
    #[serde(default = "default_participant_entry")]
    pub participant_entry: String,

    /// Entry point for the ledger access service.
    #[serde(default = "default_service_entry")]
    pub service_entry: String,

    /// Entry point for the interactive client.
    #[serde(default = "default_client_entry")]
    pub client_entry: String,

    /// Positional arguments for the ledger access service (ports).
    #[serde(default = "default_service_args")]
    pub service_args: Vec<String>,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            participant_entry: default_participant_entry(),
            service_entry: default_service_entry(),
            client_entry: default_client_entry(),
            service_args: default_service_args(),
        }
    }
}

impl LaunchConfig {
    /// Render a launch command for the given entry point and positional
    /// arguments.
    pub fn render(&self, entry: &str, positional: &[String]) -> LaunchCommand {
        let joined = positional.join(" ");
        let args = self
            .args
            .iter()
            .map(|template| template.replace("{entry}", entry).replace("{args}", &joined))
            .collect();
        LaunchCommand { program: self.program.clone(), args }
    }

    /// Launch command for a consensus participant, optionally carrying a
    /// declared behavior tag as an extra positional argument.
    pub fn participant(&self, name: &str, behavior: Option<&str>) -> LaunchCommand {
        let mut positional = vec![name.to_owned()];
        if let Some(tag) = behavior {
            positional.push(tag.to_owned());
        }
        self.render(&self.participant_entry, &positional)
    }

    /// Launch command for the ledger access service.
    pub fn service(&self) -> LaunchCommand {
        self.render(&self.service_entry, &self.service_args)
    }

    /// Launch command for the interactive client.
    pub fn client(&self, client_name: &str) -> LaunchCommand {
        self.render(&self.client_entry, &[client_name.to_owned()])
    }
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_owned()
}

fn default_args() -> Vec<String> {
    vec![
        "exec:java".to_owned(),
        "-Dexec.mainClass={entry}".to_owned(),
        "-Dexec.args={args}".to_owned(),
    ]
}

fn default_participant_entry() -> String {
    DEFAULT_PARTICIPANT_ENTRY.to_owned()
}

fn default_service_entry() -> String {
    DEFAULT_SERVICE_ENTRY.to_owned()
}

fn default_client_entry() -> String {
    DEFAULT_CLIENT_ENTRY.to_owned()
}

fn default_service_args() -> Vec<String> {
    vec!["8080".to_owned(), "8081".to_owned()]
}
