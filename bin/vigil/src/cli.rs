//! Contains the CLI for the `vigil` harness.

use std::path::PathBuf;

use clap::Parser;
use vigil_config::HarnessConfig;
use vigil_scenario::{library, Scenario};

/// Input channel variants selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub(crate) enum ChannelKind {
    /// Write tokens into the client's input stream.
    Direct,
    /// Emit keystrokes into the client's window (requires a host input
    /// automation backend).
    Simulated,
}

/// CLI arguments for the vigil harness.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Scenario-driven black-box test harness for a BFT ledger")]
pub(crate) struct Cli {
    /// Scenario to run (see --list).
    pub scenario: Option<String>,

    /// Path to the harness configuration file (TOML or JSON).
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// List the built-in scenarios and exit.
    #[arg(short, long)]
    pub list: bool,

    /// How to deliver the interaction script to the client.
    #[arg(long, value_enum, default_value = "direct")]
    pub channel: ChannelKind,

    /// Override the working directory external processes launch from.
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl Cli {
    /// Load the harness configuration, applying CLI overrides.
    pub(crate) fn load_config(&self) -> eyre::Result<HarnessConfig> {
        let mut config = HarnessConfig::load(self.config.as_deref())?;
        if let Some(ref root) = self.root {
            config.paths.root = root.clone();
        }
        Ok(config)
    }

    /// Run the selected scenario to a verdict.
    pub(crate) fn run(self) -> eyre::Result<()> {
        if self.list {
            for spec in library::all() {
                println!("{}", spec.name());
            }
            return Ok(());
        }

        let Some(name) = self.scenario.as_deref() else {
            eyre::bail!("no scenario given; use --list to see what is available");
        };
        if self.channel == ChannelKind::Simulated {
            // The automation capability is host-specific and not bundled;
            // wire one up through the library API instead.
            eyre::bail!("no input automation backend is available on this host");
        }

        let config = self.load_config()?;
        let spec = library::find(name)?;
        tracing::info!(scenario = name, "running scenario");

        let report = Scenario::new(config, spec).run()?;
        println!("{report}");

        if !report.verdict.passed() {
            std::process::exit(1);
        }
        Ok(())
    }
}
