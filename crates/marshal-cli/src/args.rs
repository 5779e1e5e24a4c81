//! CLI argument definitions using clap
//!
//! - marshal run <workflow> --snapshot FILE --invoker ID   # Run a workflow
//! - marshal inspect --snapshot FILE --invoker ID          # Readiness report
//! - marshal config show|init                              # Utility commands

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use marshal_core::target::FilterPreset;
use marshal_core::workflows::Workflow;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "marshal")]
#[command(about = "Marshal - chunked, phase-sequenced bulk actions against platform APIs")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a workflow against a platform snapshot
    Run(RunArgs),

    /// Show what the acting identity can reach
    Inspect(InspectArgs),

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Display the effective configuration
    Show,

    /// Write a configuration file with defaults
    Init {
        /// Path for the new configuration file
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Where to act and on whose behalf
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Platform snapshot (JSON) to load into the simulated platform
    #[arg(long)]
    pub snapshot: PathBuf,

    /// Acting identity; defaults to the snapshot's actor
    #[arg(long)]
    pub actor: Option<String>,

    /// Identity that requested the run
    #[arg(long)]
    pub invoker: String,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[arg(value_enum)]
    pub workflow: WorkflowArg,

    #[command(flatten)]
    pub target: TargetArgs,

    /// Member selection for filtered workflows
    #[arg(long, value_enum)]
    pub filter: Option<FilterArg>,

    /// Message for the announce workflow
    #[arg(long)]
    pub message: Option<String>,

    /// Channel name for provision-channels (repeatable)
    #[arg(long = "channel")]
    pub channels: Vec<String>,

    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowArg {
    MemberRemoval,
    MemberBan,
    FilteredRemoval,
    FilteredBan,
    Teardown,
    ChannelPurge,
    Announce,
    ProvisionChannels,
    Elevate,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterArg {
    Offline,
    Online,
    Bots,
}

impl From<FilterArg> for FilterPreset {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Offline => FilterPreset::Offline,
            FilterArg::Online => FilterPreset::Online,
            FilterArg::Bots => FilterPreset::Bots,
        }
    }
}

impl RunArgs {
    /// Combine the workflow name with its options
    pub fn workflow(&self) -> anyhow::Result<Workflow> {
        let preset = || -> anyhow::Result<FilterPreset> {
            self.filter
                .map(FilterPreset::from)
                .context("--filter is required for filtered workflows")
        };

        let workflow = match self.workflow {
            WorkflowArg::MemberRemoval => Workflow::MemberRemoval,
            WorkflowArg::MemberBan => Workflow::MemberBan,
            WorkflowArg::FilteredRemoval => Workflow::FilteredRemoval(preset()?),
            WorkflowArg::FilteredBan => Workflow::FilteredBan(preset()?),
            WorkflowArg::Teardown => Workflow::Teardown,
            WorkflowArg::ChannelPurge => Workflow::ChannelPurge,
            WorkflowArg::Announce => Workflow::Announce {
                message: self
                    .message
                    .clone()
                    .context("--message is required for announce")?,
            },
            WorkflowArg::Elevate => Workflow::Elevate,
            WorkflowArg::ProvisionChannels => {
                if self.channels.is_empty() {
                    bail!("at least one --channel is required for provision-channels");
                }
                Workflow::ProvisionChannels {
                    names: self.channels.clone(),
                }
            }
        };
        Ok(workflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn run_args(cli: Cli) -> RunArgs {
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_filtered_run() {
        let cli = parse(&[
            "marshal", "run", "filtered-ban", "--snapshot", "s.json", "--invoker", "boss",
            "--filter", "offline", "--yes",
        ]);
        let args = run_args(cli);
        assert!(args.yes);
        assert_eq!(
            args.workflow().unwrap(),
            Workflow::FilteredBan(FilterPreset::Offline)
        );
    }

    #[test]
    fn test_filtered_run_requires_filter() {
        let args = run_args(parse(&[
            "marshal", "run", "filtered-removal", "--snapshot", "s.json", "--invoker", "boss",
        ]));
        assert!(args.workflow().is_err());
    }

    #[test]
    fn test_repeated_channels() {
        let args = run_args(parse(&[
            "marshal", "--verbose", "run", "provision-channels", "--snapshot", "s.json",
            "--invoker", "boss", "--channel", "rules", "--channel", "news",
        ]));
        assert_eq!(
            args.workflow().unwrap(),
            Workflow::ProvisionChannels {
                names: vec!["rules".to_string(), "news".to_string()]
            }
        );
    }

    #[test]
    fn test_parse_elevate() {
        let args = run_args(parse(&[
            "marshal", "run", "elevate", "--snapshot", "s.json", "--invoker", "boss",
        ]));
        assert_eq!(args.workflow().unwrap(), Workflow::Elevate);
        assert!(!args.yes);
    }

    #[test]
    fn test_global_config_flag() {
        let cli = parse(&["marshal", "config", "show", "--config", "m.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("m.toml")));
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Show
            }
        ));
    }
}
