//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hookline_core::config::FixtureMode;
use hookline_core::scenarios::Scenario;

/// hookline -- test lifecycle sequencer.
///
/// Use `hookline <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "hookline", version, about, long_about = None)]
pub struct Cli {
    /// Path to the hookline.toml configuration file (defaults are used if missing).
    #[arg(short, long, global = true, default_value = "hookline.toml")]
    pub config: PathBuf,

    /// Override log level.
    #[arg(long, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

/// Log levels accepted by `--log-level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevelArg {
    /// Level name as written in `[general] log_level`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a built-in user scenario and report per-test results.
    Run(RunArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run one of the built-in user scenarios.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Scenario to run.
    #[arg(short, long, default_value = "fresh")]
    pub scenario: ScenarioArg,

    /// Override how the fixture is shared between test cases.
    #[arg(long)]
    pub fixture_mode: Option<FixtureModeArg>,

    /// Only run tests whose full name contains this string.
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Override the number of concurrent test cases allowed at once.
    #[arg(long)]
    pub max_concurrency: Option<usize>,

    /// Print the lifecycle timeline after the results (text output only).
    #[arg(long)]
    pub timeline: bool,
}

/// Built-in scenarios selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioArg {
    /// User created once, no reconstructing hook.
    Stale,
    /// before_each reconstructs the user.
    Fresh,
    /// after_each restores the user.
    Reset,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Stale => Scenario::Stale,
            ScenarioArg::Fresh => Scenario::Fresh,
            ScenarioArg::Reset => Scenario::Reset,
        }
    }
}

/// Fixture sharing modes selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FixtureModeArg {
    /// One fixture shared by the whole scope tree.
    Shared,
    /// Each test case works on its own copy.
    Isolated,
}

impl From<FixtureModeArg> for FixtureMode {
    fn from(arg: FixtureModeArg) -> Self {
        match arg {
            FixtureModeArg::Shared => FixtureMode::Shared,
            FixtureModeArg::Isolated => FixtureMode::Isolated,
        }
    }
}

// ---- config ----

/// Manage hookline configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, runner).
        #[arg(long)]
        section: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_parse_run_defaults() {
        let cli = Cli::try_parse_from(["hookline", "run"]).expect("parse succeeded");
        assert_eq!(cli.config, PathBuf::from("hookline.toml"));
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(cli.log_level.is_none());
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.scenario, ScenarioArg::Fresh);
                assert!(args.fixture_mode.is_none());
                assert!(args.filter.is_none());
                assert!(args.max_concurrency.is_none());
                assert!(!args.timeline);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_all_flags() {
        let cli = Cli::try_parse_from([
            "hookline",
            "run",
            "--scenario",
            "stale",
            "--fixture-mode",
            "isolated",
            "--filter",
            "email",
            "--max-concurrency",
            "2",
            "--timeline",
        ])
        .expect("parse succeeded");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.scenario, ScenarioArg::Stale);
                assert_eq!(args.fixture_mode, Some(FixtureModeArg::Isolated));
                assert_eq!(args.filter.as_deref(), Some("email"));
                assert_eq!(args.max_concurrency, Some(2));
                assert!(args.timeline);
            }
            _ => panic!("expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_rejects_unknown_scenario() {
        let result = Cli::try_parse_from(["hookline", "run", "--scenario", "flaky"]);
        assert!(result.is_err(), "unknown scenario should be rejected");
    }

    #[test]
    fn test_cli_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "hookline",
            "run",
            "--output",
            "json",
            "--log-level",
            "debug",
            "--config",
            "/tmp/custom.toml",
        ])
        .expect("parse succeeded");
        assert_eq!(cli.output, OutputFormat::Json);
        assert_eq!(cli.log_level, Some(LogLevelArg::Debug));
        assert_eq!(cli.config, PathBuf::from("/tmp/custom.toml"));
    }

    #[test]
    fn test_cli_parse_rejects_unknown_log_level() {
        let result = Cli::try_parse_from(["hookline", "--log-level", "verbose", "run"]);
        assert!(result.is_err(), "unknown log level should be rejected");
    }

    #[test]
    fn test_log_level_arg_names_pass_config_validation() {
        for level in LogLevelArg::value_variants() {
            let mut config = hookline_core::config::HooklineConfig::default();
            config.general.log_level = level.as_str().to_owned();
            assert!(config.validate().is_ok(), "{level:?}");
        }
    }

    #[test]
    fn test_cli_parse_config_validate() {
        let cli = Cli::try_parse_from(["hookline", "config", "validate"]).expect("parse");
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.action, ConfigAction::Validate)),
            _ => panic!("expected Config command"),
        }
    }

    #[test]
    fn test_cli_parse_config_show_section() {
        let cli = Cli::try_parse_from(["hookline", "config", "show", "--section", "runner"])
            .expect("parse");
        match cli.command {
            Commands::Config(ConfigArgs {
                action: ConfigAction::Show { section },
            }) => assert_eq!(section.as_deref(), Some("runner")),
            _ => panic!("expected Config Show command"),
        }
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["hookline"]).is_err());
    }

    #[test]
    fn test_scenario_arg_maps_to_core_scenario() {
        assert_eq!(Scenario::from(ScenarioArg::Stale), Scenario::Stale);
        assert_eq!(Scenario::from(ScenarioArg::Fresh), Scenario::Fresh);
        assert_eq!(Scenario::from(ScenarioArg::Reset), Scenario::Reset);
    }

    #[test]
    fn test_fixture_mode_arg_maps_to_core_mode() {
        assert_eq!(
            FixtureMode::from(FixtureModeArg::Isolated),
            FixtureMode::Isolated
        );
        assert_eq!(FixtureMode::from(FixtureModeArg::Shared), FixtureMode::Shared);
    }
}
