//! `hookline run` command handler

use std::io::Write;

use serde::Serialize;
use tracing::info;

use hookline_core::config::{FixtureMode, HooklineConfig, RunnerConfig};
use hookline_core::report::{SuiteReport, TestStatus};
use hookline_core::runner::Runner;
use hookline_core::scenarios::Scenario;

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// CLI flags override the `[runner]` section of the loaded configuration.
///
/// # Errors
///
/// Returns `CliError::TestsFailed` when the suite ran but any test or scope hook failed,
/// and `CliError::Core` when the overridden runner configuration is invalid.
pub async fn execute(
    args: RunArgs,
    config: HooklineConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let runner_config = apply_overrides(config.runner, &args);
    runner_config.validate()?;

    let scenario = Scenario::from(args.scenario);
    info!(
        %scenario,
        fixture_mode = %runner_config.fixture_mode,
        "running scenario"
    );

    let fixture_mode = runner_config.fixture_mode;
    let report = Runner::new(runner_config).run(scenario.build()).await?;

    let run = RunReport {
        scenario,
        description: scenario.description(),
        fixture_mode,
        show_timeline: args.timeline,
        report,
    };
    writer.render(&run)?;

    if !run.report.is_success() {
        return Err(CliError::TestsFailed {
            failed: run.report.failed(),
            scope_failures: run.report.scope_failures.len(),
        });
    }

    Ok(())
}

fn apply_overrides(mut runner: RunnerConfig, args: &RunArgs) -> RunnerConfig {
    if let Some(mode) = args.fixture_mode {
        runner.fixture_mode = mode.into();
    }
    if let Some(filter) = &args.filter {
        runner.filter = Some(filter.clone());
    }
    if let Some(n) = args.max_concurrency {
        runner.max_concurrency = n;
    }
    runner
}

/// Result of a scenario run.
///
/// The JSON form is the full [`SuiteReport`] plus the scenario it came from.
#[derive(Serialize)]
pub struct RunReport {
    pub scenario: Scenario,
    pub description: &'static str,
    pub fixture_mode: FixtureMode,
    #[serde(skip)]
    pub show_timeline: bool,
    #[serde(flatten)]
    pub report: SuiteReport,
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Suite: {} (scenario: {}, fixture mode: {})",
            self.report.suite.bold(),
            self.scenario,
            self.fixture_mode
        )?;
        writeln!(w, "  {}", self.description.dimmed())?;
        writeln!(w)?;

        for result in &self.report.results {
            let label = match result.status {
                TestStatus::Passed => "PASS".green().bold(),
                TestStatus::Failed => "FAIL".red().bold(),
                TestStatus::Skipped => "SKIP".yellow().bold(),
            };
            let concurrent = if result.concurrent {
                " [concurrent]"
            } else {
                ""
            };
            writeln!(
                w,
                "  {} {}{} ({}ms)",
                label,
                result.full_name(),
                concurrent,
                result.duration_ms
            )?;
            if let Some(failure) = &result.failure {
                writeln!(w, "       {}", failure.to_string().red())?;
            }
        }

        for scope in &self.report.scope_failures {
            writeln!(
                w,
                "  {} {} [{}]",
                "HOOK".red().bold(),
                scope.path.join(" > "),
                scope.phase
            )?;
            writeln!(w, "       {}", scope.failure.to_string().red())?;
        }

        if self.show_timeline {
            writeln!(w)?;
            writeln!(w, "Timeline:")?;
            for event in &self.report.timeline {
                match &event.test {
                    Some(test) => writeln!(
                        w,
                        "  {:>3} {:<12} {} > {}",
                        event.seq, event.phase.as_str(), event.scope, test
                    )?,
                    None => writeln!(
                        w,
                        "  {:>3} {:<12} {}",
                        event.seq,
                        event.phase.as_str(),
                        event.scope
                    )?,
                }
            }
        }

        writeln!(w)?;
        let verdict = if self.report.is_success() {
            "OK".green().bold()
        } else {
            "FAILED".red().bold()
        };
        writeln!(
            w,
            "{}: {} passed, {} failed, {} skipped ({} total) in {}ms",
            verdict,
            self.report.passed(),
            self.report.failed(),
            self.report.skipped(),
            self.report.results.len(),
            self.report.duration_ms
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{FixtureModeArg, ScenarioArg};

    fn args() -> RunArgs {
        RunArgs {
            scenario: ScenarioArg::Stale,
            fixture_mode: None,
            filter: None,
            max_concurrency: None,
            timeline: false,
        }
    }

    async fn run_report(scenario: Scenario, mode: FixtureMode, timeline: bool) -> RunReport {
        let runner = Runner::new(RunnerConfig {
            fixture_mode: mode,
            ..RunnerConfig::default()
        });
        let report = runner
            .run(scenario.build())
            .await
            .expect("runner should not error");
        RunReport {
            scenario,
            description: scenario.description(),
            fixture_mode: mode,
            show_timeline: timeline,
            report,
        }
    }

    fn render_text(report: &RunReport) -> String {
        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let mut args = args();
        args.fixture_mode = Some(FixtureModeArg::Isolated);
        args.filter = Some("email".to_owned());
        args.max_concurrency = Some(9);

        let runner = apply_overrides(RunnerConfig::default(), &args);
        assert_eq!(runner.fixture_mode, FixtureMode::Isolated);
        assert_eq!(runner.filter.as_deref(), Some("email"));
        assert_eq!(runner.max_concurrency, 9);
    }

    #[test]
    fn test_no_overrides_keep_config_values() {
        let config = RunnerConfig {
            max_concurrency: 3,
            fixture_mode: FixtureMode::Isolated,
            filter: Some("clear".to_owned()),
        };
        let runner = apply_overrides(config, &args());
        assert_eq!(runner.max_concurrency, 3);
        assert_eq!(runner.fixture_mode, FixtureMode::Isolated);
        assert_eq!(runner.filter.as_deref(), Some("clear"));
    }

    #[tokio::test]
    async fn test_render_text_stale_shows_failure() {
        let report = run_report(Scenario::Stale, FixtureMode::Shared, false).await;
        let output = render_text(&report);

        assert!(output.contains("scenario: stale"));
        assert!(output.contains("FAIL"));
        assert!(output.contains("should store the provided email value"));
        assert!(output.contains("test2@test.com"), "should show actual value");
        assert!(output.contains("4 passed, 1 failed, 0 skipped"));
        assert!(!output.contains("Timeline:"));
    }

    #[tokio::test]
    async fn test_render_text_fresh_is_ok() {
        let report = run_report(Scenario::Fresh, FixtureMode::Shared, false).await;
        let output = render_text(&report);

        assert!(!output.contains("FAIL"));
        assert!(output.contains("5 passed, 0 failed"));
        assert!(output.contains("[concurrent]"));
    }

    #[tokio::test]
    async fn test_render_text_timeline() {
        let report = run_report(Scenario::Fresh, FixtureMode::Shared, true).await;
        let output = render_text(&report);

        assert!(output.contains("Timeline:"));
        assert!(output.contains("before-all"));
        assert!(output.contains("after-all"));
    }

    #[tokio::test]
    async fn test_json_contains_report_and_scenario() {
        let report = run_report(Scenario::Stale, FixtureMode::Isolated, true).await;
        let json = serde_json::to_value(&report).expect("serialize");

        assert_eq!(json["scenario"], "stale");
        assert_eq!(json["fixture_mode"], "isolated");
        assert_eq!(json["suite"], "user");
        assert_eq!(json["results"].as_array().map(Vec::len), Some(5));
        assert!(json.get("show_timeline").is_none());
    }

    #[tokio::test]
    async fn test_execute_fails_with_tests_failed_for_stale() {
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let err = execute(args(), HooklineConfig::default(), &writer)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[tokio::test]
    async fn test_execute_rejects_zero_concurrency_override() {
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let mut args = args();
        args.max_concurrency = Some(0);
        let err = execute(args, HooklineConfig::default(), &writer)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
