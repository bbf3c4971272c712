//! `hookline config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use hookline_core::config::HooklineConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
const SECTIONS: [&str; 2] = ["general", "runner"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Execute the config validate subcommand.
///
/// Unlike `run` and `show`, a missing file is reported as invalid here.
///
/// # Errors
///
/// Returns `CliError::Config` if the file is missing, malformed, or holds invalid values.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = validation_report(config_path, HooklineConfig::load(config_path).await);
    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }

    Ok(())
}

fn validation_report<T, E: std::fmt::Display>(
    config_path: &Path,
    result: Result<T, E>,
) -> ConfigValidationReport {
    match result {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    }
}

/// Execute the config show subcommand.
///
/// Displays the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::Core` if loading fails or `CliError::Command` if the section name is invalid.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading configuration");

    let config = HooklineConfig::load_or_default(config_path).await?;
    let report = config_report(&config, config_path, section)?;
    writer.render(&report)?;

    Ok(())
}

fn config_report(
    config: &HooklineConfig,
    config_path: &Path,
    section: Option<String>,
) -> Result<ConfigReport, CliError> {
    let config_toml = match section.as_deref() {
        None => toml::to_string_pretty(config),
        Some("general") => toml::to_string_pretty(&config.general),
        Some("runner") => toml::to_string_pretty(&config.runner),
        Some(other) => {
            return Err(CliError::Command(format!(
                "unknown section: {} (expected: {})",
                other,
                SECTIONS.join(", ")
            )));
        }
    }
    .unwrap_or_else(|e| format!("(serialization error: {})", e));

    Ok(ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
        config: config.clone(),
    })
}

/// Configuration display report.
///
/// Text output shows the TOML form; JSON output carries the structured config.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
    /// Effective configuration
    pub config: HooklineConfig,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Configuration validation report.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    /// Configuration file path
    pub source: String,
    /// Whether the configuration is valid
    pub valid: bool,
    /// Validation error messages (empty if valid)
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;

        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(report: &impl Render) -> String {
        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        String::from_utf8(buffer).expect("valid UTF-8")
    }

    #[test]
    fn test_config_report_full_config_contains_both_sections() {
        let report =
            config_report(&HooklineConfig::default(), Path::new("hookline.toml"), None)
                .expect("report");

        let output = render(&report);
        assert!(output.contains("hookline.toml"));
        assert!(output.contains("[general]"));
        assert!(output.contains("[runner]"));
        assert!(output.contains("fixture_mode"));
    }

    #[test]
    fn test_config_report_runner_section_only() {
        let report = config_report(
            &HooklineConfig::default(),
            Path::new("hookline.toml"),
            Some("runner".to_owned()),
        )
        .expect("report");

        let output = render(&report);
        assert!(output.contains("[runner]"), "should show section label");
        assert!(output.contains("max_concurrency = 5"));
        assert!(!output.contains("log_level"));
    }

    #[test]
    fn test_config_report_unknown_section_is_command_error() {
        let err = config_report(
            &HooklineConfig::default(),
            Path::new("hookline.toml"),
            Some("ebpf".to_owned()),
        )
        .err()
        .expect("unknown section should fail");
        assert_eq!(err.exit_code(), 1);
        assert!(err.to_string().contains("general, runner"));
    }

    #[test]
    fn test_config_report_json_skips_toml_text() {
        let report = config_report(
            &HooklineConfig::default(),
            Path::new("test.toml"),
            Some("general".to_owned()),
        )
        .expect("report");

        let json = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(json["source"].as_str(), Some("test.toml"));
        assert_eq!(json["section"].as_str(), Some("general"));
        assert_eq!(json["config"]["runner"]["fixture_mode"], "shared");
        assert!(json.get("config_toml").is_none());
    }

    #[test]
    fn test_validation_report_valid() {
        let report = validation_report::<(), String>(Path::new("hookline.toml"), Ok(()));
        let output = render(&report);
        assert!(report.valid);
        assert!(output.contains("VALID"));
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn test_validation_report_invalid() {
        let report = validation_report::<(), String>(
            Path::new("bad.toml"),
            Err("invalid config value for 'runner.max_concurrency'".to_owned()),
        );
        let output = render(&report);
        assert!(!report.valid);
        assert!(output.contains("INVALID"));
        assert!(output.contains("runner.max_concurrency"));

        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["valid"].as_bool(), Some(false));
        assert_eq!(json["errors"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_validate_missing_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let writer = OutputWriter::new(crate::cli::OutputFormat::Json);
        let err = execute_validate(&dir.path().join("missing.toml"), &writer)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
