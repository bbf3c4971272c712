mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use hookline_core::config::HooklineConfig;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 설정 로딩 실패는 명령 실행 시점에 보고하고, 로깅은 기본값으로 시작
    let loaded = HooklineConfig::load_or_default(&cli.config).await;
    let mut general = loaded
        .as_ref()
        .map(|c| c.general.clone())
        .unwrap_or_default();
    if let Some(level) = cli.log_level {
        general.log_level = level.as_str().to_owned();
    }

    if let Err(e) = logging::init_tracing(&general) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        return ExitCode::from(1);
    }

    tracing::debug!(config = %cli.config.display(), "hookline starting");

    let writer = OutputWriter::new(cli.output);
    let result = match cli.command {
        Commands::Run(args) => match loaded {
            Ok(config) => commands::run::execute(args, config, &writer).await,
            Err(e) => Err(CliError::from(e)),
        },
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // 테스트 실패는 리포트에 이미 나타나므로 한 줄 요약만 출력
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
