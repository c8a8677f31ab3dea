use std::process::ExitCode;

use api_quest::Config;
use api_quest::Harness;
use api_quest::outputter::OutPutter;
use api_quest::parser::Suite;
use api_quest::runner::run_suite;
use api_quest::validator::IR;
use api_quest::validator::ValidationError;
use api_quest::validator::Validator;
use clap::Parser;
use miette::Diagnostic;
use miette::Result;
use thiserror::Error;

use crate::cli::Cli;

mod cli;

#[derive(Error, Debug, Diagnostic)]
pub enum QuestError {
    #[error("Failed to read toml file")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse toml file")]
    TomlParsing(#[from] toml::de::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    ValidationError(#[from] ValidationError),
}

/// Reads the suite file named on the command line and validates it.
///
/// The base URL given with `--base-url` replaces the one from the file before
/// validation, so every target is checked against the URL actually used.
fn load_and_validate_config(cli: &Cli) -> Result<(IR, Config), QuestError> {
    let contents = std::fs::read_to_string(&cli.path).map_err(QuestError::FileError)?;
    let suite: Suite = toml::from_str(&contents).map_err(QuestError::TomlParsing)?;

    let mut validator = Validator::new(&suite, contents.as_str(), cli.path.as_str());
    if let Some(base_url) = &cli.base_url {
        validator = validator.with_base_url(base_url);
    }

    let (ir, config) = validator
        .validate()
        .map_err(QuestError::ValidationError)?;

    Ok((ir, config))
}

fn print_with_color(s: &str) {
    println!("{}", console::style(s).bold().yellow());
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let (ir, config) = load_and_validate_config(&cli)?;

    print_with_color(&format!("[SETUP] base URL set to {} ⚙️", config.base_url()));
    let harness = Harness::with_config(config);

    let mut outputter = OutPutter::start(&cli.path, harness.config().base_url(), ir.tests.len());
    let summary = run_suite(&harness, ir, &mut outputter).await;

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
