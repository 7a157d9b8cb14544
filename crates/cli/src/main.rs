//! `pyrelease` command line.
//!
//! Loads release options, resolves the next version of every package and
//! prints the version report as JSON on stdout.
//!
//! Exit codes: 0 success, 2 configuration, 3 resolution, 4 manifest,
//! 5 git or filesystem, 1 anything else.

mod prompt;
mod tracing;

use crate::prompt::TerminalPrompt;
use crate::tracing::{LogLevel, TracingFormat, init_tracing};
use clap::Parser;
use pyrelease_version::{Error, ErrorCategory, VersionOptions, VersionOrchestrator};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Parser)]
#[command(name = "pyrelease")]
#[command(about = "Resolve and write release versions for Python packages")]
#[command(version)]
struct Cli {
    /// Workspace root containing the packages
    #[arg(short, long, default_value = ".")]
    workspace_root: PathBuf,

    /// JSON file with release options
    #[arg(short, long)]
    options: Option<PathBuf>,

    /// Explicit specifier (bump keyword or exact version), overriding the options file
    #[arg(short, long)]
    specifier: Option<String>,

    /// Prerelease identifier, overriding the options file
    #[arg(long)]
    preid: Option<String>,

    /// Resolve versions without writing manifests
    #[arg(long)]
    dry_run: bool,

    /// Log level
    #[arg(long, value_enum, default_value_t)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t)]
    log_format: TracingFormat,
}

impl Cli {
    fn load_options(&self) -> pyrelease_version::Result<VersionOptions> {
        let mut options = match &self.options {
            Some(path) => VersionOptions::from_json_file(path)?,
            None => VersionOptions::default(),
        };
        if let Some(specifier) = &self.specifier {
            options.specifier = Some(specifier.clone());
        }
        if let Some(preid) = &self.preid {
            options.preid = Some(preid.clone());
        }
        options.dry_run |= self.dry_run;
        Ok(options)
    }
}

/// Process exit code for a failed run.
const fn exit_code(category: Option<ErrorCategory>) -> u8 {
    match category {
        Some(ErrorCategory::Configuration) => 2,
        Some(ErrorCategory::Resolution) => 3,
        Some(ErrorCategory::Manifest) => 4,
        Some(ErrorCategory::Io) => 5,
        None => 1,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(report) => {
            let category = report.downcast_ref::<Error>().map(Error::category);
            #[allow(clippy::print_stderr)]
            {
                eprintln!("{report:?}");
            }
            ExitCode::from(exit_code(category))
        }
    }
}

async fn run(cli: Cli) -> miette::Result<()> {
    init_tracing(cli.log_level, cli.log_format)?;

    let options = cli.load_options()?;
    let result = VersionOrchestrator::new(&cli.workspace_root, options)
        .with_prompt(Box::new(TerminalPrompt::stdin()))
        .run()
        .await?;

    let mut report = serde_json::to_string_pretty(&result.data)
        .map_err(|e| miette::miette!("Failed to serialize the version report: {e}"))?;
    report.push('\n');
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(report.as_bytes())
        .await
        .map_err(|e| miette::miette!("Failed to write the version report: {e}"))?;
    stdout
        .flush()
        .await
        .map_err(|e| miette::miette!("Failed to write the version report: {e}"))?;

    Ok(())
}
