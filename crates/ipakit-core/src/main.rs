//! ipakit – command-line ZIP → IPA converter.
//!
//! ```text
//! ipakit convert App.zip            # writes App.ipa next to the input
//! ipakit convert App.zip out/App    # writes out/App.ipa
//! ipakit inspect App.zip            # prints the archive inventory as JSON
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use ipakit_core::inspect::{self, Inspection};
use ipakit_core::transform::TransformKind;
use ipakit_core::upload::IPA_EXTENSION;
use ipakit_core::validate::Validator;

#[derive(Debug, Parser)]
#[command(name = "ipakit", version, about = "Convert ZIP archives to IPA files with Xcode detection")]
struct Cli {
    /// Log pipeline details to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a ZIP archive into an IPA file.
    Convert {
        /// Path to the input ZIP file.
        input: PathBuf,
        /// Path for the output IPA file (`.ipa` is appended if missing).
        output: Option<PathBuf>,
        /// Transform to apply: `copy` or `payload`.
        #[arg(long, default_value_t = TransformKind::Copy)]
        transform: TransformKind,
    },
    /// List the files, directories and Xcode markers inside a ZIP archive.
    Inspect {
        /// Path to the input ZIP file.
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Convert {
            input,
            output,
            transform,
        } => convert(&input, output, transform).await,
        Command::Inspect { input } => inspect_archive(&input).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn convert(input: &Path, output: Option<PathBuf>, kind: TransformKind) -> Result<()> {
    if !input.is_file() {
        bail!("input file '{}' does not exist", input.display());
    }

    let validator = Validator::new();
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if validator.check_declared_type(&name, None).is_err() {
        warn!(input = %input.display(), "input file does not have a .zip extension");
    }
    validator
        .check_signature(input)
        .await
        .with_context(|| format!("'{}' is not a ZIP archive", input.display()))?;

    let output = output_path(input, output);
    let inspection = inspect_blocking(input).await;
    if let Err(e) = &inspection {
        warn!(error = %e, "archive contents could not be listed; converting anyway");
    }

    let transformer = kind.build();
    let (src, dst) = (input.to_path_buf(), output.clone());
    let cancel = CancellationToken::new();
    let report = tokio::task::spawn_blocking(move || transformer.transform(&src, &dst, &cancel))
        .await
        .context("transform task panicked")?
        .with_context(|| format!("error during conversion of '{}'", input.display()))?;
    debug!(?report, "transform report");

    println!(
        "\n✓ Successfully converted '{}' to '{}'",
        input.display(),
        output.display()
    );
    if let Ok(found) = inspection {
        print_summary(&found);
    }
    Ok(())
}

async fn inspect_archive(input: &Path) -> Result<()> {
    let found = inspect_blocking(input).await?;
    println!("{}", serde_json::to_string_pretty(&found)?);
    Ok(())
}

async fn inspect_blocking(input: &Path) -> Result<Inspection> {
    let path = input.to_path_buf();
    let found = tokio::task::spawn_blocking(move || inspect::inspect(&path))
        .await
        .context("inspect task panicked")??;
    Ok(found)
}

fn print_summary(found: &Inspection) {
    println!("  Files detected: {}", found.file_count());
    println!("  Directories detected: {}", found.directory_count());
    if found.xcode_detection.has_xcode_project {
        println!("  Xcode Project: Yes ✓");
    } else {
        println!("  Xcode Project: No");
        println!(
            "  Warning: ZIP does not contain recognizable Xcode project files. \
             Converted anyway."
        );
    }
}

/// Default to `<input stem>.ipa`; append `.ipa` to an explicit output that lacks it.
fn output_path(input: &Path, output: Option<PathBuf>) -> PathBuf {
    match output {
        None => input.with_extension(IPA_EXTENSION),
        Some(out) => {
            let has_ipa = out
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(IPA_EXTENSION));
            if has_ipa {
                out
            } else {
                let mut s = out.into_os_string();
                s.push(".");
                s.push(IPA_EXTENSION);
                PathBuf::from(s)
            }
        }
    }
}
