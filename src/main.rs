use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use version_align::alignment::align;
use version_align::config::{self, AlignmentConfig};
use version_align::relocation::parse_relocations;
use version_align::report::compare_projects;
use version_align::session::{SessionDocument, load_modules, write_modules};

#[derive(Parser)]
#[command(name = "version-align")]
#[command(version, about = "Align dependency and plugin versions across a multi-module build")]
struct Cli {
    /// Write logs to a file instead of stderr (defaults to the data directory)
    #[arg(long, global = true, num_args = 0..=1, require_equals = true)]
    log_file: Option<Option<PathBuf>>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an alignment pass over a session document and print the changes
    Align {
        session: PathBuf,

        /// Configuration override, e.g. -D strictAlignment=true
        #[arg(short = 'D', value_name = "KEY=VALUE", value_parser = parse_key_value)]
        define: Vec<(String, String)>,

        /// Write the aligned modules as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Compare two module sets and print what changed
    Compare {
        before: PathBuf,
        after: PathBuf,

        /// Relocation rule used to match moved artifacts
        #[arg(long = "relocation")]
        relocations: Vec<String>,

        /// Also list matched entries whose version did not change
        #[arg(long)]
        report_non_aligned: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.log_file.as_ref(), cli.json_logs)?;

    match cli.command {
        Command::Align {
            session,
            define,
            output,
        } => run_align(&session, define, output.as_deref()),
        Command::Compare {
            before,
            after,
            relocations,
            report_non_aligned,
        } => run_compare(&before, &after, &relocations, report_non_aligned),
    }
}

fn run_align(
    path: &Path,
    define: Vec<(String, String)>,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let session = SessionDocument::load(path)?;
    let config = session.config.clone().with_properties(define)?;
    let relocations = session.relocation_table()?;
    let targets = session.target_source();
    let mut forest = session.forest()?;

    let outcome = align(&mut forest, &config, &targets, &relocations)
        .with_context(|| format!("alignment of {} failed", path.display()))?;
    for unresolved in &outcome.unresolved_properties {
        info!(
            "Property {} referenced from {} is not declared anywhere",
            unresolved.property, unresolved.module
        );
    }

    let aligned = forest.into_modules();
    let report = compare_projects(&config, &relocations, &session.modules, &aligned);
    print!("{report}");

    if let Some(output) = output {
        write_modules(output, &aligned)?;
        info!("Wrote aligned modules to {}", output.display());
    }
    Ok(())
}

fn run_compare(
    before: &Path,
    after: &Path,
    relocations: &[String],
    report_non_aligned: bool,
) -> anyhow::Result<()> {
    let config = AlignmentConfig {
        report_non_aligned,
        ..Default::default()
    };
    let relocations = parse_relocations(relocations)?;
    let before = load_modules(before)?;
    let after = load_modules(after)?;

    let report = compare_projects(&config, &relocations, &before, &after);
    print!("{report}");
    Ok(())
}

fn init_logging(
    log_file: Option<&Option<PathBuf>>,
    json: bool,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (writer, guard) = match log_file {
        Some(path) => {
            let path = path.clone().unwrap_or_else(config::log_path);
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create log directory {}", dir.display()))?;
            let file_name = path
                .file_name()
                .context("log file path has no file name")?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(writer), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(false);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install logger: {err}"))?;

    Ok(guard)
}
