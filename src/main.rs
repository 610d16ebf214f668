use std::path::{Path, PathBuf};

use chrono::Utc;
use churnlens_core::{ChurnConfig, OutputFormat, VcsKind};
use churnlens_history::{open_backend, HistoryOptions};
use churnlens_report::{ChurnReportBuilder, ReportOptions};
use churnlens_structure::TreeSitterParser;
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "churnlens",
    version,
    about = "Find the files that change most, and the classes and methods your diff touches in them",
    long_about = "churnlens ranks files by how often version control says they changed, then\n\
                   matches the uncommitted diff against each file's classes and methods.\n\n\
                   Examples:\n  \
                     churnlens                              Report on the current repository\n  \
                     churnlens report --min-churn 10        Only files changed 10+ times\n  \
                     churnlens report --start-date '3 months ago'\n  \
                     churnlens report --diff-base main      Compare the working tree with main\n  \
                     churnlens --format json report         Machine-readable output\n  \
                     churnlens init                         Write a default .churnlens.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .churnlens.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the report.\n\n\
                       Formats:\n  \
                         text      Human-readable table (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Rank churned files and the entities the current diff touches
    #[command(long_about = "Rank churned files and the entities the current diff touches.\n\n\
        Counts how many log entries mention each file, keeps files at or above the\n\
        threshold, and matches the working-copy diff against their classes and methods.\n\n\
        Examples:\n  churnlens report --path ~/src/app\n  churnlens report --backend svn --limit 20")]
    Report(ReportArgs),
    /// Write a default .churnlens.toml in the current directory
    Init,
    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Default)]
struct ReportArgs {
    /// Working copy path (default: current directory)
    #[arg(long)]
    path: Option<PathBuf>,

    /// Version-control backend (default: from config, else git)
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Minimum number of changes for a file to be reported (default: 5)
    #[arg(long)]
    min_churn: Option<u32>,

    /// Only count changes after this date, e.g. 2024-01-01 or "90 days ago"
    #[arg(long)]
    start_date: Option<String>,

    /// Revision to diff the working tree against (default: the index)
    #[arg(long)]
    diff_base: Option<String>,

    /// Worker threads for entity matching (default: number of CPUs)
    #[arg(long)]
    jobs: Option<usize>,

    /// Maximum files to show (default: all)
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendChoice {
    /// Detect from the working copy
    Auto,
    /// git repository
    Git,
    /// Subversion working copy
    Svn,
}

const DEFAULT_CONFIG: &str = r#"# churnlens configuration

[churn]
# Files changed fewer times than this are left out of the report.
# minimum_churn_count = 5

# Only count changes after this date: "2024-01-01", "90 days ago",
# "6 weeks ago", "3 months ago", "1 year ago".
# start_date = "6 months ago"

# Version-control system: "git" or "svn".
# backend = "git"

# Diff the working tree against this revision instead of the index.
# diff_base = "main"

# Worker threads for matching; 0 uses one per CPU.
# jobs = 0

[output]
# Maximum files to print; 0 prints all.
# limit = 0
"#;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(explicit: Option<&Path>) -> Result<ChurnConfig> {
    let config = match explicit {
        Some(path) => ChurnConfig::from_file(path)
            .wrap_err_with(|| format!("failed to load {}", path.display()))?,
        None => {
            let default_path = Path::new(".churnlens.toml");
            if default_path.exists() {
                ChurnConfig::from_file(default_path)?
            } else {
                ChurnConfig::default()
            }
        }
    };
    Ok(config)
}

fn detect_backend(path: &Path) -> Result<VcsKind> {
    if git2::Repository::discover(path).is_ok() {
        return Ok(VcsKind::Git);
    }
    if path.ancestors().any(|dir| dir.join(".svn").is_dir()) {
        return Ok(VcsKind::Svn);
    }
    miette::bail!(miette::miette!(
        help = "Run churnlens inside a git or subversion working copy, or specify --path to one",
        "No working copy found at {}",
        path.display()
    ));
}

fn run_report(args: ReportArgs, config: ChurnConfig, format: OutputFormat) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));
    let path = path
        .canonicalize()
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot access {}", path.display()))?;

    let mut settings = config.churn;
    if let Some(minimum) = args.min_churn {
        settings.minimum_churn_count = minimum;
    }
    if args.start_date.is_some() {
        settings.start_date = args.start_date;
    }
    if args.diff_base.is_some() {
        settings.diff_base = args.diff_base;
    }
    if let Some(jobs) = args.jobs {
        settings.jobs = jobs;
    }
    let limit = args.limit.unwrap_or(config.output.limit);

    let kind = match args.backend {
        None => settings.backend,
        Some(BackendChoice::Git) => VcsKind::Git,
        Some(BackendChoice::Svn) => VcsKind::Svn,
        Some(BackendChoice::Auto) => detect_backend(&path)?,
    };

    let today = Utc::now().date_naive();
    let since = settings.resolve_start_date(today)?;
    debug!(%kind, ?since, minimum = settings.minimum_churn_count, "starting report");

    let opened = open_backend(
        kind,
        &path,
        HistoryOptions {
            since,
            diff_base: settings.diff_base.clone(),
        },
    )?;
    let parser = TreeSitterParser::new(&opened.root);

    let report = ChurnReportBuilder::new(opened.backend.as_ref(), &parser)
        .options(ReportOptions {
            minimum_churn_count: settings.minimum_churn_count,
            jobs: settings.jobs,
        })
        .build()?;

    print!(
        "{}",
        churnlens_report::output::render(&report, format, limit)?
    );
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref())?;
            run_report(ReportArgs::default(), config, cli.format)?;
        }
        Some(Command::Report(args)) => {
            let config = load_config(cli.config.as_deref())?;
            run_report(args, config, cli.format)?;
        }
        Some(Command::Init) => {
            let path = Path::new(".churnlens.toml");
            if path.exists() {
                miette::bail!(".churnlens.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .churnlens.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "churnlens", &mut std::io::stdout());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_config_parses_to_defaults() {
        let config = ChurnConfig::from_toml(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.churn.minimum_churn_count, 5);
        assert_eq!(config.churn.backend, VcsKind::Git);
        assert!(config.churn.start_date.is_none());
        assert_eq!(config.output.limit, 0);
    }

    #[test]
    fn report_flags_parse() {
        let cli = Cli::try_parse_from([
            "churnlens",
            "--format",
            "json",
            "report",
            "--backend",
            "svn",
            "--min-churn",
            "10",
            "--start-date",
            "3 months ago",
            "--jobs",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        let Some(Command::Report(args)) = cli.command else {
            panic!("expected report subcommand");
        };
        assert!(matches!(args.backend, Some(BackendChoice::Svn)));
        assert_eq!(args.min_churn, Some(10));
        assert_eq!(args.start_date.as_deref(), Some("3 months ago"));
        assert_eq!(args.jobs, Some(2));
        assert!(args.limit.is_none());
    }
}
