use std::cell::RefCell;
use std::io::IsTerminal;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use miette::{IntoDiagnostic, Result, WrapErr};

use turbulence_core::{OutputFormat, Phase, ProgressReporter, TurbulenceConfig};
use turbulence_engine::{analyzer_for, history_source_for, render, Turbulence};

const CONFIG_FILE: &str = ".turbulence.toml";

#[derive(Parser)]
#[command(
    name = "turbulence",
    version,
    about = "Churn vs. complexity for Ruby projects",
    long_about = "Turbulence finds the files that change most and are hardest to change.\n\n\
                   For every Ruby file under app/models, app/controllers, app/helpers and lib\n\
                   it measures churn (lines added + deleted across git history) and complexity\n\
                   (the flog score), and reports both side by side.\n\n\
                   Examples:\n  \
                     turbulence report                  Rank files in the current project\n  \
                     turbulence report --path ../shop   Rank files in another project\n  \
                     turbulence --format json report    Emit the metrics map as JSON\n  \
                     turbulence --format plot report -o cc.json  Write scatter-plot series\n  \
                     turbulence init                    Create a .turbulence.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: <project>/.turbulence.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for the report.\n\n\
                       Formats:\n  \
                         text      Ranked table (default)\n  \
                         json      {path: {churn, complexity}} map\n  \
                         markdown  GitHub-flavored Markdown table\n  \
                         plot      Scatter-plot series grouped by directory, as JSON"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Compute churn and complexity for every source file
    #[command(long_about = "Compute churn and complexity for every source file.\n\n\
        Reads the full git history (all branches, renames and copies detected) and runs\n\
        the complexity analyzer once per file. Files the analyzer cannot parse are\n\
        reported and skipped; any other failure stops the run.\n\n\
        Examples:\n  turbulence report --path .\n  turbulence report --limit 20\n  turbulence --format json report --output metrics.json")]
    Report {
        /// Project root (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Write the report to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Maximum rows in text and markdown tables
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Create a default .turbulence.toml configuration file
    #[command(long_about = "Create a default .turbulence.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .turbulence.toml already exists.")]
    Init {
        /// Project root (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const DEFAULT_CONFIG: &str = r#"# Turbulence Configuration
# Measured files: app/models, app/controllers, app/helpers and lib (**/*.rb)

[history]
# "git-cli" runs `git log --all -M -C --numstat`; "libgit2" reads the repository in-process
# backend = "git-cli"
# git = "git"

[complexity]
# Run once per file as: <command> [args...] <file>
# command = "flog"
# args = []
"#;

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mturbulence\x1b[0m v{version}: churn vs. complexity for Ruby projects\n");

        println!("Quick start:");
        println!("  \x1b[36mturbulence report\x1b[0m          Rank files by churn x complexity");
        println!("  \x1b[36mturbulence init\x1b[0m            Create a .turbulence.toml config file\n");
    } else {
        println!("turbulence v{version}: churn vs. complexity for Ruby projects\n");

        println!("Quick start:");
        println!("  turbulence report          Rank files by churn x complexity");
        println!("  turbulence init            Create a .turbulence.toml config file\n");
    }

    println!("Run 'turbulence <command> --help' for details.");
}

fn load_config(explicit: Option<&Path>, project: &Path) -> Result<TurbulenceConfig> {
    match explicit {
        Some(path) => TurbulenceConfig::from_file(path)
            .wrap_err(format!("loading {}", path.display())),
        None => {
            let default_path = project.join(CONFIG_FILE);
            if default_path.exists() {
                TurbulenceConfig::from_file(&default_path)
                    .wrap_err(format!("loading {}", default_path.display()))
            } else {
                Ok(TurbulenceConfig::default())
            }
        }
    }
}

/// Progress on stderr: a bar on terminals, otherwise one dot per file.
enum CliProgress {
    Bar(RefCell<Option<ProgressBar>>),
    Dots,
}

impl CliProgress {
    fn new() -> Self {
        if std::io::stderr().is_terminal() {
            CliProgress::Bar(RefCell::new(None))
        } else {
            CliProgress::Dots
        }
    }
}

impl ProgressReporter for CliProgress {
    fn begin(&self, phase: Phase, total: usize) {
        if let CliProgress::Bar(slot) = self {
            let pb = ProgressBar::new(total as u64);
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner:.cyan} {msg:<10} [{bar:30.cyan/blue}] {pos}/{len} ({elapsed})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.set_message(phase.to_string());
            pb.enable_steady_tick(Duration::from_millis(120));
            *slot.borrow_mut() = Some(pb);
        }
    }

    fn advance(&self) {
        match self {
            CliProgress::Bar(slot) => {
                if let Some(pb) = slot.borrow().as_ref() {
                    pb.inc(1);
                }
            }
            CliProgress::Dots => {
                eprint!(".");
                let _ = std::io::stderr().flush();
            }
        }
    }

    fn skipped(&self, path: &str, reason: &str) {
        let line = format!("Error analyzing {path}: {reason}");
        match self {
            CliProgress::Bar(slot) => match slot.borrow().as_ref() {
                Some(pb) => pb.println(line),
                None => eprintln!("{line}"),
            },
            CliProgress::Dots => eprintln!("\n{line}"),
        }
    }

    fn finish(&self, _phase: Phase) {
        match self {
            CliProgress::Bar(slot) => {
                if let Some(pb) = slot.borrow_mut().take() {
                    pb.finish_and_clear();
                }
            }
            CliProgress::Dots => eprintln!(),
        }
    }
}

fn run_report(
    cli: &Cli,
    path: &Path,
    output: Option<&Path>,
    limit: Option<usize>,
) -> Result<()> {
    if !path.is_dir() {
        miette::bail!(miette::miette!(
            help = "Pass --path pointing at the root of a Ruby project",
            "Not a directory: {}",
            path.display()
        ));
    }

    let config = load_config(cli.config.as_deref(), path)?;
    let history = history_source_for(&config.history);
    let analyzer = analyzer_for(&config.complexity);

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        eprintln!("history backend: {}", history.name());
        eprintln!("complexity analyzer: {}", analyzer.name());
    }

    let progress = CliProgress::new();
    let run = Turbulence::compute(path, history.as_ref(), analyzer.as_ref(), &progress)?;
    let metrics = run.metrics();

    if cli.verbose {
        eprintln!(
            "{} source files, {} with churn, {} with complexity, {} skipped",
            run.source_files().len(),
            metrics.churn_count(),
            metrics.complexity_count(),
            run.skipped().len(),
        );
    }

    let rendered = render(metrics, cli.format, limit)?;
    match output {
        Some(out) => {
            std::fs::write(out, rendered)
                .into_diagnostic()
                .wrap_err(format!("writing {}", out.display()))?;
            eprintln!("Wrote {} ({} files)", out.display(), metrics.len());
        }
        None => print!("{rendered}"),
    }

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
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match &cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Report {
            path,
            output,
            limit,
        }) => {
            run_report(&cli, path, output.as_deref(), *limit)?;
        }
        Some(Command::Init { path }) => {
            let config_path = path.join(CONFIG_FILE);
            if config_path.exists() {
                miette::bail!("{} already exists", config_path.display());
            }
            std::fs::write(&config_path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {} with default configuration", config_path.display());
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "turbulence", &mut std::io::stdout());
        }
    }

    Ok(())
}
