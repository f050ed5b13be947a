use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use litprog_builder::{BuildSummary, Builder};
use litprog_config::{Config, LoadOptions};
use litprog_core::Fragment;
use serde_json::{Map, Value};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut options = LoadOptions::default();
    if let Some(path) = cli.config {
        options = options.with_override_path(path);
    }
    let config = Config::load(options)?;
    for layer in &config.sources.layers {
        debug!("configuration layer {:?} from {}", layer.kind, layer.base_dir.display());
    }

    match cli.command {
        Command::Build(args) => handle_build(config, args),
        Command::Clean => handle_clean(config),
        Command::Snippets(args) => handle_snippets(config, args),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn handle_build(mut config: Config, args: BuildArgs) -> Result<i32> {
    let BuildArgs {
        fresh,
        pages,
        fail_on_warning,
        output_dir,
    } = args;

    if let Some(dir) = output_dir {
        let cwd = env::current_dir().context("failed to resolve working directory")?;
        config.build.output_dir = cwd.join(dir);
    }
    config.build.pages |= pages;
    config.build.fail_on_warning |= fail_on_warning;

    let builder = Builder::new(config);
    let BuildSummary {
        documents,
        read,
        warnings,
        weave,
        ..
    } = builder.build(fresh)?;

    debug!(
        "build read {} of {documents} document(s) with {} warning(s)",
        read.len(),
        warnings.len()
    );
    if let Some(report) = weave {
        emit(&report.path.display().to_string())?;
    }
    Ok(0)
}

fn handle_clean(config: Config) -> Result<i32> {
    let builder = Builder::new(config);
    if builder.clean()? {
        let output_dir = &builder.config().build.output_dir;
        emit(&format!("removed {}", output_dir.display()))?;
    }
    Ok(0)
}

fn handle_snippets(config: Config, args: SnippetsArgs) -> Result<i32> {
    let SnippetsArgs { doc, format } = args;
    let builder = Builder::new(config);
    let Some(environment) = builder.load_environment()? else {
        bail!(
            "no build environment at {}; run `litprog build` first",
            builder.environment_path().display()
        );
    };
    let store = environment.snippets();

    let selected: Vec<(&str, &[Fragment])> = match &doc {
        Some(docname) => vec![(docname.as_str(), store.get(docname))],
        None => store.documents().collect(),
    };

    let rendered = match format.unwrap_or(SnippetsFormatValue::Plain) {
        SnippetsFormatValue::Plain => render_plain(&selected),
        SnippetsFormatValue::Json => render_json(&selected)?,
    };
    if !rendered.is_empty() {
        emit(&rendered)?;
    }
    Ok(0)
}

fn render_plain(selected: &[(&str, &[Fragment])]) -> String {
    let mut out = String::new();
    for (docname, fragments) in selected {
        out.push_str(&format!("{docname}: {} fragment(s)\n", fragments.len()));
        for (idx, fragment) in fragments.iter().enumerate() {
            out.push_str(&format!(
                "--- fragment {} ({} line(s))\n",
                idx + 1,
                fragment.lines().len()
            ));
            for line in fragment.lines() {
                out.push_str(line);
                out.push('\n');
            }
        }
    }
    out
}

fn render_json(selected: &[(&str, &[Fragment])]) -> Result<String> {
    let mut map = Map::new();
    for (docname, fragments) in selected {
        map.insert(docname.to_string(), serde_json::to_value(fragments)?);
    }
    Ok(serde_json::to_string_pretty(&Value::Object(map))?)
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Literate-programming documentation builds",
    propagate_version = true
)]
struct Cli {
    /// Explicit configuration file, applied over discovered ones
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Log debug detail
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the documentation and weave captured fragments
    Build(BuildArgs),
    /// Remove the build output directory
    Clean,
    /// Show fragments captured by the last build
    Snippets(SnippetsArgs),
}

#[derive(Args)]
struct BuildArgs {
    /// Ignore the saved environment and read every document
    #[arg(long)]
    fresh: bool,
    /// Also write one HTML page per document read
    #[arg(long)]
    pages: bool,
    /// Treat warnings as errors
    #[arg(short = 'W', long)]
    fail_on_warning: bool,
    /// Override the configured build output directory
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
}

#[derive(Args)]
struct SnippetsArgs {
    /// Only show fragments of this document
    #[arg(long, value_name = "NAME")]
    doc: Option<String>,
    /// Output format
    #[arg(long, value_enum)]
    format: Option<SnippetsFormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SnippetsFormatValue {
    Plain,
    Json,
}
