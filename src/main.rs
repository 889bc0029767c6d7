//! codecard - render source files as snippet cards
//!
//! Usage: codecard [OPTIONS] [FILES]...
//! With no files, the snippet is read from standard input.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser};
use codecard::{
    plan_jobs, run_batch, BatchOptions, CancelToken, FontRegistry, Outcome, OutputFormat, RenderOptions,
    Resources, ThemeRegistry, DEFAULT_THEME,
};
use std::io::Read;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Render source code as a styled image.
#[derive(Parser, Debug)]
#[command(name = "codecard", version, about)]
struct Args {
    /// Input files; standard input when empty
    files: Vec<PathBuf>,

    /// Output file (single input only)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Directory for outputs named after their inputs
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Built-in theme name or path to a theme JSON file
    #[arg(short, long, default_value = DEFAULT_THEME)]
    theme: String,

    /// Syntax to highlight with instead of inferring it
    #[arg(short, long)]
    syntax: Option<String>,

    /// Font name or path, overriding the theme's font
    #[arg(long)]
    font: Option<String>,

    /// Extra directory to search for fonts
    #[arg(long = "font-dir")]
    font_dirs: Vec<PathBuf>,

    /// Multiplier for every length and the font size
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// Corner radius of the window, overriding the theme
    #[arg(long)]
    border_radius: Option<f32>,

    /// Border stroke width of the window, overriding the theme
    #[arg(long)]
    border_width: Option<f32>,

    /// Draw window control dots
    #[arg(long)]
    decorations: bool,

    /// Title shown in the title bar
    #[arg(long)]
    title: Option<String>,

    /// Show a line-number gutter
    #[arg(long)]
    line_numbers: bool,

    /// Draw a drop shadow under the window
    #[arg(long)]
    shadow: bool,

    /// Spaces per tab
    #[arg(long, default_value_t = 4)]
    tab_width: usize,

    /// Keep leading blank lines and trailing whitespace
    #[arg(long)]
    no_trim: bool,

    /// Output format (png or svg); taken from the output extension otherwise
    #[arg(long)]
    format: Option<String>,

    /// Parallel renders; 0 uses every core
    #[arg(short, long, default_value_t = 0)]
    jobs: usize,

    /// Print the element tree with measured sizes
    #[arg(long)]
    layout_report: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// List built-in themes and exit
    #[arg(long)]
    list_themes: bool,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    if args.list_themes {
        for name in ThemeRegistry::new().names() {
            println!("{name}");
        }
        return Ok(());
    }

    if args.scale <= 0.0 {
        bail!("--scale must be positive");
    }
    let format = args
        .format
        .as_deref()
        .map(OutputFormat::from_name)
        .transpose()?;

    let stdin = if args.files.is_empty() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("cannot read standard input")?;
        Some(buf)
    } else {
        None
    };
    let jobs = plan_jobs(&args.files, stdin, args.out.as_deref(), args.out_dir.as_deref(), format)?;

    let fonts = FontRegistry::new(args.font_dirs.clone());
    let resources = Resources::load(&args.theme, args.font.as_deref(), &fonts, args.scale)
        .context("cannot load rendering resources")?;

    let options = BatchOptions {
        render: RenderOptions {
            scale: args.scale,
            line_numbers: args.line_numbers,
            decorations: args.decorations,
            title: args.title.clone(),
            shadow: args.shadow,
            border_radius: args.border_radius,
            border_width: args.border_width,
            tab_width: args.tab_width,
            trim: !args.no_trim,
        },
        syntax: args.syntax.clone(),
        format,
        parallel: args.jobs != 1 && jobs.len() > 1,
        layout_report: args.layout_report,
    };
    debug!(?options, jobs = jobs.len(), "starting batch");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.jobs)
        .build()
        .context("cannot start worker pool")?;
    let cancel = CancelToken::new();
    #[cfg(unix)]
    cancel.cancel_on_signals()?;
    let report = pool.install(|| run_batch(&jobs, &resources, &options, &cancel));

    for result in &report.results {
        match &result.outcome {
            Outcome::Written(path) => println!("{} -> {}", result.input, path.display()),
            Outcome::Failed(err) => eprintln!("{}: {err}", result.input),
            Outcome::Cancelled => eprintln!("{}: cancelled", result.input),
        }
    }
    if !report.is_success() {
        bail!("{} of {} inputs failed", report.failed(), report.results.len());
    }
    Ok(())
}
