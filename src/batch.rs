//! Rendering many inputs: output naming, shared resources, per-file
//! isolation and cancellation

use crate::error::{Error, Result};
use crate::font::{Face, FontRegistry};
use crate::lexer::LexerRegistry;
use crate::render::{layout, preprocess, render, OutputFormat, RenderOptions};
use crate::theme::{Theme, ThemeRegistry};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, info_span, warn};

/// Output name used for standard input when no `--out` is given.
pub const STDIN_STEM: &str = "snippet";

/// Theme, face and lexers shared read-only by every render in a batch.
pub struct Resources {
    pub theme: Theme,
    pub face: Box<dyn Face>,
    pub lexers: LexerRegistry,
}

impl Resources {
    pub fn new(theme: Theme, face: Box<dyn Face>) -> Self {
        Self {
            theme,
            face,
            lexers: LexerRegistry::new(),
        }
    }

    /// Loads the theme, then the font it names (or `font`) at the scaled
    /// font size.
    pub fn load(theme: &str, font: Option<&str>, fonts: &FontRegistry, scale: f32) -> Result<Self> {
        let theme = ThemeRegistry::new().load(theme)?;
        let name = font.unwrap_or(theme.font.as_str()).to_string();
        let face = fonts.load(&name, theme.font_size * scale)?;
        info!(font = %name, size = theme.font_size * scale, "loaded font");
        Ok(Self::new(theme, Box::new(face)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    File(PathBuf),
    /// Contents already read from standard input.
    Stdin(String),
}

impl Input {
    pub fn label(&self) -> String {
        match self {
            Input::File(path) => path.display().to_string(),
            Input::Stdin(_) => "<stdin>".to_string(),
        }
    }

    fn path(&self) -> Option<&Path> {
        match self {
            Input::File(path) => Some(path),
            Input::Stdin(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input: Input,
    pub output: PathBuf,
}

/// Pairs every input with its output path.
///
/// `out` names the output of a single input. Otherwise each output is
/// `<out_dir or the input's directory>/<input stem>.<format>`, and standard
/// input (used when `files` is empty) becomes `snippet.<format>`.
pub fn plan_jobs(
    files: &[PathBuf],
    stdin: Option<String>,
    out: Option<&Path>,
    out_dir: Option<&Path>,
    format: Option<OutputFormat>,
) -> Result<Vec<Job>> {
    let ext = format.unwrap_or(OutputFormat::Png).extension();

    if files.is_empty() {
        let contents = stdin.ok_or_else(|| Error::Config("no input files".to_string()))?;
        let output = match out {
            Some(out) => out.to_path_buf(),
            None => out_dir
                .unwrap_or_else(|| Path::new(""))
                .join(format!("{STDIN_STEM}.{ext}")),
        };
        return Ok(vec![Job {
            input: Input::Stdin(contents),
            output,
        }]);
    }

    if let Some(out) = out {
        if files.len() > 1 {
            return Err(Error::Config(format!(
                "--out {} names one output but {} inputs were given; use --out-dir",
                out.display(),
                files.len()
            )));
        }
        return Ok(vec![Job {
            input: Input::File(files[0].clone()),
            output: out.to_path_buf(),
        }]);
    }

    files
        .iter()
        .map(|file| {
            let stem = file
                .file_stem()
                .ok_or_else(|| Error::Config(format!("cannot name output for {}", file.display())))?;
            let dir = match out_dir {
                Some(dir) => dir,
                None => file.parent().unwrap_or_else(|| Path::new("")),
            };
            let mut name = stem.to_os_string();
            name.push(".");
            name.push(ext);
            Ok(Job {
                input: Input::File(file.clone()),
                output: dir.join(name),
            })
        })
        .collect()
}

/// Shared flag that stops a batch before its remaining files start.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Cancels on SIGINT or SIGTERM. A second signal after cancellation
    /// exits the process immediately.
    #[cfg(unix)]
    pub fn cancel_on_signals(&self) -> Result<()> {
        use signal_hook::consts::signal::{SIGINT, SIGTERM};
        for signal in [SIGINT, SIGTERM] {
            signal_hook::flag::register_conditional_shutdown(signal, 130, Arc::clone(&self.0))
                .and_then(|_| signal_hook::flag::register(signal, Arc::clone(&self.0)))
                .map_err(|e| Error::Config(format!("cannot install signal handler: {e}")))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub render: RenderOptions,
    /// Syntax name forced on every input.
    pub syntax: Option<String>,
    /// Output format; taken from each output's extension when unset.
    pub format: Option<OutputFormat>,
    pub parallel: bool,
    /// Print each element tree with its measured sizes.
    pub layout_report: bool,
}

#[derive(Debug)]
pub enum Outcome {
    Written(PathBuf),
    Failed(Error),
    Cancelled,
}

#[derive(Debug)]
pub struct FileResult {
    pub input: String,
    pub outcome: Outcome,
}

/// Per-file results, in job order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub results: Vec<FileResult>,
}

impl BatchReport {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Written(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Cancelled))
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0 && self.cancelled() == 0
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Renders every job. A failing job is recorded and the rest carry on;
/// once `cancel` is set, jobs that have not started are skipped.
pub fn run_batch(jobs: &[Job], resources: &Resources, options: &BatchOptions, cancel: &CancelToken) -> BatchReport {
    let run = |job: &Job| -> FileResult {
        let input = job.input.label();
        if cancel.is_cancelled() {
            return FileResult {
                input,
                outcome: Outcome::Cancelled,
            };
        }
        let _span = info_span!("file", input = %input).entered();
        let outcome = match render_job(job, resources, options) {
            Ok(()) => {
                info!(output = %job.output.display(), "wrote snippet");
                Outcome::Written(job.output.clone())
            }
            Err(err) => {
                error!(%err, "render failed");
                Outcome::Failed(err)
            }
        };
        FileResult { input, outcome }
    };

    let results: Vec<FileResult> = if options.parallel {
        jobs.par_iter().map(run).collect()
    } else {
        jobs.iter().map(run).collect()
    };
    let report = BatchReport { results };
    if report.failed() > 0 {
        warn!(failed = report.failed(), total = jobs.len(), "some inputs failed");
    }
    report
}

fn render_job(job: &Job, resources: &Resources, options: &BatchOptions) -> Result<()> {
    let contents = match &job.input {
        Input::File(path) => std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?,
        Input::Stdin(text) => text.clone(),
    };
    let lexer = resources
        .lexers
        .resolve(options.syntax.as_deref(), job.input.path(), &contents)?;
    let format = match options.format {
        Some(format) => format,
        None => OutputFormat::from_path(&job.output)?,
    };
    let face = resources.face.as_ref();

    if options.layout_report {
        let text = preprocess(&contents, &options.render);
        let root = layout(&text, lexer, &resources.theme, face, &options.render)?;
        print!("{}:\n{}", job.input.label(), root.report());
    }

    let canvas = render(&contents, lexer, &resources.theme, face, &options.render, format)?;
    if let Some(dir) = job.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    canvas.save(&job.output)
}
