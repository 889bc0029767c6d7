//! Batch rendering over real files: naming, isolation and cancellation.

use codecard::{
    plan_jobs, run_batch, BatchOptions, CancelToken, Error, FixedFace, Outcome, OutputFormat, Resources,
    ThemeRegistry,
};
use std::fs;
use std::path::PathBuf;

fn resources() -> Resources {
    let theme = ThemeRegistry::new().load("github").unwrap();
    Resources::new(theme, Box::new(FixedFace::new(8, 16)))
}

fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn one_failing_file_does_not_stop_the_others() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let files = vec![
        write(&src, "a.rs", "fn a() {}\n"),
        write(&src, "mystery.xyz", "???"),
        write(&src, "b.md", "# B\n"),
    ];

    let jobs = plan_jobs(&files, None, None, Some(out.path()), None).unwrap();
    let options = BatchOptions {
        parallel: true,
        ..BatchOptions::default()
    };
    let report = run_batch(&jobs, &resources(), &options, &CancelToken::new());

    assert_eq!(report.written(), 2);
    assert_eq!(report.failed(), 1);
    assert!(!report.is_success());
    assert!(matches!(report.results[1].outcome, Outcome::Failed(Error::Config(_))));

    let png = fs::read(out.path().join("a.png")).unwrap();
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    assert!(out.path().join("b.png").is_file());
    assert!(!out.path().join("mystery.png").exists());
}

#[test]
fn missing_input_is_an_io_failure() {
    let out = tempfile::tempdir().unwrap();
    let files = vec![out.path().join("gone.rs")];
    let jobs = plan_jobs(&files, None, None, Some(out.path()), None).unwrap();
    let report = run_batch(&jobs, &resources(), &BatchOptions::default(), &CancelToken::new());
    assert!(matches!(report.results[0].outcome, Outcome::Failed(Error::Io { .. })));
}

#[test]
fn forced_format_and_syntax_apply_to_every_file() {
    let src = tempfile::tempdir().unwrap();
    let files = vec![write(&src, "notes.unknown", "let x = 1;")];
    let jobs = plan_jobs(&files, None, None, None, Some(OutputFormat::Svg)).unwrap();
    let options = BatchOptions {
        syntax: Some("rust".into()),
        format: Some(OutputFormat::Svg),
        ..BatchOptions::default()
    };
    let report = run_batch(&jobs, &resources(), &options, &CancelToken::new());
    assert!(report.is_success(), "{report:?}");

    let svg = fs::read_to_string(src.path().join("notes.svg")).unwrap();
    assert!(svg.starts_with("<svg"));
}

#[test]
fn stdin_job_writes_into_out_dir() {
    let out = tempfile::tempdir().unwrap();
    let nested = out.path().join("cards");
    let jobs = plan_jobs(&[], Some("plain words".into()), None, Some(&nested), None).unwrap();
    let options = BatchOptions {
        syntax: Some("text".into()),
        ..BatchOptions::default()
    };
    let report = run_batch(&jobs, &resources(), &options, &CancelToken::new());
    assert!(report.is_success(), "{report:?}");
    assert!(nested.join("snippet.png").is_file());
}

#[test]
fn cancelled_batch_skips_pending_files() {
    let src = tempfile::tempdir().unwrap();
    let files = vec![write(&src, "a.rs", "fn a() {}"), write(&src, "b.rs", "fn b() {}")];
    let jobs = plan_jobs(&files, None, None, None, None).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let report = run_batch(&jobs, &resources(), &BatchOptions::default(), &cancel);

    assert_eq!(report.cancelled(), 2);
    assert_eq!(report.written(), 0);
    assert!(!src.path().join("a.png").exists());
}

#[cfg(unix)]
#[test]
fn interrupt_cancels_the_token() {
    use signal_hook::consts::signal::SIGINT;

    let cancel = CancelToken::new();
    cancel.cancel_on_signals().unwrap();
    assert!(!cancel.is_cancelled());
    signal_hook::low_level::raise(SIGINT).unwrap();
    assert!(cancel.is_cancelled());

    let src = tempfile::tempdir().unwrap();
    let files = vec![write(&src, "a.rs", "fn a() {}")];
    let jobs = plan_jobs(&files, None, None, None, None).unwrap();
    let report = run_batch(&jobs, &resources(), &BatchOptions::default(), &cancel);
    assert_eq!(report.cancelled(), 1);
}
