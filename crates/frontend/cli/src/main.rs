mod settings;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use romcheck_core::collect::{ArchiveKind, CollectEvent};
use romcheck_core::logging::{LogCategory, LogConfig, LogLevel};
use romcheck_core::{
    collect_all, default_workers, render_table, resolve_inputs, verify_all, ArchiveCollector,
    CancelFlag, CheckError, ReportStyle, SevenZipExtractor, Summary,
    TemporaryWorkspace, WidthStrategy,
};
use settings::Settings;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Check Game Boy / Game Boy Color ROM extensions against their headers.
///
/// Drop .zip/.7z archives, folders or .gb/.gbc files onto the executable,
/// or pass them as arguments. Nothing is modified.
#[derive(Parser, Debug)]
#[command(name = "romcheck", version)]
struct Args {
    /// Archives, folders or ROM files to check
    paths: Vec<PathBuf>,

    /// 7-zip binary used for .7z archives
    #[arg(long, value_name = "PATH")]
    seven_zip: Option<PathBuf>,

    /// Verification threads (default: min(4, cores))
    #[arg(long)]
    jobs: Option<usize>,

    /// Plain-text status labels instead of emoji
    #[arg(long, default_value_t = false)]
    ascii: bool,

    /// Exit without waiting for Enter
    #[arg(long, default_value_t = false)]
    no_pause: bool,

    /// Count every non-ASCII character as two columns
    #[arg(long, default_value_t = false)]
    codepoint_width: bool,

    /// Core log level: off, error, warn, info, debug, trace
    #[arg(long, value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Per-category core log level, e.g. `archive=debug` (repeatable)
    #[arg(long, value_name = "CATEGORY=LEVEL", value_parser = parse_category_level)]
    log_category: Vec<(LogCategory, LogLevel)>,

    /// Write core logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::from_str(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

fn parse_category_level(s: &str) -> Result<(LogCategory, LogLevel), String> {
    let (category, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected CATEGORY=LEVEL, got '{}'", s))?;
    let category = LogCategory::from_str(category)
        .ok_or_else(|| format!("unknown log category '{}'", category))?;
    Ok((category, parse_log_level(level)?))
}

/// How a run ended, short of an unhandled error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Checked,
    Usage,
    NoValidPaths,
    NoRoms,
    Interrupted,
}

impl Outcome {
    fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Checked => ExitCode::SUCCESS,
            Outcome::Usage | Outcome::NoValidPaths | Outcome::NoRoms => ExitCode::from(1),
            Outcome::Interrupted => ExitCode::from(130),
        }
    }
}

/// Settings with command-line overrides applied
struct Options {
    seven_zip: Option<PathBuf>,
    jobs: usize,
    style: ReportStyle,
    pause: bool,
    extract_timeout: Duration,
}

impl Options {
    fn new(args: &Args, settings: Settings) -> Self {
        let width = if args.codepoint_width {
            WidthStrategy::Codepoint
        } else {
            settings.width_strategy
        };
        Self {
            seven_zip: args
                .seven_zip
                .clone()
                .or_else(|| settings.seven_zip_path.map(PathBuf::from)),
            jobs: args.jobs.or(settings.jobs).unwrap_or_else(default_workers),
            style: ReportStyle {
                width,
                ascii: args.ascii || settings.ascii_status,
            },
            // Only pause when someone is there to press Enter.
            pause: !args.no_pause && settings.pause_on_exit && io::stdin().is_terminal(),
            extract_timeout: Duration::from_secs(settings.extract_timeout_secs),
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let log_config = LogConfig::global();
    log_config.set_global_level(args.log_level.unwrap_or(LogLevel::Warn));
    for &(category, level) in &args.log_category {
        log_config.set_level(category, level);
    }
    if let Some(path) = &args.log_file {
        if let Err(e) = log_config.set_log_file(path.clone()) {
            eprintln!("Warning: cannot open log file {}: {}", path.display(), e);
        }
    }

    let options = Options::new(&args, Settings::load());

    // Nothing is created on disk until the first archive is extracted.
    let workspace = Arc::new(TemporaryWorkspace::new());
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        let workspace = Arc::downgrade(&workspace);
        if let Err(e) = ctrlc::set_handler(move || {
            // A second Ctrl-C exits at once, so clean up by hand.
            if cancel.is_cancelled() {
                if let Some(workspace) = workspace.upgrade() {
                    workspace.purge();
                }
                std::process::exit(130);
            }
            cancel.cancel();
        }) {
            log::warn!("could not install Ctrl-C handler: {}", e);
        }
    }

    let code = match run(&args, &options, &workspace, &cancel) {
        Ok(Outcome::Interrupted) => {
            println!("\n\nInterrupted by user");
            Outcome::Interrupted.exit_code()
        }
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("\nError: {:#}", e);
            eprintln!("{:?}", e);
            ExitCode::from(2)
        }
    };

    drop(workspace);
    log_config.clear_log_file();

    if options.pause {
        wait_for_enter();
    }
    code
}

fn run(
    args: &Args,
    options: &Options,
    workspace: &TemporaryWorkspace,
    cancel: &CancelFlag,
) -> Result<Outcome> {
    if args.paths.is_empty() {
        Args::command().print_help()?;
        println!();
        return Ok(Outcome::Usage);
    }

    let resolved = resolve_inputs(&args.paths);
    for skipped in &resolved.skipped {
        println!("  Skipped: {}", skipped);
    }
    if resolved.sources.is_empty() {
        println!("No valid paths given");
        return Ok(Outcome::NoValidPaths);
    }

    println!("Scanning inputs...");
    let seven_zip = SevenZipExtractor::new(options.seven_zip.clone())
        .with_timeout(options.extract_timeout)
        .with_cancel(cancel.clone());
    let collector = ArchiveCollector::new(workspace, seven_zip);

    let roms = match collect_all(&resolved.sources, &collector, cancel, print_event) {
        Err(CheckError::Cancelled) => return Ok(Outcome::Interrupted),
        other => other?,
    };
    if roms.is_empty() {
        println!("\nNo .gb/.gbc files found");
        return Ok(Outcome::NoRoms);
    }

    let total = roms.len();
    println!("\nChecking {} ROM(s)...", total);
    let show_progress = io::stderr().is_terminal();
    let done = AtomicUsize::new(0);
    let verdicts = match verify_all(&roms, options.jobs, cancel, |_| {
        let n = done.fetch_add(1, Ordering::Relaxed) + 1;
        if show_progress {
            eprint!("\r  {}/{}", n, total);
        }
    }) {
        Err(CheckError::Cancelled) => return Ok(Outcome::Interrupted),
        other => other?,
    };
    if show_progress {
        eprintln!();
    }
    log::info!("{} verdict(s) from {} worker(s)", verdicts.len(), options.jobs);

    println!();
    print!("{}", render_table(&verdicts, options.style));
    println!("\n{}", Summary::from_verdicts(&verdicts));
    Ok(Outcome::Checked)
}

fn print_event(event: CollectEvent<'_>) {
    match event {
        CollectEvent::Archive { archive, outcome } => {
            let tag = match ArchiveKind::from_path(archive) {
                Some(ArchiveKind::SevenZip) => "7z",
                _ => "zip",
            };
            println!("  [{}] {}", tag, display_file_name(archive));
            if outcome.roms.is_empty() {
                println!("    ! {}", outcome.status());
            }
            if outcome.is_failure() {
                log::warn!("{}: {}", archive.display(), outcome.status());
            }
        }
        CollectEvent::Folder { folder, found } => {
            println!("  [dir] {} ({} ROM(s))", display_file_name(folder), found);
        }
        CollectEvent::Loose { path } => {
            log::debug!("loose ROM {}", path.display());
        }
    }
}

fn display_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn wait_for_enter() {
    print!("\n(Press Enter to exit)");
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}
