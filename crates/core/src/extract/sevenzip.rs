//! 7z extraction through an external `7za`-compatible binary.
//!
//! The binary is asked for a flat, recursive extraction of the ROM globs.
//! Its own listing is not trusted: afterwards the output directory is scanned
//! for what actually landed there.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::Extractor;
use crate::cancel::CancelFlag;
use crate::collect::CollectedRom;
use crate::error::{CheckError, Result};
use crate::logging::{log, LogCategory, LogLevel};
use crate::rom::has_extension;

/// Hard limit for one archive
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Longest excerpt of the tool's output kept in an error
const EXCERPT_CHARS: usize = 80;

/// Printed by 7-zip when no entry matched the filters
const NO_FILES_MARKER: &str = "No files to process";

/// Binary names tried, in order, when no explicit path is configured
const TOOL_NAMES: [&str; 3] = ["7za", "7zz", "7z"];

#[derive(Debug, Clone)]
pub struct SevenZipExtractor {
    program: Option<PathBuf>,
    timeout: Duration,
    cancel: CancelFlag,
    /// Directories searched for the tool; the executable's directory and
    /// `PATH` when unset
    search_dirs: Option<Vec<PathBuf>>,
}

impl Default for SevenZipExtractor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SevenZipExtractor {
    /// `program` overrides the tool lookup. A bare name such as `7za` is
    /// searched for like the default names; anything else must be a file.
    pub fn new(program: Option<PathBuf>) -> Self {
        Self {
            program,
            timeout: DEFAULT_TIMEOUT,
            cancel: CancelFlag::new(),
            search_dirs: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Search only `dirs` instead of the executable's directory and `PATH`.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = Some(dirs);
        self
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if let Some(dirs) = &self.search_dirs {
            return dirs.clone();
        }
        let exe_dir = env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf));
        let path_dirs = env::var_os("PATH")
            .map(|p| env::split_paths(&p).collect::<Vec<_>>())
            .unwrap_or_default();
        exe_dir.into_iter().chain(path_dirs).collect()
    }

    /// Resolve the tool: configured path, then next to our executable, then
    /// `PATH`.
    fn locate(&self) -> Result<PathBuf> {
        match &self.program {
            Some(program) if program.is_file() => Ok(program.clone()),
            Some(program) if is_bare_name(program) => {
                let name = program.to_string_lossy().into_owned();
                let found = find_tool(&[name.as_str()], &self.search_dirs());
                found.ok_or(CheckError::MissingExtractionTool(name))
            }
            Some(program) => Err(CheckError::MissingExtractionTool(
                program.display().to_string(),
            )),
            None => find_tool(&TOOL_NAMES, &self.search_dirs())
                .ok_or_else(|| CheckError::MissingExtractionTool(TOOL_NAMES.join("/"))),
        }
    }

    fn command(
        &self,
        program: &Path,
        archive: &Path,
        extensions: &[&str],
        out_dir: &Path,
    ) -> Command {
        let mut cmd = Command::new(program);
        cmd.arg("e").arg(archive).arg("-r");
        for ext in extensions {
            cmd.arg(format!("*.{ext}"));
        }
        cmd.arg(format!("-o{}", out_dir.display()))
            .arg("-y")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            cmd.creation_flags(CREATE_NO_WINDOW);
        }

        cmd
    }
}

impl Extractor for SevenZipExtractor {
    fn extract(
        &self,
        archive: &Path,
        extensions: &[&str],
        out_dir: &Path,
    ) -> Result<Vec<CollectedRom>> {
        let program = self.locate()?;
        log(LogCategory::Archive, LogLevel::Debug, || {
            format!("running {} on {}", program.display(), archive.display())
        });

        let mut child = self
            .command(&program, archive, extensions, out_dir)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    CheckError::MissingExtractionTool(program.display().to_string())
                }
                _ => CheckError::ExtractionFailed(e.to_string()),
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());
        let status = wait_with_timeout(&mut child, self.timeout, &self.cancel)?;
        let stdout = stdout.join().unwrap_or_default();
        let stderr = stderr.join().unwrap_or_default();

        classify_output(status.success(), &stdout, &stderr)?;

        let roms = list_extracted(out_dir, extensions)?;
        if roms.is_empty() {
            return Err(CheckError::NoMatchingEntries);
        }
        Ok(roms)
    }
}

/// A single path component, e.g. `7za` but not `./7za` or `tools/7za`
fn is_bare_name(program: &Path) -> bool {
    let mut components = program.components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// First `dir/name` (plus the platform executable suffix) that is a file,
/// trying every name in a directory before moving to the next one.
fn find_tool(names: &[&str], dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| dir.join(tool_file_name(name))))
        .find(|candidate| candidate.is_file())
}

fn tool_file_name(name: &str) -> String {
    let suffix = env::consts::EXE_SUFFIX;
    if suffix.is_empty() || name.to_lowercase().ends_with(suffix) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// Read a child pipe to the end on its own thread so a chatty tool never
/// blocks on a full pipe while we poll it.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Wait for `child`, killing it on timeout or cancellation.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    cancel: &CancelFlag,
) -> Result<ExitStatus> {
    let start = Instant::now();
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| CheckError::ExtractionFailed(e.to_string()))?
        {
            return Ok(status);
        }

        let outcome = if cancel.is_cancelled() {
            CheckError::Cancelled
        } else if start.elapsed() >= timeout {
            CheckError::ExtractionTimeout(timeout)
        } else {
            thread::sleep(POLL_INTERVAL);
            continue;
        };

        let _ = child.kill();
        let _ = child.wait();
        return Err(outcome);
    }
}

/// Map the tool's exit status and output onto the error taxonomy.
///
/// "No files to process" wins over the exit code: an archive without ROMs
/// is an empty result, not a failure.
fn classify_output(success: bool, stdout: &str, stderr: &str) -> Result<()> {
    if stdout.contains(NO_FILES_MARKER) || stderr.contains(NO_FILES_MARKER) {
        return Err(CheckError::NoMatchingEntries);
    }
    if !success {
        let text = match stderr.trim() {
            "" => stdout.trim(),
            err => err,
        };
        return Err(CheckError::ExtractionFailed(
            text.chars().take(EXCERPT_CHARS).collect(),
        ));
    }
    Ok(())
}

fn list_extracted(out_dir: &Path, extensions: &[&str]) -> Result<Vec<CollectedRom>> {
    let entries = fs::read_dir(out_dir).map_err(|e| CheckError::fs(out_dir, e))?;
    let mut roms: Vec<CollectedRom> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            has_extension(&name, extensions).then(|| CollectedRom::new(entry.path(), name))
        })
        .collect();
    roms.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    Ok(roms)
}
