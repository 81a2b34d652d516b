//! # External Tool Runner
//!
//! Questo modulo esegue gli encoder esterni (ffmpeg) e ne cattura l'esito.
//!
//! ## Responsabilità:
//! - Avvia il processo senza stdin, così nessun prompt interattivo può bloccare la run
//! - Cattura exit status e stderr in un `ToolOutcome`
//! - Applica il timeout opzionale uccidendo il processo bloccato
//! - Fornisce `encode_in_place()`: encoder → temporaneo fratello → rename sull'originale
//!
//! Un fallimento (tool mancante, exit status non zero, timeout, output vuoto)
//! non tocca mai il file originale.

use crate::error::{CodecResult, CompressError};
use crate::file_manager::FileManager;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::debug;

/// Result of one external tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Succeeded { stderr: String },
    Failed { status: String, stderr: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }

    /// Turn a failed outcome into an error naming the file being encoded
    pub fn into_result(self, tool: &str, subject: &Path) -> CodecResult<()> {
        match self {
            Self::Succeeded { .. } => Ok(()),
            Self::Failed { status, stderr } => Err(CompressError::Encoder {
                tool: tool.to_string(),
                path: subject.to_path_buf(),
                status,
                stderr: stderr.trim().to_string(),
            }),
        }
    }
}

/// Leading ffmpeg arguments shared by audio and video encodes
pub fn ffmpeg_input_args(input: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_os_string());
    args
}

/// Runs one external program, optionally bounded by a timeout
#[derive(Debug, Clone)]
pub struct ToolRunner {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl ToolRunner {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn tool_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Run the program and capture its outcome.
    ///
    /// `subject` is the media file the invocation is about; it only feeds
    /// error messages.
    pub async fn run(&self, args: &[OsString], subject: &Path) -> CodecResult<ToolOutcome> {
        debug!("Running {} {:?}", self.program.display(), args);

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CompressError::MissingDependency(format!(
                    "{} could not be started: {}",
                    self.program.display(),
                    e
                )),
                _ => CompressError::Io(e),
            })?;

        let start_time = Instant::now();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| CompressError::Timeout {
                    path: subject.to_path_buf(),
                    secs: limit.as_secs(),
                })??,
            None => child.wait_with_output().await?,
        };
        debug!(
            "{} finished in {:.1}s with {}",
            self.tool_name(),
            start_time.elapsed().as_secs_f64(),
            output.status
        );

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.status.success() {
            Ok(ToolOutcome::Succeeded { stderr })
        } else {
            Ok(ToolOutcome::Failed {
                status: output.status.to_string(),
                stderr,
            })
        }
    }

    /// Encode `input` into a temp sibling and swap it in on verified success.
    ///
    /// `build_args` receives the temp output path.
    pub async fn encode_in_place<F>(&self, input: &Path, build_args: F) -> CodecResult<()>
    where
        F: FnOnce(&Path) -> Vec<OsString>,
    {
        let temp = FileManager::sibling_temp(input)?;
        let args = build_args(temp.path());

        self.run(&args, input)
            .await?
            .into_result(&self.tool_name(), input)?;

        FileManager::commit(temp, input)
    }
}
