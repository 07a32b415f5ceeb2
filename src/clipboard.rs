// src/clipboard.rs
// Clipboard integration for copying the server URL without external crates

use std::error::Error;
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};

#[derive(Debug)]
pub enum ClipboardError {
    NotAvailable,
    CopyFailed(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::NotAvailable => write!(f, "No clipboard command available"),
            ClipboardError::CopyFailed(msg) => write!(f, "Failed to copy to clipboard: {}", msg),
        }
    }
}

impl Error for ClipboardError {}

#[derive(Debug, Clone, Copy)]
struct ClipboardCommand {
    program: &'static str,
    args: &'static [&'static str],
}

#[cfg(target_os = "macos")]
const CANDIDATES: &[ClipboardCommand] = &[ClipboardCommand {
    program: "pbcopy",
    args: &[],
}];

#[cfg(all(unix, not(target_os = "macos")))]
const CANDIDATES: &[ClipboardCommand] = &[
    ClipboardCommand {
        program: "wl-copy",
        args: &[],
    },
    ClipboardCommand {
        program: "xclip",
        args: &["-selection", "clipboard"],
    },
    ClipboardCommand {
        program: "xsel",
        args: &["--clipboard", "--input"],
    },
];

#[cfg(windows)]
const CANDIDATES: &[ClipboardCommand] = &[ClipboardCommand {
    program: "clip",
    args: &[],
}];

#[cfg(not(any(unix, windows)))]
const CANDIDATES: &[ClipboardCommand] = &[];

impl ClipboardCommand {
    fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => ClipboardError::NotAvailable,
                _ => ClipboardError::CopyFailed(err.to_string()),
            })?;

        {
            let stdin = child
                .stdin
                .as_mut()
                .ok_or_else(|| ClipboardError::CopyFailed("failed to open stdin".to_string()))?;
            stdin
                .write_all(text.as_bytes())
                .map_err(|err| ClipboardError::CopyFailed(err.to_string()))?;
        }

        let status = child
            .wait()
            .map_err(|err| ClipboardError::CopyFailed(err.to_string()))?;

        if status.success() {
            Ok(())
        } else {
            let message = match status.code() {
                Some(code) => format!("exited with status {code}"),
                None => "process terminated by signal".to_string(),
            };
            Err(ClipboardError::CopyFailed(message))
        }
    }
}

pub struct ClipboardManager {
    enabled: bool,
}

impl ClipboardManager {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Best effort: tries each known clipboard command until one takes the
    /// text. A disabled manager reports success without touching anything.
    pub fn copy_server_url(&self, url: &str) -> Result<(), ClipboardError> {
        if !self.enabled {
            return Ok(());
        }

        for candidate in CANDIDATES {
            match candidate.copy(url) {
                Ok(()) => return Ok(()),
                Err(ClipboardError::NotAvailable) => continue,
                Err(err) => return Err(err),
            }
        }

        Err(ClipboardError::NotAvailable)
    }
}
