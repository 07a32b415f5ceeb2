// src/logger.rs
// Console logging with colored level badges and an injectable output sink

use chrono::{DateTime, Local};
use colored::*;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Http,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LogLevel::Http => write!(f, "{}", " HTTP ".on_blue().bold().white()),
            LogLevel::Info => write!(f, "{}", " INFO ".on_magenta().bold().white()),
            LogLevel::Warn => write!(f, "{}", " WARN ".on_yellow().bold().black()),
            LogLevel::Error => write!(f, "{}", " ERROR ".on_red().bold().white()),
        }
    }
}

/// Destination for finished log records. Each record arrives as a single
/// `write` call, so a sink shared between concurrent requests never sees
/// partial lines.
pub trait LogSink: Send + Sync {
    fn write(&self, level: LogLevel, record: &str);
}

/// Default sink: one line per record on stdout, prefixed with the badge.
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&self, level: LogLevel, record: &str) {
        println!("{} {}", level, record);
    }
}

pub struct Logger {
    sink: Arc<dyn LogSink>,
    pub enable_timestamps: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            sink: Arc::new(StdoutSink),
            enable_timestamps: true,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_timestamps(mut self, enable: bool) -> Self {
        self.enable_timestamps = enable;
        self
    }

    fn format_timestamp(&self) -> String {
        if self.enable_timestamps {
            let now: DateTime<Local> = Local::now();
            format!("{} ", now.format("%Y-%m-%d %H:%M:%S"))
        } else {
            String::new()
        }
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        let record = format!("{}{}", self.format_timestamp(), message);
        self.sink.write(level, &record);
    }

    /// One HTTP record per call: the request line on arrival, the status and
    /// latency once the response went out.
    pub fn http(
        &self,
        ip: &str,
        method: &str,
        path: &str,
        status: Option<u16>,
        elapsed_ms: Option<u128>,
    ) {
        let message = match (status, elapsed_ms) {
            (Some(status), Some(elapsed)) => {
                format!("{} Returned {} in {} ms", ip, status, elapsed)
            }
            _ => format!("{} {} {}", ip, method, path),
        };
        self.log(LogLevel::Http, &message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    pub fn startup_info(&self, name: &str, version: &str, author: &str) {
        let startup_msg = format!(
            "Starting {} v{} by {}",
            name.bold(),
            version.bold(),
            author.bold()
        );
        self.info(&startup_msg);
    }

    pub fn server_info(&self, signature: &str, local_url: &str, network_url: &str) {
        self.info(&format!("Server: {}", signature.bold()));

        if !atty::is(atty::Stream::Stdout) {
            self.info(&format!("Accepting connections at {}", local_url));
            return;
        }

        let mut message = format!("{}", "Serving!".green().bold());
        message += &format!("\n\n{}    - {}", "Local:".bold(), local_url.bright_cyan());
        message += &format!("\n{}  {}", "- Network:".bold(), network_url.bright_cyan());

        self.print_boxed(&message);
    }

    pub fn print_boxed(&self, message: &str) {
        let lines: Vec<&str> = message.lines().collect();
        if lines.is_empty() {
            return;
        }

        let max_width = lines
            .iter()
            .map(|line| strip_ansi_codes(line).len())
            .max()
            .unwrap_or(0);

        let box_width = max_width + 4; // 2 spaces padding on each side

        let mut boxed = String::new();
        boxed.push_str(&format!("┌{}┐\n", "─".repeat(box_width)));
        boxed.push_str(&format!("│{}│\n", " ".repeat(box_width)));

        for line in lines {
            let stripped_len = strip_ansi_codes(line).len();
            let padding = " ".repeat((box_width - stripped_len) / 2);
            let right_padding = " ".repeat(box_width - stripped_len - padding.len());
            boxed.push_str(&format!("│{}{}{}│\n", padding, line, right_padding));
        }

        boxed.push_str(&format!("│{}│\n", " ".repeat(box_width)));
        boxed.push_str(&format!("└{}┘", "─".repeat(box_width)));

        // Display-only banner, emitted as one write.
        println!("{}\n", boxed);
    }

    pub fn shutdown_message(&self) {
        println!();
        self.info("Gracefully shutting down. Please wait...");
    }

    pub fn force_shutdown_message(&self) {
        println!();
        self.warn("Force-closing all open sockets...");
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

// Helper function to strip ANSI color codes for width calculation
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut in_escape = false;
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                in_escape = true;
                continue;
            }
        }

        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
            continue;
        }

        result.push(ch);
    }

    result
}
