// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use imagedash::images::ImageRecord;
use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

impl OutputMode {
    pub fn from_flags(quiet: bool, json: bool) -> Self {
        if json {
            Self::Json
        } else if quiet {
            Self::Quiet
        } else {
            Self::Normal
        }
    }
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    fn elapsed_secs(&self) -> Option<f64> {
        self.start_time.map(|t| t.elapsed().as_secs_f64())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => match self.elapsed_secs() {
                Some(elapsed) => println!("{message} ({elapsed:.1}s)"),
                None => println!("{message}"),
            },
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.event("success", message, false),
        }
    }

    /// Print a per-item failure without aborting (bulk operations).
    pub fn failure(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Failed: {message}"),
            OutputMode::Json => self.event("failure", message, true),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.event("error", message, true),
        }
    }

    /// Print the image list as a table, bare references, or one JSON object per line.
    pub fn images(&self, images: &[ImageRecord]) {
        match self.mode {
            OutputMode::Normal => print!("{}", image_table(images)),
            OutputMode::Quiet => {
                for image in images {
                    println!("{}", image.reference());
                }
            }
            OutputMode::Json => {
                for image in images {
                    if let Ok(json) = serde_json::to_string(image) {
                        println!("{json}");
                    }
                }
            }
        }
    }

    /// Print a serializable value (JSON mode) or its plain summary.
    pub fn value<T: Serialize>(&self, value: &T, summary: &str) {
        match self.mode {
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(value) {
                    println!("{json}");
                }
            }
            _ => println!("{summary}"),
        }
    }

    fn event(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.elapsed_secs(),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

const HEADERS: [&str; 5] = ["REPOSITORY", "TAG", "IMAGE ID", "CREATED", "SIZE"];

fn image_table(images: &[ImageRecord]) -> String {
    let rows: Vec<[&str; 5]> = images
        .iter()
        .map(|i| {
            [
                i.repository.as_str(),
                i.tag.as_str(),
                i.id.as_str(),
                i.created_at.as_str(),
                i.size.as_str(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut table = String::new();
    for row in std::iter::once(&HEADERS).chain(&rows) {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("   ");
        table.push_str(line.trim_end());
        table.push('\n');
    }
    table
}
