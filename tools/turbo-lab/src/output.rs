//! Output formatting for the CLI.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use turbo_islands::{ActionOutcome, ChunkState, ChunkStatus};

/// Output handler for CLI messages.
#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    pub fn info(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style("✓").green(), msg);
    }

    pub fn warn(&self, msg: &str) {
        if self.json {
            return;
        }
        eprintln!("{} {}", style("⚠").yellow(), msg);
    }

    /// Print an error message. Always shown, as JSON in JSON mode.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
            return;
        }
        eprintln!("{} {}", style("✗").red(), style(msg).red());
    }

    pub fn debug(&self, msg: &str) {
        if !self.verbose || self.json {
            return;
        }
        eprintln!("{} {}", style("→").dim(), style(msg).dim());
    }

    pub fn header(&self, msg: &str) {
        if self.json {
            return;
        }
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a numbered step of a session.
    pub fn step(&self, num: usize, total: usize, msg: &str) {
        if self.json {
            return;
        }
        println!("{} {}", style(format!("[{}/{}]", num, total)).dim(), msg);
    }

    pub fn json<T: serde::Serialize>(&self, value: &T) {
        if let Ok(json) = serde_json::to_string_pretty(value) {
            println!("{}", json);
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.json {
            return;
        }
        println!("  {}: {}", style(key).dim(), value);
    }

    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let formatted: Vec<String> = cols
            .iter()
            .zip(widths.iter())
            .map(|(col, width)| format!("{:width$}", col, width = width))
            .collect();
        println!("  {}", formatted.join("  "));
    }

    /// Print the chunk status table.
    pub fn chunk_report(&self, report: &[ChunkStatus]) {
        if self.json {
            return;
        }
        let widths = [12, 18, 14, 12, 24];
        self.table_row(&["ISLAND", "TRIGGER", "CHUNK", "CONTROLLER", "HYDRATION"], &widths);
        for row in report {
            let chunk = chunk_badge(row.chunk);
            let controller = row.controller.as_deref().unwrap_or("-");
            let cols = [
                row.island.as_str(),
                row.trigger.as_str(),
                chunk.as_str(),
                controller,
                row.hydration,
            ];
            self.table_row(&cols, &widths);
        }
    }

    /// Print the outcome of an island action.
    pub fn outcome(&self, island: &str, action: &str, outcome: &ActionOutcome) {
        match outcome {
            ActionOutcome::Applied => self.success(&format!("{} {}", island, action)),
            ActionOutcome::Started => self.info(&format!("{} {} started", island, action)),
            ActionOutcome::Ignored(reason) => {
                self.warn(&format!("{} {} ignored: {}", island, action, reason))
            }
            ActionOutcome::Output(document) => {
                self.success(&format!("{} {}", island, action));
                if !self.json {
                    println!("{}", style(document).dim());
                }
            }
        }
    }

    /// Spinner shown while simulated time passes.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.json {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Chunk state padded to the table column, then coloured.
///
/// Escape codes count towards `{:width$}`, so padding happens first.
pub fn chunk_badge(state: ChunkState) -> String {
    let text = format!("{:14}", state.to_string());
    match state {
        ChunkState::Loaded => style(text).green().to_string(),
        ChunkState::Loading => style(text).yellow().to_string(),
        ChunkState::NotLoaded => style(text).dim().to_string(),
    }
}

/// Format milliseconds for display.
pub fn format_millis(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.1}s", ms as f64 / 1000.0)
    }
}
