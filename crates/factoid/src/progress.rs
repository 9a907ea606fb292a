// AI
//! 📊 progress.rs — "Are we there yet?" — every fan-out, every time, forever.
//!
//! 🚀 Two jobs:
//! - a live progress bar while facts trickle in (one tick per arrival)
//! - a summary table once the run is done, because "Code finished running in 412ms"
//!   deserves a table. It just does.
//!
//! ⚠️ Watching this progress bar will not make the API respond faster.

use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

use crate::RunReport;
use crate::common::Fact;

/// ⏱️ Formats a Duration as `1.234s` below a minute, `MM:SS` above.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    if total_secs < 60 {
        format!("{:.3}s", duration.as_secs_f64())
    } else {
        format!("{:02}:{:02}", total_secs / 60, total_secs % 60)
    }
}

/// 📊 The live display for one run. Tracks arrivals against the fan-out width.
pub(crate) struct ProgressMetrics {
    /// 🏷️ what are we fetching from? shown above the bar
    source_name: String,
    /// 📏 how many facts we expect: the fan-out width
    expected: u64,
    /// 📄 how many have arrived so far
    received: u64,
    /// 🎨 indicatif does the heavy lifting here
    progress_bar: ProgressBar,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 custom Debug impl because ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("source_name", &self.source_name)
            .field("expected", &self.expected)
            .field("received", &self.received)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 A visible bar sized to `expected`. indicatif hides it by itself when stderr isn't a terminal.
    pub(crate) fn new(source_name: String, expected: usize) -> Self {
        let progress_bar = ProgressBar::new(expected as u64);
        // -- 🐛 a bad template only costs us the styling, never the run
        if let Ok(style) = ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}] {pos}/{len}") {
            progress_bar.set_style(style.progress_chars("=>-"));
        }
        Self::with_bar(source_name, expected, progress_bar)
    }

    /// 🙈 Same bookkeeping, nothing drawn. Tests use this one.
    pub(crate) fn hidden(expected: usize) -> Self {
        Self::with_bar(String::from("hidden"), expected, ProgressBar::hidden())
    }

    fn with_bar(source_name: String, expected: usize, progress_bar: ProgressBar) -> Self {
        Self {
            source_name,
            expected: expected as u64,
            received: 0,
            progress_bar,
            start_time: Instant::now(),
        }
    }

    /// 📬 One more fact made it home.
    pub(crate) fn record_arrival(&mut self, fact: &Fact) {
        self.received += 1;
        self.render(fact);
        self.progress_bar.set_position(self.received);
    }

    #[cfg(test)]
    pub(crate) fn received(&self) -> u64 {
        self.received
    }

    /// ✅ Mark the progress bar done. Ring the bell.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    /// 🎨 Rate, count and elapsed time as a borderless comfy-table above the bar.
    fn render(&self, latest: &Fact) {
        let elapsed = self.start_time.elapsed();
        let facts_per_sec = if elapsed.as_secs_f64() > 0.0 {
            self.received as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{:.2} Facts/s", facts_per_sec)).set_alignment(CellAlignment::Right),
            Cell::new(format!("{} / {} Facts", self.received, self.expected))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("latest: {}", latest.id)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("source: {}\n{}", self.source_name, table));
    }
}

/// 🍽️ The end-of-run summary. Two columns, no borders, all facts.
pub fn render_report(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    let rows = [
        ("source", report.source.clone()),
        ("workers", report.width.to_string()),
        ("facts persisted", report.facts_persisted.to_string()),
        ("written to", report.destination.clone()),
        ("finished in", format_duration(report.elapsed)),
    ];
    for (label, value) in rows {
        table.add_row(vec![
            Cell::new(label).set_alignment(CellAlignment::Right),
            Cell::new(value),
        ]);
    }
    table
}
