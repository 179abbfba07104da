// AI
//! 📊 progress.rs: "Are we there yet?" asks every bridge task, forever.
//!
//! 🚀 A spinner while tuples flow, and a table so comfy it has lumbar support once
//! they stop. The spinner draws to stderr and quietly hides itself when stderr
//! is not a terminal, so piping output around does not paint escape codes
//! all over somebody's log file.
//!
//! ⚠️ Watching this spinner will not make it go faster. We've tried. Science says no. 🦆

use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};

use crate::bridge::BridgeStats;

/// 🔢 Formats a number with commas. "1000000 tuples" → "1,000,000 tuples". You're welcome, eyes.
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// ⏱️ MM:SS for most tasks, HH:MM:SS for the ones that ran through lunch.
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// 📋 What a finished task has to show for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSummary {
    pub tuples_written: u64,
    pub records_written: u64,
    pub elapsed: Duration,
}

impl TaskSummary {
    pub(crate) fn from_stats(stats: BridgeStats, elapsed: Duration) -> Self {
        Self {
            tuples_written: stats.tuples_written,
            records_written: stats.records_written,
            elapsed,
        }
    }

    /// 🚀 Tuples per second, or 0 when the task finished faster than the clock could notice.
    pub fn tuples_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.tuples_written as f64 / secs
        } else {
            0.0
        }
    }

    /// 🍽️ Render the summary as a borderless two-column table.
    pub fn render(&self) -> String {
        let mut table = Table::new();
        table
            .load_preset(NOTHING)
            .set_content_arrangement(ContentArrangement::Dynamic);
        let rows = [
            ("tuples", format_number(self.tuples_written)),
            ("records", format_number(self.records_written)),
            ("elapsed", format_duration(self.elapsed)),
            ("tuples/sec", format!("{:.1}", self.tuples_per_sec())),
        ];
        for (label, value) in rows {
            table.add_row(vec![
                Cell::new(label),
                Cell::new(value).set_alignment(CellAlignment::Right),
            ]);
        }
        table.to_string()
    }
}

/// 🌀 Live progress for a running task: a spinner and a tuple count.
pub(crate) struct ProgressMetrics {
    progress_bar: ProgressBar,
    tuples: u64,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("tuples", &self.tuples)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 A spinner labelled with the task name, or a hidden one if nobody asked.
    pub(crate) fn new(label: &str, visible: bool) -> Self {
        let progress_bar = if visible {
            let bar = ProgressBar::new_spinner();
            // -- 🎨 a bad template is a programming error in this file, not a runtime condition
            if let Ok(style) = ProgressStyle::with_template("{spinner} {prefix} {msg} [{elapsed}]") {
                bar.set_style(style);
            }
            bar.set_prefix(label.to_string());
            bar.enable_steady_tick(Duration::from_millis(120));
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            progress_bar,
            tuples: 0,
            start_time: Instant::now(),
        }
    }

    /// ➕ One more tuple crossed. Redraw the message every so often, not every time.
    pub(crate) fn tick(&mut self) {
        self.tuples += 1;
        if self.tuples % 1024 == 0 {
            self.progress_bar
                .set_message(format!("{} tuples", format_number(self.tuples)));
        }
    }

    pub(crate) fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 🏁 Stop spinning and leave the final count on screen.
    pub(crate) fn finish(&self) {
        self.progress_bar
            .finish_with_message(format!("{} tuples", format_number(self.tuples)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_big_numbers_get_their_commas() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn the_one_where_durations_pick_their_format() {
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(format_duration(Duration::from_secs(3661)), "01:01:01");
    }

    #[test]
    fn the_one_where_the_summary_table_shows_everything() {
        let the_summary = TaskSummary {
            tuples_written: 2000,
            records_written: 2000,
            elapsed: Duration::from_secs(2),
        };
        assert_eq!(the_summary.tuples_per_sec(), 1000.0);
        let the_table = the_summary.render();
        assert!(the_table.contains("2,000"));
        assert!(the_table.contains("00:02"));
        assert!(the_table.contains("1000.0"));
    }

    #[test]
    fn the_one_where_a_hidden_spinner_still_counts() {
        let mut the_metrics = ProgressMetrics::new("test", false);
        the_metrics.tick();
        the_metrics.tick();
        the_metrics.finish();
        assert_eq!(the_metrics.tuples, 2);
    }
}
