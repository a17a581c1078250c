//! 📊 progress.rs: "Are we there yet?" Every indexing pass, every time, forever.
//!
//! 🚀 Counts documents against the listing's `doc_count`, renders a bar and a table
//! so comfy it has lumbar support.
//!
//! ⚠️ Staring at the bar does not make the by-id queries any faster.
//! The DBA has asked us to stop trying. 🦆

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use comfy_table::{Cell, CellAlignment, ContentArrangement, Table, presets::NOTHING};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::warn;

// -- ⏱️ rates are averaged over this window so one slow record doesn't look like the apocalypse
const RATE_WINDOW: Duration = Duration::from_secs(5);

/// 🔢 Formats a number with commas. "1000000 docs" → "1,000,000 docs". You're welcome, eyes.
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

/// ⏱️ MM:SS or HH:MM:SS. If it shows HH:MM:SS, call your mom. It's been a while.
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

fn bar_style() -> ProgressStyle {
    match ProgressStyle::default_bar().template("{msg}\n| [{bar:40.cyan/blue}] {pos}/{len}") {
        Ok(style) => style.progress_chars("=>-"),
        Err(e) => {
            warn!("🎨 progress template rejected ({e}), falling back to the plain bar");
            ProgressStyle::default_bar()
        }
    }
}

/// 📊 Tracks indexed and skipped documents for one pass, plus a documents-per-second rate.
///
/// # Ancient Proverb
/// "He who indexes without a progress bar, indexes alone and in darkness."
pub(crate) struct ProgressMetrics {
    /// 🏷️ what are we indexing? shown at the top of the display
    source_name: String,
    /// 📏 records the listing promised
    total_records: u64,
    /// 📄 documents handed to the sink so far
    indexed: u64,
    /// 🕳️ records skipped because a mapping query found nothing
    skipped: u64,
    progress_bar: ProgressBar,
    /// 🔄 sliding window of (timestamp, records seen) for the rate
    rate_samples: VecDeque<(Instant, u64)>,
    start_time: Instant,
}

impl std::fmt::Debug for ProgressMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // -- 🎭 ProgressBar is a diva and doesn't derive Debug
        f.debug_struct("ProgressMetrics")
            .field("source_name", &self.source_name)
            .field("total_records", &self.total_records)
            .field("indexed", &self.indexed)
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl ProgressMetrics {
    /// 🚀 `visible = false` keeps the counting and hides the bar. Log-only runs, tests.
    pub(crate) fn new(source_name: String, total_records: u64, visible: bool) -> Self {
        let progress_bar = if visible {
            ProgressBar::new(total_records)
        } else {
            let hidden = ProgressBar::hidden();
            hidden.set_length(total_records);
            hidden
        };
        progress_bar.set_style(bar_style());

        let start_time = Instant::now();
        // -- 🔄 seed the window with t=0 so we don't divide by zero like animals
        let mut rate_samples = VecDeque::new();
        rate_samples.push_back((start_time, 0u64));

        Self {
            source_name,
            total_records,
            indexed: 0,
            skipped: 0,
            progress_bar,
            rate_samples,
            start_time,
        }
    }

    /// ✅ One more document made it to the sink.
    pub(crate) fn record_indexed(&mut self) {
        self.indexed += 1;
        self.tick();
    }

    /// 🕳️ One more record skipped.
    pub(crate) fn record_skipped(&mut self) {
        self.skipped += 1;
        self.tick();
    }

    pub(crate) fn indexed(&self) -> u64 {
        self.indexed
    }

    pub(crate) fn skipped(&self) -> u64 {
        self.skipped
    }

    fn seen(&self) -> u64 {
        self.indexed + self.skipped
    }

    fn tick(&mut self) {
        let rate = self.docs_per_sec();
        self.render(rate);
        self.progress_bar.set_position(self.seen());
    }

    /// ✅ Ring the bell. We made it.
    pub(crate) fn finish(&self) {
        self.progress_bar.finish();
    }

    /// 📈 Records per second over the last [`RATE_WINDOW`].
    fn docs_per_sec(&mut self) -> f64 {
        let now = Instant::now();
        while let Some(&(timestamp, _)) = self.rate_samples.front() {
            if now.duration_since(timestamp) > RATE_WINDOW {
                self.rate_samples.pop_front();
            } else {
                break;
            }
        }
        self.rate_samples.push_back((now, self.seen()));

        match self.rate_samples.front() {
            Some(&(oldest_time, oldest_seen)) => {
                let elapsed = now.duration_since(oldest_time).as_secs_f64();
                if elapsed > 0.0 {
                    self.seen().saturating_sub(oldest_seen) as f64 / elapsed
                } else {
                    0.0
                }
            }
            None => 0.0,
        }
    }

    fn percent(&self) -> f64 {
        if self.total_records > 0 {
            (self.seen() as f64 / self.total_records as f64) * 100.0
        } else {
            0.0
        }
    }

    /// 🎨 Render the display as a comfy-table message on the bar:
    /// ```text
    /// source: <name>
    ///   <docs/s>       <indexed docs>
    ///   <skipped>      <percent>
    ///   <elapsed>      <remaining>
    /// | [=====>----------] 12/40
    /// ```
    fn render(&self, docs_per_sec: f64) {
        let percent = self.percent();
        let elapsed = self.start_time.elapsed();
        let remaining = if percent > 0.0 {
            // 🔮 linear extrapolation: assumes the future looks like the past
            let total_estimated = elapsed.as_secs_f64() / (percent / 100.0);
            let remaining_secs = total_estimated - elapsed.as_secs_f64();
            if remaining_secs > 0.0 {
                format_duration(Duration::from_secs_f64(remaining_secs))
            } else {
                "--:--".to_string()
            }
        } else {
            "--:--".to_string()
        };

        let mut table = Table::new();
        table.load_preset(NOTHING);
        table.set_content_arrangement(ContentArrangement::Dynamic);
        table.add_row(vec![
            Cell::new(format!("{} Docs/s", format_number(docs_per_sec as u64)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} Docs", format_number(self.indexed)))
                .set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} skipped", format_number(self.skipped)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2}%", percent)).set_alignment(CellAlignment::Right),
        ]);
        table.add_row(vec![
            Cell::new(format!("{} elapsed", format_duration(elapsed)))
                .set_alignment(CellAlignment::Right),
            Cell::new(format!("{} remaining", remaining)).set_alignment(CellAlignment::Right),
        ]);

        self.progress_bar
            .set_message(format!("source: {}\n{}", self.source_name, table));
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
    fn the_one_where_long_passes_grow_an_hour_column() {
        assert_eq!(format_duration(Duration::from_secs(65)), "01:05");
        assert_eq!(format_duration(Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn the_one_where_skipped_records_still_count_toward_done() {
        let mut metrics = ProgressMetrics::new("records".into(), 4, false);
        metrics.record_indexed();
        metrics.record_indexed();
        metrics.record_skipped();
        assert_eq!(metrics.indexed(), 2);
        assert_eq!(metrics.skipped(), 1);
        assert!((metrics.percent() - 75.0).abs() < f64::EPSILON);
        metrics.finish();
    }
}
