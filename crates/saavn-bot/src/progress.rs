//! Progress message rendering and edit throttling.

#[cfg(test)]
#[path = "progress_tests.rs"]
mod progress_tests;

use teloxide::utils::markdown::escape;
use tokio::time::{Duration, Instant};

use crate::batch::{BatchStats, TargetKind};

/// Minimum time between edits of the same progress message (Telegram rate
/// limit headroom).
pub const MIN_EDIT_INTERVAL: Duration = Duration::from_secs(2);

/// An edit goes out on every Nth track even inside the interval.
pub const FORCE_EVERY_N_TRACKS: usize = 3;

const BAR_LENGTH: usize = 20;
const RULE: &str = "━━━━━━━━━━━━━━━━━━━━";

/// Decides whether a given track completion warrants a message edit.
///
/// Rule: at most one edit per [`MIN_EDIT_INTERVAL`], except the final track
/// and every [`FORCE_EVERY_N_TRACKS`]th track always report.
pub struct UpdateGate {
    last_sent: Option<Instant>,
}

impl UpdateGate {
    pub fn new() -> Self {
        Self { last_sent: None }
    }

    /// `index` is 1-based. Records the send when it answers `true`.
    pub fn should_send(&mut self, index: usize, total: usize) -> bool {
        let interval_open = match self.last_sent {
            Some(at) => at.elapsed() > MIN_EDIT_INTERVAL,
            None => true,
        };
        let forced = index == total || index % FORCE_EVERY_N_TRACKS == 0;
        if interval_open || forced {
            self.last_sent = Some(Instant::now());
            true
        } else {
            false
        }
    }
}

impl Default for UpdateGate {
    fn default() -> Self {
        Self::new()
    }
}

/// `[████████░░░░░░░░░░░░] 40%`
pub fn progress_bar(current: usize, total: usize) -> String {
    let total = total.max(1);
    let percent = current * 100 / total;
    let filled = (current * BAR_LENGTH + total / 2) / total;
    let filled = filled.min(BAR_LENGTH);
    format!(
        "\\[{}{}\\] {}%",
        "█".repeat(filled),
        "░".repeat(BAR_LENGTH - filled),
        percent
    )
}

pub fn format_duration(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Render the in-flight progress message (MarkdownV2).
pub fn render_progress(
    kind: TargetKind,
    name: &str,
    current: usize,
    total: usize,
    current_song: &str,
    stage: &str,
    stats: &BatchStats,
) -> String {
    let mut text = format!("{} *{}:* {}\n{RULE}\n\n", kind.emoji(), kind.label(), escape(name));
    text.push_str(&format!("📊 *Progress:* {current}/{total}\n"));
    text.push_str(&progress_bar(current, total));
    text.push_str("\n\n");
    text.push_str(&format!("🎵 *Current:* {}\n", escape(current_song)));
    text.push_str(&format!("📍 *Status:* {}\n\n", escape(stage)));
    text.push_str(&format!(
        "{RULE}\n✅ Success: {}\n⏭️ Skipped: {}\n❌ Failed: {}",
        stats.success, stats.skipped, stats.failed
    ));
    text
}

/// Render the one-off message sent before the first track starts.
pub fn render_start(kind: TargetKind, name: &str, total: usize) -> String {
    format!(
        "{} *{}:* {}\n{RULE}\n\n📊 *Total Songs:* {total}\n⏳ *Status:* Starting download\\.\\.\\.\n\n{}",
        kind.emoji(),
        kind.label(),
        escape(name),
        progress_bar(0, total)
    )
}

/// Render the final summary after the last track.
pub fn render_summary(kind: TargetKind, name: &str, total: usize, stats: &BatchStats) -> String {
    format!(
        "{} *{}:* {}\n{RULE}\n\n✅ *COMPLETED\\!*\n\n{}\n\n{RULE}\n📊 *Final Stats:*\n✅ Success: {}\n⏭️ Skipped: {}\n❌ Failed: {}\n📁 Total: {total}",
        kind.emoji(),
        kind.label(),
        escape(name),
        progress_bar(total, total),
        stats.success,
        stats.skipped,
        stats.failed
    )
}
