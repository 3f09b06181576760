//! Batch runs: everything between "/artist 123" and the final summary edit.

#[cfg(test)]
#[path = "batch_tests.rs"]
mod batch_tests;

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use saavn_api::{SaavnClient, Song};
use teloxide::utils::markdown::escape;
use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

use crate::outbound::Messenger;
use crate::pipeline::{Stage, TrackOutcome, TrackPipeline};
use crate::progress::{render_progress, render_start, render_summary, UpdateGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Artist,
    Playlist,
}

impl TargetKind {
    pub fn label(&self) -> &'static str {
        match self {
            TargetKind::Artist => "Artist",
            TargetKind::Playlist => "Playlist",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TargetKind::Artist => "🎤",
            TargetKind::Playlist => "📋",
        }
    }

    fn key_prefix(&self) -> &'static str {
        match self {
            TargetKind::Artist => "artist",
            TargetKind::Playlist => "playlist",
        }
    }
}

/// What a batch run archives: one artist's or one playlist's catalog.
#[derive(Debug, Clone)]
pub struct BatchTarget {
    pub kind: TargetKind,
    pub id: String,
}

impl BatchTarget {
    /// Registry key; two requests with the same key race for one slot.
    pub fn key(&self) -> String {
        format!("{}_{}", self.kind.key_prefix(), self.id)
    }
}

/// Per-run outcome counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &TrackOutcome) {
        match outcome {
            TrackOutcome::Succeeded { .. } => self.success += 1,
            TrackOutcome::SkippedExists
            | TrackOutcome::SkippedTooLong
            | TrackOutcome::SkippedTooLarge => self.skipped += 1,
            TrackOutcome::Failed { .. } => self.failed += 1,
        }
    }
}

/// Registry of targets currently being archived. Duplicate requests are
/// rejected, not queued; the claim is released by dropping the guard, which
/// covers error exits too.
#[derive(Clone, Default)]
pub struct ActiveRuns {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl ActiveRuns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim a run slot for `key`. `None` means a run for the
    /// same target is already in flight.
    pub fn try_claim(&self, key: &str) -> Option<RunGuard> {
        let mut active = self.inner.lock().unwrap();
        if active.insert(key.to_string()) {
            Some(RunGuard {
                key: key.to_string(),
                inner: self.inner.clone(),
            })
        } else {
            None
        }
    }

    pub fn keys(&self) -> Vec<String> {
        let active = self.inner.lock().unwrap();
        let mut keys: Vec<String> = active.iter().cloned().collect();
        keys.sort();
        keys
    }
}

pub struct RunGuard {
    key: String,
    inner: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.inner.lock().unwrap().remove(&self.key);
    }
}

/// Drives the track pipeline over one target's full catalog, strictly one
/// song at a time.
pub struct BatchRunner {
    catalog: SaavnClient,
    pipeline: TrackPipeline,
    messenger: Arc<dyn Messenger>,
    runs: ActiveRuns,
    inter_track_delay: Duration,
}

impl BatchRunner {
    pub fn new(
        catalog: SaavnClient,
        pipeline: TrackPipeline,
        messenger: Arc<dyn Messenger>,
        runs: ActiveRuns,
        inter_track_delay: Duration,
    ) -> Self {
        Self {
            catalog,
            pipeline,
            messenger,
            runs,
            inter_track_delay,
        }
    }

    pub fn active_keys(&self) -> Vec<String> {
        self.runs.keys()
    }

    /// Archive everything for `target`, reporting progress to `chat_id`.
    /// Never returns an error: orchestration failures are reported to the
    /// chat and the run slot is released either way.
    pub async fn run(&self, target: BatchTarget, chat_id: i64) {
        let key = target.key();
        let guard = match self.runs.try_claim(&key) {
            Some(guard) => guard,
            None => {
                info!("Rejected duplicate run for {}", key);
                let text = escape(&format!(
                    "⚠️ This {} is already being downloaded!",
                    target.kind.label().to_lowercase()
                ));
                if let Err(e) = self.messenger.send_status(chat_id, &text).await {
                    warn!("Could not notify chat {} about duplicate run: {}", chat_id, e);
                }
                return;
            }
        };

        info!("Starting batch run for {}", key);
        if let Err(e) = self.run_inner(&target, chat_id).await {
            error!("Batch run for {} aborted: {}", key, e);
            let text = escape(&format!("❌ Error: {e}"));
            if let Err(send_err) = self.messenger.send_status(chat_id, &text).await {
                warn!("Could not report batch error to chat {}: {}", chat_id, send_err);
            }
        }
        drop(guard);
    }

    async fn run_inner(&self, target: &BatchTarget, chat_id: i64) -> anyhow::Result<()> {
        let (name, songs) = self.resolve_target(target).await;

        if songs.is_empty() {
            let text = escape(&format!(
                "❌ No songs found for this {}!",
                target.kind.label().to_lowercase()
            ));
            self.messenger.send_status(chat_id, &text).await?;
            return Ok(());
        }

        info!("{} \"{}\": {} songs to process", target.kind.label(), name, songs.len());

        let total = songs.len();
        let status_id = self
            .messenger
            .send_status(chat_id, &render_start(target.kind, &name, total))
            .await?;

        let mut stats = BatchStats::default();
        let mut gate = UpdateGate::new();

        for (i, song) in songs.iter().enumerate() {
            let index = i + 1;
            let song_name = song.title();
            debug!("[{}/{}] {}", index, total, song_name);

            let (stage_tx, stage_rx) = watch::channel(Stage::Queued);
            let outcome = self.pipeline.process(&song.id, &stage_tx).await;
            stats.record(&outcome);

            if gate.should_send(index, total) {
                let stage_label = stage_rx.borrow().to_string();
                let text = render_progress(
                    target.kind,
                    &name,
                    index,
                    total,
                    &song_name,
                    &stage_label,
                    &stats,
                );
                if let Err(e) = self.messenger.edit_status(chat_id, status_id, &text).await {
                    warn!("Progress update failed: {}", e);
                }
            }

            if index < total {
                tokio::time::sleep(self.inter_track_delay).await;
            }
        }

        self.messenger
            .edit_status(
                chat_id,
                status_id,
                &render_summary(target.kind, &name, total, &stats),
            )
            .await?;

        info!(
            "Batch run for {} finished: {} ok, {} skipped, {} failed",
            target.key(),
            stats.success,
            stats.skipped,
            stats.failed
        );
        Ok(())
    }

    /// Resolve the display name and the full song list. Name lookup is
    /// best-effort; listing failures already degrade to a partial (possibly
    /// empty) list inside the client.
    async fn resolve_target(&self, target: &BatchTarget) -> (String, Vec<Song>) {
        match target.kind {
            TargetKind::Artist => {
                let name = match self.catalog.artist(&target.id).await {
                    Ok(details) => details.display_name(),
                    Err(e) => {
                        debug!("Artist lookup for {} failed: {}", target.id, e);
                        "Unknown Artist".to_string()
                    }
                };
                (name, self.catalog.all_artist_songs(&target.id).await)
            }
            TargetKind::Playlist => {
                let name = match self.catalog.playlist(&target.id).await {
                    Ok(details) => details.display_name(),
                    Err(e) => {
                        debug!("Playlist lookup for {} failed: {}", target.id, e);
                        "Unknown Playlist".to_string()
                    }
                };
                (name, self.catalog.all_playlist_songs(&target.id).await)
            }
        }
    }
}
