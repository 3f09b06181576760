//! The per-track state machine: ledger gate → metadata → download →
//! transcode → upload → record.
//!
//! Every failure mode is folded into a [`TrackOutcome`]; the only way a
//! track influences its batch is through that value and the stage channel.
//! Scratch files are removed on every exit path by a drop guard.

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod pipeline_tests;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use saavn_api::{SaavnClient, Song};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::download::fetch_to_file;
use crate::errors::TrackError;
use crate::ledger::{Ledger, NewEntry};
use crate::outbound::{AudioUpload, Messenger};
use crate::progress::format_duration;
use crate::transcode::{self, TagSet};

const MAX_TITLE_CHARS: usize = 100;
const MAX_ARTIST_CHARS: usize = 50;

/// Where a track currently is in its pipeline. Published on a watch channel
/// so the progress renderer can show the latest stage without holding any
/// shared counters.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Queued,
    FetchingInfo,
    Downloading,
    Converting,
    Uploading,
    Done,
    AlreadyArchived,
    TooLong,
    TooLarge,
    Failed(String),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Queued => write!(f, "Starting..."),
            Stage::FetchingInfo => write!(f, "Fetching info..."),
            Stage::Downloading => write!(f, "Downloading..."),
            Stage::Converting => write!(f, "Converting..."),
            Stage::Uploading => write!(f, "Uploading..."),
            Stage::Done => write!(f, "✅ Done"),
            Stage::AlreadyArchived => write!(f, "Already exists, skipped"),
            Stage::TooLong => write!(f, "Too long, skipped"),
            Stage::TooLarge => write!(f, "Too large, skipped"),
            Stage::Failed(reason) => write!(f, "❌ {reason}"),
        }
    }
}

/// Terminal result of processing one track.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    Succeeded { title: String },
    SkippedExists,
    SkippedTooLong,
    SkippedTooLarge,
    Failed { reason: String },
}

/// Removes its registered files when dropped, on success and failure alike.
/// A failed removal is logged and forgotten — scratch space is best-effort.
struct Scratch {
    files: Vec<PathBuf>,
}

impl Scratch {
    fn new() -> Self {
        Self { files: Vec::new() }
    }

    fn track(&mut self, path: PathBuf) -> PathBuf {
        self.files.push(path.clone());
        path
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        for path in &self.files {
            match std::fs::remove_file(path) {
                Ok(()) => debug!("Removed scratch file {}", path.display()),
                Err(e) => debug!("Scratch file {} not removed: {}", path.display(), e),
            }
        }
    }
}

pub struct TrackPipeline {
    catalog: SaavnClient,
    /// Dedicated client for media downloads, carrying the 60 s timeout.
    media_http: reqwest::Client,
    ledger: Ledger,
    messenger: Arc<dyn Messenger>,
    download_dir: PathBuf,
    temp_dir: PathBuf,
    max_bytes: u64,
    max_duration_secs: u32,
}

impl TrackPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: SaavnClient,
        media_http: reqwest::Client,
        ledger: Ledger,
        messenger: Arc<dyn Messenger>,
        download_dir: PathBuf,
        temp_dir: PathBuf,
        max_bytes: u64,
        max_duration_secs: u32,
    ) -> Self {
        Self {
            catalog,
            media_http,
            ledger,
            messenger,
            download_dir,
            temp_dir,
            max_bytes,
            max_duration_secs,
        }
    }

    /// Run one track through the full pipeline. Never fails the caller:
    /// errors become `TrackOutcome::Failed` and the terminal stage label.
    pub async fn process(&self, song_id: &str, stage: &watch::Sender<Stage>) -> TrackOutcome {
        let mut scratch = Scratch::new();
        match self.run_steps(song_id, stage, &mut scratch).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Track {} failed: {}", song_id, e);
                let reason = e.to_string();
                let _ = stage.send(Stage::Failed(reason.clone()));
                TrackOutcome::Failed { reason }
            }
        }
    }

    async fn run_steps(
        &self,
        song_id: &str,
        stage: &watch::Sender<Stage>,
        scratch: &mut Scratch,
    ) -> Result<TrackOutcome, TrackError> {
        // Dedup gate: a ledger hit is the one and only skip-forever path.
        if self.ledger.contains(song_id).await? {
            let _ = stage.send(Stage::AlreadyArchived);
            return Ok(TrackOutcome::SkippedExists);
        }

        let _ = stage.send(Stage::FetchingInfo);
        let song = self.catalog.song(song_id).await?;

        let media_url = song
            .best_download_url()
            .ok_or(TrackError::NoMediaUrl)?
            .to_string();

        let duration = song.duration.unwrap_or(0);
        if duration > self.max_duration_secs {
            debug!(
                "Skipping {}: {} exceeds the duration cutoff",
                song_id,
                format_duration(duration)
            );
            let _ = stage.send(Stage::TooLong);
            return Ok(TrackOutcome::SkippedTooLong);
        }

        let _ = stage.send(Stage::Downloading);
        let audio_path = scratch.track(self.temp_dir.join(format!("{song_id}_audio.mp4")));
        fetch_to_file(
            &self.media_http,
            &media_url,
            &audio_path,
            Some(self.max_bytes),
        )
        .await?;

        // Cover art is a nice-to-have: a failed fetch is discarded and the
        // track ships without it.
        let mut cover: Option<PathBuf> = None;
        if let Some(thumb_url) = song.thumbnail_url() {
            let thumb_path = scratch.track(self.temp_dir.join(format!("{song_id}_thumb.jpg")));
            match fetch_to_file(&self.media_http, thumb_url, &thumb_path, None).await {
                Ok(_) => cover = Some(thumb_path),
                Err(e) => debug!("Cover art for {} skipped: {}", song_id, e),
            }
        }

        let title = song.title();
        let artist = song.artist_names();
        let out_path = scratch.track(
            self.download_dir
                .join(format!("{} - {}.mp3", sanitize_title(&title), sanitize_artist(&artist))),
        );

        let _ = stage.send(Stage::Converting);
        let tags = TagSet {
            title: title.clone(),
            artist: artist.clone(),
            album: song.album_name(),
            year: song.year.clone().unwrap_or_default(),
            language: song.language.clone().unwrap_or_default(),
        };
        transcode::to_tagged_mp3(&audio_path, cover.as_deref(), &tags, &out_path)
            .await
            .map_err(|e| TrackError::Conversion(e.to_string()))?;

        // The pre-download ceiling watched the compressed source; the MP3 can
        // land on the other side of it, so the output size is what counts.
        let file_size = tokio::fs::metadata(&out_path)
            .await
            .map_err(|e| TrackError::Conversion(format!("output not readable: {e}")))?
            .len();
        if file_size > self.max_bytes {
            let _ = stage.send(Stage::TooLarge);
            return Ok(TrackOutcome::SkippedTooLarge);
        }

        let _ = stage.send(Stage::Uploading);
        let caption = build_caption(&song, &title, &artist);
        let channel_message_id = self
            .messenger
            .send_audio(AudioUpload {
                path: out_path.clone(),
                caption,
                title: title.clone(),
                performer: artist.clone(),
                duration_secs: duration,
            })
            .await
            .map_err(|e| TrackError::Upload(e.to_string()))?;

        self.ledger
            .record(&NewEntry {
                song_id: song_id.to_string(),
                title: title.clone(),
                artist,
                channel_message_id,
                duration_secs: duration,
                source_url: song.url.clone(),
                file_size_bytes: file_size,
            })
            .await?;

        let _ = stage.send(Stage::Done);
        Ok(TrackOutcome::Succeeded { title })
    }
}

fn build_caption(song: &Song, title: &str, artist: &str) -> String {
    let year = song.year.as_deref().unwrap_or("N/A");
    format!(
        "🎵 {title}\n👤 {artist}\n💿 {album}\n📅 {year}",
        album = song.album_name()
    )
}

/// Characters that are unsafe in filenames on at least one supported
/// filesystem, plus the shell-noise characters the title position attracts.
fn strip_chars(raw: &str, banned: &[char]) -> String {
    raw.chars()
        .filter(|c| !banned.contains(c) && !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

fn truncate_chars(raw: &str, max: usize) -> String {
    raw.chars().take(max).collect()
}

pub fn sanitize_title(raw: &str) -> String {
    truncate_chars(
        &strip_chars(raw, &['<', '>', ':', '"', '$', '@', '/', '\\', '|', '?', '*']),
        MAX_TITLE_CHARS,
    )
}

pub fn sanitize_artist(raw: &str) -> String {
    truncate_chars(
        &strip_chars(raw, &['<', '>', ':', '"', '/', '\\', '|', '?', '*']),
        MAX_ARTIST_CHARS,
    )
}
