//! HTTP client and pagination for the Saavn catalog.

#[cfg(test)]
#[path = "client_tests.rs"]
mod client_tests;

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{ApiEnvelope, ArtistDetails, ArtistSongsPage, PlaylistDetails, Song};

/// Hard stop for artist song pagination, in case the API never reports a
/// final page.
pub const ARTIST_PAGE_CEILING: u32 = 500;

/// Hard stop for playlist pagination.
pub const PLAYLIST_PAGE_CEILING: u32 = 100;

/// Songs requested per playlist page. A shorter page signals the last one.
pub const PLAYLIST_PAGE_SIZE: usize = 100;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("API reported failure for {0}")]
    Unsuccessful(String),

    #[error("{0} not found")]
    NotFound(String),
}

/// Thin client over the catalog API. `base_url` is injectable so tests can
/// point it at a local mock server.
#[derive(Clone)]
pub struct SaavnClient {
    http: reqwest::Client,
    base_url: String,
}

impl SaavnClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_envelope<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ApiError::Status(resp.status()));
        }
        Ok(resp.json::<ApiEnvelope<T>>().await?)
    }

    /// Fetch one song's full metadata. The songs endpoint wraps its payload
    /// in a one-element array.
    pub async fn song(&self, song_id: &str) -> Result<Song, ApiError> {
        let url = format!("{}/api/songs/{}", self.base_url, song_id);
        let envelope: ApiEnvelope<Vec<Song>> = self.get_envelope(&url).await?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful(format!("song {song_id}")));
        }
        envelope
            .data
            .and_then(|mut songs| {
                if songs.is_empty() {
                    None
                } else {
                    Some(songs.remove(0))
                }
            })
            .ok_or_else(|| ApiError::NotFound(format!("song {song_id}")))
    }

    pub async fn artist(&self, artist_id: &str) -> Result<ArtistDetails, ApiError> {
        let url = format!("{}/api/artists/{}", self.base_url, artist_id);
        let envelope: ApiEnvelope<ArtistDetails> = self.get_envelope(&url).await?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful(format!("artist {artist_id}")));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::NotFound(format!("artist {artist_id}")))
    }

    pub async fn playlist(&self, playlist_id: &str) -> Result<PlaylistDetails, ApiError> {
        let url = format!("{}/api/playlists?id={}", self.base_url, playlist_id);
        let envelope: ApiEnvelope<PlaylistDetails> = self.get_envelope(&url).await?;
        if !envelope.success {
            return Err(ApiError::Unsuccessful(format!("playlist {playlist_id}")));
        }
        envelope
            .data
            .ok_or_else(|| ApiError::NotFound(format!("playlist {playlist_id}")))
    }

    /// Walk the artist's song pages and collect every song once, in the
    /// order the API first lists it.
    ///
    /// Pagination stops when the API reports failure, a page comes back
    /// empty, or the page ceiling is hit. A transport or parse error on a
    /// page ends the walk early and returns whatever has been collected —
    /// a truncated catalog beats an aborted batch.
    pub async fn all_artist_songs(&self, artist_id: &str) -> Vec<Song> {
        let mut songs: Vec<Song> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in 0..=ARTIST_PAGE_CEILING {
            let url = format!(
                "{}/api/artists/{}/songs?page={}",
                self.base_url, artist_id, page
            );
            let envelope: ApiEnvelope<ArtistSongsPage> = match self.get_envelope(&url).await {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(
                        "Artist song listing stopped at page {} after {} songs: {}",
                        page,
                        songs.len(),
                        e
                    );
                    break;
                }
            };

            if !envelope.success {
                break;
            }
            let page_songs = envelope.data.map(|d| d.songs).unwrap_or_default();
            if page_songs.is_empty() {
                break;
            }
            accumulate(page_songs, &mut seen, &mut songs);
        }

        debug!("Collected {} songs for artist {}", songs.len(), artist_id);
        songs
    }

    /// Walk the playlist pages (100 songs per request). In addition to the
    /// artist-listing stop conditions, a page shorter than the requested
    /// limit marks the last page.
    pub async fn all_playlist_songs(&self, playlist_id: &str) -> Vec<Song> {
        let mut songs: Vec<Song> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for page in 0..=PLAYLIST_PAGE_CEILING {
            let url = format!(
                "{}/api/playlists?id={}&page={}&limit={}",
                self.base_url, playlist_id, page, PLAYLIST_PAGE_SIZE
            );
            let envelope: ApiEnvelope<PlaylistDetails> = match self.get_envelope(&url).await {
                Ok(envelope) => envelope,
                Err(e) => {
                    warn!(
                        "Playlist listing stopped at page {} after {} songs: {}",
                        page,
                        songs.len(),
                        e
                    );
                    break;
                }
            };

            if !envelope.success {
                break;
            }
            let page_songs = envelope.data.map(|d| d.songs).unwrap_or_default();
            if page_songs.is_empty() {
                break;
            }
            let page_len = page_songs.len();
            accumulate(page_songs, &mut seen, &mut songs);
            if page_len < PLAYLIST_PAGE_SIZE {
                break;
            }
        }

        debug!(
            "Collected {} songs for playlist {}",
            songs.len(),
            playlist_id
        );
        songs
    }
}

/// Append songs not seen before, preserving arrival order. Overlapping pages
/// are an observed API misbehavior; the seen-set makes them harmless.
fn accumulate(page: Vec<Song>, seen: &mut HashSet<String>, out: &mut Vec<Song>) {
    for song in page {
        if seen.insert(song.id.clone()) {
            out.push(song);
        }
    }
}
