//! Wire schemas for the Saavn API.
//!
//! The API wraps every response in `{success, data}`. Media variants come as
//! ranked arrays ordered from lowest to highest quality; the selection
//! helpers below encode the fallback chains:
//!
//! - audio: index 4 (320 kbps) → 3 (160 kbps) → 2 (96 kbps), else `None`
//! - artwork: index 2 (500x500) → 1 (150x150), else `None`

#[cfg(test)]
#[path = "models_tests.rs"]
mod models_tests;

use serde::Deserialize;

/// Standard `{success, data}` response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
}

/// One quality tier of a song's cover art.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageLink {
    #[serde(default)]
    pub quality: Option<String>,
    pub url: Option<String>,
}

/// One quality tier of a song's audio stream.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadLink {
    #[serde(default)]
    pub quality: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtistRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongArtists {
    #[serde(default)]
    pub primary: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SongAlbum {
    pub name: Option<String>,
}

/// Full song record as returned by `/api/songs/{id}` and embedded in the
/// listing endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct Song {
    pub id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// Saavn web page for the song, kept as the ledger's source URL.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub album: Option<SongAlbum>,
    #[serde(default)]
    pub artists: Option<SongArtists>,
    #[serde(default)]
    pub image: Vec<ImageLink>,
    #[serde(rename = "downloadUrl", default)]
    pub download_url: Vec<DownloadLink>,
}

impl Song {
    /// Display title with HTML entities decoded.
    pub fn title(&self) -> String {
        match &self.name {
            Some(name) => decode_html_entities(name),
            None => "Unknown".to_string(),
        }
    }

    /// Comma-joined primary artist names, in catalog order.
    pub fn artist_names(&self) -> String {
        let joined = self
            .artists
            .as_ref()
            .map(|a| {
                a.primary
                    .iter()
                    .filter_map(|r| r.name.as_deref())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        if joined.is_empty() {
            "Unknown".to_string()
        } else {
            decode_html_entities(&joined)
        }
    }

    pub fn album_name(&self) -> String {
        match self.album.as_ref().and_then(|a| a.name.as_deref()) {
            Some(name) => decode_html_entities(name),
            None => "Unknown".to_string(),
        }
    }

    /// Highest-quality playable stream: 320 kbps, then 160, then 96.
    pub fn best_download_url(&self) -> Option<&str> {
        [4usize, 3, 2]
            .iter()
            .filter_map(|&i| self.download_url.get(i))
            .find_map(|link| link.url.as_deref())
    }

    /// Cover art at the 500px tier, falling back to 150px.
    pub fn thumbnail_url(&self) -> Option<&str> {
        [2usize, 1]
            .iter()
            .filter_map(|&i| self.image.get(i))
            .find_map(|link| link.url.as_deref())
    }
}

/// `/api/artists/{id}` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistDetails {
    pub name: Option<String>,
    #[serde(default)]
    pub image: Vec<ImageLink>,
    #[serde(rename = "followerCount", default)]
    pub follower_count: Option<u64>,
}

impl ArtistDetails {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => decode_html_entities(name),
            None => "Unknown Artist".to_string(),
        }
    }
}

/// `/api/artists/{id}/songs?page=N` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistSongsPage {
    #[serde(default)]
    pub songs: Vec<Song>,
}

/// `/api/playlists?id=ID[&page=N&limit=L]` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistDetails {
    pub name: Option<String>,
    #[serde(rename = "songCount", default)]
    pub song_count: Option<u64>,
    #[serde(default)]
    pub image: Vec<ImageLink>,
    #[serde(default)]
    pub songs: Vec<Song>,
}

impl PlaylistDetails {
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => decode_html_entities(name),
            None => "Unknown Playlist".to_string(),
        }
    }
}

/// Decode the handful of HTML entities the catalog embeds in names.
/// Unknown entities and bare ampersands pass through unchanged.
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        // An entity body is short and alphanumeric (or "#039"-style),
        // terminated by ';'.
        let body_len = tail[1..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '#')
            .count();
        let terminated = body_len > 0 && body_len <= 6 && tail[1 + body_len..].starts_with(';');
        if terminated {
            let entity = &tail[..body_len + 2];
            match entity {
                "&amp;" => out.push('&'),
                "&lt;" => out.push('<'),
                "&gt;" => out.push('>'),
                "&quot;" => out.push('"'),
                "&#039;" | "&#39;" => out.push('\''),
                "&nbsp;" => out.push(' '),
                other => out.push_str(other),
            }
            rest = &tail[body_len + 2..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}
