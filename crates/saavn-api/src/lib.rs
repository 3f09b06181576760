//! Client for the Saavn catalog/download API.
//!
//! Every endpoint answers a `{success: bool, data: ...}` JSON envelope. The
//! schemas here model the fields this bot consumes, with explicit `Option`s
//! for everything the API is known to omit. Listing endpoints are paginated;
//! [`SaavnClient::all_artist_songs`] and [`SaavnClient::all_playlist_songs`]
//! walk the pages and return a deduplicated, ordered song list.

mod client;
mod models;

pub use client::{ApiError, SaavnClient, ARTIST_PAGE_CEILING, PLAYLIST_PAGE_CEILING, PLAYLIST_PAGE_SIZE};
pub use models::{
    decode_html_entities, ArtistDetails, ArtistRef, DownloadLink, ImageLink, PlaylistDetails, Song,
    SongAlbum, SongArtists,
};
