//! External ffmpeg invocation: raw stream → tagged 320 kbps MP3.

#[cfg(test)]
#[path = "transcode_tests.rs"]
mod transcode_tests;

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

const BITRATE: &str = "320k";

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to run ffmpeg: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("ffmpeg exited with an error: {0}")]
    Ffmpeg(String),

    #[error("ffmpeg produced no output file")]
    MissingOutput,
}

/// ID3 tags stamped onto the output file.
#[derive(Debug, Clone)]
pub struct TagSet {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub year: String,
    /// The catalog's language label, carried in the genre frame.
    pub language: String,
}

/// Mux `audio_in` (and `cover`, when present) into a tagged MP3 at `out`.
///
/// Arguments go straight to the process, so no shell quoting is involved;
/// only newlines are stripped from tag values to keep the metadata frames
/// single-line.
pub async fn to_tagged_mp3(
    audio_in: &Path,
    cover: Option<&Path>,
    tags: &TagSet,
    out: &Path,
) -> Result<(), TranscodeError> {
    let args = build_args(audio_in, cover, tags, out);
    debug!("Running ffmpeg with {} args", args.len());

    let output = Command::new("ffmpeg")
        .args(&args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: String = stderr
            .lines()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect::<Vec<_>>()
            .join(" | ");
        return Err(TranscodeError::Ffmpeg(tail));
    }

    if !out.exists() {
        return Err(TranscodeError::MissingOutput);
    }

    Ok(())
}

fn tag_value(raw: &str) -> String {
    raw.replace(['\n', '\r'], " ")
}

/// Build the full ffmpeg argument list. With a cover image the audio and
/// image streams are mapped explicitly and the image is kept as an mjpeg
/// attachment stream titled "Album cover", which players render as art.
fn build_args(audio_in: &Path, cover: Option<&Path>, tags: &TagSet, out: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-i".into(), audio_in.into()];

    if let Some(cover) = cover {
        args.push("-i".into());
        args.push(cover.into());
        args.push("-map".into());
        args.push("0:a".into());
        args.push("-map".into());
        args.push("1:0".into());
    }

    args.push("-c:a".into());
    args.push("libmp3lame".into());
    args.push("-b:a".into());
    args.push(BITRATE.into());

    if cover.is_some() {
        args.push("-c:v".into());
        args.push("mjpeg".into());
    }

    args.push("-id3v2_version".into());
    args.push("3".into());

    if cover.is_some() {
        args.push("-metadata:s:v".into());
        args.push("title=Album cover".into());
    }

    for (key, value) in [
        ("title", &tags.title),
        ("artist", &tags.artist),
        ("album", &tags.album),
        ("date", &tags.year),
        ("genre", &tags.language),
    ] {
        args.push("-metadata".into());
        args.push(format!("{}={}", key, tag_value(value)).into());
    }

    args.push(out.into());
    args
}
