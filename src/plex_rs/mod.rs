use color_eyre::eyre::{Context, Result};
use serde::Deserialize;
use url::Url;

pub mod metadata;
pub mod playlist;

pub const APP_NAME: &str = "Plex Playlist Transfer";
pub const APP_IDENTIFIER: &str = "plex-playlist-transfer";

/* ---------- Shared container ---------- */

/// A minimal Plex JSON envelope for list style endpoints that return `MediaContainer.Metadata`.
///
/// Notes
/// - Plex responses are wrapped in a top level `MediaContainer`.
/// - `metadata` defaults to an empty vec when missing (an empty playlist or a
///   search without hits omits the key entirely).
#[derive(Debug, Clone, Deserialize)]
pub struct PlexResponse<T> {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexMediaContainer<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexMediaContainer<T> {
    #[serde(default)]
    pub size: Option<u32>,

    #[serde(rename = "totalSize", default)]
    pub total_size: Option<u32>,

    #[serde(rename = "Metadata", default = "Vec::new")]
    pub metadata: Vec<T>,
}

/// Normalises a user supplied server address so that `Url::join` appends
/// endpoint paths instead of replacing the last segment.
///
/// `http://host:32400`, `http://host:32400/` and `http://host:32400//` all become
/// `http://host:32400/`.
pub fn parse_server_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim().trim_end_matches('/');
    Url::parse(&format!("{}/", trimmed)).wrap_err(format!("Invalid Plex server URL: {}", raw))
}
