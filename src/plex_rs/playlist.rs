use color_eyre::eyre::{OptionExt, Result, WrapErr};
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::plex_rs::metadata::PlexMetadataItem;
use crate::plex_rs::{APP_IDENTIFIER, PlexResponse};

/* ---------- Identity (machineIdentifier) ---------- */

#[derive(Debug, Clone, Deserialize)]
pub struct PlexIdentityResponse {
    #[serde(rename = "MediaContainer")]
    pub media_container: PlexIdentity,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexIdentity {
    #[serde(rename = "machineIdentifier")]
    pub machine_identifier: String,
}

pub async fn get_machine_identifier(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<String> {
    let url = base_url.join("identity")?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Client-Identifier", APP_IDENTIFIER)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexIdentityResponse>()
        .await
        .wrap_err("Failed to deserialize Plex identity response")?;

    Ok(res.media_container.machine_identifier)
}

/* ---------- Playlists ---------- */

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlexPlaylist {
    #[serde(rename = "ratingKey")]
    pub rating_key: String,

    pub title: String,

    #[serde(rename = "playlistType", default)]
    pub playlist_type: Option<String>,

    #[serde(default)]
    pub smart: Option<bool>,

    #[serde(rename = "leafCount", default)]
    pub leaf_count: Option<u32>,
}

/// Every playlist visible to the token, in server order.
///
/// Endpoint: `GET /playlists`
pub async fn get_playlists(
    client: &Client,
    base_url: &Url,
    user_token: &str,
) -> Result<Vec<PlexPlaylist>> {
    let url = base_url.join("playlists")?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Client-Identifier", APP_IDENTIFIER)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexPlaylist>>()
        .await
        .wrap_err("Failed to deserialize Plex playlists response")?;

    Ok(res.media_container.metadata)
}

/// Members of a playlist in playback order.
///
/// Endpoint: `GET /playlists/{playlist_id}/items`
pub async fn get_playlist_items(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
) -> Result<Vec<PlexMetadataItem>> {
    let url = base_url.join(&format!("playlists/{}/items", playlist_id))?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Client-Identifier", APP_IDENTIFIER)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexMetadataItem>>()
        .await
        .wrap_err("Failed to deserialize playlist items response")?;

    Ok(res.media_container.metadata)
}

/* ---------- Create and delete ---------- */

/// Plex playlist kind for a set of members, decided by the first one.
pub fn playlist_type_for(items: &[PlexMetadataItem]) -> &'static str {
    match items.first().and_then(|i| i.item_type.as_deref()) {
        Some("track" | "album" | "artist") | None => "audio",
        Some("photo") => "photo",
        Some(_) => "video",
    }
}

/// The `uri` parameter Plex expects when seeding a playlist with items.
///
/// Rating keys are comma separated; order is the playlist order.
pub fn library_items_uri(machine_identifier: &str, rating_keys: &[&str]) -> String {
    format!(
        "server://{}/com.plexapp.plugins.library/library/metadata/{}",
        machine_identifier,
        rating_keys.join(",")
    )
}

/// Create a regular (non smart) playlist already holding `items`, in order.
///
/// Endpoint: `POST /playlists?type=…&title=…&smart=0&uri=…`
pub async fn create_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    machine_identifier: &str,
    title: &str,
    items: &[PlexMetadataItem],
) -> Result<PlexPlaylist> {
    let rating_keys: Vec<&str> = items
        .iter()
        .filter_map(|item| item.rating_key.as_deref())
        .collect();
    if rating_keys.len() != items.len() {
        log::warn!(
            "{} item(s) without a rating key cannot be added to '{}'",
            items.len() - rating_keys.len(),
            title
        );
    }

    let mut url = base_url.join("playlists")?;
    url.query_pairs_mut()
        .append_pair("type", playlist_type_for(items))
        .append_pair("title", title)
        .append_pair("smart", "0")
        .append_pair("uri", &library_items_uri(machine_identifier, &rating_keys));

    let res = client
        .post(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Client-Identifier", APP_IDENTIFIER)
        .send()
        .await?
        .error_for_status()?
        .json::<PlexResponse<PlexPlaylist>>()
        .await
        .wrap_err("Failed to deserialize create playlist response")?;

    res.media_container
        .metadata
        .into_iter()
        .next()
        .ok_or_eyre("Create playlist response had no Metadata")
}

/// Endpoint: `DELETE /playlists/{playlist_id}`
pub async fn delete_playlist(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    playlist_id: &str,
) -> Result<()> {
    let url = base_url.join(&format!("playlists/{}", playlist_id))?;

    client
        .delete(url)
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Client-Identifier", APP_IDENTIFIER)
        .send()
        .await?
        .error_for_status()
        .wrap_err("Failed to delete playlist")?;

    Ok(())
}
