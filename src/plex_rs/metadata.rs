use color_eyre::eyre::{Result, WrapErr};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::plex_rs::{APP_IDENTIFIER, PlexResponse};

/* ---------- Library items ---------- */

/// One entry of the `Guid` array Plex attaches to newer-agent metadata.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlexGuid {
    pub id: String,
}

/// A library item as returned by `/library/metadata/{key}`, `/library/all`
/// and `/playlists/{key}/items`.
///
/// Only the identity fields are kept. Everything is optional except for the
/// envelope itself, since Plex omits fields freely depending on item kind and
/// agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlexMetadataItem {
    #[serde(rename = "ratingKey", default)]
    pub rating_key: Option<String>,

    #[serde(default)]
    pub guid: Option<String>,

    #[serde(rename = "Guid", default)]
    pub guids: Vec<PlexGuid>,

    #[serde(rename = "type", default)]
    pub item_type: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
}

impl PlexMetadataItem {
    /// The single portable identifier for this item.
    ///
    /// Prefers the first entry of the `Guid` list and falls back to the
    /// singular `guid` attribute.
    pub fn content_id(&self) -> Option<&str> {
        self.guids
            .first()
            .map(|g| g.id.as_str())
            .filter(|id| !id.is_empty())
            .or_else(|| self.guid.as_deref().filter(|g| !g.is_empty()))
    }
}

/// Fetch a single library item by its rating key.
///
/// Endpoint: `GET /library/metadata/{rating_key}`
///
/// Returns `Ok(None)` when the server does not know the key (404 or an empty
/// container); other failures are returned as errors.
pub async fn get_metadata_item(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    rating_key: &str,
) -> Result<Option<PlexMetadataItem>> {
    let url = base_url.join(&format!("library/metadata/{}", rating_key))?;

    let res = client
        .get(url)
        .header("Accept", "application/json")
        .header("X-Plex-Token", user_token)
        .header("X-Plex-Client-Identifier", APP_IDENTIFIER)
        .send()
        .await?;

    if res.status() == StatusCode::NOT_FOUND {
        return Ok(None);
    }

    let res = res
        .error_for_status()?
        .json::<PlexResponse<PlexMetadataItem>>()
        .await
        .wrap_err("Failed to deserialize library metadata response")?;

    Ok(res.media_container.metadata.into_iter().next())
}

/// Search the whole library for items carrying a given guid.
///
/// Endpoint: `GET /library/all?guid={guid}`
pub async fn search_by_guid(
    client: &Client,
    base_url: &Url,
    user_token: &str,
    guid: &str,
) -> Result<Vec<PlexMetadataItem>> {
    let mut url = base_url.join("library/all")?;
    url.query_pairs_mut().append_pair("guid", guid);

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
        .wrap_err("Failed to deserialize guid search response")?;

    Ok(res.media_container.metadata)
}
