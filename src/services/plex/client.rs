use color_eyre::eyre::Result;
use reqwest::Client;
use tokio::sync::OnceCell;
use url::Url;

use crate::plex_rs::metadata::{PlexMetadataItem, get_metadata_item, search_by_guid};
use crate::plex_rs::parse_server_url;
use crate::plex_rs::playlist::{
    PlexPlaylist, create_playlist, delete_playlist, get_machine_identifier, get_playlist_items,
    get_playlists,
};
use crate::ports::plex::PlexClient;

/// HTTP implementation of [`PlexClient`] bound to one server and token.
pub struct PlexHttpAdapter {
    client: Client,
    server_url: Url,
    token: String,
    machine_identifier: OnceCell<String>,
}

impl PlexHttpAdapter {
    pub fn new(server_url: &str, token: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            server_url: parse_server_url(server_url)?,
            token: token.to_string(),
            machine_identifier: OnceCell::new(),
        })
    }

    /// Looked up once, on the first playlist creation.
    async fn machine_identifier(&self) -> Result<&str> {
        let id = self
            .machine_identifier
            .get_or_try_init(|| get_machine_identifier(&self.client, &self.server_url, &self.token))
            .await?;
        Ok(id.as_str())
    }
}

#[async_trait::async_trait]
impl PlexClient for PlexHttpAdapter {
    async fn get_playlists(&self) -> Result<Vec<PlexPlaylist>> {
        get_playlists(&self.client, &self.server_url, &self.token).await
    }

    async fn get_playlist_items(&self, playlist: &PlexPlaylist) -> Result<Vec<PlexMetadataItem>> {
        get_playlist_items(
            &self.client,
            &self.server_url,
            &self.token,
            &playlist.rating_key,
        )
        .await
    }

    async fn fetch_item(&self, rating_key: &str) -> Result<Option<PlexMetadataItem>> {
        get_metadata_item(&self.client, &self.server_url, &self.token, rating_key).await
    }

    async fn search_by_guid(&self, guid: &str) -> Result<Vec<PlexMetadataItem>> {
        search_by_guid(&self.client, &self.server_url, &self.token, guid).await
    }

    async fn delete_playlist(&self, playlist: &PlexPlaylist) -> Result<()> {
        delete_playlist(
            &self.client,
            &self.server_url,
            &self.token,
            &playlist.rating_key,
        )
        .await
    }

    async fn create_playlist(
        &self,
        title: &str,
        items: &[PlexMetadataItem],
    ) -> Result<PlexPlaylist> {
        let machine_identifier = self.machine_identifier().await?;
        create_playlist(
            &self.client,
            &self.server_url,
            &self.token,
            machine_identifier,
            title,
            items,
        )
        .await
    }
}
