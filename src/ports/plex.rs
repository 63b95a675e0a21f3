use color_eyre::eyre::Result;

use crate::plex_rs::metadata::PlexMetadataItem;
use crate::plex_rs::playlist::PlexPlaylist;

/// Port trait wrapping the Plex catalog capabilities used by export and import.
///
/// Implementations live in `services::plex::client` (production) or test
/// doubles (`MockPlexClient`, `test_utils::FakeCatalog`).
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PlexClient: Send + Sync {
    async fn get_playlists(&self) -> Result<Vec<PlexPlaylist>>;

    async fn get_playlist_items(&self, playlist: &PlexPlaylist) -> Result<Vec<PlexMetadataItem>>;

    /// `Ok(None)` means the server answered and has no such key.
    async fn fetch_item(&self, rating_key: &str) -> Result<Option<PlexMetadataItem>>;

    async fn search_by_guid(&self, guid: &str) -> Result<Vec<PlexMetadataItem>>;

    async fn delete_playlist(&self, playlist: &PlexPlaylist) -> Result<()>;

    async fn create_playlist(
        &self,
        title: &str,
        items: &[PlexMetadataItem],
    ) -> Result<PlexPlaylist>;
}
