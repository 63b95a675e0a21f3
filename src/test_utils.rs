use std::collections::HashSet;
use std::sync::Mutex;

use color_eyre::eyre::{Result, eyre};

use crate::plex_rs::metadata::{PlexGuid, PlexMetadataItem};
use crate::plex_rs::playlist::PlexPlaylist;
use crate::ports::plex::PlexClient;

pub fn track(rating_key: &str, guid: Option<&str>, title: &str) -> PlexMetadataItem {
    PlexMetadataItem {
        rating_key: Some(rating_key.to_string()),
        guid: None,
        guids: guid
            .map(|id| vec![PlexGuid { id: id.to_string() }])
            .unwrap_or_default(),
        item_type: Some("track".to_string()),
        title: Some(title.to_string()),
    }
}

pub fn playlist(rating_key: &str, title: &str) -> PlexPlaylist {
    PlexPlaylist {
        rating_key: rating_key.to_string(),
        title: title.to_string(),
        playlist_type: Some("audio".to_string()),
        smart: Some(false),
        leaf_count: None,
    }
}

/// In-memory Plex server.
///
/// Holds a library and a list of playlists with their members. Lookups and
/// mutations are logged as `kind:argument` strings for call-order assertions.
pub struct FakeCatalog {
    library: Vec<PlexMetadataItem>,
    playlists: Mutex<Vec<(PlexPlaylist, Vec<PlexMetadataItem>)>>,
    failing_fetch_keys: HashSet<String>,
    fail_all_fetches: bool,
    fail_search: bool,
    fail_delete: bool,
    next_key: Mutex<u64>,
    calls: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new(library: Vec<PlexMetadataItem>) -> Self {
        Self {
            library,
            playlists: Mutex::new(Vec::new()),
            failing_fetch_keys: HashSet::new(),
            fail_all_fetches: false,
            fail_search: false,
            fail_delete: false,
            next_key: Mutex::new(1000),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_playlist(self, playlist: PlexPlaylist, members: Vec<PlexMetadataItem>) -> Self {
        self.playlists.lock().unwrap().push((playlist, members));
        self
    }

    pub fn failing_fetch(mut self, rating_key: &str) -> Self {
        self.failing_fetch_keys.insert(rating_key.to_string());
        self
    }

    pub fn failing_all_fetches(mut self) -> Self {
        self.fail_all_fetches = true;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_delete(mut self) -> Self {
        self.fail_delete = true;
        self
    }

    pub fn playlists(&self) -> Vec<(PlexPlaylist, Vec<PlexMetadataItem>)> {
        self.playlists.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl PlexClient for FakeCatalog {
    async fn get_playlists(&self) -> Result<Vec<PlexPlaylist>> {
        Ok(self
            .playlists
            .lock()
            .unwrap()
            .iter()
            .map(|(p, _)| p.clone())
            .collect())
    }

    async fn get_playlist_items(&self, playlist: &PlexPlaylist) -> Result<Vec<PlexMetadataItem>> {
        self.playlists
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p.rating_key == playlist.rating_key)
            .map(|(_, members)| members.clone())
            .ok_or_else(|| eyre!("404 playlist {}", playlist.rating_key))
    }

    async fn fetch_item(&self, rating_key: &str) -> Result<Option<PlexMetadataItem>> {
        self.record(format!("fetch:{}", rating_key));
        if self.fail_all_fetches || self.failing_fetch_keys.contains(rating_key) {
            return Err(eyre!("500 fetching {}", rating_key));
        }
        Ok(self
            .library
            .iter()
            .find(|item| item.rating_key.as_deref() == Some(rating_key))
            .cloned())
    }

    async fn search_by_guid(&self, guid: &str) -> Result<Vec<PlexMetadataItem>> {
        self.record(format!("search:{}", guid));
        if self.fail_search {
            return Err(eyre!("search unavailable"));
        }
        Ok(self
            .library
            .iter()
            .filter(|item| item.content_id() == Some(guid))
            .cloned()
            .collect())
    }

    async fn delete_playlist(&self, playlist: &PlexPlaylist) -> Result<()> {
        self.record(format!("delete:{}", playlist.rating_key));
        if self.fail_delete {
            return Err(eyre!("403 forbidden"));
        }
        self.playlists
            .lock()
            .unwrap()
            .retain(|(p, _)| p.rating_key != playlist.rating_key);
        Ok(())
    }

    async fn create_playlist(
        &self,
        title: &str,
        items: &[PlexMetadataItem],
    ) -> Result<PlexPlaylist> {
        self.record(format!("create:{}", title));
        let key = {
            let mut next = self.next_key.lock().unwrap();
            *next += 1;
            next.to_string()
        };
        let created = PlexPlaylist {
            leaf_count: Some(items.len() as u32),
            ..playlist(&key, title)
        };
        self.playlists
            .lock()
            .unwrap()
            .push((created.clone(), items.to_vec()));
        Ok(created)
    }
}
