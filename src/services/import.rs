use std::path::Path;

use color_eyre::eyre::{Result, WrapErr};
use futures::stream::{self, StreamExt};
use tracing::instrument;

use crate::config::AmbiguityPolicy;
use crate::document::{ItemRecord, PlaylistDocument};
use crate::error::TransferError;
use crate::plex_rs::metadata::PlexMetadataItem;
use crate::plex_rs::playlist::PlexPlaylist;
use crate::ports::plex::PlexClient;

/// Outcome of matching one record against the server.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(PlexMetadataItem),
    Missing,
}

/// Records split into live items and records that could not be matched,
/// both in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionResult {
    pub resolved: Vec<PlexMetadataItem>,
    pub unresolved: Vec<ItemRecord>,
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Remove playlists with the same title before creating the new one.
    pub delete_existing: bool,
    pub ambiguity: AmbiguityPolicy,
    /// Upper bound on lookups in flight; 1 means strictly sequential.
    pub resolve_concurrency: usize,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            delete_existing: true,
            ambiguity: AmbiguityPolicy::default(),
            resolve_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportSummary {
    pub playlist: PlexPlaylist,
    pub created: usize,
    pub missing: Vec<ItemRecord>,
    pub deleted: usize,
}

/// Match a single record: by rating key first, then by guid.
///
/// Server errors on either path count as a miss for that path only.
pub async fn resolve_item<C: PlexClient + ?Sized>(client: &C, record: &ItemRecord) -> Resolution {
    if let Some(key) = record.lookup_key() {
        match client.fetch_item(&key).await {
            Ok(Some(item)) => return Resolution::Found(item),
            Ok(None) => log::debug!("No item with ratingKey {}", key),
            Err(e) => log::debug!("Fetching ratingKey {} failed: {:#}", key, e),
        }
    }

    if let Some(guid) = record.content_id() {
        match client.search_by_guid(guid).await {
            Ok(results) => {
                if let Some(item) = results.into_iter().next() {
                    return Resolution::Found(item);
                }
                log::debug!("No item with guid {}", guid);
            }
            Err(e) => log::debug!("Searching guid {} failed: {:#}", guid, e),
        }
    }

    Resolution::Missing
}

/// Resolve every record, keeping document order in both partitions.
///
/// Up to `concurrency` lookups run at once; results are reassembled in input
/// order so the partition is the same as a sequential run.
pub async fn resolve_items<C: PlexClient + ?Sized>(
    client: &C,
    records: &[ItemRecord],
    concurrency: usize,
) -> ResolutionResult {
    let resolutions: Vec<Resolution> = stream::iter(records)
        .map(|record| async move {
            if record.is_resolvable() {
                resolve_item(client, record).await
            } else {
                Resolution::Missing
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut result = ResolutionResult::default();
    for (record, resolution) in records.iter().zip(resolutions) {
        match resolution {
            Resolution::Found(item) => result.resolved.push(item),
            Resolution::Missing => {
                log::debug!("Unresolved item {}", record.describe());
                result.unresolved.push(record.clone());
            }
        }
    }
    result
}

/// Delete each of `existing`. Failures are logged and skipped.
async fn delete_same_titled<C: PlexClient + ?Sized>(
    client: &C,
    existing: &[&PlexPlaylist],
) -> usize {
    let mut deleted = 0;
    for playlist in existing {
        match client.delete_playlist(playlist).await {
            Ok(()) => {
                deleted += 1;
                log::info!(
                    "Deleted existing playlist '{}' (ratingKey: {})",
                    playlist.title,
                    playlist.rating_key
                );
            }
            Err(e) => log::warn!(
                "Failed to delete playlist '{}' (ratingKey: {}): {:#}",
                playlist.title,
                playlist.rating_key,
                e
            ),
        }
    }
    deleted
}

/// Rebuild the document's playlist on the server.
///
/// Nothing on the server is touched unless at least one item resolved.
#[instrument(skip(client, document), fields(title = %document.playlist.title, items = document.items.len()))]
pub async fn import_playlist<C: PlexClient + ?Sized>(
    client: &C,
    document: &PlaylistDocument,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let title = &document.playlist.title;

    let ResolutionResult {
        resolved,
        unresolved,
    } = resolve_items(client, &document.items, options.resolve_concurrency).await;

    if !unresolved.is_empty() {
        log::info!("{} items missing; they will be skipped", unresolved.len());
    }
    if resolved.is_empty() {
        return Err(TransferError::NoItemsResolved {
            title: title.clone(),
            missing: unresolved.len(),
        }
        .into());
    }

    let mut deleted = 0;
    if options.delete_existing {
        let playlists = client
            .get_playlists()
            .await
            .wrap_err("Failed to list playlists")?;
        let existing: Vec<&PlexPlaylist> = playlists.iter().filter(|p| &p.title == title).collect();

        if existing.len() > 1 && options.ambiguity == AmbiguityPolicy::Error {
            return Err(TransferError::AmbiguousPlaylist {
                title: title.clone(),
                count: existing.len(),
            }
            .into());
        }

        deleted = delete_same_titled(client, &existing).await;
    }

    let playlist = client
        .create_playlist(title, &resolved)
        .await
        .wrap_err(format!("Failed to create playlist '{}'", title))?;

    log::info!(
        "Created playlist '{}' (ratingKey: {}) with {} items (skipped {})",
        playlist.title,
        playlist.rating_key,
        resolved.len(),
        unresolved.len()
    );

    Ok(ImportSummary {
        playlist,
        created: resolved.len(),
        missing: unresolved,
        deleted,
    })
}

pub async fn import_playlist_file<C: PlexClient + ?Sized>(
    client: &C,
    path: &Path,
    options: &ImportOptions,
) -> Result<ImportSummary> {
    let document = PlaylistDocument::read_from_file(path)?;
    import_playlist(client, &document, options).await
}
