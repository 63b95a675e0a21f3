use std::path::{Path, PathBuf};

use color_eyre::eyre::{Result, WrapErr};
use tracing::instrument;

use crate::config::AmbiguityPolicy;
use crate::document::{ItemRecord, PlaylistDocument, PlaylistHeader, RatingKey};
use crate::error::TransferError;
use crate::plex_rs::metadata::PlexMetadataItem;
use crate::plex_rs::playlist::PlexPlaylist;
use crate::ports::plex::PlexClient;

/// Pick the playlist named by `selector`, matched against the title verbatim or
/// against the rating key.
pub fn select_playlist<'a>(
    playlists: &'a [PlexPlaylist],
    selector: &str,
    policy: AmbiguityPolicy,
) -> Result<&'a PlexPlaylist, TransferError> {
    let mut matches = playlists
        .iter()
        .filter(|p| p.title == selector || p.rating_key == selector);

    let first = matches.next().ok_or_else(|| TransferError::PlaylistNotFound {
        selector: selector.to_string(),
    })?;

    let others = matches.count();
    if others > 0 {
        match policy {
            AmbiguityPolicy::FirstMatch => log::warn!(
                "{} playlists match '{}'; using the first (ratingKey: {})",
                others + 1,
                selector,
                first.rating_key
            ),
            AmbiguityPolicy::Error => {
                return Err(TransferError::AmbiguousPlaylist {
                    title: selector.to_string(),
                    count: others + 1,
                });
            }
        }
    }

    Ok(first)
}

fn item_record(item: &PlexMetadataItem) -> ItemRecord {
    ItemRecord {
        rating_key: item.rating_key.as_deref().map(RatingKey::from),
        guid: item.content_id().map(str::to_string),
        item_type: item.item_type.clone(),
        title: item.title.clone(),
    }
}

/// Snapshot the selected playlist as a document, members in server order.
#[instrument(skip(client))]
pub async fn export_playlist<C: PlexClient + ?Sized>(
    client: &C,
    selector: &str,
    policy: AmbiguityPolicy,
) -> Result<PlaylistDocument> {
    let playlists = client
        .get_playlists()
        .await
        .wrap_err("Failed to list playlists")?;
    let playlist = select_playlist(&playlists, selector, policy)?;

    log::info!(
        "Exporting playlist '{}' (ratingKey: {})",
        playlist.title,
        playlist.rating_key
    );

    let members = client
        .get_playlist_items(playlist)
        .await
        .wrap_err(format!("Failed to fetch items of '{}'", playlist.title))?;

    let items: Vec<ItemRecord> = members.iter().map(item_record).collect();
    let without_guid = items.iter().filter(|i| i.guid.is_none()).count();
    if without_guid > 0 {
        log::debug!(
            "{} of {} items have no guid and can only be matched by ratingKey",
            without_guid,
            items.len()
        );
    }

    Ok(PlaylistDocument {
        playlist: PlaylistHeader {
            title: playlist.title.clone(),
            rating_key: Some(RatingKey::from(playlist.rating_key.as_str())),
        },
        items,
    })
}

/// Export and write the document into `outdir`. Nothing is written when the
/// playlist cannot be found or read.
pub async fn export_playlist_to_dir<C: PlexClient + ?Sized>(
    client: &C,
    selector: &str,
    policy: AmbiguityPolicy,
    outdir: &Path,
) -> Result<PathBuf> {
    let document = export_playlist(client, selector, policy).await?;
    let path = document.write_to_dir(outdir)?;
    log::info!(
        "Exported {} items of '{}' to {}",
        document.items.len(),
        document.playlist.title,
        path.display()
    );
    Ok(path)
}
