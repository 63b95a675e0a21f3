/// Conditions that abort an export or import run.
///
/// Everything else (a single item that cannot be found, a delete that fails)
/// is absorbed and reported as a count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    #[error("Playlist not found: '{selector}'")]
    PlaylistNotFound { selector: String },

    #[error("{count} playlists match '{title}'; refusing to pick one")]
    AmbiguousPlaylist { title: String, count: usize },

    #[error("No items found on server for '{title}' ({missing} missing); aborting")]
    NoItemsResolved { title: String, missing: usize },

    #[error("Plex URL and token must be provided via CLI, environment or config file")]
    MissingCredentials,
}
