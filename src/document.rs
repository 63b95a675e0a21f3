use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use color_eyre::eyre::{Result, WrapErr};
use regex::Regex;
use serde::{Deserialize, Serialize};

/* ---------- Keys ---------- */

/// A Plex `ratingKey` as it appears in an exported document.
///
/// Plex itself hands keys out as strings, but hand-edited or older documents
/// may carry plain numbers, so both are accepted and written back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingKey {
    Number(i64),
    Text(String),
}

impl RatingKey {
    /// The key in the form the server expects, or `None` when it carries no
    /// usable value (empty string or `0`).
    pub fn lookup_key(&self) -> Option<String> {
        match self {
            RatingKey::Number(0) => None,
            RatingKey::Number(n) => Some(n.to_string()),
            RatingKey::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            }
        }
    }
}

impl fmt::Display for RatingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RatingKey::Number(n) => write!(f, "{}", n),
            RatingKey::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RatingKey {
    fn from(value: &str) -> Self {
        RatingKey::Text(value.to_string())
    }
}

/* ---------- Document ---------- */

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistHeader {
    pub title: String,

    #[serde(rename = "ratingKey", default)]
    pub rating_key: Option<RatingKey>,
}

/// Snapshot of a single playlist member.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemRecord {
    #[serde(rename = "ratingKey", default)]
    pub rating_key: Option<RatingKey>,

    #[serde(default)]
    pub guid: Option<String>,

    #[serde(rename = "type", default)]
    pub item_type: Option<String>,

    #[serde(default)]
    pub title: Option<String>,
}

impl ItemRecord {
    pub fn lookup_key(&self) -> Option<String> {
        self.rating_key.as_ref().and_then(RatingKey::lookup_key)
    }

    pub fn content_id(&self) -> Option<&str> {
        self.guid.as_deref().map(str::trim).filter(|g| !g.is_empty())
    }

    /// A record with neither identifier can never be matched.
    pub fn is_resolvable(&self) -> bool {
        self.lookup_key().is_some() || self.content_id().is_some()
    }

    /// Short human label used in log lines.
    pub fn describe(&self) -> String {
        let title = self.title.as_deref().unwrap_or("<untitled>");
        match &self.rating_key {
            Some(key) => format!("'{}' (ratingKey: {})", title, key),
            None => format!("'{}'", title),
        }
    }
}

/// The portable JSON form of one playlist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistDocument {
    pub playlist: PlaylistHeader,

    #[serde(default)]
    pub items: Vec<ItemRecord>,
}

#[cfg(unix)]
const EXPORT_FILE_MODE: u32 = 0o644;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("static regex is valid"));

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(name: &str) -> String {
    UNSAFE_FILENAME_CHARS.replace_all(name, "_").into_owned()
}

impl PlaylistDocument {
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).wrap_err("Failed to parse playlist document")
    }

    pub fn read_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read playlist document: {}", path.display()))?;
        Self::from_json(&contents)
            .wrap_err(format!("Invalid playlist document: {}", path.display()))
    }

    /// `{title}_{ratingKey}.json`, with the title made filesystem safe.
    pub fn file_name(&self) -> String {
        let key = self
            .playlist
            .rating_key
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "None".to_string());
        format!("{}_{}.json", sanitize_filename(&self.playlist.title), key)
    }

    /// Serialize into `dir`, creating it when needed.
    ///
    /// The document is written to a temporary file next to the destination and
    /// renamed into place, so a reader never observes a half-written export.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .wrap_err(format!("Failed to create output directory: {}", dir.display()))?;

        let path = dir.join(self.file_name());
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .wrap_err("Failed to create temporary export file")?;

        serde_json::to_writer_pretty(&mut tmp, self)
            .wrap_err("Failed to serialize playlist document")?;
        tmp.write_all(b"\n")?;
        tmp.flush()?;

        // Temp files are created owner-only; exports are ordinary readable files.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(EXPORT_FILE_MODE))
                .wrap_err("Failed to set export file permissions")?;
        }

        tmp.persist(&path)
            .wrap_err(format!("Failed to write export file: {}", path.display()))?;

        log::debug!("Wrote playlist document to {}", path.display());
        Ok(path)
    }
}
