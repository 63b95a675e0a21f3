mod config;
mod document;
mod error;
mod logging;
mod plex_rs;
mod ports;
mod services;
#[cfg(test)]
mod test_utils;

use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser};
use color_eyre::{
    Result,
    eyre::{Context, OptionExt},
};

use crate::{
    config::Config,
    logging::init_tracing,
    services::{
        export::export_playlist_to_dir,
        import::{ImportOptions, import_playlist_file},
        plex::PlexHttpAdapter,
    },
};

/// Export a Plex playlist to a JSON document, or rebuild one from it.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Export the playlist named by TARGET (title or ratingKey)
    #[arg(long, conflicts_with = "import", required_unless_present_any = ["import", "init_config"])]
    export: bool,

    /// Import the playlist document at TARGET
    #[arg(long, required_unless_present_any = ["export", "init_config"])]
    import: bool,

    /// Plex base URL, e.g. http://127.0.0.1:32400
    #[arg(long, env = "PLEX_URL")]
    url: Option<String>,

    /// Plex token
    #[arg(long, env = "PLEX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output directory for exports
    #[arg(long)]
    outdir: Option<PathBuf>,

    /// Path to a TOML config file (keys: url, token, outdir, ambiguity, resolve_concurrency)
    #[arg(short, long, env = "PLAYLIST_TRANSFER_CONFIG")]
    config: Option<PathBuf>,

    /// Write a config file (path from --config or the user default) and exit
    #[arg(long)]
    init_config: bool,

    /// Do not delete an existing playlist with the same title on import
    #[arg(long = "no-delete", action = ArgAction::SetFalse)]
    delete_existing: bool,

    /// Log filter for stderr output (default: warn)
    #[arg(long, default_value = "warn", env = "PLAYLIST_TRANSFER_LOG")]
    log_level: String,

    /// Playlist title or ratingKey (export) or document path (import)
    #[arg(required_unless_present = "init_config")]
    target: Option<String>,
}

/// Shown regardless of the log filter.
fn missing_items_warning(missing: usize) -> Option<String> {
    (missing > 0).then(|| format!("Warning: {} items missing; they will be skipped", missing))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    init_tracing(&args.log_level)?;

    let working_dir = std::env::current_dir().wrap_err("Failed to read working directory")?;
    let config = Config::load(args.config.as_deref(), &working_dir)
        .wrap_err("Failed to load playlist-transfer config")?;

    if args.init_config {
        let path = Config::init(
            args.config.as_deref(),
            args.url.or(config.url),
            args.token.or(config.token),
            args.outdir
                .map(|p| p.to_string_lossy().into_owned())
                .or(config.outdir),
        )?;
        println!("Wrote config to {}", path.display());
        return Ok(());
    }

    let (url, token) = config.credentials(args.url, args.token)?;
    let target = args
        .target
        .ok_or_eyre("A playlist title or document path is required")?;
    let client = PlexHttpAdapter::new(&url, &token)?;

    if args.export {
        let outdir = config.outdir_path(args.outdir.as_deref());
        log::debug!("Exporting '{}' into {}", target, outdir.display());
        let path = export_playlist_to_dir(&client, &target, config.ambiguity, &outdir).await?;
        println!("Exported to {}", path.display());
    } else {
        let options = ImportOptions {
            delete_existing: args.delete_existing,
            ambiguity: config.ambiguity,
            resolve_concurrency: config.resolve_concurrency,
        };
        let summary = import_playlist_file(&client, Path::new(&target), &options).await?;
        if let Some(warning) = missing_items_warning(summary.missing.len()) {
            eprintln!("{}", warning);
        }
        if summary.deleted > 0 {
            log::info!("Replaced {} existing playlist(s)", summary.deleted);
        }
        println!(
            "Created playlist '{}' with {} items (skipped {})",
            summary.playlist.title,
            summary.created,
            summary.missing.len()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_export_and_import_conflict() {
        let result = Args::try_parse_from(["prog", "--export", "--import", "Mix"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_mode_is_required() {
        let result = Args::try_parse_from(["prog", "Mix"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_import_defaults_to_delete() {
        let args = Args::try_parse_from(["prog", "--import", "mix.json"]).unwrap();
        assert!(args.import);
        assert!(args.delete_existing);
        assert_eq!(args.target.as_deref(), Some("mix.json"));

        let args = Args::try_parse_from(["prog", "--import", "--no-delete", "mix.json"]).unwrap();
        assert!(!args.delete_existing);
    }

    #[test]
    fn test_missing_items_warning() {
        assert_eq!(missing_items_warning(0), None);
        assert_eq!(
            missing_items_warning(3).as_deref(),
            Some("Warning: 3 items missing; they will be skipped")
        );
    }

    #[test]
    fn test_init_config_needs_no_target() {
        let args = Args::try_parse_from(["prog", "--init-config", "--url", "http://plex:32400"])
            .unwrap();
        assert!(args.init_config);
        assert_eq!(args.target, None);
    }
}
