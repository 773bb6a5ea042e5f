//! yt-dlp backed media resolver.
//!
//! Runs the yt-dlp binary in single-JSON mode (`-J`) and reads descriptors
//! out of the dump. Download mode adds `--no-simulate` so media lands in the
//! configured directory before the locator is returned.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::config::schema::ResolverConfig;
use crate::errors::ResolveError;
use crate::media::resolver::{MediaDescriptor, MediaResolver, PlayableLocator};

pub struct YtDlpResolver {
    config: ResolverConfig,
    media_dir: PathBuf,
}

impl YtDlpResolver {
    pub fn new(config: ResolverConfig, media_dir: PathBuf) -> Self {
        Self { config, media_dir }
    }

    fn base_args(&self) -> Vec<String> {
        let mut args = vec![
            "-J".to_string(),
            "-f".to_string(),
            self.config.format.clone(),
            "-o".to_string(),
            self.config.output_template.clone(),
            "-P".to_string(),
            self.media_dir.display().to_string(),
            "--default-search".to_string(),
            self.config.default_search.clone(),
            "--source-address".to_string(),
            self.config.source_address.clone(),
            "-q".to_string(),
            "--no-warnings".to_string(),
        ];
        if self.config.no_playlist {
            args.push("--no-playlist".to_string());
        }
        if self.config.restrict_filenames {
            args.push("--restrict-filenames".to_string());
        }
        if self.config.no_check_certificates {
            args.push("--no-check-certificates".to_string());
        }
        args
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(&self, query: &str, download: bool) -> Result<Vec<MediaDescriptor>> {
        let mut cmd = Command::new(&self.config.binary);
        cmd.args(self.base_args());
        if download {
            cmd.arg("--no-simulate");
        }
        cmd.arg("--").arg(query);

        debug!("Resolving '{}' (download={})", query, download);
        let output = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ResolveError::Spawn {
                tool: self.config.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ResolveError::Tool {
                tool: self.config.binary.clone(),
                detail: stderr_detail(&output.stderr),
            }
            .into());
        }

        let data: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| ResolveError::Parse(e.to_string()))?;
        let entries = parse_entries(&data, download, query)?;
        debug!("Resolved '{}' to {} playable entr(y/ies)", query, entries.len());
        Ok(entries)
    }
}

/// Extract descriptors from a yt-dlp JSON dump.
///
/// A playlist or search dump nests items under `entries`; a single video is
/// the top-level object itself. Unavailable entries (null, or missing a
/// usable locator) are skipped.
fn parse_entries(
    data: &Value,
    downloaded: bool,
    query: &str,
) -> Result<Vec<MediaDescriptor>, ResolveError> {
    let (items, collection): (Vec<&Value>, bool) =
        match data.get("entries").and_then(Value::as_array) {
            Some(entries) => (entries.iter().collect(), true),
            None => (vec![data], false),
        };

    let mut out = Vec::new();
    for item in items {
        if item.is_null() {
            continue;
        }
        let title = item
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string);
        match extract_locator(item, downloaded) {
            Some(locator) => out.push(MediaDescriptor { title, locator }),
            None => debug!("Skipping entry without a locator"),
        }
    }

    if out.is_empty() {
        if collection {
            Err(ResolveError::NoEntries(query.to_string()))
        } else {
            Err(ResolveError::NoLocator)
        }
    } else {
        Ok(out)
    }
}

fn extract_locator(item: &Value, downloaded: bool) -> Option<PlayableLocator> {
    if downloaded {
        // yt-dlp reports the final file under requested_downloads; older
        // dumps carry a top-level "filename" instead.
        let path = item
            .get("requested_downloads")
            .and_then(Value::as_array)
            .and_then(|downloads| downloads.first())
            .and_then(|d| d.get("filepath"))
            .and_then(Value::as_str)
            .or_else(|| item.get("filename").and_then(Value::as_str))?;
        Some(PlayableLocator::File(PathBuf::from(path)))
    } else {
        item.get("url")
            .and_then(Value::as_str)
            .map(|url| PlayableLocator::Remote(url.to_string()))
    }
}

/// Pick the most useful line out of yt-dlp's stderr for the error message.
fn stderr_detail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .find(|line| line.starts_with("ERROR:"))
        .or_else(|| text.lines().rev().find(|line| !line.trim().is_empty()))
        .unwrap_or("no error output")
        .trim()
        .to_string()
}
