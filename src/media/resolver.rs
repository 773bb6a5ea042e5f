//! Media resolution contract.
//!
//! A resolver turns a URL or free-text query into something a decoder can
//! consume. Resolution runs outside any session lock; callers re-check
//! session state before acting on the result.

use std::path::PathBuf;

use anyhow::Result;
use async_trait::async_trait;

/// Where resolved media can be played from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayableLocator {
    /// A file on local disk, either pre-existing or just downloaded.
    File(PathBuf),
    /// A direct media URL, decoded over the network without predownload.
    Remote(String),
}

impl PlayableLocator {
    /// The input argument handed to the decoder.
    pub fn as_arg(&self) -> String {
        match self {
            PlayableLocator::File(path) => path.display().to_string(),
            PlayableLocator::Remote(url) => url.clone(),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, PlayableLocator::Remote(_))
    }
}

/// One playable result.
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    /// Display title, when the backend reports one.
    pub title: Option<String>,
    pub locator: PlayableLocator,
}

impl MediaDescriptor {
    /// Title to show the user, falling back to `query` when the backend
    /// reported none.
    pub fn display_title(&self, query: &str) -> String {
        self.title.clone().unwrap_or_else(|| query.to_string())
    }
}

/// Turns a URL or search query into playable media plus metadata.
///
/// With `download` set, media is fetched to local storage and the locator
/// points at the file; otherwise the locator is a remote URL suitable for
/// streaming. A playlist or search result yields multiple descriptors in
/// backend order. Failures embed [`crate::errors::ResolveError`] in the
/// returned `anyhow::Error`.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    async fn resolve(&self, query: &str, download: bool) -> Result<Vec<MediaDescriptor>>;
}
