//! URL rewriting and local file placement.
//!
//! The streaming cache claims a URL by appending a suffix to its scheme. The
//! routing layer (whatever hands read requests to the cache) uses
//! [`remote_url`] to recognise such URLs and recover the real location.
//! Persisted downloads and exports are both named after the last path segment
//! of the remote URL.

use crate::error::{PlaybackError, Result};
use bridge_traits::FileSystemAccess;
use std::path::{Path, PathBuf};
use url::Url;

/// Parse a remote media URL.
pub fn parse_remote(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Rewrite `remote` into the cache-handled form by suffixing its scheme.
///
/// `https://host/a.mp4` with suffix `-demoloader` becomes
/// `https-demoloader://host/a.mp4`. Everything after the scheme is kept
/// verbatim.
pub fn streaming_url(remote: &Url, suffix: &str) -> Result<Url> {
    let rest = &remote.as_str()[remote.scheme().len()..];
    let rewritten = format!("{}{}{}", remote.scheme(), suffix, rest);
    Url::parse(&rewritten)
        .map_err(|e| PlaybackError::InvalidUrl(format!("{}: {}", rewritten, e)))
}

/// Recover the remote URL from a cache-handled one.
///
/// Returns `None` when the scheme does not carry `suffix`, i.e. the URL is
/// not served by the cache.
pub fn remote_url(streaming: &Url, suffix: &str) -> Option<Url> {
    let scheme = streaming.scheme().strip_suffix(suffix)?;
    if scheme.is_empty() {
        return None;
    }
    let rest = &streaming.as_str()[streaming.scheme().len()..];
    Url::parse(&format!("{}{}", scheme, rest)).ok()
}

/// Name of the local copy: the last non-empty path segment of `remote`.
pub fn local_file_name(remote: &Url) -> Option<String> {
    remote
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .map(str::to_string)
}

/// Documents directory to write into: the override if set, otherwise the
/// bridge's platform directory.
pub async fn documents_dir(
    fs: &dyn FileSystemAccess,
    override_dir: Option<&Path>,
) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => {
            fs.create_dir_all(dir).await?;
            Ok(dir.to_path_buf())
        }
        None => Ok(fs.get_documents_directory().await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUFFIX: &str = "-demoloader";

    #[test]
    fn test_streaming_url_appends_suffix() {
        let remote = parse_remote("https://cdn.example.com/media/bbb-360p.mp4?x=1").unwrap();
        let streaming = streaming_url(&remote, SUFFIX).unwrap();

        assert_eq!(streaming.scheme(), "https-demoloader");
        assert_eq!(
            streaming.as_str(),
            "https-demoloader://cdn.example.com/media/bbb-360p.mp4?x=1"
        );
    }

    #[test]
    fn test_streaming_url_is_deterministic_and_reversible() {
        let remote = parse_remote("http://10.0.0.2:8080/clips/a%20b.mp4").unwrap();
        let first = streaming_url(&remote, SUFFIX).unwrap();
        let second = streaming_url(&remote, SUFFIX).unwrap();
        assert_eq!(first, second);

        assert_eq!(remote_url(&first, SUFFIX), Some(remote));
    }

    #[test]
    fn test_remote_url_rejects_foreign_schemes() {
        let plain = parse_remote("https://cdn.example.com/a.mp4").unwrap();
        assert_eq!(remote_url(&plain, SUFFIX), None);

        let other = Url::parse("https-otherloader://cdn.example.com/a.mp4").unwrap();
        assert_eq!(remote_url(&other, SUFFIX), None);
    }

    #[test]
    fn test_parse_remote_rejects_garbage() {
        assert!(matches!(
            parse_remote("not a url"),
            Err(PlaybackError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_local_file_name() {
        let url = parse_remote("https://cdn.example.com/media/bbb-360p.mp4?sig=1").unwrap();
        assert_eq!(local_file_name(&url).as_deref(), Some("bbb-360p.mp4"));

        let dir = parse_remote("https://cdn.example.com/media/").unwrap();
        assert_eq!(local_file_name(&dir), None);

        let root = parse_remote("https://cdn.example.com").unwrap();
        assert_eq!(local_file_name(&root), None);
    }
}
