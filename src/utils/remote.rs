use crate::error::{Result, UpmError};
use crate::ui;
use reqwest::blocking::Client;
use std::path::Path;

const USER_AGENT: &str = "upm-cli";

/// Fetch `source` into `dest`.
///
/// `source` is either an HTTP(S) URL or a local snapshot, given as a plain
/// path or a `file://` URL. Any failure aborts; there is no retry.
pub fn download_file(source: &str, dest: &Path) -> Result<()> {
    ui::progress(&format!("download {}", source));

    if source.starts_with("http://") || source.starts_with("https://") {
        let bytes = fetch_url(source)?;
        std::fs::write(dest, bytes).map_err(|e| UpmError::io(dest, e))?;
        return Ok(());
    }

    let local = source.strip_prefix("file://").unwrap_or(source);
    std::fs::copy(local, dest).map_err(|e| {
        UpmError::RemoteFetch(format!("Cannot copy snapshot '{}': {}", local, e))
    })?;
    Ok(())
}

fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let client = Client::new();
    let resp = client
        .get(url)
        .header("User-Agent", USER_AGENT)
        .send()
        .map_err(|e| UpmError::RemoteFetch(format!("Network error: {}", e)))?;

    if !resp.status().is_success() {
        return Err(UpmError::RemoteFetch(format!(
            "{} returned HTTP {}",
            url,
            resp.status()
        )));
    }

    resp.bytes()
        .map(|b| b.to_vec())
        .map_err(|e| UpmError::RemoteFetch(format!("Failed to read {}: {}", url, e)))
}
