//! Thumbnail download, degradation filter, and content-addressed cache.
//!
//! Cache entries are named by the md5 of the source URL, so one URL maps to
//! one file regardless of query order or redirects. The degradation filter
//! (blur, plus pixelation at the top level) runs on a blocking thread; a
//! failed decode falls back to the original bytes rather than erroring.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use md5::{Digest, Md5};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, REFERER};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::options::Options;
use crate::patterns::ROOT_URL;

/// JPEG quality for re-encoded thumbnails.
const JPEG_QUALITY: u8 = 85;

/// Downloader and cache for thumbnail images.
///
/// Without a cache directory every download lands in a kept temporary file
/// and nothing is ever reused; with one, files are cached under their URL
/// hash and [`ImageCache::get`] answers repeat requests from disk.
#[derive(Debug)]
pub struct ImageCache {
    cache_dir: Option<PathBuf>,
    filter_level: u8,
    http: reqwest::Client,
    // Serializes trim/clear so they do not fight over the same files.
    maintenance: Mutex<()>,
}

impl ImageCache {
    /// Build an image cache from the given options.
    ///
    /// Creates the cache directory if configured. Fails with
    /// [`Error::Config`] when the proxy URL is invalid.
    pub fn new(options: &Options) -> Result<Self> {
        if let Some(dir) = &options.cache_dir {
            std::fs::create_dir_all(dir)?;
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("image/webp,image/apng,image/*,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        let referer = HeaderValue::from_str(&format!("{ROOT_URL}/"))
            .map_err(|e| Error::Config(e.to_string()))?;
        headers.insert(REFERER, referer);

        let mut builder = reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .default_headers(headers)
            .timeout(options.timeout);
        if let Some(proxy) = &options.proxy {
            let proxy = reqwest::Proxy::all(proxy).map_err(|e| Error::Config(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let http = builder.build().map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            cache_dir: options.cache_dir.clone(),
            filter_level: options.effective_filter_level(),
            http,
            maintenance: Mutex::new(()),
        })
    }

    /// Cache file path for a URL, or `None` without a cache directory.
    ///
    /// The name is the md5 hex digest of the full URL plus `.jpg`.
    #[must_use]
    pub fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let mut hasher = Md5::new();
        hasher.update(url.as_bytes());
        Some(dir.join(format!("{:x}.jpg", hasher.finalize())))
    }

    /// Fetch an image, filter it, and persist it.
    ///
    /// Returns `(path, from_cache)` on success and `Ok(None)` when the
    /// download fails or the response is not an image; only filesystem
    /// failures while persisting are errors. With `use_cache` an existing
    /// cache file short-circuits the download entirely.
    pub async fn get(
        &self,
        url: &str,
        use_cache: bool,
        apply_filter: bool,
    ) -> Result<Option<(PathBuf, bool)>> {
        if use_cache {
            if let Some(path) = self.cache_path(url) {
                if path.exists() {
                    return Ok(Some((path, true)));
                }
            }
        }

        let Some(bytes) = self.download(url).await else {
            return Ok(None);
        };

        let level = if apply_filter { self.filter_level } else { 0 };
        let bytes = if level > 0 {
            tokio::task::spawn_blocking(move || degrade(&bytes, level))
                .await
                .map_err(|err| Error::Io(std::io::Error::other(err)))?
        } else {
            bytes
        };

        if let Some(path) = self.cache_path(url) {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
            tmp.write_all(&bytes)?;
            tmp.persist(&path).map_err(|e| Error::Io(e.error))?;
            return Ok(Some((path, false)));
        }

        let mut tmp = tempfile::Builder::new().suffix(".jpg").tempfile()?;
        tmp.write_all(&bytes)?;
        let (_file, path) = tmp.keep().map_err(|e| Error::Io(e.error))?;
        Ok(Some((path, false)))
    }

    /// Download image bytes, answering `None` on any failure.
    async fn download(&self, url: &str) -> Option<Vec<u8>> {
        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!(url, error = %err, "image download failed");
                return None;
            }
        };
        if response.status() != StatusCode::OK {
            debug!(url, status = %response.status(), "image download rejected");
            return None;
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.is_empty() && !content_type.contains("image") {
            debug!(url, content_type, "response is not an image");
            return None;
        }

        response.bytes().await.ok().map(|b| b.to_vec())
    }

    /// Delete the oldest cache files beyond `max_files`, newest kept.
    ///
    /// Best effort; returns the number of files actually deleted.
    pub async fn trim(&self, max_files: usize) -> usize {
        let _guard = self.maintenance.lock().await;
        let Some(dir) = &self.cache_dir else {
            return 0;
        };
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };

        let mut files: Vec<(PathBuf, SystemTime)> = entries
            .flatten()
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
                    return None;
                }
                let mtime = entry.metadata().ok()?.modified().ok()?;
                Some((path, mtime))
            })
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1));

        let mut deleted = 0;
        for (path, _) in files.into_iter().skip(max_files) {
            if std::fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
        deleted
    }

    /// Delete every cache file. Best effort; returns the count deleted.
    pub async fn clear(&self) -> usize {
        let _guard = self.maintenance.lock().await;
        let Some(dir) = &self.cache_dir else {
            return 0;
        };
        let Ok(entries) = std::fs::read_dir(dir) else {
            return 0;
        };

        let mut deleted = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("jpg") {
                continue;
            }
            if std::fs::remove_file(&path).is_ok() {
                deleted += 1;
            }
        }
        deleted
    }
}

/// Blur (and at the top level pixelate) image bytes, re-encoding as JPEG.
///
/// Level 1 is a light blur, 2 medium, 3 heavy plus pixelation in 20x20
/// blocks. Bytes that do not decode are returned unchanged.
fn degrade(bytes: &[u8], level: u8) -> Vec<u8> {
    let Ok(img) = image::load_from_memory(bytes) else {
        return bytes.to_vec();
    };

    let sigma = match level {
        1 => 5.0,
        2 => 15.0,
        _ => 30.0,
    };
    let mut img = img.blur(sigma);

    if level >= 3 {
        let (width, height) = (img.width(), img.height());
        let small_w = (width / 20).max(1);
        let small_h = (height / 20).max(1);
        img = img
            .resize_exact(small_w, small_h, FilterType::Nearest)
            .resize_exact(width, height, FilterType::Nearest);
    }

    let rgb = img.to_rgb8();
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    if encoder.encode_image(&rgb).is_err() {
        return bytes.to_vec();
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::*;

    fn cache_options(dir: &Path, filter_level: u8) -> Options {
        Options {
            cache_dir: Some(dir.to_path_buf()),
            filter_level,
            ..Options::default()
        }
    }

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([200, 30, 60]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    /// Serve a single HTTP response carrying the given body bytes.
    async fn serve_once(content_type: &str, body: Vec<u8>) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let header = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 2048];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(header.as_bytes()).await;
                let _ = stream.write_all(&body).await;
                let _ = stream.shutdown().await;
            }
        });
        format!("http://{addr}/thumb.jpg")
    }

    #[test]
    fn cache_path_is_deterministic_per_url() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 0)).unwrap();

        let a = cache.cache_path("https://example.com/a.jpg").unwrap();
        let b = cache.cache_path("https://example.com/a.jpg").unwrap();
        let c = cache.cache_path("https://example.com/b.jpg").unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.extension().and_then(|e| e.to_str()), Some("jpg"));
        assert_eq!(a.parent(), Some(dir.path()));
    }

    #[test]
    fn cache_path_requires_a_cache_dir() {
        let cache = ImageCache::new(&Options::default()).unwrap();
        assert!(cache.cache_path("https://example.com/a.jpg").is_none());
    }

    #[test]
    fn degrade_produces_decodable_jpeg_of_same_size() {
        let original = png_bytes(64, 48);
        for level in 1..=3 {
            let out = degrade(&original, level);
            let img = image::load_from_memory_with_format(&out, ImageFormat::Jpeg).unwrap();
            assert_eq!((img.width(), img.height()), (64, 48));
        }
    }

    #[test]
    fn degrade_returns_undecodable_bytes_unchanged() {
        let garbage = b"definitely not an image".to_vec();
        assert_eq!(degrade(&garbage, 3), garbage);
    }

    #[tokio::test]
    async fn get_downloads_and_persists_into_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 0)).unwrap();
        let body = png_bytes(16, 16);
        let url = serve_once("image/png", body.clone()).await;

        let (path, from_cache) = cache.get(&url, true, true).await.unwrap().unwrap();
        assert!(!from_cache);
        assert_eq!(Some(path.clone()), cache.cache_path(&url));
        assert_eq!(std::fs::read(&path).unwrap(), body);
    }

    #[tokio::test]
    async fn get_answers_repeat_requests_from_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 0)).unwrap();

        // Pre-seed the cache entry; the host is unresolvable on purpose.
        let url = "https://cache-hit.invalid/thumb.jpg";
        let path = cache.cache_path(url).unwrap();
        std::fs::write(&path, b"cached bytes").unwrap();

        let (hit_path, from_cache) = cache.get(url, true, true).await.unwrap().unwrap();
        assert!(from_cache);
        assert_eq!(hit_path, path);

        // Bypassing the cache goes back to the network and fails cleanly.
        assert!(cache.get(url, false, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_rejects_non_image_responses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 0)).unwrap();
        let url = serve_once("text/html", b"<html>nope</html>".to_vec()).await;

        assert!(cache.get(&url, true, true).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_applies_the_filter_before_persisting() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 2)).unwrap();
        let body = png_bytes(32, 32);
        let url = serve_once("image/png", body).await;

        let (path, _) = cache.get(&url, true, true).await.unwrap().unwrap();
        let stored = std::fs::read(&path).unwrap();
        let img = image::load_from_memory_with_format(&stored, ImageFormat::Jpeg).unwrap();
        assert_eq!((img.width(), img.height()), (32, 32));
    }

    #[tokio::test]
    async fn trim_keeps_the_most_recent_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 0)).unwrap();

        for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
            let path = dir.path().join(format!("{name}.jpg"));
            std::fs::write(&path, b"x").unwrap();
            let mtime = filetime::FileTime::from_unix_time(1_700_000_000 + i as i64, 0);
            filetime::set_file_mtime(&path, mtime).unwrap();
        }

        assert_eq!(cache.trim(2).await, 2);
        assert!(!dir.path().join("a.jpg").exists());
        assert!(!dir.path().join("b.jpg").exists());
        assert!(dir.path().join("c.jpg").exists());
        assert!(dir.path().join("d.jpg").exists());
    }

    #[tokio::test]
    async fn clear_removes_only_cache_files() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ImageCache::new(&cache_options(dir.path(), 0)).unwrap();

        std::fs::write(dir.path().join("a.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"keep").unwrap();

        assert_eq!(cache.clear().await, 2);
        assert!(dir.path().join("notes.txt").exists());

        // A second clear finds nothing.
        assert_eq!(cache.clear().await, 0);
    }
}
