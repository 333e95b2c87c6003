//! Fetch collaborators: download raw per-category lists into source directories.
//!
//! Sources are fetched one after another with a single attempt each. A
//! failed source is reported and the run carries on with whatever the other
//! sources produced.

use async_trait::async_trait;
use flate2::read::GzDecoder;
use reqwest::Client;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

#[cfg(test)]
use mockall::automock;

use crate::config::{FetchConfig, SecureString, SourceConfig, SourceKind};
use crate::error::CombinerError;
use crate::normalizer::CategoryNormalizer;
use crate::report::{RunReport, SkipReason, SourceOutcome};

const GITHUB_API_PREFIX: &str = "https://api.github.com/";

/// Trait abstracting HTTP downloads so the fetch logic can be tested offline.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Download `url` in full, failing if the body exceeds `max_bytes`.
    async fn get(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, CombinerError>;
}

/// `reqwest`-backed transport with a per-request deadline.
pub struct HttpTransport {
    client: Client,
    github_token: Option<SecureString>,
}

impl HttpTransport {
    pub fn new(config: &FetchConfig) -> Result<Self, CombinerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("blocklist-combiner/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CombinerError::Network(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            github_token: config.get_github_token(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &str, max_bytes: u64) -> Result<Vec<u8>, CombinerError> {
        let mut request = self.client.get(url);
        if url.starts_with(GITHUB_API_PREFIX) {
            request = request.header("Accept", "application/vnd.github+json");
            if let Some(ref token) = self.github_token {
                request = request.bearer_auth(token.as_str());
            }
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| CombinerError::Network(format!("{}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(CombinerError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        if let Some(length) = response.content_length() {
            if length > max_bytes {
                return Err(CombinerError::TooLarge {
                    size: length,
                    max: max_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| CombinerError::Network(format!("{}: {}", url, e)))?
        {
            if body.len() as u64 + chunk.len() as u64 > max_bytes {
                return Err(CombinerError::TooLarge {
                    size: body.len() as u64 + chunk.len() as u64,
                    max: max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body)
    }
}

/// One entry of a GitHub contents API directory listing
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubContent {
    pub name: String,
    pub download_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Unpack a gzipped UT1-layout tarball into `target_dir`.
///
/// Every regular `<category>/domains` member becomes `<category>.txt`
/// (lowercased). Excluded names are never written. Returns the number of
/// files written.
pub fn extract_ut1_archive<R: Read>(
    reader: R,
    target_dir: &Path,
    normalizer: &CategoryNormalizer,
) -> Result<usize, CombinerError> {
    let archive_err = |e: io::Error| CombinerError::Archive(e.to_string());
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut written = 0;

    for entry in archive.entries().map_err(archive_err)? {
        let mut entry = entry.map_err(archive_err)?;
        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path().map_err(archive_err)?.into_owned();
        if path.file_name().and_then(|n| n.to_str()) != Some("domains") {
            continue;
        }
        let Some(category) = path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };

        let file_name = normalizer.list_file_name(&category);
        if normalizer.is_excluded(&file_name) {
            debug!("Skipping excluded archive member {}", path.display());
            continue;
        }

        let mut out = File::create(target_dir.join(&file_name))?;
        io::copy(&mut entry, &mut out).map_err(archive_err)?;
        written += 1;
    }

    Ok(written)
}

/// Downloads configured sources into their raw directories.
pub struct Fetcher<T: Transport = HttpTransport> {
    transport: T,
    normalizer: CategoryNormalizer,
    max_download_bytes: u64,
}

impl Fetcher<HttpTransport> {
    /// Create a fetcher backed by a real HTTP client
    pub fn new(
        config: &FetchConfig,
        normalizer: CategoryNormalizer,
    ) -> Result<Self, CombinerError> {
        Ok(Self::with_transport(
            HttpTransport::new(config)?,
            normalizer,
            config.max_download_bytes,
        ))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn with_transport(
        transport: T,
        normalizer: CategoryNormalizer,
        max_download_bytes: u64,
    ) -> Self {
        Self {
            transport,
            normalizer,
            max_download_bytes,
        }
    }

    /// Fetch one source into `target_dir`, recording the outcome.
    pub async fn fetch_source(
        &self,
        source: &SourceConfig,
        target_dir: &Path,
        report: &mut RunReport,
    ) -> SourceOutcome {
        let result = match source.kind {
            SourceKind::Ut1Archive => self.fetch_ut1(&source.url, target_dir).await,
            SourceKind::GithubDirectory => {
                self.fetch_github_directory(&source.url, target_dir, report)
                    .await
            }
        };

        match result {
            Ok(files_written) => {
                info!("Fetched {} - {} lists", source.name, files_written);
                SourceOutcome {
                    name: source.name.clone(),
                    files_written,
                    error: None,
                }
            }
            Err(e) => {
                report.skip(&source.name, SkipReason::FetchFailed, Some(e.to_string()));
                SourceOutcome {
                    name: source.name.clone(),
                    files_written: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Download and unpack the UT1 archive.
    pub async fn fetch_ut1(&self, url: &str, target_dir: &Path) -> Result<usize, CombinerError> {
        info!("Downloading archive {}...", url);
        fs::create_dir_all(target_dir)?;
        let body = self.transport.get(url, self.max_download_bytes).await?;
        debug!("Archive is {} bytes", body.len());
        extract_ut1_archive(body.as_slice(), target_dir, &self.normalizer)
    }

    /// Download every list file of a GitHub contents API directory listing.
    ///
    /// Individual file failures are recorded and skipped; only a failed or
    /// undecodable listing fails the source.
    pub async fn fetch_github_directory(
        &self,
        api_url: &str,
        target_dir: &Path,
        report: &mut RunReport,
    ) -> Result<usize, CombinerError> {
        info!("Fetching GitHub listing {}...", api_url);
        fs::create_dir_all(target_dir)?;

        let listing = self.transport.get(api_url, self.max_download_bytes).await?;
        let contents: Vec<GitHubContent> = serde_json::from_slice(&listing)
            .map_err(|e| CombinerError::Decode(format!("{}: {}", api_url, e)))?;

        let mut written = 0;
        for item in contents {
            let file_name = item.name.to_lowercase();
            if item.kind != "file" || !self.normalizer.has_list_suffix(&file_name) {
                continue;
            }
            if self.normalizer.is_excluded(&file_name) {
                debug!("Skipping excluded list {}", file_name);
                continue;
            }
            let Some(download_url) = item.download_url else {
                warn!("{} has no download URL", item.name);
                continue;
            };

            let body = match self.transport.get(&download_url, self.max_download_bytes).await {
                Ok(body) => body,
                Err(e) => {
                    report.skip(download_url, SkipReason::FetchFailed, Some(e.to_string()));
                    continue;
                }
            };

            let target = target_dir.join(&file_name);
            match fs::write(&target, &body) {
                Ok(()) => written += 1,
                Err(e) => report.skip_path(&target, SkipReason::WriteFailed, Some(e.to_string())),
            }
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::TempDir;

    fn normalizer() -> CategoryNormalizer {
        CategoryNormalizer::new(["child.txt"], [("publicite", "ads")], "txt")
    }

    fn ut1_tarball(members: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
        for (path, content) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    fn listing(entries: &[(&str, &str, Option<&str>)]) -> Vec<u8> {
        let items: Vec<serde_json::Value> = entries
            .iter()
            .map(|(name, kind, url)| {
                serde_json::json!({ "name": name, "type": kind, "download_url": url })
            })
            .collect();
        serde_json::to_vec(&items).unwrap()
    }

    #[test]
    fn test_extract_ut1_archive() {
        let temp = TempDir::new().unwrap();
        let tarball = ut1_tarball(&[
            ("blacklists/Publicite/domains", "ads.example\n"),
            ("blacklists/publicite/urls", "ads.example/path\n"),
            ("blacklists/child/domains", "never.example\n"),
            ("blacklists/gambling/domains", "bet.example\n"),
            ("blacklists/README", "readme\n"),
        ]);

        let written = extract_ut1_archive(tarball.as_slice(), temp.path(), &normalizer()).unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            fs::read_to_string(temp.path().join("publicite.txt")).unwrap(),
            "ads.example\n"
        );
        assert!(temp.path().join("gambling.txt").exists());
        assert!(!temp.path().join("child.txt").exists());
        assert!(!temp.path().join("readme.txt").exists());
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let result = extract_ut1_archive(&b"not a gzip stream"[..], temp.path(), &normalizer());
        assert!(matches!(result, Err(CombinerError::Archive(_))));
    }

    #[test]
    fn test_github_content_deserialize() {
        let json = r#"[
            {"name":"ads.txt","type":"file","download_url":"https://raw.example/ads.txt","sha":"x"},
            {"name":"alt","type":"dir","download_url":null}
        ]"#;
        let items: Vec<GitHubContent> = serde_json::from_str(json).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, "file");
        assert!(items[1].download_url.is_none());
    }

    #[tokio::test]
    async fn test_fetch_github_directory() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .withf(|url, _| url.starts_with("https://api.github.com/"))
            .times(1)
            .returning(|_, _| {
                Ok(listing(&[
                    ("Ads.txt", "file", Some("https://raw.example/Ads.txt")),
                    ("child.txt", "file", Some("https://raw.example/child.txt")),
                    ("README.md", "file", Some("https://raw.example/README.md")),
                    ("alt-version", "dir", None),
                    ("porn.txt", "file", Some("https://raw.example/porn.txt")),
                ]))
            });
        transport
            .expect_get()
            .withf(|url, _| url.ends_with("/Ads.txt"))
            .times(1)
            .returning(|_, _| Ok(b"0.0.0.0 ad.example\n".to_vec()));
        transport
            .expect_get()
            .withf(|url, _| url.ends_with("/porn.txt"))
            .times(1)
            .returning(|_, _| {
                Err(CombinerError::HttpStatus {
                    url: "https://raw.example/porn.txt".to_string(),
                    status: 404,
                })
            });

        let fetcher = Fetcher::with_transport(transport, normalizer(), 1024);
        let mut report = RunReport::new();
        let written = fetcher
            .fetch_github_directory(
                "https://api.github.com/repos/o/r/contents/",
                temp.path(),
                &mut report,
            )
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert!(temp.path().join("ads.txt").exists());
        assert!(!temp.path().join("child.txt").exists());
        assert_eq!(report.count_skipped(SkipReason::FetchFailed), 1);
    }

    #[tokio::test]
    async fn test_fetch_github_bad_listing_fails_source() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .returning(|_, _| Ok(br#"{"message":"API rate limit exceeded"}"#.to_vec()));

        let fetcher = Fetcher::with_transport(transport, normalizer(), 1024);
        let result = fetcher
            .fetch_github_directory(
                "https://api.github.com/repos/o/r/contents/",
                temp.path(),
                &mut RunReport::new(),
            )
            .await;
        assert!(matches!(result, Err(CombinerError::Decode(_))));
    }

    #[tokio::test]
    async fn test_fetch_source_ut1() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("ut1");
        let tarball = ut1_tarball(&[("blacklists/ads/domains", "a.example\n")]);
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .returning(move |_, _| Ok(tarball.clone()));

        let fetcher = Fetcher::with_transport(transport, normalizer(), 1 << 20);
        let source = SourceConfig {
            name: "ut1".to_string(),
            kind: SourceKind::Ut1Archive,
            url: "https://example.org/all.tar.gz".to_string(),
            enabled: true,
        };
        let mut report = RunReport::new();
        let outcome = fetcher.fetch_source(&source, &target, &mut report).await;

        assert_eq!(outcome.files_written, 1);
        assert!(outcome.error.is_none());
        assert!(target.join("ads.txt").exists());
    }

    #[tokio::test]
    async fn test_fetch_source_failure_is_recorded() {
        let temp = TempDir::new().unwrap();
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .returning(|_, _| Err(CombinerError::Network("connection refused".to_string())));

        let fetcher = Fetcher::with_transport(transport, normalizer(), 1024);
        let source = SourceConfig {
            name: "blp".to_string(),
            kind: SourceKind::GithubDirectory,
            url: "https://api.github.com/repos/o/r/contents/".to_string(),
            enabled: true,
        };
        let mut report = RunReport::new();
        let outcome = fetcher
            .fetch_source(&source, &temp.path().join("blp"), &mut report)
            .await;

        assert_eq!(outcome.files_written, 0);
        assert!(outcome.error.unwrap().contains("connection refused"));
        assert_eq!(report.count_skipped(SkipReason::FetchFailed), 1);
    }

    #[test]
    fn test_http_transport_builds() {
        assert!(HttpTransport::new(&FetchConfig::default()).is_ok());
    }
}
