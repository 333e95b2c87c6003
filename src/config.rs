//! Configuration management for the blocklist combiner.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Default partition threshold: 90 MiB of domain lines per output file
pub const DEFAULT_MAX_PARTITION_BYTES: u64 = 90 * 1024 * 1024;

/// Environment variable consulted for the GitHub API token
pub const GITHUB_TOKEN_ENV: &str = "BLOCKLIST_COMBINER_GITHUB_TOKEN";

/// Secure string type that zeroizes memory on drop
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Parent directory of every per-source raw directory
    pub work_dir: PathBuf,

    /// Directory receiving the partitioned category lists
    pub output_dir: PathBuf,

    /// Recognized list-file suffix, without the dot
    pub list_extension: String,

    /// Maximum domain-line bytes per output partition
    pub max_partition_bytes: u64,

    /// Split categories into `<name><N>.txt` parts (false: one `<name>.txt`)
    pub split_output: bool,

    /// Sort domains before writing for reproducible output
    pub sort_output: bool,

    /// Raw file names that never contribute to output
    pub exclusions: Vec<String>,

    /// Raw category -> canonical category remappings
    pub category_merge: BTreeMap<String, String>,

    /// Ordered list of sources; aggregation follows this order
    pub sources: Vec<SourceConfig>,

    /// Network settings for the fetch stage
    pub fetch: FetchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("Temp"),
            output_dir: PathBuf::from("master_export"),
            list_extension: "txt".to_string(),
            max_partition_bytes: DEFAULT_MAX_PARTITION_BYTES,
            split_output: true,
            sort_output: true,
            exclusions: default_exclusions(),
            category_merge: default_category_merge(),
            sources: default_sources(),
            fetch: FetchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load configuration, falling back to built-in defaults when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::debug!(
                "No config file at {:?}, using built-in defaults",
                path.as_ref()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_partition_bytes == 0 {
            anyhow::bail!("max_partition_bytes must be greater than zero");
        }

        if self.list_extension.is_empty() || self.list_extension.contains(['.', '/', '\\']) {
            anyhow::bail!(
                "Invalid list_extension '{}'. Use a bare suffix like 'txt'",
                self.list_extension
            );
        }

        if self.fetch.timeout_secs == 0 {
            anyhow::bail!("fetch.timeout_secs must be greater than zero");
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.is_empty()
                || source.name.contains(['/', '\\'])
                || source.name == "."
                || source.name == ".."
            {
                anyhow::bail!("Invalid source name '{}'", source.name);
            }
            if !seen.insert(source.name.as_str()) {
                anyhow::bail!("Duplicate source name '{}'", source.name);
            }
            if source.enabled && !source.url.starts_with("https://") {
                anyhow::bail!(
                    "Source '{}' URL must use HTTPS: {}",
                    source.name,
                    source.url
                );
            }
            if self.output_dir.starts_with(self.source_dir(source)) {
                anyhow::bail!(
                    "output_dir {:?} lies inside the raw directory of source '{}'",
                    self.output_dir,
                    source.name
                );
            }
        }

        // Wiping the output directory must never reach the work directory
        if self.work_dir.starts_with(&self.output_dir) {
            anyhow::bail!(
                "output_dir {:?} must not contain work_dir {:?}",
                self.output_dir,
                self.work_dir
            );
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Sources that take part in this run, in configuration order
    pub fn enabled_sources(&self) -> Vec<&SourceConfig> {
        self.sources.iter().filter(|s| s.enabled).collect()
    }

    /// Raw directory of a source
    pub fn source_dir(&self, source: &SourceConfig) -> PathBuf {
        self.work_dir.join(&source.name)
    }
}

/// How a source delivers its per-category files
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Gzipped tarball with `<category>/domains` members (UT1 layout)
    Ut1Archive,
    /// GitHub contents API listing of one-file-per-category
    GithubDirectory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub kind: SourceKind,
    pub url: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Deadline for a single HTTP request, in seconds
    pub timeout_secs: u64,
    /// Largest accepted response body
    pub max_download_bytes: u64,
    /// GitHub API token (raises the anonymous rate limit)
    /// Memory is securely zeroed when dropped
    pub github_token: SecureString,
    /// Environment variable name to read the token from (optional)
    pub github_token_env: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            max_download_bytes: 512 * 1024 * 1024,
            github_token: SecureString::default(),
            github_token_env: None,
        }
    }
}

impl FetchConfig {
    /// Get the effective token, checking env vars before the config value
    pub fn get_github_token(&self) -> Option<SecureString> {
        if let Some(ref env_name) = self.github_token_env {
            if let Ok(val) = env::var(env_name) {
                return Some(SecureString::new(val));
            }
        }
        if let Ok(val) = env::var(GITHUB_TOKEN_ENV) {
            return Some(SecureString::new(val));
        }
        if self.github_token.is_empty() {
            None
        } else {
            Some(self.github_token.clone())
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_exclusions() -> Vec<String> {
    [
        "agressif.txt",
        "arjel.txt",
        "child.txt",
        "list_blanche.txt",
        "list_bu.txt",
        "tricheur.txt",
        "tricheur_pix.txt",
        "update.txt",
        "reaffected.txt",
        "associations_religieuses.txt",
        "sect.txt",
        "exceptions_liste_bu.txt",
        "examen_pix.txt",
        "everything.txt",
        "special.txt",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_category_merge() -> BTreeMap<String, String> {
    [
        ("publicite", "ads"),
        ("drogue", "drugs"),
        ("doh", "DNS_Over_HTTPS"),
        ("gaming", "games"),
        ("x", "twitter"),
        ("adult", "porn"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig {
            name: "ut1".to_string(),
            kind: SourceKind::Ut1Archive,
            url: "https://dsi.ut-capitole.fr/blacklists/download/all.tar.gz".to_string(),
            enabled: true,
        },
        SourceConfig {
            name: "blp".to_string(),
            kind: SourceKind::GithubDirectory,
            url: "https://api.github.com/repos/blocklistproject/Lists/contents/".to_string(),
            enabled: true,
        },
        SourceConfig {
            name: "fm".to_string(),
            kind: SourceKind::GithubDirectory,
            url: "https://api.github.com/repos/FikesMedia/fm-if-categories/contents/CustomList"
                .to_string(),
            enabled: true,
        },
    ]
}
