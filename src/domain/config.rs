use std::path::Path;

use serde::{Deserialize, Serialize};

/// Configuration for a reconciliation run.
///
/// This struct holds the revision range searched for history, the shape of
/// the source documents, the issue tracker to consult, and the policy used
/// to decide which textual references count as issue links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
pub struct Config {
    /// The tag of the baseline revision.
    ///
    /// History is searched in the range `(baseline, mainline]`.
    pub baseline: String,

    /// The mainline branch, whose tip bounds the history range and whose
    /// first-parent chain is used to resolve merge commits.
    pub mainline: String,

    /// Glob matched against file names in each revision directory.
    ///
    /// For example `0x??-V*.md`.
    pub file_pattern: String,

    /// The marker that introduces the trailing cross-reference annotation of
    /// a description. Everything from the marker onwards is stripped.
    pub annotation_marker: String,

    /// The minimum number of digits in a textual issue reference.
    ///
    /// Shorter references (`#5`) are usually version numbers or list items.
    min_reference_digits: usize,

    /// Issue numbers that are never attributed to a requirement.
    ignored_issues: Vec<u64>,

    /// The issue tracker to consult.
    pub tracker: TrackerConfig,
}

/// Settings for the issue tracker client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// The tracked repository, as `owner/name`.
    #[serde(default = "default_repository")]
    pub repository: String,

    /// The root of the tracker's REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// The environment variable holding the access token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Whether closed issues are enumerated as well as open ones.
    #[serde(default = "default_include_closed")]
    pub include_closed: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            repository: default_repository(),
            api_url: default_api_url(),
            token_env: default_token_env(),
            include_closed: default_include_closed(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            mainline: default_mainline(),
            file_pattern: default_file_pattern(),
            annotation_marker: default_annotation_marker(),
            min_reference_digits: default_min_reference_digits(),
            ignored_issues: Vec::new(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {e}"))?;
        toml::from_str(&content).map_err(|e| format!("Failed to parse config file: {e}"))
    }

    /// Loads the configuration from `path` if it exists, otherwise returns
    /// the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, String> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized or the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), String> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| format!("Failed to write config file: {e}"))
    }

    /// Serializes the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized.
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize config: {e}"))
    }

    /// Returns the minimum number of digits in a textual issue reference.
    #[must_use]
    pub const fn min_reference_digits(&self) -> usize {
        self.min_reference_digits
    }

    /// Sets the minimum number of digits in a textual issue reference.
    pub const fn set_min_reference_digits(&mut self, digits: usize) {
        self.min_reference_digits = digits;
    }

    /// Returns the issue numbers that are never attributed.
    #[must_use]
    pub fn ignored_issues(&self) -> &[u64] {
        &self.ignored_issues
    }

    /// Adds an issue number to the denylist.
    ///
    /// Returns `true` if the number was added, `false` if it was already
    /// present.
    pub fn ignore_issue(&mut self, number: u64) -> bool {
        if self.ignored_issues.contains(&number) {
            false
        } else {
            self.ignored_issues.push(number);
            true
        }
    }
}

fn default_baseline() -> String {
    "v4.0.3".to_string()
}

fn default_mainline() -> String {
    "master".to_string()
}

fn default_file_pattern() -> String {
    "0x??-V*.md".to_string()
}

fn default_annotation_marker() -> String {
    "([".to_string()
}

const fn default_min_reference_digits() -> usize {
    2
}

fn default_repository() -> String {
    "OWASP/ASVS".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

const fn default_include_closed() -> bool {
    true
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default = "default_baseline")]
        baseline: String,

        #[serde(default = "default_mainline")]
        mainline: String,

        #[serde(default = "default_file_pattern")]
        file_pattern: String,

        #[serde(default = "default_annotation_marker")]
        annotation_marker: String,

        #[serde(default = "default_min_reference_digits")]
        min_reference_digits: usize,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        ignored_issues: Vec<u64>,

        #[serde(default)]
        tracker: TrackerConfig,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                baseline,
                mainline,
                file_pattern,
                annotation_marker,
                min_reference_digits,
                ignored_issues,
                tracker,
            } => Self {
                baseline,
                mainline,
                file_pattern,
                annotation_marker,
                min_reference_digits,
                ignored_issues,
                tracker,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            baseline: config.baseline,
            mainline: config.mainline,
            file_pattern: config.file_pattern,
            annotation_marker: config.annotation_marker,
            min_reference_digits: config.min_reference_digits,
            ignored_issues: config.ignored_issues,
            tracker: config.tracker,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn load_reads_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"_version = \"1\"\nbaseline = \"v3.0\"\nmainline = \"main\"\nmin_reference_digits = 3\nignored_issues = [1, 2]\n\n[tracker]\nrepository = \"acme/standard\"\ninclude_closed = false\n",
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.baseline, "v3.0");
        assert_eq!(config.mainline, "main");
        assert_eq!(config.min_reference_digits(), 3);
        assert_eq!(config.ignored_issues(), &[1, 2]);
        assert_eq!(config.tracker.repository, "acme/standard");
        assert!(!config.tracker.include_closed);
        assert_eq!(config.tracker.token_env, "GITHUB_TOKEN");
        assert_eq!(config.file_pattern, "0x??-V*.md");
    }

    #[test]
    fn load_missing_file_returns_error() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing.toml");

        let error = Config::load(&missing).unwrap_err();
        assert!(error.starts_with("Failed to read config file:"));

        assert_eq!(Config::load_or_default(&missing).unwrap(), Config::default());
    }

    #[test]
    fn load_invalid_toml_returns_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"_version = \"1\"\nmin_reference_digits = \"two\"\n")
            .unwrap();

        let error = Config::load(file.path()).unwrap_err();
        assert!(error.starts_with("Failed to parse config file:"));
    }

    #[test]
    fn empty_file_returns_default() {
        let expected = Config::default();
        let actual: Config = toml::from_str(r#"_version = "1""#).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn saved_config_loads_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("reqlog.toml");
        let mut config = Config::default();
        config.set_min_reference_digits(4);
        assert!(config.ignore_issue(1234));
        assert!(!config.ignore_issue(1234));

        config.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("_version = \"1\""));
        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
