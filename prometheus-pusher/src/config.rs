//! Scrape target configuration.
//!
//! Configuration is a set of sections, one file or a directory of files.
//! The reserved `[config]` section carries the gateway settings, every other
//! section is a scrape target named after the section:
//!
//! ```toml
//! [config]
//! pushgateway_url = "http://pushgateway:9091"
//! push_interval = 30
//!
//! [node]
//! port = 9100
//!
//! [app]
//! host = "10.0.0.5"
//! port = 8443
//! path = "/internal/metrics"
//! ssl = true
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// Name of the section holding gateway settings.
pub const CONFIG_SECTION: &str = "config";

/// Gateway used when `pushgateway_url` is not set.
pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:9091";

/// Push interval used when `push_interval` is not set.
pub const DEFAULT_PUSH_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted push interval.
pub const MAX_PUSH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PATH: &str = "/metrics";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config path '{}': {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid section [{section}] in '{}': {message}", path.display())]
    Section {
        path: PathBuf,
        section: String,
        message: String,
    },

    #[error("Port is not defined for target [{section}] in '{}'", path.display())]
    MissingPort { path: PathBuf, section: String },
}

impl ConfigError {
    fn unreadable(path: &Path, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.to_path_buf(),
            source,
        }
    }

    fn section(path: &Path, section: &str, message: impl Into<String>) -> Self {
        Self::Section {
            path: path.to_path_buf(),
            section: section.to_string(),
            message: message.into(),
        }
    }
}

/// Syntax of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json5,
}

impl ConfigFormat {
    /// Format of a directory member, `None` for files that are not
    /// configuration.
    pub fn from_member(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Some(Self::Toml),
            Some("json5") => Some(Self::Json5),
            _ => None,
        }
    }

    /// Format of an explicitly named file. Anything not `.json5` is TOML.
    pub fn from_file(path: &Path) -> Self {
        Self::from_member(path).unwrap_or(Self::Toml)
    }
}

/// Gateway settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    /// Base URL of the Pushgateway.
    pub gateway_url: String,

    /// Time between two collection cycles.
    pub push_interval: Duration,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            push_interval: DEFAULT_PUSH_INTERVAL,
        }
    }
}

/// One scrape target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    /// Section name; also the job name on the gateway.
    pub name: String,

    /// Fully composed `scheme://host:port/path`.
    pub url: String,
}

/// Snapshot of the whole configuration, rebuilt on every reload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PusherConfig {
    /// Gateway settings.
    pub push: PushConfig,

    /// Targets ordered by name.
    pub targets: Vec<TargetConfig>,
}

impl PusherConfig {
    /// Parse a single document.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        let origin = Path::new("<inline>");
        let mut builder = ConfigBuilder::default();
        builder.merge(origin, parse_document(origin, content, format)?)?;
        Ok(builder.build())
    }

    /// Look up a target by name.
    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// `[config]` section as written.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PushSection {
    pushgateway_url: Option<String>,
    push_interval: Option<i64>,
}

/// Target section as written.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetSection {
    host: Option<String>,
    path: Option<String>,
    ssl: Option<bool>,
    port: Option<i64>,
}

/// Load configuration from a file or a directory.
///
/// For a directory, every regular `*.toml` and `*.json5` member is loaded in
/// file name order; other entries are ignored. A target defined twice keeps
/// the last definition.
pub fn load(path: impl AsRef<Path>) -> Result<PusherConfig, ConfigError> {
    let path = path.as_ref();
    let mut builder = ConfigBuilder::default();

    for file in config_files(path)? {
        let content =
            std::fs::read_to_string(&file).map_err(|e| ConfigError::unreadable(&file, e))?;
        let document = parse_document(&file, &content, ConfigFormat::from_file(&file))?;
        builder.merge(&file, document)?;
    }

    Ok(builder.build())
}

/// List the files making up the configuration at `path`.
pub fn config_files(path: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let metadata = std::fs::metadata(path).map_err(|e| ConfigError::unreadable(path, e))?;

    if !metadata.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path).map_err(|e| ConfigError::unreadable(path, e))? {
        let entry = entry.map_err(|e| ConfigError::unreadable(path, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| ConfigError::unreadable(&entry.path(), e))?;

        let member = entry.path();
        if file_type.is_file() && ConfigFormat::from_member(&member).is_some() {
            files.push(member);
        }
    }
    files.sort();

    Ok(files)
}

fn parse_document(
    path: &Path,
    content: &str,
    format: ConfigFormat,
) -> Result<Value, ConfigError> {
    let parsed = match format {
        ConfigFormat::Toml => toml::from_str::<Value>(content).map_err(|e| e.to_string()),
        ConfigFormat::Json5 => json5::from_str::<Value>(content).map_err(|e| e.to_string()),
    };

    match parsed {
        Ok(document @ Value::Object(_)) => Ok(document),
        Ok(_) => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: "top level must be a table".to_string(),
        }),
        Err(message) => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        }),
    }
}

/// Accumulates documents into a [`PusherConfig`].
#[derive(Default)]
struct ConfigBuilder {
    push: PushConfig,
    targets: BTreeMap<String, (PathBuf, TargetConfig)>,
}

impl ConfigBuilder {
    fn merge(&mut self, origin: &Path, document: Value) -> Result<(), ConfigError> {
        let Value::Object(sections) = document else {
            return Ok(());
        };

        for (name, section) in sections {
            // Top-level keys that are not tables are not sections.
            if !section.is_object() {
                continue;
            }

            if name == CONFIG_SECTION {
                let raw: PushSection = decode_section(origin, &name, section)?;
                self.apply_push(origin, raw)?;
                continue;
            }

            let raw: TargetSection = decode_section(origin, &name, section)?;
            let target = resolve_target(origin, &name, raw)?;

            if let Some((previous, _)) = self.targets.get(&name) {
                tracing::warn!(
                    target_name = %name,
                    previous = %previous.display(),
                    file = %origin.display(),
                    "Target defined more than once, last definition wins"
                );
            }
            self.targets.insert(name, (origin.to_path_buf(), target));
        }

        Ok(())
    }

    fn apply_push(&mut self, origin: &Path, raw: PushSection) -> Result<(), ConfigError> {
        if let Some(url) = raw.pushgateway_url {
            Url::parse(&url).map_err(|e| {
                ConfigError::section(
                    origin,
                    CONFIG_SECTION,
                    format!("invalid pushgateway_url '{url}': {e}"),
                )
            })?;
            self.push.gateway_url = url;
        }

        if let Some(secs) = raw.push_interval {
            if secs <= 0 {
                return Err(ConfigError::section(
                    origin,
                    CONFIG_SECTION,
                    "push_interval must be > 0",
                ));
            }
            if secs as u64 > MAX_PUSH_INTERVAL.as_secs() {
                return Err(ConfigError::section(
                    origin,
                    CONFIG_SECTION,
                    format!(
                        "push_interval {secs} exceeds the maximum of {} seconds",
                        MAX_PUSH_INTERVAL.as_secs()
                    ),
                ));
            }
            self.push.push_interval = Duration::from_secs(secs as u64);
        }

        Ok(())
    }

    fn build(self) -> PusherConfig {
        PusherConfig {
            push: self.push,
            targets: self.targets.into_values().map(|(_, t)| t).collect(),
        }
    }
}

fn decode_section<T: DeserializeOwned>(
    origin: &Path,
    section: &str,
    value: Value,
) -> Result<T, ConfigError> {
    serde_json::from_value(value).map_err(|e| ConfigError::section(origin, section, e.to_string()))
}

fn resolve_target(
    origin: &Path,
    name: &str,
    raw: TargetSection,
) -> Result<TargetConfig, ConfigError> {
    // Port 0 counts as unset.
    let port = match raw.port {
        None | Some(0) => {
            return Err(ConfigError::MissingPort {
                path: origin.to_path_buf(),
                section: name.to_string(),
            });
        }
        Some(port) => u16::try_from(port).map_err(|_| {
            ConfigError::section(origin, name, format!("port {port} out of range"))
        })?,
    };

    let host = raw.host.as_deref().unwrap_or(DEFAULT_HOST);
    let path = raw.path.as_deref().unwrap_or(DEFAULT_PATH);
    let scheme = if raw.ssl.unwrap_or(false) { "https" } else { "http" };

    let url = format!("{scheme}://{host}:{port}{path}");
    Url::parse(&url).map_err(|e| {
        ConfigError::section(origin, name, format!("invalid target URL '{url}': {e}"))
    })?;

    Ok(TargetConfig {
        name: name.to_string(),
        url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_target_url() {
        let toml = r#"
            [web]
            host = "a"
            path = "/m"
            ssl = true
            port = 9100
        "#;

        let config = PusherConfig::parse(toml, ConfigFormat::Toml).unwrap();

        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.target("web").unwrap().url, "https://a:9100/m");
    }

    #[test]
    fn test_target_defaults() {
        let config = PusherConfig::parse("[node]\nport = 9100\n", ConfigFormat::Toml).unwrap();

        assert_eq!(
            config.target("node").unwrap().url,
            "http://localhost:9100/metrics"
        );
        assert_eq!(config.push, PushConfig::default());
        assert_eq!(config.push.gateway_url, "http://localhost:9091");
        assert_eq!(config.push.push_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_config_section() {
        let toml = r#"
            [config]
            pushgateway_url = "http://gateway:9091"
            push_interval = 15

            [node]
            port = 9100
        "#;

        let config = PusherConfig::parse(toml, ConfigFormat::Toml).unwrap();

        assert_eq!(config.push.gateway_url, "http://gateway:9091");
        assert_eq!(config.push.push_interval, Duration::from_secs(15));
        assert_eq!(config.targets.len(), 1);
        assert!(config.target(CONFIG_SECTION).is_none());
    }

    #[test]
    fn test_missing_port() {
        let toml = r#"
            [good]
            port = 9100

            [bad]
            host = "example"
        "#;

        let result = PusherConfig::parse(toml, ConfigFormat::Toml);
        assert!(
            matches!(result, Err(ConfigError::MissingPort { ref section, .. }) if section == "bad")
        );
    }

    #[test]
    fn test_port_zero_is_missing() {
        let result = PusherConfig::parse("[zero]\nport = 0\n", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::MissingPort { .. })));
    }

    #[test]
    fn test_port_out_of_range() {
        let result = PusherConfig::parse("[big]\nport = 70000\n", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Section { .. })));
    }

    #[test]
    fn test_wrong_value_type() {
        let result = PusherConfig::parse("[node]\nport = \"9100\"\n", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Section { .. })));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = PusherConfig::parse("[config]\npush_interval = 0\n", ConfigFormat::Toml);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("push_interval must be > 0"));
    }

    #[test]
    fn test_interval_upper_bound() {
        let day = MAX_PUSH_INTERVAL.as_secs();

        let config =
            PusherConfig::parse(&format!("[config]\npush_interval = {day}\n"), ConfigFormat::Toml)
                .unwrap();
        assert_eq!(config.push.push_interval, MAX_PUSH_INTERVAL);

        for secs in [day + 1, i64::MAX as u64] {
            let result = PusherConfig::parse(
                &format!("[config]\npush_interval = {secs}\n"),
                ConfigFormat::Toml,
            );
            assert!(
                matches!(result, Err(ConfigError::Section { ref section, .. }) if section == CONFIG_SECTION),
                "accepted {secs}"
            );
        }
    }

    #[test]
    fn test_invalid_gateway_url() {
        let result = PusherConfig::parse(
            "[config]\npushgateway_url = \"not a url\"\n",
            ConfigFormat::Toml,
        );
        assert!(matches!(result, Err(ConfigError::Section { .. })));
    }

    #[test]
    fn test_top_level_values_ignored() {
        let toml = r#"
            title = "pushers"

            [node]
            port = 9100
            comment = "unknown keys are fine"
        "#;

        let config = PusherConfig::parse(toml, ConfigFormat::Toml).unwrap();
        assert_eq!(config.targets.len(), 1);
    }

    #[test]
    fn test_parse_json5() {
        let json = r#"{
            config: { pushgateway_url: "http://gw:9091" },
            app: { host: "10.0.0.5", port: 8443, ssl: true },
        }"#;

        let config = PusherConfig::parse(json, ConfigFormat::Json5).unwrap();
        assert_eq!(config.push.gateway_url, "http://gw:9091");
        assert_eq!(
            config.target("app").unwrap().url,
            "https://10.0.0.5:8443/metrics"
        );
    }

    #[test]
    fn test_invalid_syntax() {
        let result = PusherConfig::parse("[node\nport = 1", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_missing_path() {
        let result = load("/nonexistent/prometheus-pusher/conf.d");
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        // Explicit files are TOML whatever their extension.
        let file = dir.path().join("pusher.conf");
        fs::write(&file, "[node]\nport = 9100\n").unwrap();

        let config = load(&file).unwrap();
        assert_eq!(config.targets.len(), 1);
    }

    #[test]
    fn test_load_directory_merges_members() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("00-global.toml"),
            "[config]\npushgateway_url = \"http://gw:9091\"\npush_interval = 10\n",
        )
        .unwrap();
        fs::write(dir.path().join("node.toml"), "[node]\nport = 9100\n").unwrap();
        fs::write(dir.path().join("app.json5"), "{ app: { port: 8080 } }").unwrap();
        fs::write(dir.path().join("README"), "not a config file").unwrap();
        fs::write(dir.path().join("broken.toml.bak"), "[[[").unwrap();
        fs::create_dir(dir.path().join("nested.toml")).unwrap();

        let config = load(dir.path()).unwrap();

        assert_eq!(config.push.gateway_url, "http://gw:9091");
        assert_eq!(config.push.push_interval, Duration::from_secs(10));
        let names: Vec<_> = config.targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["app", "node"]);
    }

    #[test]
    fn test_load_directory_duplicate_last_wins() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.toml"), "[node]\nport = 9100\n").unwrap();
        fs::write(dir.path().join("b.toml"), "[node]\nport = 9200\n").unwrap();

        let config = load(dir.path()).unwrap();

        assert_eq!(config.targets.len(), 1);
        assert_eq!(
            config.target("node").unwrap().url,
            "http://localhost:9200/metrics"
        );
    }

    #[test]
    fn test_load_directory_fails_on_any_bad_member() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("good.toml"), "[node]\nport = 9100\n").unwrap();
        fs::write(dir.path().join("bad.toml"), "[app]\nhost = \"a\"\n").unwrap();

        let result = load(dir.path());
        assert!(matches!(result, Err(ConfigError::MissingPort { .. })));
    }

    #[test]
    fn test_load_empty_directory() {
        let dir = tempfile::tempdir().unwrap();

        let config = load(dir.path()).unwrap();
        assert!(config.targets.is_empty());
        assert_eq!(config.push, PushConfig::default());
    }
}
