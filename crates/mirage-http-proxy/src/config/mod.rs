//! Configuration types for the Mirage intermediary.

mod listen;
mod recording;
mod upstream;

use crate::recording::Mode;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Re-export all types for library consumers
pub use listen::{ListenConfig, LogFormat, LoggingConfig};
pub use recording::{RecordingBackend, RecordingConfig};
pub use upstream::UpstreamConfig;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Initial mode; can be switched at runtime through the admin endpoint
    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, anyhow::Error> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.listen.socket_addr().map_err(|e| {
            anyhow::anyhow!("Invalid listen host '{}': {e}", self.listen.host)
        })?;

        if self.upstream.timeout_secs == 0 {
            anyhow::bail!("upstream.timeout_secs must be greater than zero");
        }

        if self.upstream.connect_timeout_secs == 0 {
            anyhow::bail!("upstream.connect_timeout_secs must be greater than zero");
        }

        if self.upstream.target_param.trim().is_empty() {
            anyhow::bail!("upstream.target_param must not be empty");
        }

        if self.recording.backend == RecordingBackend::File
            && self.recording.path.as_os_str().is_empty()
        {
            anyhow::bail!("recording.path is required for the file backend");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::DEFAULT_IGNORED_HEADERS;
    use std::path::PathBuf;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
listen:
  host: 127.0.0.1
  port: 9000
mode: record
recording:
  path: /tmp/mirage-recordings
  ignored_headers: [host, user-agent]
upstream:
  timeout_secs: 45
  target_param: upstream
logging:
  format: json
"#;

        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.listen.port, 9000);
        assert_eq!(config.mode, Mode::Record);
        assert_eq!(config.recording.path, PathBuf::from("/tmp/mirage-recordings"));
        assert_eq!(config.recording.backend, RecordingBackend::File);
        assert_eq!(config.recording.ignored_headers, vec!["host", "user-agent"]);
        assert!(config.recording.fingerprinter().ignores("User-Agent"));
        assert_eq!(config.upstream.timeout_secs, 45);
        assert_eq!(config.upstream.connect_timeout_secs, 10);
        assert_eq!(config.upstream.target_param, "upstream");
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("{}").unwrap();
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.mode, Mode::Playback);
        assert_eq!(config.recording.path, PathBuf::from("recordings"));
        assert_eq!(
            config.recording.ignored_headers.len(),
            DEFAULT_IGNORED_HEADERS.len()
        );
        assert_eq!(config.upstream.timeout().as_secs(), 30);
        assert_eq!(config.upstream.target_param, "target");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_memory_backend() {
        let config = Config::from_yaml_str("recording:\n  backend: memory\n  path: \"\"\n").unwrap();
        assert_eq!(config.recording.backend, RecordingBackend::Memory);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let err = Config::from_yaml_str("upstream:\n  timeout_secs: 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn test_validate_rejects_empty_target_param() {
        let err = Config::from_yaml_str("upstream:\n  target_param: \"  \"\n").unwrap_err();
        assert!(err.to_string().contains("target_param"));
    }

    #[test]
    fn test_validate_rejects_empty_file_path() {
        let err = Config::from_yaml_str("recording:\n  path: \"\"\n").unwrap_err();
        assert!(err.to_string().contains("recording.path"));
    }

    #[test]
    fn test_validate_rejects_bad_listen_host() {
        let err = Config::from_yaml_str("listen:\n  host: not-an-ip\n").unwrap_err();
        assert!(err.to_string().contains("not-an-ip"));
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        assert!(Config::from_yaml_str("mode: replay\n").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mirage.yaml");
        std::fs::write(&path, "mode: record\nlisten:\n  port: 7000\n").unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.mode, Mode::Record);
        assert_eq!(config.listen.port, 7000);

        let missing = Config::from_file(dir.path().join("missing.yaml")).unwrap_err();
        assert!(missing.to_string().contains("missing.yaml"));
    }
}
