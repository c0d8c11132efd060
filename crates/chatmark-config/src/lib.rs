use chatmark_engine::streaming::DEFAULT_ASYNC_THRESHOLD;
use chatmark_engine::{EngineError, OutputFormat, ParseOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
}

/// The `[render]` table. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub presanitize: bool,
    pub ignore_inline: bool,
    pub ignore_plain_links: bool,
    pub inline_html_as_code: bool,
    pub image_as_link: bool,
    pub coalesce: bool,
    /// `markdown`, `unicode` or `html`
    pub format: String,
    /// Input size in bytes from which re-parsing moves off the caller's thread
    pub async_threshold: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            presanitize: false,
            ignore_inline: false,
            ignore_plain_links: false,
            inline_html_as_code: false,
            image_as_link: false,
            coalesce: false,
            format: OutputFormat::default().to_string(),
            async_threshold: DEFAULT_ASYNC_THRESHOLD,
        }
    }
}

impl RenderConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            presanitize: self.presanitize,
            ignore_inline: self.ignore_inline,
            ignore_plain_links: self.ignore_plain_links,
            inline_html_as_code: self.inline_html_as_code,
            image_as_link: self.image_as_link,
            chunking: false,
        }
    }

    pub fn output_format(&self) -> Result<OutputFormat, EngineError> {
        self.format.parse()
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/chatmark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/chatmark/config.toml"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.render.async_threshold, 16 * 1024);
        assert_eq!(config.render.output_format().unwrap(), OutputFormat::Markdown);
    }

    #[test]
    fn test_partial_render_table() {
        let config: Config = toml::from_str(
            r#"
[render]
ignore_plain_links = true
format = "unicode"
"#,
        )
        .unwrap();

        assert!(config.render.ignore_plain_links);
        assert!(!config.render.coalesce);
        assert_eq!(
            config.render.output_format().unwrap(),
            OutputFormat::PlainUnicode
        );
        let options = config.render.parse_options();
        assert!(options.ignore_plain_links);
        assert!(!options.chunking);
    }

    #[rstest]
    #[case("html", Some(OutputFormat::Html))]
    #[case("MD", Some(OutputFormat::Markdown))]
    #[case("pdf", None)]
    fn test_output_format(#[case] format: &str, #[case] expected: Option<OutputFormat>) {
        let render = RenderConfig {
            format: format.to_string(),
            ..RenderConfig::default()
        };
        assert_eq!(render.output_format().ok(), expected);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[render]\ncoalesce = \"yes\"\n").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();
        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            render: RenderConfig {
                coalesce: true,
                format: "html".to_string(),
                async_threshold: 1024,
                ..RenderConfig::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }
}
