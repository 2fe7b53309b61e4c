//! Configure the command line tool.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::cli::Opts;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "atom-tools.toml";

/// Configuration for the command line tool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Base URI of documents read without one.
    pub base_url: Option<String>,

    /// Write the XML declaration before documents.
    pub xml_declaration: bool,

    /// Delimiter of tags given to the `tag` command.
    pub default_tags_delimiter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            xml_declaration: true,
            default_tags_delimiter: default_tags_delimiter(),
        }
    }
}

impl Config {
    /// Load the configuration from command line options.
    ///
    /// The file given with `--config` is required to exist. Otherwise,
    /// [`CONFIG_FILE_NAME`] is read if present in the working directory.
    pub fn from_opts(opts: &Opts) -> Result<Self> {
        let path = opts.config.clone().or_else(|| {
            let path = PathBuf::from(CONFIG_FILE_NAME);
            path.is_file().then_some(path)
        });

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(base_url) = &opts.base_url {
            config.base_url = Some(base_url.clone());
        }

        Ok(config)
    }

    /// Load the configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading configuration");

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;

        Self::from_toml(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load the configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Default value for [`Config::default_tags_delimiter`].
pub fn default_tags_delimiter() -> String {
    " ".to_owned()
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn load_config_str() {
        const CONTENT: &str = r#"
            base_url = "http://example.org/blog/"
            xml_declaration = false
            default_tags_delimiter = ","
        "#;

        let config = Config::from_toml(CONTENT).unwrap();

        assert_eq!(config.base_url.as_deref(), Some("http://example.org/blog/"));
        assert!(!config.xml_declaration);
        assert_eq!(config.default_tags_delimiter, ",");
    }

    #[test]
    fn load_config_empty() {
        let config = Config::from_toml("").unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.base_url, None);
        assert!(config.xml_declaration);
        assert_eq!(config.default_tags_delimiter, " ");
    }

    #[test]
    fn unknown_field() {
        assert!(Config::from_toml("output_dir = \"_site\"").is_err());
    }
}
