//! Tunable constants for textflow layout and editing, persisted as TOML.

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

    #[error("Invalid value for {field} in config file at {config_path}: {reason}")]
    Invalid {
        config_path: PathBuf,
        field: &'static str,
        reason: String,
    },
}

/// Constants used by the layout engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap kept between a list marker and the content it precedes.
    pub marker_padding: f64,
    /// Lower bound for every resolved table column width.
    pub minimum_column_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            marker_padding: 6.0,
            minimum_column_width: 48.0,
        }
    }
}

/// How leading whitespace in a buffer line becomes a paragraph's left margin.
///
/// A space advances one column, a tab rounds up to the next multiple of
/// `spaces_per_tab`, and each column is `indent_step / spaces_per_tab` pixels wide.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndentConfig {
    pub indent_step: f64,
    pub spaces_per_tab: usize,
}

impl IndentConfig {
    /// Pixel width of a single indentation column.
    pub fn column_width(&self) -> f64 {
        if self.spaces_per_tab == 0 {
            return 0.0;
        }
        self.indent_step / self.spaces_per_tab as f64
    }

    /// Column reached after a tab typed at `column`.
    pub fn next_tab_stop(&self, column: usize) -> usize {
        let tab = self.spaces_per_tab.max(1);
        (column / tab + 1) * tab
    }
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            indent_step: 24.0,
            spaces_per_tab: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub caret_width: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self { caret_width: 1.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub layout: LayoutConfig,
    pub indent: IndentConfig,
    pub editor: EditorConfig,
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

        config.validate(config_path)?;
        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Loaded config, or defaults when no file exists.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
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
        let config_dir = shellexpand::tilde("~/.config/textflow");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn validate(&self, config_path: &Path) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| ConfigError::Invalid {
            config_path: config_path.to_path_buf(),
            field,
            reason: reason.to_string(),
        };

        if self.indent.spaces_per_tab == 0 {
            return Err(invalid("indent.spaces_per_tab", "must be at least 1"));
        }
        if !self.indent.indent_step.is_finite() || self.indent.indent_step < 0.0 {
            return Err(invalid("indent.indent_step", "must be a finite, non-negative width"));
        }
        if !self.layout.marker_padding.is_finite() || self.layout.marker_padding < 0.0 {
            return Err(invalid("layout.marker_padding", "must be a finite, non-negative width"));
        }
        if !self.layout.minimum_column_width.is_finite() || self.layout.minimum_column_width <= 0.0
        {
            return Err(invalid("layout.minimum_column_width", "must be a finite, positive width"));
        }
        if !self.editor.caret_width.is_finite() || self.editor.caret_width <= 0.0 {
            return Err(invalid("editor.caret_width", "must be a finite, positive width"));
        }
        Ok(())
    }
}
