//! Optional TOML configuration: target format, tool paths, cover names

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::AudioFormat;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub convert: ConvertConfig,
    pub tools: ToolsConfig,
    pub discover: DiscoverConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertConfig {
    pub target: AudioFormat,
    pub bitrate: String,
    pub tag_version: u8,
    pub staging_dir: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg: String,
    pub ffprobe: String,
    pub loglevel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverConfig {
    pub cover_names: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            target: AudioFormat::Mp3,
            bitrate: "320k".into(),
            tag_version: 3,
            staging_dir: "converted".into(),
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
            loglevel: "repeat+warning".into(),
        }
    }
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            cover_names: vec!["cover.png".into(), "cover.jpg".into(), "cover.webp".into()],
        }
    }
}

impl Config {
    /// Load configuration from the given path or the default config location.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("retag/config.toml")));

        let config = match config_path {
            Some(ref p) if p.exists() => {
                let content = std::fs::read_to_string(p)?;
                Self::parse(&content)?
            }
            _ => Self::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        let mut components = Path::new(&self.convert.staging_dir).components();
        let plain = matches!(components.next(), Some(Component::Normal(_)))
            && components.next().is_none();
        if !plain {
            return Err(crate::Error::Config(format!(
                "staging_dir must be a plain directory name, got '{}'",
                self.convert.staging_dir
            )));
        }
        if !matches!(self.convert.tag_version, 3 | 4) {
            return Err(crate::Error::Config(format!(
                "tag_version must be 3 or 4, got {}",
                self.convert.tag_version
            )));
        }
        Ok(())
    }
}
