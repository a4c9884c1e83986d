//! Editor configuration

use anyhow::Result;
use semform_core::FormOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::library_selector::Library;

/// Editor-wide configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Version of the config format
    #[serde(default = "default_version")]
    pub version: u32,
    /// Content the edited params belong to, sent with uploads
    #[serde(default)]
    pub content_id: Option<String>,
    /// Where the directory uploader stores files
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Accepted mime types for image fields without a `mimes` list
    #[serde(default = "default_image_mimes")]
    pub image_mimes: Vec<String>,
    /// Longest group summary shown in a title
    #[serde(default = "default_summary_max_length")]
    pub summary_max_length: usize,
    /// Refuse to hand out params while the form is invalid
    #[serde(default)]
    pub strict_params: bool,
    /// Libraries offered by the library selector
    #[serde(default)]
    pub libraries: Vec<Library>,
}

fn default_version() -> u32 {
    1
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_image_mimes() -> Vec<String> {
    FormOptions::default().image_mimes
}

fn default_summary_max_length() -> usize {
    FormOptions::default().summary_max_length
}

impl EditorConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_path()?)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("org", "semform", "semform")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(dirs.config_dir().join("config.json"))
    }

    /// Load configuration from a specific file path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a specific file path
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Settings handed to every form built with this config
    pub fn form_options(&self) -> FormOptions {
        FormOptions {
            summary_max_length: self.summary_max_length,
            image_mimes: self.image_mimes.clone(),
            content_id: self.content_id.clone(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            content_id: None,
            upload_dir: default_upload_dir(),
            image_mimes: default_image_mimes(),
            summary_max_length: default_summary_max_length(),
            strict_params: false,
            libraries: Vec::new(),
        }
    }
}
