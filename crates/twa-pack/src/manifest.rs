use crate::errors::PackError;
use crate::files::atomic_write;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayMode {
    #[default]
    Standalone,
    Fullscreen,
    MinimalUi,
    Browser,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    Any,
    Natural,
    Landscape,
    LandscapePrimary,
    LandscapeSecondary,
    #[default]
    Portrait,
    PortraitPrimary,
    PortraitSecondary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl ManifestIcon {
    pub fn png(src: &str, sizes: &str) -> Self {
        ManifestIcon {
            src: src.to_string(),
            sizes: sizes.to_string(),
            mime_type: "image/png".to_string(),
        }
    }
}

/// The web app manifest synthesized when the remote one can't be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppManifest {
    pub name: String,
    pub short_name: String,
    pub start_url: String,
    pub display: DisplayMode,
    pub orientation: Orientation,
    pub theme_color: String,
    pub background_color: String,
    pub icons: Vec<ManifestIcon>,
}

impl WebAppManifest {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Writes the manifest to `path`, replacing whatever is there.
pub fn write_local_manifest(path: &Path, manifest: &WebAppManifest) -> Result<(), PackError> {
    let body = manifest
        .to_json_pretty()
        .map_err(|e| PackError::io("failed to serialize manifest for", path, e.into()))?;
    atomic_write(path, &body)?;
    tracing::info!(path = %path.display(), "local web manifest written");
    Ok(())
}
