use crate::api::PatchOutcome;
use crate::errors::PackError;
use crate::files::atomic_write;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    pub path: String,
    pub alias: String,
}

/// Fields written over the packaging tool's `twa-manifest.json` after init.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfigPatch {
    pub package_id: String,
    pub name: String,
    pub launcher_name: String,
    pub host: String,
    pub start_url: String,
    pub theme_color: String,
    pub background_color: String,
    pub enable_notifications: bool,
    pub signing_key: SigningKey,
}

impl ProjectConfigPatch {
    pub fn to_fields(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

/// Shallow merge: overlay values win, existing keys keep their position, new keys are appended.
pub fn merge_fields(base: &mut Map<String, Value>, overlay: Map<String, Value>) -> Vec<String> {
    let mut touched = Vec::with_capacity(overlay.len());
    for (k, v) in overlay {
        touched.push(k.clone());
        base.insert(k, v);
    }
    touched
}

pub fn patch_project_config(
    path: &Path,
    patch: &ProjectConfigPatch,
) -> Result<PatchOutcome, PackError> {
    patch_project_config_fields(path, patch.to_fields())
}

pub fn patch_project_config_fields(
    path: &Path,
    overlay: Map<String, Value>,
) -> Result<PatchOutcome, PackError> {
    if !path.is_file() {
        return Ok(PatchOutcome::NotInitialized {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| PackError::io("failed to read project config", path, e))?;
    let parsed: Value = serde_json::from_str(&raw).map_err(|e| PackError::MalformedConfig {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let Value::Object(mut obj) = parsed else {
        return Err(PackError::MalformedConfig {
            path: path.to_path_buf(),
            message: "top-level value is not an object".to_string(),
        });
    };

    let fields = merge_fields(&mut obj, overlay);
    let body = serde_json::to_string_pretty(&Value::Object(obj)).map_err(|e| {
        PackError::MalformedConfig {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;
    atomic_write(path, &body)?;
    tracing::debug!(path = %path.display(), fields = fields.len(), "project config patched");

    Ok(PatchOutcome::Patched {
        path: path.to_path_buf(),
        fields,
    })
}
